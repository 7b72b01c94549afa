use crate::score::component::Component;
use crate::selection::{Item, Prototype, Selection};

/// Each component paired with the component before it from the same
/// tree; adjacency means nothing across roots.
fn same_root_pairs(components: &[Component]) -> Vec<(&Component, &Component)> {
    let mut latest: Vec<(Component, &Component)> = Vec::new();
    let mut pairs = Vec::new();
    for component in components {
        let root = component.root();
        match latest.iter_mut().find(|(r, _)| *r == root) {
            Some(entry) => {
                pairs.push((entry.1, component));
                entry.1 = component;
            }
            None => latest.push((root, component)),
        }
    }
    pairs
}

impl Selection {
    /// Components of the requested prototype, or `None` when some item is
    /// a nested selection or a component of another kind.
    fn components_of(&self, prototype: Prototype) -> Option<Vec<Component>> {
        self.iter()
            .map(|item| match item {
                Item::Component(component) if prototype.matches(component) => {
                    Some(component.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn are_leaves(&self) -> bool {
        self.iter()
            .all(|item| item.as_component().is_some_and(|c| c.is_leaf()))
    }

    /// True when every item is a `prototype` component and the items
    /// either are all parentless or all share one logical voice.
    pub fn are_logical_voice(&self, prototype: Prototype) -> bool {
        let Some(components) = self.components_of(prototype) else {
            return false;
        };
        let Some(first) = components.first() else {
            return true;
        };
        if components.iter().all(|c| c.is_orphan()) {
            return true;
        }
        let voice = first.logical_voice();
        components.iter().all(|c| c.logical_voice() == voice)
    }

    /// [`Selection::are_logical_voice`] plus: each item is followed in
    /// time by the next one from the same tree with nothing in between.
    pub fn are_contiguous_logical_voice(&self, prototype: Prototype) -> bool {
        let Some(components) = self.components_of(prototype) else {
            return false;
        };
        if components.iter().all(|c| c.is_orphan()) {
            return true;
        }
        let Some(first) = components.first() else {
            return true;
        };
        let voice = first.logical_voice();
        components.iter().all(|c| c.logical_voice() == voice)
            && same_root_pairs(&components)
                .into_iter()
                .all(|(a, b)| a.is_immediately_followed_by(b))
    }

    /// Every item is a `prototype` component, and items from the same tree
    /// share one parent and sit next to each other in it.
    pub fn are_contiguous_same_parent(&self, prototype: Prototype) -> bool {
        let Some(components) = self.components_of(prototype) else {
            return false;
        };
        same_root_pairs(&components).into_iter().all(|(a, b)| {
            let same_parent = match (a.parent(), b.parent()) {
                (Some(p), Some(q)) => p.ptr_eq(&q),
                _ => false,
            };
            same_parent && a.is_immediately_followed_by(b)
        })
    }
}
