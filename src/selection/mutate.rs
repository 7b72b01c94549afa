//! Selection-scoped edits of the score tree. These change the tree in
//! place and assume no other edit of the same region runs meanwhile.

use crate::error::{Error, Result};
use crate::score::component::{Component, ContainerKind};
use crate::selection::{Item, Prototype, Selection};
use crate::types::duration::{Duration, assignable_parts, is_assignable, zero};
use crate::types::indicator::{Indicator, IndicatorKind};
use tracing::debug;

impl Selection {
    fn require_components(&self) -> Result<Vec<Component>> {
        self.iter()
            .map(|item| match item {
                Item::Component(component) => Ok(component.clone()),
                Item::Selection(selection) => Err(Error::Type(format!(
                    "expected components, found nested {:?}",
                    selection
                ))),
            })
            .collect()
    }

    /// Deep copies of the items. Nested selections are copied item by
    /// item.
    pub fn copy(&self) -> Result<Selection> {
        if !self.are_contiguous_logical_voice(Prototype::Component) {
            return Err(Error::Structure(format!(
                "can only copy contiguous components of one logical voice: {:?}",
                self
            )));
        }
        Ok(self
            .iter()
            .map(|item| match item {
                Item::Component(component) => Item::Component(component.deep_copy()),
                Item::Selection(selection) => Item::Selection(
                    selection
                        .iter()
                        .flat_map(|inner| inner.components())
                        .map(|c| c.deep_copy())
                        .collect(),
                ),
            })
            .collect())
    }

    /// Removes every tie from the items, then ties each one to the next.
    pub fn attach_tie_to_leaves(&self) -> Result<()> {
        let leaves = self.require_components()?;
        for (i, leaf) in leaves.iter().enumerate() {
            leaf.detach_indicators(IndicatorKind::Tie);
            if i + 1 < leaves.len() {
                leaf.attach(Indicator::Tie);
            }
        }
        Ok(())
    }

    /// Fuses leaves into one leaf, or tuplets into one tuplet.
    pub fn fuse(&self) -> Result<Selection> {
        if self.are_leaves() {
            return self.fuse_leaves();
        }
        let components = self.require_components()?;
        if components.iter().all(|c| c.is_tuplet()) {
            return self.fuse_tuplets().map(|tuplet| match tuplet {
                Some(tuplet) => Selection::from(tuplet),
                None => Selection::empty(),
            });
        }
        Err(Error::Type(format!(
            "can only fuse leaves or tuplets, not {:?}",
            self
        )))
    }

    /// The first leaf absorbs the duration of the others, which leave the
    /// tree. Sums that are not a single note value become a run of tied
    /// leaves. The last leaf is tied only if the last original leaf was.
    fn fuse_leaves(&self) -> Result<Selection> {
        if !self.are_contiguous_logical_voice(Prototype::Leaf) {
            return Err(Error::Structure(format!(
                "can only fuse contiguous leaves of one logical voice: {:?}",
                self
            )));
        }
        let leaves = self.require_components()?;
        if leaves.len() <= 1 {
            return Ok(self.clone());
        }
        let originally_tied = leaves
            .last()
            .is_some_and(|leaf| leaf.has_indicator(IndicatorKind::Tie));
        let total = leaves
            .iter()
            .fold(zero(), |sum, leaf| sum + leaf.preprolated_duration());
        let parts = duration_parts(&total)?;
        debug!(count = leaves.len(), %total, "fusing leaves");
        for leaf in &leaves[1..] {
            leaf.detach();
        }
        let result = set_leaf_duration(&leaves[0], &parts)?;
        if let Some(Item::Component(last)) = result.last() {
            last.detach_indicators(IndicatorKind::Tie);
            if originally_tied {
                last.attach(Indicator::Tie);
            }
        }
        Ok(result)
    }

    /// Moves the contents of the tuplets into a new tuplet that takes
    /// their place.
    fn fuse_tuplets(&self) -> Result<Option<Component>> {
        if !self.are_contiguous_same_parent(Prototype::Tuplet) {
            return Err(Error::Structure(format!(
                "can only fuse adjacent tuplets of one parent: {:?}",
                self
            )));
        }
        let tuplets = self.require_components()?;
        let Some(first) = tuplets.first() else {
            return Ok(None);
        };
        let kind = first.container_kind();
        if tuplets.iter().any(|t| t.container_kind() != kind) {
            return Err(Error::Value(
                "tuplets must carry the same multiplier".to_string(),
            ));
        }
        let Some(ContainerKind::Tuplet(multiplier)) = kind else {
            return Err(Error::Type("expected tuplets".to_string()));
        };
        debug!(count = tuplets.len(), %multiplier, "fusing tuplets");
        let fused = Component::tuplet(multiplier, Vec::new());
        self.give_components_to_empty_container(&fused)?;
        self.give_position_in_parent_to_container(&fused)?;
        Ok(Some(fused))
    }

    /// Moves the children of every item into `container`, which must be
    /// empty.
    pub fn give_components_to_empty_container(&self, container: &Component) -> Result<()> {
        if !self.are_contiguous_same_parent(Prototype::Component) {
            return Err(Error::Structure(format!(
                "can only rehome adjacent components of one parent: {:?}",
                self
            )));
        }
        if !container.is_container() {
            return Err(Error::Type(format!("{:?} is not a container", container)));
        }
        if !container.is_empty() {
            return Err(Error::Structure(format!("{:?} is not empty", container)));
        }
        for component in self.require_components()? {
            container.extend(component.children())?;
        }
        Ok(())
    }

    /// Puts `container` where the items stand in their parent and removes
    /// the items from it. Parentless items leave the tree untouched.
    pub fn give_position_in_parent_to_container(&self, container: &Component) -> Result<()> {
        if !self.are_contiguous_same_parent(Prototype::Component) {
            return Err(Error::Structure(format!(
                "can only replace adjacent components of one parent: {:?}",
                self
            )));
        }
        if !container.is_container() {
            return Err(Error::Type(format!("{:?} is not a container", container)));
        }
        let components = self.require_components()?;
        let Some(first) = components.first() else {
            return Ok(());
        };
        let Some(parent) = first.parent() else {
            return Ok(());
        };
        let Some(start) = parent.index_of(first) else {
            return Ok(());
        };
        debug!(parent = ?parent, start, "giving position to container");
        for component in &components {
            component.detach();
        }
        parent.insert(start, container.clone())
    }

    /// Wraps the items in `container`, which takes their place.
    pub fn wrap(&self, container: &Component) -> Result<()> {
        if !container.is_container() || !container.is_empty() {
            return Err(Error::Structure(format!(
                "can only wrap in an empty container, not {:?}",
                container
            )));
        }
        self.give_position_in_parent_to_container(container)?;
        container.extend(self.require_components()?)
    }
}

/// Note values that add up to `total`, longest first.
fn duration_parts(total: &Duration) -> Result<Vec<Duration>> {
    if is_assignable(total) {
        Ok(vec![*total])
    } else {
        assignable_parts(total)
    }
}

/// Gives `leaf` the durations in `parts`, splitting it into tied copies
/// when there is more than one.
fn set_leaf_duration(leaf: &Component, parts: &[Duration]) -> Result<Selection> {
    let Some((first, rest)) = parts.split_first() else {
        return Ok(Selection::from(leaf.clone()));
    };
    leaf.set_multiplier(None);
    leaf.set_written_duration(*first);
    if rest.is_empty() {
        return Ok(Selection::from(leaf.clone()));
    }
    let mut leaves = vec![leaf.clone()];
    let parent = leaf.parent();
    for (offset, part) in rest.iter().enumerate() {
        let copy = leaf.deep_copy();
        copy.detach_indicators(IndicatorKind::TimeSignature);
        copy.detach_indicators(IndicatorKind::MetronomeMark);
        copy.set_written_duration(*part);
        if let Some(parent) = &parent
            && let Some(index) = parent.index_of(leaf)
        {
            parent.insert(index + offset + 1, copy.clone())?;
        }
        leaves.push(copy);
    }
    let result = Selection::from(leaves);
    result.attach_tie_to_leaves()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parser::parse_score;
    use crate::selection::{LeafFilter, TieFilter};
    use crate::types::duration::Multiplier;
    use pretty_assertions::assert_eq;

    fn leaves_of(root: &Component) -> Selection {
        Selection::from(root.clone()).leaves(LeafFilter::new())
    }

    #[test]
    fn test_copy() {
        let root = parse_score("{ c'8 ~ c'8 d'8 }").unwrap();
        let leaves = leaves_of(&root);
        let copies = leaves.slice(..2).copy().unwrap();
        assert_eq!(copies.to_string(), "[c'8 ~ c'8]");
        assert!(copies.iter().all(|item| item.as_component().is_some_and(|c| c.is_orphan())));
        assert!(copies != leaves.slice(..2));

        let gapped = leaves.get([0, 2], None).unwrap();
        assert!(matches!(gapped.copy(), Err(Error::Structure(_))));
    }

    #[test]
    fn test_attach_tie_to_leaves() {
        let root = parse_score("{ c'8 ~ c'8 c'8 c'8 }").unwrap();
        let leaves = leaves_of(&root);
        leaves.slice(1..).attach_tie_to_leaves().unwrap();
        leaves.slice(1..).attach_tie_to_leaves().unwrap();
        assert_eq!(root.to_string(), "{ c'8 ~ c'8 ~ c'8 ~ c'8 }");
    }

    #[test]
    fn test_fuse_leaves() {
        let root = parse_score("{ c'8 c'8 c'8 d'4 }").unwrap();
        let fused = leaves_of(&root).slice(..2).fuse().unwrap();
        assert_eq!(fused.len(), 1);
        assert_eq!(root.to_string(), "{ c'4 c'8 d'4 }");
    }

    #[test]
    fn test_fuse_leaves_into_tied_run() {
        let root = parse_score("{ c'8 c'8 c'8 c'8 c'8 d'4 }").unwrap();
        let fused = leaves_of(&root).slice(..5).fuse().unwrap();
        assert_eq!(fused.len(), 2);
        assert_eq!(root.to_string(), "{ c'2 ~ c'8 d'4 }");
        let ties = Selection::from(root).logical_ties(TieFilter::new());
        assert_eq!(ties.len(), 2);
    }

    #[test]
    fn test_fuse_keeps_trailing_tie() {
        let root = parse_score("{ c'8 c'8 ~ c'4 }").unwrap();
        leaves_of(&root).slice(..2).fuse().unwrap();
        assert_eq!(root.to_string(), "{ c'4 ~ c'4 }");

        let root = parse_score("{ c'8 ~ c'8 d'4 }").unwrap();
        leaves_of(&root).slice(..2).fuse().unwrap();
        assert_eq!(root.to_string(), "{ c'4 d'4 }");
    }

    #[test]
    fn test_failed_fuse_leaves_tree_intact() {
        let root = parse_score("{ c'8*1/3 d'8 e'8 }").unwrap();
        let result = leaves_of(&root).slice(..2).fuse();
        assert_eq!(result, Err(Error::Assignability(Duration::new(1, 6))));
        assert_eq!(root.to_string(), "{ c'8*1/3 d'8 e'8 }");
        assert_eq!(leaves_of(&root).len(), 3);
    }

    #[test]
    fn test_fuse_leaves_requires_contiguity() {
        let root = parse_score("{ c'8 d'8 e'8 }").unwrap();
        let gapped = leaves_of(&root).get([0, 2], None).unwrap();
        assert!(matches!(gapped.fuse(), Err(Error::Structure(_))));
    }

    #[test]
    fn test_fuse_tuplets() {
        let root =
            parse_score("{ c'4 \\tuplet 3/2 { d'8 e'8 f'8 } \\tuplet 3/2 { g'4 a'8 } b'4 }").unwrap();
        let tuplets = Selection::from(root.clone()).tuplets(None, None);
        let fused = tuplets.fuse().unwrap();
        assert_eq!(fused.len(), 1);
        assert_eq!(
            root.to_string(),
            "{ c'4 \\tuplet 3/2 { d'8 e'8 f'8 g'4 a'8 } b'4 }"
        );
        let tuplet = root.child(1).unwrap();
        assert_eq!(
            tuplet.container_kind(),
            Some(ContainerKind::Tuplet(Multiplier::new(2, 3)))
        );
    }

    #[test]
    fn test_fuse_tuplets_with_different_multipliers() {
        let root = parse_score("{ \\tuplet 3/2 { d'8 e'8 f'8 } \\tuplet 5/4 { g'16 g'16 g'16 g'16 g'16 } }")
            .unwrap();
        let tuplets = Selection::from(root).tuplets(None, None);
        assert!(matches!(tuplets.fuse(), Err(Error::Value(_))));
    }

    #[test]
    fn test_fuse_mixed_content() {
        let root = parse_score("{ c'4 \\tuplet 3/2 { d'8 e'8 f'8 } }").unwrap();
        let mixed = Selection::from(root.children());
        assert!(matches!(mixed.fuse(), Err(Error::Type(_))));
    }

    #[test]
    fn test_wrap() {
        let root = parse_score("{ c'8 d'8 e'8 f'8 }").unwrap();
        let middle = leaves_of(&root).slice(1..3);
        middle.wrap(&Component::tuplet(Multiplier::new(2, 3), Vec::new())).unwrap();
        assert_eq!(root.to_string(), "{ c'8 \\tuplet 3/2 { d'8 e'8 } f'8 }");
    }

    #[test]
    fn test_rehoming_requires_same_parent() {
        let root = parse_score("{ c'8 { d'8 } }").unwrap();
        let leaves = leaves_of(&root);
        let container = Component::container(Vec::new());
        assert!(matches!(
            leaves.give_position_in_parent_to_container(&container),
            Err(Error::Structure(_))
        ));
        assert!(matches!(
            leaves.wrap(&Component::container(vec![Component::rest(Duration::new(1, 4))])),
            Err(Error::Structure(_))
        ));
    }
}
