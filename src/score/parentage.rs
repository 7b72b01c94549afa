use crate::score::component::{Component, ContainerKind};
use crate::selection::Selection;
use crate::types::indicator::IndicatorKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ContextKey {
    Named(&'static str, String),
    Anonymous(&'static str, usize),
}

/// Identity of the voice-like containers above a component. Two
/// components belong to the same musical line when their logical voices
/// are equal. Named contexts compare by name, anonymous ones by identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalVoice(Vec<ContextKey>);

impl Component {
    pub fn logical_voice(&self) -> LogicalVoice {
        let keys = self
            .parentage()
            .iter()
            .rev()
            .filter_map(|c| match c.container_kind() {
                Some(kind) if kind.is_context() => Some(match c.name() {
                    Some(name) => ContextKey::Named(kind.name(), name),
                    None => ContextKey::Anonymous(kind.name(), c.id()),
                }),
                _ => None,
            })
            .collect();
        LogicalVoice(keys)
    }

    /// Tuplets among the ancestors, `self` included.
    pub fn tuplet_depth(&self) -> usize {
        self.parentage().iter().filter(|c| c.is_tuplet()).count()
    }

    /// The sibling `n` positions away inside a sequential parent.
    pub fn sibling(&self, n: isize) -> Option<Component> {
        let parent = self.parent()?;
        if parent.is_simultaneous() {
            return None;
        }
        let index = parent.index_of(self)? as isize + n;
        if index < 0 {
            return None;
        }
        parent.child(index as usize)
    }

    /// First component after `self` in time order: the next sibling of
    /// the nearest ancestor that has one.
    pub fn next_in_time(&self) -> Option<Component> {
        self.parentage().iter().find_map(|c| c.sibling(1))
    }

    pub fn previous_in_time(&self) -> Option<Component> {
        self.parentage().iter().find_map(|c| c.sibling(-1))
    }

    /// `self` plus the descendants that start at the same moment.
    pub fn descendants_starting_with(&self) -> Vec<Component> {
        let mut result = vec![self.clone()];
        if self.is_simultaneous() {
            for child in self.children() {
                result.extend(child.descendants_starting_with());
            }
        } else if let Some(first) = self.child(0) {
            result.extend(first.descendants_starting_with());
        }
        result
    }

    /// `self` plus the descendants that stop at the same moment.
    pub fn descendants_stopping_with(&self) -> Vec<Component> {
        let mut result = vec![self.clone()];
        if self.is_simultaneous() {
            for child in self.children() {
                result.extend(child.descendants_stopping_with());
            }
        } else if !self.is_empty()
            && let Some(last) = self.child(self.len() - 1)
        {
            result.extend(last.descendants_stopping_with());
        }
        result
    }

    /// True when `other` follows `self` with nothing in between.
    pub fn is_immediately_followed_by(&self, other: &Component) -> bool {
        self.next_in_time()
            .is_some_and(|next| next.descendants_starting_with().contains(other))
    }

    /// Next leaf in the same logical voice.
    pub fn next_leaf(&self) -> Option<Component> {
        let voice = self.logical_voice();
        let next = self.next_in_time()?;
        next.descendants_starting_with()
            .into_iter()
            .find(|c| c.is_leaf() && c.logical_voice() == voice)
    }

    /// Previous leaf in the same logical voice.
    pub fn previous_leaf(&self) -> Option<Component> {
        let voice = self.logical_voice();
        let previous = self.previous_in_time()?;
        previous
            .descendants_stopping_with()
            .into_iter()
            .find(|c| c.is_leaf() && c.logical_voice() == voice)
    }

    /// The run of leaves joined to this leaf by ties.
    pub fn logical_tie(&self) -> Selection {
        let mut leaves = vec![self.clone()];
        let mut current = self.clone();
        while let Some(previous) = current.previous_leaf() {
            if !previous.has_indicator(IndicatorKind::Tie) {
                break;
            }
            leaves.insert(0, previous.clone());
            current = previous;
        }
        let mut current = self.clone();
        while current.has_indicator(IndicatorKind::Tie) {
            match current.next_leaf() {
                Some(next) => {
                    leaves.push(next.clone());
                    current = next;
                }
                None => break,
            }
        }
        Selection::from(leaves)
    }

    pub fn is_logical_tie_head(&self) -> bool {
        self.previous_leaf()
            .is_none_or(|previous| !previous.has_indicator(IndicatorKind::Tie))
    }

    pub fn is_logical_tie_tail(&self) -> bool {
        !self.has_indicator(IndicatorKind::Tie) || self.next_leaf().is_none()
    }

    /// Highest ancestor (or `self`) whose parent is a context or who has
    /// no parent at all.
    pub fn top(&self) -> Component {
        for component in self.parentage() {
            match component.parent() {
                None => return component,
                Some(parent) if parent.is_context() => return component,
                _ => {}
            }
        }
        self.root()
    }

    /// Tuplets strictly below `self`, plus `self` when it is a tuplet.
    pub fn tuplet_count(&self) -> usize {
        self.descendants()
            .iter()
            .filter(|c| matches!(c.container_kind(), Some(ContainerKind::Tuplet(_))))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parser::parse_score;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_logical_voice() {
        let root = parse_score(
            r#"\new Staff { \new Voice = "one" { c'8 d'8 } \new Voice = "one" { e'8 } \new Voice = "two" { f'8 } }"#,
        )
        .unwrap();
        let first = root.child(0).unwrap().child(0).unwrap();
        let second = root.child(1).unwrap().child(0).unwrap();
        let third = root.child(2).unwrap().child(0).unwrap();
        assert_eq!(first.logical_voice(), second.logical_voice());
        assert!(first.logical_voice() != third.logical_voice());
    }

    #[test]
    fn test_leaf_neighbors_cross_containers() {
        let root = parse_score("{ c'8 { d'8 \\tuplet 3/2 { e'8 f'8 g'8 } } a'8 }").unwrap();
        let leaves: Vec<Component> = root
            .descendants()
            .into_iter()
            .filter(|c| c.is_leaf())
            .collect();
        assert_eq!(leaves[0].next_leaf().unwrap(), leaves[1]);
        assert_eq!(leaves[1].next_leaf().unwrap(), leaves[2]);
        assert_eq!(leaves[4].next_leaf().unwrap(), leaves[5]);
        assert_eq!(leaves[5].previous_leaf().unwrap(), leaves[4]);
        assert!(leaves[5].next_leaf().is_none());
        assert!(leaves[0].previous_leaf().is_none());
        assert!(leaves[4].is_immediately_followed_by(&leaves[5]));
        assert!(!leaves[3].is_immediately_followed_by(&leaves[5]));
    }

    #[test]
    fn test_leaf_neighbors_stay_in_voice() {
        let root = parse_score(
            r#"\new Staff { \new Voice = "a" { c'8 } \new Voice = "b" { d'8 } }"#,
        )
        .unwrap();
        let first = root.child(0).unwrap().child(0).unwrap();
        assert!(first.next_leaf().is_none());
    }

    #[test]
    fn test_logical_tie() {
        let root = parse_score("{ c'8 ~ c'8 ~ c'8 d'8 }").unwrap();
        let leaves = root.children();
        let tie = leaves[1].logical_tie();
        assert_eq!(tie.len(), 3);
        assert!(leaves[0].is_logical_tie_head());
        assert!(!leaves[1].is_logical_tie_head());
        assert!(leaves[2].is_logical_tie_tail());
        assert!(!leaves[0].is_logical_tie_tail());
        assert_eq!(leaves[3].logical_tie().len(), 1);
    }

    #[test]
    fn test_top() {
        let root = parse_score("\\new Voice { c'8 { d'8 { e'8 } } }").unwrap();
        let deep = root.child(1).unwrap().child(1).unwrap().child(0).unwrap();
        assert_eq!(deep.top(), root.child(1).unwrap());
        assert_eq!(root.child(0).unwrap().top(), root.child(0).unwrap());
    }
}
