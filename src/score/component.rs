use crate::error::{Error, Result};
use crate::types::duration::{Duration, Multiplier};
use crate::types::indicator::{Indicator, IndicatorKind};
use crate::types::pitch::Pitch;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, PartialEq)]
pub enum LeafKind {
    Note(Pitch),
    Chord(Vec<Pitch>),
    Rest,
    Skip,
    MultimeasureRest,
}

impl LeafKind {
    pub fn name(&self) -> &'static str {
        match self {
            LeafKind::Note(_) => "Note",
            LeafKind::Chord(_) => "Chord",
            LeafKind::Rest => "Rest",
            LeafKind::Skip => "Skip",
            LeafKind::MultimeasureRest => "MultimeasureRest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContainerKind {
    Container,
    Tuplet(Multiplier),
    Voice,
    Staff,
    StaffGroup,
    Score,
    Grace,
}

impl ContainerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Container => "Container",
            ContainerKind::Tuplet(_) => "Tuplet",
            ContainerKind::Voice => "Voice",
            ContainerKind::Staff => "Staff",
            ContainerKind::StaffGroup => "StaffGroup",
            ContainerKind::Score => "Score",
            ContainerKind::Grace => "GraceContainer",
        }
    }

    /// Voice-like containers that establish logical voice identity.
    pub fn is_context(&self) -> bool {
        matches!(
            self,
            ContainerKind::Voice
                | ContainerKind::Staff
                | ContainerKind::StaffGroup
                | ContainerKind::Score
        )
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Content {
    Leaf {
        kind: LeafKind,
        written: Duration,
        multiplier: Option<Multiplier>,
    },
    Container {
        kind: ContainerKind,
        simultaneous: bool,
        children: Vec<Component>,
    },
}

pub(crate) struct Node {
    pub(crate) content: Content,
    pub(crate) parent: Weak<RefCell<Node>>,
    pub(crate) indicators: Vec<Indicator>,
    pub(crate) name: Option<String>,
    pub(crate) tags: Vec<String>,
}

/// Handle to a node of a score tree.
///
/// Containers own their children; children point back to their parent
/// weakly. Cloning a handle does not copy the node: equality and hashing
/// are by identity. Use [`Component::deep_copy`] for a structural copy.
#[derive(Clone)]
pub struct Component(Rc<RefCell<Node>>);

impl Component {
    fn from_content(content: Content) -> Self {
        Component(Rc::new(RefCell::new(Node {
            content,
            parent: Weak::new(),
            indicators: Vec::new(),
            name: None,
            tags: Vec::new(),
        })))
    }

    pub fn leaf(kind: LeafKind, written: Duration) -> Self {
        Self::from_content(Content::Leaf {
            kind,
            written,
            multiplier: None,
        })
    }

    pub fn note(pitch: Pitch, written: Duration) -> Self {
        Self::leaf(LeafKind::Note(pitch), written)
    }

    pub fn chord(pitches: Vec<Pitch>, written: Duration) -> Self {
        Self::leaf(LeafKind::Chord(pitches), written)
    }

    pub fn rest(written: Duration) -> Self {
        Self::leaf(LeafKind::Rest, written)
    }

    pub fn skip(written: Duration) -> Self {
        Self::leaf(LeafKind::Skip, written)
    }

    pub fn multimeasure_rest(written: Duration) -> Self {
        Self::leaf(LeafKind::MultimeasureRest, written)
    }

    pub fn new_container(kind: ContainerKind, children: Vec<Component>) -> Self {
        let simultaneous = matches!(kind, ContainerKind::StaffGroup | ContainerKind::Score);
        let container = Self::from_content(Content::Container {
            kind,
            simultaneous,
            children: Vec::new(),
        });
        for child in children {
            container.push_child(child);
        }
        container
    }

    pub fn container(children: Vec<Component>) -> Self {
        Self::new_container(ContainerKind::Container, children)
    }

    pub fn tuplet(multiplier: Multiplier, children: Vec<Component>) -> Self {
        Self::new_container(ContainerKind::Tuplet(multiplier), children)
    }

    pub fn voice(children: Vec<Component>) -> Self {
        Self::new_container(ContainerKind::Voice, children)
    }

    pub fn staff(children: Vec<Component>) -> Self {
        Self::new_container(ContainerKind::Staff, children)
    }

    pub fn staff_group(children: Vec<Component>) -> Self {
        Self::new_container(ContainerKind::StaffGroup, children)
    }

    pub fn score(children: Vec<Component>) -> Self {
        Self::new_container(ContainerKind::Score, children)
    }

    pub fn grace(children: Vec<Component>) -> Self {
        Self::new_container(ContainerKind::Grace, children)
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.0.borrow_mut().name = Some(name.into());
        self
    }

    pub fn with_tag(self, tag: impl Into<String>) -> Self {
        self.0.borrow_mut().tags.push(tag.into());
        self
    }

    pub fn with_simultaneous(self, simultaneous: bool) -> Self {
        if let Content::Container {
            simultaneous: flag, ..
        } = &mut self.0.borrow_mut().content
        {
            *flag = simultaneous;
        }
        self
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn node(&self) -> std::cell::Ref<'_, Node> {
        self.0.borrow()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.0.borrow().content, Content::Leaf { .. })
    }

    pub fn is_container(&self) -> bool {
        !self.is_leaf()
    }

    pub fn leaf_kind(&self) -> Option<LeafKind> {
        match &self.0.borrow().content {
            Content::Leaf { kind, .. } => Some(kind.clone()),
            Content::Container { .. } => None,
        }
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match &self.0.borrow().content {
            Content::Container { kind, .. } => Some(*kind),
            Content::Leaf { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.0.borrow().content {
            Content::Leaf { kind, .. } => kind.name(),
            Content::Container { kind, .. } => kind.name(),
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(self.leaf_kind(), Some(LeafKind::Note(_)))
    }

    pub fn is_chord(&self) -> bool {
        matches!(self.leaf_kind(), Some(LeafKind::Chord(_)))
    }

    pub fn is_pitched(&self) -> bool {
        self.is_note() || self.is_chord()
    }

    /// Rests, skips and multimeasure rests.
    pub fn is_silent(&self) -> bool {
        matches!(
            self.leaf_kind(),
            Some(LeafKind::Rest | LeafKind::Skip | LeafKind::MultimeasureRest)
        )
    }

    pub fn is_tuplet(&self) -> bool {
        matches!(self.container_kind(), Some(ContainerKind::Tuplet(_)))
    }

    pub fn is_context(&self) -> bool {
        self.container_kind().is_some_and(|kind| kind.is_context())
    }

    pub fn is_grace_container(&self) -> bool {
        matches!(self.container_kind(), Some(ContainerKind::Grace))
    }

    pub fn is_simultaneous(&self) -> bool {
        matches!(
            self.0.borrow().content,
            Content::Container {
                simultaneous: true,
                ..
            }
        )
    }

    pub fn name(&self) -> Option<String> {
        self.0.borrow().name.clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.0.borrow().tags.clone()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.0.borrow().tags.iter().any(|t| t == tag)
    }

    pub fn pitches(&self) -> Vec<Pitch> {
        match self.leaf_kind() {
            Some(LeafKind::Note(pitch)) => vec![pitch],
            Some(LeafKind::Chord(pitches)) => pitches,
            _ => Vec::new(),
        }
    }

    pub fn written_duration(&self) -> Option<Duration> {
        match &self.0.borrow().content {
            Content::Leaf { written, .. } => Some(*written),
            Content::Container { .. } => None,
        }
    }

    pub fn multiplier(&self) -> Option<Multiplier> {
        match &self.0.borrow().content {
            Content::Leaf { multiplier, .. } => *multiplier,
            Content::Container { .. } => None,
        }
    }

    pub fn set_multiplier(&self, value: Option<Multiplier>) {
        if let Content::Leaf { multiplier, .. } = &mut self.0.borrow_mut().content {
            *multiplier = value;
        }
    }

    pub fn set_written_duration(&self, value: Duration) {
        if let Content::Leaf { written, .. } = &mut self.0.borrow_mut().content {
            *written = value;
        }
    }

    pub fn parent(&self) -> Option<Component> {
        self.0.borrow().parent.upgrade().map(Component)
    }

    pub fn children(&self) -> Vec<Component> {
        match &self.0.borrow().content {
            Content::Container { children, .. } => children.clone(),
            Content::Leaf { .. } => Vec::new(),
        }
    }

    /// Number of children; zero for leaves.
    pub fn len(&self) -> usize {
        match &self.0.borrow().content {
            Content::Container { children, .. } => children.len(),
            Content::Leaf { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn child(&self, index: usize) -> Option<Component> {
        match &self.0.borrow().content {
            Content::Container { children, .. } => children.get(index).cloned(),
            Content::Leaf { .. } => None,
        }
    }

    pub fn index_of(&self, child: &Component) -> Option<usize> {
        match &self.0.borrow().content {
            Content::Container { children, .. } => children.iter().position(|c| c.ptr_eq(child)),
            Content::Leaf { .. } => None,
        }
    }

    /// The component followed by its ancestors, innermost first.
    pub fn parentage(&self) -> Vec<Component> {
        let mut result = vec![self.clone()];
        let mut current = self.parent();
        while let Some(parent) = current {
            current = parent.parent();
            result.push(parent);
        }
        result
    }

    pub fn root(&self) -> Component {
        let mut root = self.clone();
        while let Some(parent) = root.parent() {
            root = parent;
        }
        root
    }

    pub fn is_orphan(&self) -> bool {
        self.parent().is_none()
    }

    /// Pre-order walk of the subtree, starting with `self`.
    pub fn descendants(&self) -> Vec<Component> {
        let mut result = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(component) = stack.pop() {
            let children = component.children();
            result.push(component);
            stack.extend(children.into_iter().rev());
        }
        result
    }

    fn push_child(&self, child: Component) {
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        if let Content::Container { children, .. } = &mut self.0.borrow_mut().content {
            children.push(child);
        }
    }

    fn check_can_adopt(&self, child: &Component) -> Result<()> {
        if self.is_leaf() {
            return Err(Error::Structure(format!(
                "can not add children to leaf {:?}",
                self
            )));
        }
        if self.parentage().iter().any(|c| c.ptr_eq(child)) {
            return Err(Error::Structure(format!(
                "can not insert {:?} into itself",
                child
            )));
        }
        Ok(())
    }

    /// Appends `child`, removing it from any previous parent first.
    pub fn append(&self, child: Component) -> Result<()> {
        self.check_can_adopt(&child)?;
        self.push_child(child);
        Ok(())
    }

    pub fn extend(&self, children: impl IntoIterator<Item = Component>) -> Result<()> {
        for child in children {
            self.append(child)?;
        }
        Ok(())
    }

    /// Inserts `child` at `index`, clamped to the number of children.
    pub fn insert(&self, index: usize, child: Component) -> Result<()> {
        self.check_can_adopt(&child)?;
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        if let Content::Container { children, .. } = &mut self.0.borrow_mut().content {
            let index = index.min(children.len());
            children.insert(index, child);
        }
        Ok(())
    }

    pub fn remove(&self, index: usize) -> Option<Component> {
        let removed = match &mut self.0.borrow_mut().content {
            Content::Container { children, .. } if index < children.len() => {
                Some(children.remove(index))
            }
            _ => None,
        };
        if let Some(child) = &removed {
            child.0.borrow_mut().parent = Weak::new();
        }
        removed
    }

    /// Removes the component from its parent, if any.
    pub fn detach(&self) {
        if let Some(parent) = self.parent()
            && let Some(index) = parent.index_of(self)
        {
            parent.remove(index);
        }
        self.0.borrow_mut().parent = Weak::new();
    }

    pub fn indicators(&self) -> Vec<Indicator> {
        self.0.borrow().indicators.clone()
    }

    pub fn indicator(&self, kind: IndicatorKind) -> Option<Indicator> {
        self.0
            .borrow()
            .indicators
            .iter()
            .find(|indicator| indicator.kind() == kind)
            .cloned()
    }

    pub fn has_indicator(&self, kind: IndicatorKind) -> bool {
        self.indicator(kind).is_some()
    }

    pub fn attach(&self, indicator: Indicator) {
        self.0.borrow_mut().indicators.push(indicator);
    }

    /// Removes every indicator of `kind` and returns them.
    pub fn detach_indicators(&self, kind: IndicatorKind) -> Vec<Indicator> {
        let mut node = self.0.borrow_mut();
        let (removed, kept): (Vec<Indicator>, Vec<Indicator>) = node
            .indicators
            .drain(..)
            .partition(|indicator| indicator.kind() == kind);
        node.indicators = kept;
        removed
    }

    /// Copies the component and all of its descendants, indicators
    /// included. The copy has no parent.
    pub fn deep_copy(&self) -> Component {
        let node = self.0.borrow();
        let content = match &node.content {
            Content::Leaf {
                kind,
                written,
                multiplier,
            } => Content::Leaf {
                kind: kind.clone(),
                written: *written,
                multiplier: *multiplier,
            },
            Content::Container {
                kind, simultaneous, ..
            } => Content::Container {
                kind: *kind,
                simultaneous: *simultaneous,
                children: Vec::new(),
            },
        };
        let copy = Component(Rc::new(RefCell::new(Node {
            content,
            parent: Weak::new(),
            indicators: node.indicators.clone(),
            name: node.name.clone(),
            tags: node.tags.clone(),
        })));
        if let Content::Container { children, .. } = &node.content {
            for child in children {
                copy.push_child(child.deep_copy());
            }
        }
        copy
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Component {}

impl Hash for Component {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind_name(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parser::parse_score;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parent_links() {
        let root = parse_score("{ c'8 { d'8 e'8 } }").unwrap();
        let inner = root.child(1).unwrap();
        let leaf = inner.child(0).unwrap();
        assert_eq!(leaf.parent().unwrap(), inner);
        assert_eq!(leaf.root(), root);
        assert_eq!(leaf.parentage().len(), 3);
        assert_eq!(root.descendants().len(), 5);
    }

    #[test]
    fn test_append_moves_child() {
        let first = parse_score("{ c'8 d'8 }").unwrap();
        let second = parse_score("{ e'8 }").unwrap();
        let leaf = first.child(0).unwrap();
        second.append(leaf.clone()).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(leaf.parent().unwrap(), second);
    }

    #[test]
    fn test_append_rejects_cycles() {
        let root = parse_score("{ c'8 { d'8 } }").unwrap();
        let inner = root.child(1).unwrap();
        assert!(matches!(inner.append(root.clone()), Err(Error::Structure(_))));
        let leaf = root.child(0).unwrap();
        assert!(leaf.append(inner.clone()).is_err());
    }

    #[test]
    fn test_deep_copy() {
        let root = parse_score("{ c'8 ~ c'8 { d'8 } }").unwrap();
        let copy = root.deep_copy();
        assert_eq!(copy.to_string(), root.to_string());
        assert!(copy != root);
        assert!(copy.is_orphan());
        assert!(copy.child(0).unwrap().has_indicator(IndicatorKind::Tie));
    }

    #[test]
    fn test_detach_indicators() {
        let root = parse_score("{ c'8 ~ c'8 }").unwrap();
        let leaf = root.child(0).unwrap();
        assert_eq!(leaf.detach_indicators(IndicatorKind::Tie).len(), 1);
        assert!(!leaf.has_indicator(IndicatorKind::Tie));
        assert_eq!(root.to_string(), "{ c'8 c'8 }");
    }
}
