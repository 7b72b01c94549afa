use crate::error::{Error, Result};
use crate::score::component::{Component, ContainerKind, LeafKind};
use crate::selection::{Item, Selection};
use anyhow::bail;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Component classes that traversals can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prototype {
    Component,
    Leaf,
    Note,
    Chord,
    Rest,
    Skip,
    MultimeasureRest,
    /// Any container, tuplets and contexts included.
    Container,
    Tuplet,
    Voice,
    Staff,
    StaffGroup,
    Score,
    Grace,
}

impl Prototype {
    pub fn matches(&self, component: &Component) -> bool {
        match self {
            Prototype::Component => true,
            Prototype::Leaf => component.is_leaf(),
            Prototype::Container => component.is_container(),
            Prototype::Note => matches!(component.leaf_kind(), Some(LeafKind::Note(_))),
            Prototype::Chord => matches!(component.leaf_kind(), Some(LeafKind::Chord(_))),
            Prototype::Rest => component.leaf_kind() == Some(LeafKind::Rest),
            Prototype::Skip => component.leaf_kind() == Some(LeafKind::Skip),
            Prototype::MultimeasureRest => {
                component.leaf_kind() == Some(LeafKind::MultimeasureRest)
            }
            Prototype::Tuplet => component.is_tuplet(),
            Prototype::Voice => component.container_kind() == Some(ContainerKind::Voice),
            Prototype::Staff => component.container_kind() == Some(ContainerKind::Staff),
            Prototype::StaffGroup => {
                component.container_kind() == Some(ContainerKind::StaffGroup)
            }
            Prototype::Score => component.container_kind() == Some(ContainerKind::Score),
            Prototype::Grace => component.is_grace_container(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Prototype::Component => "Component",
            Prototype::Leaf => "Leaf",
            Prototype::Note => "Note",
            Prototype::Chord => "Chord",
            Prototype::Rest => "Rest",
            Prototype::Skip => "Skip",
            Prototype::MultimeasureRest => "MultimeasureRest",
            Prototype::Container => "Container",
            Prototype::Tuplet => "Tuplet",
            Prototype::Voice => "Voice",
            Prototype::Staff => "Staff",
            Prototype::StaffGroup => "StaffGroup",
            Prototype::Score => "Score",
            Prototype::Grace => "GraceContainer",
        }
    }
}

impl FromStr for Prototype {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(match s {
            "Component" => Prototype::Component,
            "Leaf" => Prototype::Leaf,
            "Note" => Prototype::Note,
            "Chord" => Prototype::Chord,
            "Rest" => Prototype::Rest,
            "Skip" => Prototype::Skip,
            "MultimeasureRest" => Prototype::MultimeasureRest,
            "Container" => Prototype::Container,
            "Tuplet" => Prototype::Tuplet,
            "Voice" => Prototype::Voice,
            "Staff" => Prototype::Staff,
            "StaffGroup" => Prototype::StaffGroup,
            "Score" => Prototype::Score,
            "GraceContainer" => Prototype::Grace,
            _ => bail!("Unknown prototype: {}", s),
        })
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which end(s) of a leaf run lose their rests, skips and multimeasure
/// rests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trim {
    Both,
    Left,
}

/// Options for [`Selection::components`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ComponentFilter {
    /// Empty means any component.
    pub prototypes: Vec<Prototype>,
    /// Components tagged with this string are skipped with their
    /// descendants.
    pub exclude: Option<String>,
    /// `Some(true)` keeps only grace music, `Some(false)` only main music.
    pub grace: Option<bool>,
    pub reverse: bool,
}

impl ComponentFilter {
    pub fn new() -> Self {
        ComponentFilter::default()
    }

    pub fn prototype(mut self, prototype: Prototype) -> Self {
        self.prototypes.push(prototype);
        self
    }

    pub fn exclude(mut self, tag: impl Into<String>) -> Self {
        self.exclude = Some(tag.into());
        self
    }

    pub fn grace(mut self, grace: bool) -> Self {
        self.grace = Some(grace);
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    fn accepts(&self, component: &Component) -> bool {
        let prototype_ok =
            self.prototypes.is_empty() || self.prototypes.iter().any(|p| p.matches(component));
        let grace_ok = self
            .grace
            .is_none_or(|grace| component.is_grace_music() == grace);
        prototype_ok && grace_ok
    }
}

/// Options for [`Selection::leaves`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LeafFilter {
    /// Empty means any leaf.
    pub prototypes: Vec<Prototype>,
    pub exclude: Option<String>,
    pub grace: Option<bool>,
    /// Keep only (or drop) logical tie heads.
    pub head: Option<bool>,
    /// Keep only (or drop) logical tie tails.
    pub tail: Option<bool>,
    /// `Some(true)` keeps notes and chords, `Some(false)` everything else.
    pub pitched: Option<bool>,
    pub trim: Option<Trim>,
    pub reverse: bool,
}

impl LeafFilter {
    pub fn new() -> Self {
        LeafFilter::default()
    }

    pub fn pitched() -> Self {
        LeafFilter::default().with_pitched(true)
    }

    pub fn prototype(mut self, prototype: Prototype) -> Self {
        self.prototypes.push(prototype);
        self
    }

    pub fn exclude(mut self, tag: impl Into<String>) -> Self {
        self.exclude = Some(tag.into());
        self
    }

    pub fn grace(mut self, grace: bool) -> Self {
        self.grace = Some(grace);
        self
    }

    pub fn head(mut self, head: bool) -> Self {
        self.head = Some(head);
        self
    }

    pub fn tail(mut self, tail: bool) -> Self {
        self.tail = Some(tail);
        self
    }

    pub fn with_pitched(mut self, pitched: bool) -> Self {
        self.pitched = Some(pitched);
        self
    }

    pub fn trim(mut self, trim: Trim) -> Self {
        self.trim = Some(trim);
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

/// Options for [`Selection::logical_ties`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TieFilter {
    pub exclude: Option<String>,
    pub grace: Option<bool>,
    /// `Some(true)` drops single-leaf ties, `Some(false)` keeps only them.
    pub nontrivial: Option<bool>,
    pub pitched: Option<bool>,
    pub reverse: bool,
}

impl TieFilter {
    pub fn new() -> Self {
        TieFilter::default()
    }

    pub fn exclude(mut self, tag: impl Into<String>) -> Self {
        self.exclude = Some(tag.into());
        self
    }

    pub fn grace(mut self, grace: bool) -> Self {
        self.grace = Some(grace);
        self
    }

    pub fn nontrivial(mut self, nontrivial: bool) -> Self {
        self.nontrivial = Some(nontrivial);
        self
    }

    pub fn pitched(mut self, pitched: bool) -> Self {
        self.pitched = Some(pitched);
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

fn walk(component: &Component, exclude: Option<&str>, result: &mut Vec<Component>) {
    if exclude.is_some_and(|tag| component.has_tag(tag)) {
        return;
    }
    result.push(component.clone());
    for child in component.children() {
        walk(&child, exclude, result);
    }
}

fn walk_items(items: &[Item], exclude: Option<&str>, result: &mut Vec<Component>) {
    for item in items {
        match item {
            Item::Component(component) => walk(component, exclude, result),
            Item::Selection(selection) => walk_items(selection.items(), exclude, result),
        }
    }
}

fn is_silent(component: &Component) -> bool {
    matches!(
        component.leaf_kind(),
        Some(LeafKind::Rest | LeafKind::Skip | LeafKind::MultimeasureRest)
    )
}

fn trim_silent(leaves: Vec<Component>, trim: Trim) -> Vec<Component> {
    let start = leaves
        .iter()
        .position(|leaf| !is_silent(leaf))
        .unwrap_or(leaves.len());
    let stop = match trim {
        Trim::Left => leaves.len(),
        Trim::Both => leaves
            .iter()
            .rposition(|leaf| !is_silent(leaf))
            .map_or(start, |index| index + 1),
    };
    leaves[start..stop.max(start)].to_vec()
}

fn finish(mut components: Vec<Component>, reverse: bool) -> Selection {
    if reverse {
        components.reverse();
    }
    components.into_iter().collect()
}

fn nth_component(selection: Selection, n: isize) -> Result<Component> {
    match selection.item(n)? {
        Item::Component(component) => Ok(component),
        Item::Selection(_) => Err(Error::Type("expected a component".to_string())),
    }
}

fn nth_selection(selection: Selection, n: isize) -> Result<Selection> {
    match selection.item(n)? {
        Item::Selection(selection) => Ok(selection),
        Item::Component(component) => Ok(Selection::from(component)),
    }
}

impl Selection {
    /// Every component at or below the items, in score order.
    pub fn components(&self, filter: ComponentFilter) -> Selection {
        let mut walked = Vec::new();
        walk_items(self.items(), filter.exclude.as_deref(), &mut walked);
        let kept = walked.into_iter().filter(|c| filter.accepts(c)).collect();
        finish(kept, filter.reverse)
    }

    pub fn leaves(&self, filter: LeafFilter) -> Selection {
        let mut walked = Vec::new();
        walk_items(self.items(), filter.exclude.as_deref(), &mut walked);
        let mut leaves: Vec<Component> = walked
            .into_iter()
            .filter(|c| c.is_leaf())
            .filter(|c| filter.prototypes.is_empty() || filter.prototypes.iter().any(|p| p.matches(c)))
            .filter(|c| filter.grace.is_none_or(|grace| c.is_grace_music() == grace))
            .filter(|c| filter.pitched.is_none_or(|pitched| c.is_pitched() == pitched))
            .filter(|c| filter.head.is_none_or(|head| c.is_logical_tie_head() == head))
            .filter(|c| filter.tail.is_none_or(|tail| c.is_logical_tie_tail() == tail))
            .collect();
        if let Some(trim) = filter.trim {
            leaves = trim_silent(leaves, trim);
        }
        finish(leaves, filter.reverse)
    }

    pub fn notes(&self, filter: ComponentFilter) -> Selection {
        self.components(ComponentFilter {
            prototypes: vec![Prototype::Note],
            ..filter
        })
    }

    pub fn chords(&self, filter: ComponentFilter) -> Selection {
        self.components(ComponentFilter {
            prototypes: vec![Prototype::Chord],
            ..filter
        })
    }

    /// Rests and multimeasure rests.
    pub fn rests(&self, filter: ComponentFilter) -> Selection {
        self.components(ComponentFilter {
            prototypes: vec![Prototype::Rest, Prototype::MultimeasureRest],
            ..filter
        })
    }

    /// Logical ties of the selected leaves, one selection per tie, in
    /// order of their first leaf.
    pub fn logical_ties(&self, filter: TieFilter) -> Selection {
        let leaves = self.leaves(LeafFilter {
            exclude: filter.exclude.clone(),
            grace: filter.grace,
            pitched: filter.pitched,
            ..LeafFilter::default()
        });
        let mut seen = HashSet::new();
        let mut ties = Vec::new();
        for leaf in leaves.iter().filter_map(|item| item.as_component()) {
            let tie = leaf.logical_tie();
            let Some(Item::Component(head)) = tie.first().cloned() else {
                continue;
            };
            if !seen.insert(head) {
                continue;
            }
            let keep = filter
                .nontrivial
                .is_none_or(|nontrivial| (tie.len() > 1) == nontrivial);
            if keep {
                ties.push(Item::Selection(tie));
            }
        }
        if filter.reverse {
            ties.reverse();
        }
        Selection::new(ties)
    }

    /// Tuplets at any depth, or at the given level: positive levels count
    /// enclosing tuplets (1 is outermost), negative levels count tuplets
    /// inside (-1 is innermost).
    pub fn tuplets(&self, exclude: Option<&str>, level: Option<isize>) -> Selection {
        let mut filter = ComponentFilter::new().prototype(Prototype::Tuplet);
        filter.exclude = exclude.map(str::to_string);
        let tuplets = self.components(filter);
        match level {
            None => tuplets,
            Some(level) if level < 0 => tuplets.filter(|item| {
                item.as_component()
                    .is_some_and(|t| t.tuplet_count() as isize == -level)
            }),
            Some(level) => tuplets.filter(|item| {
                item.as_component()
                    .is_some_and(|t| t.tuplet_depth() as isize == level)
            }),
        }
    }

    /// Highest ancestors of the selected components that sit directly in
    /// a context (or have no parent), without repeats.
    pub fn top(&self, exclude: Option<&str>) -> Selection {
        let mut walked = Vec::new();
        walk_items(self.items(), exclude, &mut walked);
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for component in walked {
            let top = component.top();
            if seen.insert(top.clone()) {
                result.push(top);
            }
        }
        result.into_iter().collect()
    }

    /// Maximal runs of notes and chords that follow one another in time.
    pub fn runs(&self, exclude: Option<&str>) -> Selection {
        let mut filter = LeafFilter::pitched();
        filter.exclude = exclude.map(str::to_string);
        self.leaves(filter).group_by_contiguity()
    }

    pub fn leaf(&self, n: isize, filter: LeafFilter) -> Result<Component> {
        nth_component(self.leaves(filter), n)
    }

    pub fn note(&self, n: isize, filter: ComponentFilter) -> Result<Component> {
        nth_component(self.notes(filter), n)
    }

    pub fn chord(&self, n: isize, filter: ComponentFilter) -> Result<Component> {
        nth_component(self.chords(filter), n)
    }

    pub fn rest(&self, n: isize, filter: ComponentFilter) -> Result<Component> {
        nth_component(self.rests(filter), n)
    }

    pub fn tuplet(&self, n: isize, level: Option<isize>) -> Result<Component> {
        nth_component(self.tuplets(None, level), n)
    }

    pub fn run(&self, n: isize, exclude: Option<&str>) -> Result<Selection> {
        nth_selection(self.runs(exclude), n)
    }

    pub fn logical_tie(&self, n: isize, filter: TieFilter) -> Result<Selection> {
        nth_selection(self.logical_ties(filter), n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parser::parse_score;
    use crate::util::assert_eq_selection;
    use pretty_assertions::assert_eq;

    fn select(source: &str) -> Selection {
        Selection::from(parse_score(source).unwrap())
    }

    #[test]
    fn test_components() {
        let selection = select("{ c'8 \\tuplet 3/2 { d'8 e'8 f'8 } r4 }");
        assert_eq!(selection.components(ComponentFilter::new()).len(), 7);
        let containers = selection.components(ComponentFilter::new().prototype(Prototype::Container));
        assert_eq!(containers.len(), 2);
        let reversed = selection.components(
            ComponentFilter::new()
                .prototype(Prototype::Note)
                .reverse(true),
        );
        assert_eq!(reversed.to_string(), "[f'8 e'8 d'8 c'8]");
    }

    #[test]
    fn test_exclude_tag() {
        let root = parse_score("{ c'8 { d'8 e'8 } f'8 }").unwrap();
        let inner = root.child(1).unwrap().with_tag("hidden");
        assert!(inner.has_tag("hidden"));
        let leaves = Selection::from(root).leaves(LeafFilter::new().exclude("hidden"));
        assert_eq!(leaves.to_string(), "[c'8 f'8]");
    }

    #[test]
    fn test_grace_policy() {
        let selection = select("{ c'4 \\grace { d'16 e'16 } f'4 }");
        assert_eq!(selection.leaves(LeafFilter::new()).len(), 4);
        assert_eq!(
            selection.leaves(LeafFilter::new().grace(true)).to_string(),
            "[d'16 e'16]"
        );
        assert_eq!(
            selection.leaves(LeafFilter::new().grace(false)).to_string(),
            "[c'4 f'4]"
        );
    }

    #[test]
    fn test_leaves_pitched_and_trim() {
        let selection = select("{ r8 s8 c'8 r8 d'8 R1 r8 }");
        assert_eq!(
            selection.leaves(LeafFilter::pitched()).to_string(),
            "[c'8 d'8]"
        );
        assert_eq!(
            selection.leaves(LeafFilter::new().trim(Trim::Both)).to_string(),
            "[c'8 r8 d'8]"
        );
        assert_eq!(
            selection.leaves(LeafFilter::new().trim(Trim::Left)).to_string(),
            "[c'8 r8 d'8 R1 r8]"
        );
        assert!(select("{ r4 r4 }").leaves(LeafFilter::new().trim(Trim::Both)).is_empty());
    }

    #[test]
    fn test_heads_and_tails() {
        let selection = select("{ c'8 ~ c'8 ~ c'8 d'8 e'8 ~ e'8 }");
        assert_eq!(
            selection.leaves(LeafFilter::new().head(true)).to_string(),
            "[c'8 ~ d'8 e'8 ~]"
        );
        assert_eq!(
            selection.leaves(LeafFilter::new().tail(true)).to_string(),
            "[c'8 d'8 e'8]"
        );
    }

    #[test]
    fn test_logical_ties() {
        let selection = select("{ c'8 ~ c'8 d'8 r8 e'8 ~ e'8 ~ e'8 }");
        let ties = selection.logical_ties(TieFilter::new());
        assert_eq!(ties.len(), 4);
        assert_eq!(ties.to_string(), "[[c'8 ~ c'8] [d'8] [r8] [e'8 ~ e'8 ~ e'8]]");
        let nontrivial = selection.logical_ties(TieFilter::new().nontrivial(true));
        assert_eq!(nontrivial.len(), 2);
        let pitched = selection.logical_ties(TieFilter::new().pitched(true).reverse(true));
        assert_eq!(pitched.item(0).unwrap().to_string(), "[e'8 ~ e'8 ~ e'8]");
        assert_eq!(selection.logical_tie(-1, TieFilter::new()).unwrap().len(), 3);
    }

    #[test]
    fn test_tuplet_levels() {
        let selection = select(
            "{ \\tuplet 3/2 { c'8 \\tuplet 5/4 { d'16 d'16 d'16 d'16 d'16 } } \\tuplet 3/2 { e'4 e'4 e'4 } }",
        );
        assert_eq!(selection.tuplets(None, None).len(), 3);
        assert_eq!(selection.tuplets(None, Some(1)).len(), 2);
        assert_eq!(selection.tuplets(None, Some(2)).len(), 1);
        // innermost tuplets hold no further tuplets
        assert_eq!(selection.tuplets(None, Some(-1)).len(), 2);
        assert_eq!(selection.tuplets(None, Some(-2)).len(), 1);
        assert!(selection.tuplet(5, None).is_err());
    }

    #[test]
    fn test_top() {
        let root = parse_score("\\new Voice { c'8 { d'8 { e'8 } } f'8 }").unwrap();
        let leaves = Selection::from(root.clone()).leaves(LeafFilter::new());
        let top = leaves.top(None);
        assert_eq!(top.len(), 3);
        assert_eq!(top[1], root.child(1).unwrap());
    }

    #[test]
    fn test_runs() {
        assert_eq_selection(
            "{ c'8 r8 d'8 e'8 r8 f'8 g'8 a'8 }",
            |s| s.runs(None),
            "[[c'8] [d'8 e'8] [f'8 g'8 a'8]]",
        );
        let selection = select("{ c'8 r8 d'8 e'8 }");
        assert_eq!(selection.run(1, None).unwrap().len(), 2);
    }

    #[test]
    fn test_single_accessors() {
        let selection = select("{ c'8 <d' f'>8 r8 e'8 }");
        assert_eq!(selection.leaf(1, LeafFilter::new()).unwrap().to_string(), "<d' f'>8");
        assert_eq!(selection.note(-1, ComponentFilter::new()).unwrap().to_string(), "e'8");
        assert_eq!(selection.chord(0, ComponentFilter::new()).unwrap().to_string(), "<d' f'>8");
        assert_eq!(selection.rest(0, ComponentFilter::new()).unwrap().to_string(), "r8");
        assert_eq!(
            selection.leaf(9, LeafFilter::new()),
            Err(Error::IndexOutOfRange {
                index: 9,
                length: 4
            })
        );
    }
}
