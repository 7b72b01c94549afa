pub mod filter;
pub mod group;
pub mod iterate;
pub mod mutate;
pub mod partition;
pub mod predicates;

pub use iterate::{ComponentFilter, LeafFilter, Prototype, TieFilter, Trim};
pub use partition::{CountsOptions, DurationsOptions, Fill};

use crate::error::{Error, Result};
use crate::pattern::{Cursor, Pattern};
use crate::score::component::Component;
use crate::score::timing::Timespan;
use crate::types::duration::{Duration, zero};
use crate::types::pitch::Pitch;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Bound, Index, RangeBounds};

/// One entry of a selection: a score component or a nested selection.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Component(Component),
    Selection(Selection),
}

impl Item {
    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Item::Component(component) => Some(component),
            Item::Selection(_) => None,
        }
    }

    pub fn as_selection(&self) -> Option<&Selection> {
        match self {
            Item::Component(_) => None,
            Item::Selection(selection) => Some(selection),
        }
    }

    /// The components named by this item, nested selections flattened.
    pub fn components(&self) -> Vec<Component> {
        match self {
            Item::Component(component) => vec![component.clone()],
            Item::Selection(selection) => selection
                .items
                .iter()
                .flat_map(|item| item.components())
                .collect(),
        }
    }

    /// Every leaf at or below this item, in score order.
    pub fn leaves(&self) -> Vec<Component> {
        self.components()
            .iter()
            .flat_map(|c| c.descendants())
            .filter(|c| c.is_leaf())
            .collect()
    }

    pub fn duration(&self) -> Duration {
        match self {
            Item::Component(component) => component.duration(),
            Item::Selection(selection) => selection.duration(),
        }
    }

    pub fn preprolated_duration(&self) -> Duration {
        match self {
            Item::Component(component) => component.preprolated_duration(),
            Item::Selection(selection) => selection
                .items
                .iter()
                .fold(zero(), |sum, item| sum + item.preprolated_duration()),
        }
    }

    pub fn duration_in_seconds(&self) -> Result<Duration> {
        match self {
            Item::Component(component) => component.duration_in_seconds(),
            Item::Selection(selection) => {
                let mut total = zero();
                for item in &selection.items {
                    total += item.duration_in_seconds()?;
                }
                Ok(total)
            }
        }
    }

    /// A leaf counts as one; containers and selections count their items.
    pub fn length(&self) -> usize {
        match self {
            Item::Component(component) if component.is_leaf() => 1,
            Item::Component(component) => component.len(),
            Item::Selection(selection) => selection.len(),
        }
    }

    /// Sorted, de-duplicated pitches of every leaf below the item.
    pub fn pitches(&self) -> Vec<Pitch> {
        let mut pitches: Vec<Pitch> = self.leaves().iter().flat_map(|l| l.pitches()).collect();
        pitches.sort();
        pitches.dedup();
        pitches
    }

    pub fn timespan(&self) -> Timespan {
        match self {
            Item::Component(component) => component.timespan(),
            Item::Selection(selection) => selection.timespan(),
        }
    }
}

impl From<Component> for Item {
    fn from(component: Component) -> Self {
        Item::Component(component)
    }
}

impl From<Selection> for Item {
    fn from(selection: Selection) -> Self {
        Item::Selection(selection)
    }
}

impl PartialEq<Component> for Item {
    fn eq(&self, other: &Component) -> bool {
        self.as_component() == Some(other)
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Component(component) => write!(f, "{:?}", component),
            Item::Selection(selection) => write!(f, "{:?}", selection),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Component(component) => write!(f, "{}", component),
            Item::Selection(selection) => write!(f, "{}", selection),
        }
    }
}

/// Ordered, immutable collection of components and nested selections.
///
/// Every query returns a new selection; the score tree is only touched by
/// the helpers in [`mutate`]. `previous` is a pattern cursor consumed by
/// [`Selection::get`] and [`Selection::exclude`].
///
/// Parent links in the tree are weak, so a selection holds the roots of
/// its components; leaves selected out of a temporary score keep their
/// parentage for as long as the selection lives.
#[derive(Clone, Default)]
pub struct Selection {
    items: Vec<Item>,
    previous: Option<usize>,
    roots: Vec<Component>,
}

fn collect_roots(items: &[Item]) -> Vec<Component> {
    let mut roots: Vec<Component> = Vec::new();
    let mut push = |root: Component| {
        if !roots.contains(&root) {
            roots.push(root);
        }
    };
    for item in items {
        match item {
            Item::Component(component) => push(component.root()),
            Item::Selection(selection) => selection.roots.iter().cloned().for_each(&mut push),
        }
    }
    roots
}

impl Selection {
    pub fn new(items: Vec<Item>) -> Self {
        let roots = collect_roots(&items);
        Selection {
            items,
            previous: None,
            roots,
        }
    }

    pub fn empty() -> Self {
        Selection::default()
    }

    pub fn with_previous(mut self, previous: Option<usize>) -> Self {
        self.previous = previous;
        self
    }

    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.items.contains(item)
    }

    pub fn contains_component(&self, component: &Component) -> bool {
        self.items.iter().any(|item| item == component)
    }

    fn resolve_index(index: isize, length: usize) -> Result<usize> {
        let resolved = if index < 0 {
            length as isize + index
        } else {
            index
        };
        if resolved < 0 || resolved as usize >= length {
            return Err(Error::IndexOutOfRange { index, length });
        }
        Ok(resolved as usize)
    }

    /// Item at `index`; negative indices count from the end.
    pub fn item(&self, index: isize) -> Result<Item> {
        let resolved = Self::resolve_index(index, self.items.len())?;
        Ok(self.items[resolved].clone())
    }

    pub fn first(&self) -> Option<&Item> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Item> {
        self.items.last()
    }

    /// Sub-selection over `range`, clamped to the length. Keeps `previous`.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Selection {
        let length = self.items.len();
        let start = match range.start_bound() {
            Bound::Included(n) => *n,
            Bound::Excluded(n) => n + 1,
            Bound::Unbounded => 0,
        }
        .min(length);
        let stop = match range.end_bound() {
            Bound::Included(n) => n + 1,
            Bound::Excluded(n) => *n,
            Bound::Unbounded => length,
        }
        .min(length)
        .max(start);
        let items = self.items[start..stop].to_vec();
        Selection {
            roots: collect_roots(&items),
            items,
            previous: self.previous,
        }
    }

    /// Slice with optional bounds; negative bounds count from the end.
    pub fn slice_signed(&self, start: Option<isize>, stop: Option<isize>) -> Selection {
        let length = self.items.len() as isize;
        let clamp = |n: isize| {
            let n = if n < 0 { length + n } else { n };
            n.clamp(0, length) as usize
        };
        let start = start.map_or(0, clamp);
        let stop = stop.map_or(length as usize, clamp);
        self.slice(start..stop)
    }

    pub fn concat(&self, other: impl IntoIterator<Item = Item>) -> Selection {
        let mut items = self.items.clone();
        items.extend(other);
        Selection::new(items)
    }

    /// Components of the top-level items; nested selections are flattened.
    pub fn components_flat(&self) -> Vec<Component> {
        self.items.iter().flat_map(|item| item.components()).collect()
    }

    pub fn duration(&self) -> Duration {
        self.items
            .iter()
            .fold(zero(), |sum, item| sum + item.duration())
    }

    /// Smallest timespan covering every item; empty selections span
    /// nothing at offset zero.
    pub fn timespan(&self) -> Timespan {
        self.items
            .iter()
            .map(|item| item.timespan())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Timespan::new(zero(), zero()))
    }

    fn build_pattern(indices: Pattern, period: Option<usize>) -> Result<Pattern> {
        if indices.period() == Some(0) {
            return Err(Error::Value("period must be positive".to_string()));
        }
        match period {
            None => Ok(indices),
            Some(_) if indices.period().is_some() => Err(Error::Value(
                "period must be given once, on the pattern or the call".to_string(),
            )),
            Some(0) => Err(Error::Value("period must be positive".to_string())),
            Some(period) => Ok(indices.with_period(period)),
        }
    }

    fn retain(&self, pattern: Pattern, cursor: usize) -> Selection {
        let pattern = if cursor > 0 {
            pattern.advance(cursor)
        } else {
            pattern
        };
        Selection::new(pattern.retain(&self.items))
    }

    /// Keeps items whose positions match the pattern built from
    /// `indices` and `period`. A `previous` cursor on `self` advances the
    /// pattern first; the result carries no cursor.
    pub fn get(&self, indices: impl Into<Pattern>, period: Option<usize>) -> Result<Selection> {
        let pattern = Self::build_pattern(indices.into(), period)?;
        Ok(self.retain(pattern, self.previous.unwrap_or(0)))
    }

    /// Complement of [`Selection::get`].
    pub fn exclude(&self, indices: impl Into<Pattern>, period: Option<usize>) -> Result<Selection> {
        let pattern = Self::build_pattern(indices.into(), period)?;
        Ok(self.retain(pattern.invert(), self.previous.unwrap_or(0)))
    }

    /// Like [`Selection::get`] but with an explicit cursor. The returned
    /// cursor continues the pattern on the next selection.
    pub fn get_with_cursor(
        &self,
        indices: impl Into<Pattern>,
        period: Option<usize>,
        cursor: Cursor,
    ) -> Result<(Selection, Cursor)> {
        let pattern = Self::build_pattern(indices.into(), period)?;
        let result = self.retain(pattern, cursor.position());
        Ok((result, cursor.advanced(self.len())))
    }

    pub fn exclude_with_cursor(
        &self,
        indices: impl Into<Pattern>,
        period: Option<usize>,
        cursor: Cursor,
    ) -> Result<(Selection, Cursor)> {
        let pattern = Self::build_pattern(indices.into(), period)?;
        let result = self.retain(pattern.invert(), cursor.position());
        Ok((result, cursor.advanced(self.len())))
    }

    /// The leaves of the selection followed by the next leaf in the same
    /// logical voice, when there is one.
    pub fn with_next_leaf(&self) -> Selection {
        let mut leaves = self.leaves(LeafFilter::default()).into_items();
        let next = leaves
            .last()
            .and_then(|item| item.as_component())
            .and_then(|leaf| leaf.next_leaf());
        if let Some(next) = next {
            leaves.push(Item::Component(next));
        }
        Selection::new(leaves)
    }

    pub fn with_previous_leaf(&self) -> Selection {
        let mut leaves = self.leaves(LeafFilter::default()).into_items();
        let previous = leaves
            .first()
            .and_then(|item| item.as_component())
            .and_then(|leaf| leaf.previous_leaf());
        if let Some(previous) = previous {
            leaves.insert(0, Item::Component(previous));
        }
        Selection::new(leaves)
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for Selection {}

impl PartialEq<[Item]> for Selection {
    fn eq(&self, other: &[Item]) -> bool {
        self.items.as_slice() == other
    }
}

impl PartialEq<Vec<Item>> for Selection {
    fn eq(&self, other: &Vec<Item>) -> bool {
        self.items == *other
    }
}

impl PartialEq<Vec<Component>> for Selection {
    fn eq(&self, other: &Vec<Component>) -> bool {
        self.items.len() == other.len() && self.items.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl Hash for Selection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.items.hash(state);
    }
}

impl Index<usize> for Selection {
    type Output = Item;

    fn index(&self, index: usize) -> &Item {
        &self.items[index]
    }
}

impl Add for Selection {
    type Output = Selection;

    fn add(self, other: Selection) -> Selection {
        self.concat(other.items)
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Selection {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl From<Component> for Selection {
    fn from(component: Component) -> Self {
        Selection::new(vec![Item::Component(component)])
    }
}

impl From<Vec<Component>> for Selection {
    fn from(components: Vec<Component>) -> Self {
        components.into_iter().collect()
    }
}

impl From<Vec<Item>> for Selection {
    fn from(items: Vec<Item>) -> Self {
        Selection::new(items)
    }
}

impl From<Vec<Selection>> for Selection {
    fn from(selections: Vec<Selection>) -> Self {
        selections.into_iter().map(Item::Selection).collect()
    }
}

impl FromIterator<Component> for Selection {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        Selection::new(iter.into_iter().map(Item::Component).collect())
    }
}

impl FromIterator<Item> for Selection {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Selection::new(iter.into_iter().collect())
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selection(")?;
        f.debug_list().entries(&self.items).finish()?;
        write!(f, ")")
    }
}

/// Items rendered as LilyPond, nested selections in brackets.
impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.items.iter().map(|item| item.to_string()).collect();
        write!(f, "[{}]", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parser::parse_score;
    use pretty_assertions::assert_eq;

    fn eight_leaves() -> Selection {
        let root = parse_score("{ c'8 d'8 e'8 f'8 g'8 a'8 b'8 c''8 }").unwrap();
        Selection::from(root).leaves(LeafFilter::default())
    }

    #[test]
    fn test_protocol() {
        let leaves = eight_leaves();
        assert_eq!(leaves.len(), 8);
        assert!(!leaves.is_empty());
        assert_eq!(leaves.item(-1).unwrap().to_string(), "c''8");
        assert_eq!(
            leaves.item(8),
            Err(Error::IndexOutOfRange {
                index: 8,
                length: 8
            })
        );
        assert!(leaves.contains(&leaves[3]));
        assert_eq!(leaves.slice(2..4).to_string(), "[e'8 f'8]");
        assert_eq!(leaves.slice_signed(Some(-2), None).to_string(), "[b'8 c''8]");
        assert_eq!((leaves.slice(..2) + leaves.slice(6..)).len(), 4);
        assert_eq!(leaves.duration(), Duration::new(1, 1));
    }

    #[test]
    fn test_equality_with_sequences() {
        let leaves = eight_leaves();
        let items: Vec<Item> = leaves.iter().cloned().collect();
        assert_eq!(leaves, items);
        let copy = Selection::new(items).with_previous(Some(3));
        assert_eq!(leaves, copy);
        assert!(leaves != leaves.slice(1..));
    }

    #[test]
    fn test_slice_keeps_previous() {
        let leaves = eight_leaves().with_previous(Some(2));
        assert_eq!(leaves.slice(1..3).previous(), Some(2));
    }

    #[test]
    fn test_get_and_exclude_are_complements() {
        let leaves = eight_leaves();
        let kept = leaves.get([0], Some(2)).unwrap();
        let dropped = leaves.exclude([0], Some(2)).unwrap();
        assert_eq!(kept.to_string(), "[c'8 e'8 g'8 b'8]");
        assert_eq!(dropped.to_string(), "[d'8 f'8 a'8 c''8]");

        let kept = leaves.get([1, 4, -1], None).unwrap();
        let dropped = leaves.exclude([1, 4, -1], None).unwrap();
        assert_eq!(kept.len() + dropped.len(), 8);
        assert!(kept.iter().all(|item| !dropped.contains(item)));
        let mut merged: Vec<Item> = leaves
            .iter()
            .filter(|item| kept.contains(item) || dropped.contains(item))
            .cloned()
            .collect();
        merged.dedup();
        assert_eq!(leaves, merged);
    }

    #[test]
    fn test_get_rejects_double_period() {
        let leaves = eight_leaves();
        let pattern = Pattern::new(vec![0]).with_period(2);
        assert!(matches!(leaves.get(pattern, Some(3)), Err(Error::Value(_))));
        assert!(matches!(leaves.get([0], Some(0)), Err(Error::Value(_))));
    }

    #[test]
    fn test_get_rejects_zero_period() {
        let leaves = eight_leaves();
        let pattern = Pattern::new(vec![0]).with_period(0);
        assert!(matches!(
            leaves.get(pattern.clone(), None),
            Err(Error::Value(_))
        ));
        assert!(matches!(leaves.exclude(pattern, None), Err(Error::Value(_))));
    }

    #[test]
    fn test_queries_leave_source_unchanged() {
        let leaves = eight_leaves();
        let before: Vec<Item> = leaves.items().to_vec();
        let text = leaves.to_string();
        leaves.get([0], Some(2)).unwrap();
        leaves.exclude([1], None).unwrap();
        leaves.runs(None);
        leaves.group_by_contiguity();
        leaves
            .partition_by_counts(&[3], CountsOptions::cyclic())
            .unwrap();
        leaves.with_next_leaf();
        leaves.slice(2..);
        assert_eq!(leaves, before);
        assert_eq!(leaves.to_string(), text);
        assert_eq!(leaves.previous(), None);
    }

    #[test]
    fn test_selection_keeps_temporary_root() {
        let leaves = Selection::from(parse_score("{ c'8 r8 d'8 e'8 r8 f'8 }").unwrap())
            .leaves(LeafFilter::default());
        assert!(leaves.components_flat().iter().all(|leaf| !leaf.is_orphan()));
        assert_eq!(leaves.runs(None).to_string(), "[[c'8] [d'8 e'8] [f'8]]");
        let tail = leaves.slice(4..);
        drop(leaves);
        assert_eq!(tail.with_previous_leaf().to_string(), "[e'8 r8 f'8]");
    }

    #[test]
    fn test_get_consumes_previous() {
        let leaves = eight_leaves();
        let tail = leaves.slice(3..).with_previous(Some(3));
        let result = tail.get([0], Some(2)).unwrap();
        // continues the every-other pattern from position 3
        assert_eq!(result.to_string(), "[g'8 b'8]");
        assert_eq!(result.previous(), None);
    }

    #[test]
    fn test_get_with_cursor() {
        let leaves = eight_leaves();
        let (first, cursor) = leaves
            .slice(..3)
            .get_with_cursor([0], Some(2), Cursor::default())
            .unwrap();
        let (second, cursor) = leaves
            .slice(3..)
            .get_with_cursor([0], Some(2), cursor)
            .unwrap();
        assert_eq!(first.to_string(), "[c'8 e'8]");
        assert_eq!(second.to_string(), "[g'8 b'8]");
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_neighbor_leaves() {
        let root = parse_score("{ c'8 d'8 e'8 f'8 }").unwrap();
        let leaves = Selection::from(root).leaves(LeafFilter::default());
        let middle = leaves.slice(1..3);
        assert_eq!(middle.with_next_leaf().to_string(), "[d'8 e'8 f'8]");
        assert_eq!(middle.with_previous_leaf().to_string(), "[c'8 d'8 e'8]");
        assert_eq!(leaves.with_next_leaf().len(), 4);
        assert_eq!(Selection::empty().with_next_leaf().len(), 0);
    }

    #[test]
    fn test_timespan() {
        let leaves = eight_leaves();
        let span = leaves.slice(2..5).timespan();
        assert_eq!(span, Timespan::new(Duration::new(1, 4), Duration::new(5, 8)));
    }
}
