use crate::score::timing::MeasureMap;
use crate::selection::{Item, Selection};
use crate::sequence::group_consecutive;

impl Selection {
    /// Runs of consecutive items with equal keys. Items that share a key
    /// but are not adjacent land in different groups.
    pub fn group_by<K: PartialEq>(&self, key: impl Fn(&Item) -> K) -> Selection {
        group_consecutive(self.items(), key)
            .into_iter()
            .map(|group| Item::Selection(Selection::new(group)))
            .collect()
    }

    /// The whole selection as its single group.
    pub fn group(&self) -> Selection {
        if self.is_empty() {
            return Selection::empty();
        }
        self.group_by(|_| ())
    }

    /// Runs where each item stops exactly where the next one starts.
    pub fn group_by_contiguity(&self) -> Selection {
        let mut groups: Vec<Vec<Item>> = Vec::new();
        for item in self.iter() {
            let start = item.timespan().start;
            match groups.last_mut() {
                Some(group)
                    if group
                        .last()
                        .is_some_and(|last| last.timespan().stop == start) =>
                {
                    group.push(item.clone());
                }
                _ => groups.push(vec![item.clone()]),
            }
        }
        groups
            .into_iter()
            .map(|group| Item::Selection(Selection::new(group)))
            .collect()
    }

    pub fn group_by_duration(&self) -> Selection {
        self.group_by(|item| item.duration())
    }

    pub fn group_by_length(&self) -> Selection {
        self.group_by(|item| item.length())
    }

    /// Groups by the measure each item starts in. Measures come from the
    /// time signatures of the first component's score.
    pub fn group_by_measure(&self) -> Selection {
        let Some(first) = self.components_flat().into_iter().next() else {
            return Selection::empty();
        };
        let measures = MeasureMap::new(&first.root());
        self.group_by(|item| measures.measure_number(item.timespan().start))
    }

    pub fn group_by_pitch(&self) -> Selection {
        self.group_by(|item| item.pitches())
    }

    /// Splices nested selections into their parent, `depth` levels deep.
    /// A negative depth flattens completely.
    pub fn flatten(&self, depth: isize) -> Selection {
        fn flatten_into(items: &[Item], depth: isize, result: &mut Vec<Item>) {
            for item in items {
                match item {
                    Item::Selection(selection) if depth != 0 => {
                        flatten_into(selection.items(), depth - 1, result)
                    }
                    _ => result.push(item.clone()),
                }
            }
        }
        let mut result = Vec::new();
        flatten_into(self.items(), depth, &mut result);
        Selection::new(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parser::parse_score;
    use crate::selection::{LeafFilter, TieFilter};
    use crate::util::assert_eq_selection;
    use pretty_assertions::assert_eq;

    fn leaves(source: &str) -> Selection {
        Selection::from(parse_score(source).unwrap()).leaves(LeafFilter::new())
    }

    #[test]
    fn test_group_then_flatten_is_identity() {
        let selection = leaves("{ c'8 d'8 e'8 r8 }");
        let grouped = selection.group();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.flatten(1), selection);
        assert!(Selection::empty().group().is_empty());
    }

    #[test]
    fn test_group_by_is_consecutive() {
        assert_eq_selection(
            "{ c'8 d'8 r8 e'8 f'8 }",
            |s| {
                s.leaves(LeafFilter::new())
                    .group_by(|item| item.as_component().is_some_and(|c| c.is_pitched()))
            },
            "[[c'8 d'8] [r8] [e'8 f'8]]",
        );
    }

    #[test]
    fn test_group_by_contiguity() {
        let selection = leaves("{ c'8 d'8 r8 e'8 f'8 r4 g'4 }").filter(|item| {
            item.as_component().is_some_and(|c| c.is_pitched())
        });
        let groups = selection.group_by_contiguity();
        assert_eq!(groups.to_string(), "[[c'8 d'8] [e'8 f'8] [g'4]]");
        for group in groups.iter().filter_map(|g| g.as_selection()) {
            for pair in group.items().windows(2) {
                assert_eq!(pair[0].timespan().stop, pair[1].timespan().start);
            }
        }
        let boundaries: Vec<&Selection> = groups.iter().filter_map(|g| g.as_selection()).collect();
        for pair in boundaries.windows(2) {
            let last = pair[0].last().unwrap();
            let first = pair[1].first().unwrap();
            assert!(last.timespan().stop != first.timespan().start);
        }
    }

    #[test]
    fn test_group_by_duration_and_length() {
        assert_eq_selection(
            "{ c'8 d'8 e'4 f'4 g'8 }",
            |s| s.leaves(LeafFilter::new()).group_by_duration(),
            "[[c'8 d'8] [e'4 f'4] [g'8]]",
        );
        assert_eq_selection(
            "{ c'8 ~ c'8 d'8 e'8 ~ e'8 }",
            |s| s.logical_ties(TieFilter::new()).group_by_length(),
            "[[[c'8 ~ c'8]] [[d'8]] [[e'8 ~ e'8]]]",
        );
    }

    #[test]
    fn test_group_by_measure() {
        assert_eq_selection(
            "{ \\time 2/4 c'4 d'4 e'8 f'8 g'4 \\time 1/4 a'4 b'4 }",
            |s| s.leaves(LeafFilter::new()).group_by_measure(),
            "[[\\time 2/4 c'4 d'4] [e'8 f'8 g'4] [\\time 1/4 a'4] [b'4]]",
        );
    }

    #[test]
    fn test_group_by_pitch() {
        assert_eq_selection(
            "{ c'8 c'4 d'8 <c' e'>8 <e' c'>4 }",
            |s| s.leaves(LeafFilter::new()).group_by_pitch(),
            "[[c'8 c'4] [d'8] [<c' e'>8 <e' c'>4]]",
        );
    }

    #[test]
    fn test_flatten_depths() {
        let selection = leaves("{ c'8 d'8 e'8 f'8 }");
        let nested = selection.group().group();
        assert_eq!(nested.flatten(1).len(), 1);
        assert_eq!(nested.flatten(2), selection);
        assert_eq!(nested.flatten(-1), selection);
        assert_eq!(nested.flatten(0), nested);
    }
}
