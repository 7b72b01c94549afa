use crate::inequality::{
    Comparison, DurationInequality, LengthInequality, PitchInequality, SetOperator,
};
use crate::selection::{Item, Selection};
use crate::types::duration::Duration;
use crate::types::pitch::Pitch;

impl Selection {
    /// Items for which `predicate` holds.
    pub fn filter(&self, predicate: impl Fn(&Item) -> bool) -> Selection {
        self.iter().filter(|item| predicate(item)).cloned().collect()
    }

    pub fn filter_duration(
        &self,
        comparison: Comparison,
        duration: Duration,
        preprolated: bool,
    ) -> Selection {
        let inequality = DurationInequality::new(comparison, duration).preprolated(preprolated);
        self.filter(|item| inequality.matches(item))
    }

    pub fn filter_preprolated(&self, comparison: Comparison, duration: Duration) -> Selection {
        self.filter_duration(comparison, duration, true)
    }

    pub fn filter_length(&self, comparison: Comparison, length: usize) -> Selection {
        let inequality = LengthInequality::new(comparison, length);
        self.filter(|item| inequality.matches(item))
    }

    pub fn filter_pitches(&self, operator: SetOperator, pitches: Vec<Pitch>) -> Selection {
        let inequality = PitchInequality::new(operator, pitches);
        self.filter(|item| inequality.matches(item))
    }

    /// Items longer than one.
    pub fn nontrivial(&self) -> Selection {
        self.filter_length(Comparison::Gt, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parser::parse_score;
    use crate::selection::{LeafFilter, TieFilter};
    use crate::util::assert_eq_selection;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filter_closure() {
        assert_eq_selection(
            "{ c'8 r8 d'4 r4 }",
            |s| {
                s.leaves(LeafFilter::new())
                    .filter(|item| item.as_component().is_some_and(|c| c.is_silent()))
            },
            "[r8 r4]",
        );
    }

    #[test]
    fn test_filter_duration() {
        assert_eq_selection(
            "{ c'8 ~ c'8 d'4 e'8 ~ e'8 ~ e'8 }",
            |s| {
                s.logical_ties(TieFilter::new())
                    .filter_duration(Comparison::Eq, Duration::new(1, 4), false)
            },
            "[[c'8 ~ c'8] [d'4]]",
        );
        assert_eq_selection(
            "{ \\tuplet 3/2 { c'4 d'4 e'4 } f'4 }",
            |s| {
                s.leaves(LeafFilter::new())
                    .filter_preprolated(Comparison::Eq, Duration::new(1, 4))
            },
            "[c'4 d'4 e'4 f'4]",
        );
        assert_eq_selection(
            "{ \\tuplet 3/2 { c'4 d'4 e'4 } f'4 }",
            |s| {
                s.leaves(LeafFilter::new())
                    .filter_duration(Comparison::Lt, Duration::new(1, 4), false)
            },
            "[c'4 d'4 e'4]",
        );
    }

    #[test]
    fn test_filter_length_and_nontrivial() {
        let root = parse_score("{ c'8 ~ c'8 d'8 e'8 ~ e'8 ~ e'8 }").unwrap();
        let ties = Selection::from(root).logical_ties(TieFilter::new());
        assert_eq!(ties.filter_length(Comparison::Ge, 3).len(), 1);
        assert_eq!(ties.nontrivial().len(), 2);
        assert_eq!(ties.filter(|_| true), ties);
    }

    #[test]
    fn test_filter_pitches() {
        assert_eq_selection(
            "{ c'8 d'8 <c' e'>8 f'8 }",
            |s| {
                s.leaves(LeafFilter::new())
                    .filter_pitches(SetOperator::Intersects, vec!["c'".parse().unwrap()])
            },
            "[c'8 <c' e'>8]",
        );
    }
}
