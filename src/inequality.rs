use crate::selection::Item;
use crate::types::duration::Duration;
use crate::types::pitch::Pitch;
use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl Comparison {
    pub fn compare<T: PartialOrd>(&self, left: &T, right: &T) -> bool {
        match self {
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
            Comparison::Gt => left > right,
            Comparison::Ge => left >= right,
        }
    }
}

impl FromStr for Comparison {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "<" => Comparison::Lt,
            "<=" => Comparison::Le,
            "==" => Comparison::Eq,
            "!=" => Comparison::Ne,
            ">" => Comparison::Gt,
            ">=" => Comparison::Ge,
            _ => bail!("Invalid comparison: {}", s),
        })
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// Compares an item's duration against a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DurationInequality {
    pub comparison: Comparison,
    pub duration: Duration,
    pub preprolated: bool,
}

impl DurationInequality {
    pub fn new(comparison: Comparison, duration: Duration) -> Self {
        DurationInequality {
            comparison,
            duration,
            preprolated: false,
        }
    }

    pub fn preprolated(mut self, preprolated: bool) -> Self {
        self.preprolated = preprolated;
        self
    }

    pub fn matches(&self, item: &Item) -> bool {
        let duration = if self.preprolated {
            item.preprolated_duration()
        } else {
            item.duration()
        };
        self.comparison.compare(&duration, &self.duration)
    }
}

/// Compares an item's length: one for a leaf, the item count otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LengthInequality {
    pub comparison: Comparison,
    pub length: usize,
}

impl LengthInequality {
    pub fn new(comparison: Comparison, length: usize) -> Self {
        LengthInequality { comparison, length }
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.comparison.compare(&item.length(), &self.length)
    }
}

/// Set relation tested by [`PitchInequality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperator {
    /// `&`: the pitch sets share at least one pitch.
    Intersects,
    /// `|`: every pitch of the item is in the set.
    Subset,
    /// `^`: the pitch sets share nothing.
    Disjoint,
}

impl FromStr for SetOperator {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "&" => SetOperator::Intersects,
            "|" => SetOperator::Subset,
            "^" => SetOperator::Disjoint,
            _ => bail!("Invalid set operator: {}", s),
        })
    }
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            SetOperator::Intersects => "&",
            SetOperator::Subset => "|",
            SetOperator::Disjoint => "^",
        };
        write!(f, "{}", symbol)
    }
}

/// Tests an item's pitch set against a fixed set of pitches. Pitches
/// compare by sounding pitch number, so enharmonics match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PitchInequality {
    pub operator: SetOperator,
    pub pitches: Vec<Pitch>,
}

impl PitchInequality {
    pub fn new(operator: SetOperator, pitches: Vec<Pitch>) -> Self {
        PitchInequality { operator, pitches }
    }

    pub fn matches(&self, item: &Item) -> bool {
        let numbers: Vec<i32> = self.pitches.iter().map(|p| p.number()).collect();
        let candidate: Vec<i32> = item.pitches().iter().map(|p| p.number()).collect();
        match self.operator {
            SetOperator::Intersects => candidate.iter().any(|n| numbers.contains(n)),
            SetOperator::Subset => {
                !candidate.is_empty() && candidate.iter().all(|n| numbers.contains(n))
            }
            SetOperator::Disjoint => !candidate.iter().any(|n| numbers.contains(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parser::parse_score;
    use crate::selection::{LeafFilter, Selection};
    use pretty_assertions::assert_eq;

    fn leaves(source: &str) -> Vec<Item> {
        let root = parse_score(source).unwrap();
        Selection::from(root)
            .leaves(LeafFilter::default())
            .into_items()
    }

    #[test]
    fn test_comparison_parsing() {
        assert_eq!("<=".parse::<Comparison>().unwrap(), Comparison::Le);
        assert_eq!(Comparison::Ne.to_string(), "!=");
        assert!("=<".parse::<Comparison>().is_err());
    }

    #[test]
    fn test_duration_inequality() {
        let items = leaves("{ c'4 \\tuplet 3/2 { d'8 e'8 f'8 } }");
        let shorter = DurationInequality::new(Comparison::Lt, Duration::new(1, 8));
        let flags: Vec<bool> = items.iter().map(|i| shorter.matches(i)).collect();
        assert_eq!(flags, vec![false, true, true, true]);

        let written = shorter.preprolated(true);
        assert!(!written.matches(&items[1]));
    }

    #[test]
    fn test_length_inequality() {
        let root = parse_score("{ { c'8 d'8 } { e'8 } }").unwrap();
        let containers: Vec<Item> = root.children().into_iter().map(Item::Component).collect();
        let long = LengthInequality::new(Comparison::Gt, 1);
        assert!(long.matches(&containers[0]));
        assert!(!long.matches(&containers[1]));
    }

    #[test]
    fn test_pitch_inequality() {
        let items = leaves("{ c'4 <d' fis'>4 r4 bes4 }");
        let pitches = vec!["fis'".parse().unwrap(), "ais".parse().unwrap()];
        let intersects = PitchInequality::new(SetOperator::Intersects, pitches.clone());
        let flags: Vec<bool> = items.iter().map(|i| intersects.matches(i)).collect();
        assert_eq!(flags, vec![false, true, false, true]);

        let subset = PitchInequality::new(SetOperator::Subset, pitches.clone());
        assert!(!subset.matches(&items[1]));
        assert!(!subset.matches(&items[2]));
        assert!(subset.matches(&items[3]));

        let disjoint = PitchInequality::new(SetOperator::Disjoint, pitches);
        assert!(disjoint.matches(&items[0]));
        assert!(disjoint.matches(&items[2]));
    }
}
