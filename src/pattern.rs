use std::fmt;

/// Index-selection predicate over a sequence of known length.
///
/// Negative indices count from the end. With a period, an index matches
/// when it is congruent to one of `indices` modulo the period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pattern {
    indices: Vec<isize>,
    period: Option<usize>,
    inverted: bool,
}

impl Pattern {
    pub fn new(indices: Vec<isize>) -> Self {
        Pattern {
            indices,
            period: None,
            inverted: false,
        }
    }

    /// The first `n` positions.
    pub fn first(n: usize) -> Self {
        Pattern::new((0..n as isize).collect())
    }

    /// The last `n` positions.
    pub fn last(n: usize) -> Self {
        Pattern::new((1..=n as isize).rev().map(|i| -i).collect())
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = Some(period);
        self
    }

    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// The complement pattern.
    pub fn invert(mut self) -> Self {
        self.inverted = !self.inverted;
        self
    }

    pub fn indices(&self) -> &[isize] {
        &self.indices
    }

    pub fn period(&self) -> Option<usize> {
        self.period
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn matches_index(&self, index: usize, length: usize) -> bool {
        let index = index as isize;
        let length = length as isize;
        let hit = match self.period {
            None => self.indices.iter().any(|&i| {
                let i = if i < 0 { length + i } else { i };
                i == index
            }),
            Some(0) => false,
            Some(period) => {
                let period = period as isize;
                self.indices.iter().any(|&i| {
                    let candidate = if i < 0 { index - length } else { index };
                    i.rem_euclid(period) == candidate.rem_euclid(period)
                })
            }
        };
        hit != self.inverted
    }

    /// The pattern seen from `n` positions further along the sequence:
    /// position `i` of the advanced pattern matches when position `i + n`
    /// of `self` does. Negative indices stay relative to the end.
    pub fn advance(&self, n: usize) -> Pattern {
        let n = n as isize;
        let indices = match self.period {
            Some(period) if period > 0 => self
                .indices
                .iter()
                .map(|&i| {
                    if i < 0 {
                        i
                    } else {
                        (i - n).rem_euclid(period as isize)
                    }
                })
                .collect(),
            _ => self
                .indices
                .iter()
                .filter_map(|&i| match i {
                    i if i < 0 => Some(i),
                    i if i >= n => Some(i - n),
                    _ => None,
                })
                .collect(),
        };
        Pattern {
            indices,
            period: self.period,
            inverted: self.inverted,
        }
    }

    /// The items at matching positions.
    pub fn retain<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let length = items.len();
        items
            .iter()
            .enumerate()
            .filter(|(index, _)| self.matches_index(*index, length))
            .map(|(_, item)| item.clone())
            .collect()
    }
}

impl From<Vec<isize>> for Pattern {
    fn from(indices: Vec<isize>) -> Self {
        Pattern::new(indices)
    }
}

impl From<&[isize]> for Pattern {
    fn from(indices: &[isize]) -> Self {
        Pattern::new(indices.to_vec())
    }
}

impl<const N: usize> From<[isize; N]> for Pattern {
    fn from(indices: [isize; N]) -> Self {
        Pattern::new(indices.to_vec())
    }
}

/// Argument form used in pipeline text: `[0, 2], period=3`.
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indices: Vec<String> = self.indices.iter().map(|i| i.to_string()).collect();
        write!(f, "[{}]", indices.join(", "))?;
        if let Some(period) = self.period {
            write!(f, ", period={}", period)?;
        }
        if self.inverted {
            write!(f, ", inverted=true")?;
        }
        Ok(())
    }
}

/// Position reached by successive pattern queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor(usize);

impl Cursor {
    pub fn new(position: usize) -> Self {
        Cursor(position)
    }

    pub fn position(&self) -> usize {
        self.0
    }

    pub fn advanced(&self, n: usize) -> Cursor {
        Cursor(self.0 + n)
    }
}
