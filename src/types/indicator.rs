use crate::types::duration::{Duration, lilypond_duration};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::new(self.numerator as i64, self.denominator as i64)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Tempo as `unit = bpm`, e.g. a quarter note at 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetronomeMark {
    pub unit: Duration,
    pub bpm: i64,
}

impl MetronomeMark {
    pub fn new(unit: Duration, bpm: i64) -> Self {
        Self { unit, bpm }
    }

    /// Real time taken by `duration`, in seconds.
    pub fn seconds(&self, duration: &Duration) -> Duration {
        *duration / self.unit * Duration::new(60, self.bpm)
    }
}

impl fmt::Display for MetronomeMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match lilypond_duration(&self.unit) {
            Some(unit) => write!(f, "{}={}", unit, self.bpm),
            None => write!(f, "{}={}", self.unit, self.bpm),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Ties the leaf to the next leaf in its logical voice.
    Tie,
    TimeSignature(TimeSignature),
    MetronomeMark(MetronomeMark),
    Color(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Tie,
    TimeSignature,
    MetronomeMark,
    Color,
}

impl Indicator {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            Indicator::Tie => IndicatorKind::Tie,
            Indicator::TimeSignature(_) => IndicatorKind::TimeSignature,
            Indicator::MetronomeMark(_) => IndicatorKind::MetronomeMark,
            Indicator::Color(_) => IndicatorKind::Color,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Tie => write!(f, "~"),
            Indicator::TimeSignature(signature) => write!(f, "\\time {}", signature),
            Indicator::MetronomeMark(mark) => write!(f, "\\tempo {}", mark),
            Indicator::Color(color) => write!(f, "\\once \\override NoteHead.color = #{}", color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display() {
        assert_eq!(Indicator::Tie.to_string(), "~");
        assert_eq!(
            Indicator::TimeSignature(TimeSignature::new(3, 4)).to_string(),
            "\\time 3/4"
        );
        assert_eq!(
            Indicator::MetronomeMark(MetronomeMark::new(Duration::new(1, 4), 60)).to_string(),
            "\\tempo 4=60"
        );
    }

    #[test]
    fn test_seconds() {
        let mark = MetronomeMark::new(Duration::new(1, 4), 120);
        assert_eq!(mark.seconds(&Duration::new(1, 4)), Duration::new(1, 2));
        assert_eq!(mark.seconds(&Duration::from_integer(1)), Duration::from_integer(2));
    }
}
