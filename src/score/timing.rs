use crate::error::{Error, Result};
use crate::score::component::{Component, Content, ContainerKind};
use crate::types::duration::{Duration, Multiplier, Offset, zero};
use crate::types::indicator::{Indicator, MetronomeMark, TimeSignature};
use std::fmt;

/// Start and stop offsets of a component or selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timespan {
    pub start: Offset,
    pub stop: Offset,
}

impl Timespan {
    pub fn new(start: Offset, stop: Offset) -> Self {
        Timespan { start, stop }
    }

    pub fn duration(&self) -> Duration {
        self.stop - self.start
    }

    pub fn contains(&self, offset: Offset) -> bool {
        offset >= self.start && offset < self.stop
    }

    pub fn overlaps(&self, other: &Timespan) -> bool {
        self.start < other.stop && other.start < self.stop
    }

    /// Smallest timespan covering both.
    pub fn union(&self, other: &Timespan) -> Timespan {
        Timespan::new(self.start.min(other.start), self.stop.max(other.stop))
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.stop)
    }
}

impl Component {
    /// Product of the multipliers of all enclosing tuplets.
    pub fn prolation(&self) -> Multiplier {
        let mut prolation = Multiplier::from_integer(1);
        let mut current = self.parent();
        while let Some(parent) = current {
            if let Some(ContainerKind::Tuplet(multiplier)) = parent.container_kind() {
                prolation *= multiplier;
            }
            current = parent.parent();
        }
        prolation
    }

    /// Duration of the contents, ignoring grace music.
    pub fn contents_duration(&self) -> Duration {
        let node = self.node();
        match &node.content {
            Content::Leaf {
                written,
                multiplier,
                ..
            } => multiplier.map_or(*written, |m| *written * m),
            Content::Container {
                simultaneous,
                children,
                ..
            } => {
                let timed = children.iter().filter(|c| !c.is_grace_container());
                if *simultaneous {
                    timed
                        .map(|c| c.preprolated_duration())
                        .max()
                        .unwrap_or_else(zero)
                } else {
                    timed.fold(zero(), |sum, c| sum + c.preprolated_duration())
                }
            }
        }
    }

    /// Duration before the prolation of enclosing tuplets is applied.
    pub fn preprolated_duration(&self) -> Duration {
        match self.container_kind() {
            Some(ContainerKind::Tuplet(multiplier)) => self.contents_duration() * multiplier,
            _ => self.contents_duration(),
        }
    }

    /// Sounding duration, after enclosing tuplets are applied.
    pub fn duration(&self) -> Duration {
        self.preprolated_duration() * self.prolation()
    }

    /// True for grace containers and everything inside them.
    pub fn is_grace_music(&self) -> bool {
        self.parentage().iter().any(|c| c.is_grace_container())
    }

    pub fn start_offset(&self) -> Offset {
        // grace music sits at the offset of its outermost grace container
        let anchor = self
            .parentage()
            .into_iter()
            .filter(|c| c.is_grace_container())
            .last()
            .unwrap_or_else(|| self.clone());

        let mut offset = zero();
        let mut node = anchor;
        while let Some(parent) = node.parent() {
            if !parent.is_simultaneous() {
                for sibling in parent.children() {
                    if sibling.ptr_eq(&node) {
                        break;
                    }
                    if !sibling.is_grace_container() {
                        offset += sibling.duration();
                    }
                }
            }
            node = parent;
        }
        offset
    }

    pub fn stop_offset(&self) -> Offset {
        if self.is_grace_music() {
            self.start_offset()
        } else {
            self.start_offset() + self.duration()
        }
    }

    pub fn timespan(&self) -> Timespan {
        Timespan::new(self.start_offset(), self.stop_offset())
    }

    /// The last metronome mark attached at or before this component's
    /// start, searching every leaf of the root.
    pub fn effective_metronome_mark(&self) -> Option<MetronomeMark> {
        let start = self.start_offset();
        let mut marks: Vec<(Offset, MetronomeMark)> = self
            .root()
            .descendants()
            .into_iter()
            .filter(|c| c.is_leaf())
            .flat_map(|leaf| {
                let offset = leaf.start_offset();
                leaf.indicators()
                    .into_iter()
                    .filter_map(move |indicator| match indicator {
                        Indicator::MetronomeMark(mark) => Some((offset, mark)),
                        _ => None,
                    })
            })
            .filter(|(offset, _)| *offset <= start)
            .collect();
        marks.sort_by(|a, b| a.0.cmp(&b.0));
        marks.last().map(|(_, mark)| *mark)
    }

    /// Real-time duration in seconds, summed leaf by leaf so that tempo
    /// changes inside a container are honoured.
    pub fn duration_in_seconds(&self) -> Result<Duration> {
        if self.is_leaf() {
            if self.is_grace_music() {
                return Ok(zero());
            }
            let mark = self
                .effective_metronome_mark()
                .ok_or_else(|| Error::MissingMetronomeMark(format!("{:?}", self)))?;
            return Ok(mark.seconds(&self.duration()));
        }
        if self.is_simultaneous() {
            let mut longest = zero();
            for child in self.children() {
                longest = longest.max(child.duration_in_seconds()?);
            }
            return Ok(longest);
        }
        let mut total = zero();
        for child in self.children() {
            total += child.duration_in_seconds()?;
        }
        Ok(total)
    }

    /// One-based measure number, computed from the time signatures
    /// attached anywhere under the root.
    pub fn measure_number(&self) -> usize {
        MeasureMap::new(&self.root()).measure_number(self.start_offset())
    }
}

/// Measure start offsets of a score, derived from time signatures.
/// Scores without any time signature are read as 4/4. Signatures with a
/// zero numerator or denominator are ignored.
#[derive(Debug, Clone)]
pub struct MeasureMap {
    starts: Vec<Offset>,
}

impl MeasureMap {
    pub fn new(root: &Component) -> Self {
        let mut changes: Vec<(Offset, TimeSignature)> = root
            .descendants()
            .into_iter()
            .filter(|c| c.is_leaf())
            .flat_map(|leaf| {
                let offset = leaf.start_offset();
                leaf.indicators()
                    .into_iter()
                    .filter_map(move |indicator| match indicator {
                        Indicator::TimeSignature(signature)
                            if signature.numerator > 0 && signature.denominator > 0 =>
                        {
                            Some((offset, signature))
                        }
                        _ => None,
                    })
            })
            .collect();
        changes.sort_by(|a, b| a.0.cmp(&b.0));

        let total = root.duration();
        let mut starts = vec![zero()];
        let mut signature = TimeSignature::default();
        let mut pending = changes.into_iter().peekable();
        let mut start = zero();
        loop {
            while let Some((offset, next)) = pending.peek() {
                if *offset > start {
                    break;
                }
                signature = *next;
                pending.next();
            }
            start += signature.duration();
            if start >= total {
                break;
            }
            starts.push(start);
        }
        MeasureMap { starts }
    }

    pub fn measure_number(&self, offset: Offset) -> usize {
        self.starts.iter().filter(|start| **start <= offset).count().max(1)
    }

    pub fn measure_count(&self) -> usize {
        self.starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parser::parse_score;
    use pretty_assertions::assert_eq;

    fn d(n: i64, m: i64) -> Duration {
        Duration::new(n, m)
    }

    #[test]
    fn test_offsets() {
        let root = parse_score("{ c'4 d'8 e'8 f'2 }").unwrap();
        let leaves = root.children();
        assert_eq!(leaves[0].start_offset(), d(0, 1));
        assert_eq!(leaves[1].start_offset(), d(1, 4));
        assert_eq!(leaves[2].stop_offset(), d(1, 2));
        assert_eq!(leaves[3].timespan(), Timespan::new(d(1, 2), d(1, 1)));
        assert_eq!(root.duration(), d(1, 1));
    }

    #[test]
    fn test_tuplet_prolation() {
        let root = parse_score("{ \\tuplet 3/2 { c'8 d'8 e'8 } f'4 }").unwrap();
        let tuplet = root.child(0).unwrap();
        let leaf = tuplet.child(1).unwrap();
        assert_eq!(leaf.prolation(), d(2, 3));
        assert_eq!(leaf.duration(), d(1, 12));
        assert_eq!(leaf.preprolated_duration(), d(1, 8));
        assert_eq!(leaf.start_offset(), d(1, 12));
        assert_eq!(tuplet.duration(), d(1, 4));
        assert_eq!(tuplet.contents_duration(), d(3, 8));
        assert_eq!(root.child(1).unwrap().start_offset(), d(1, 4));
    }

    #[test]
    fn test_simultaneous() {
        let root = parse_score("<< { c'4 d'4 } { e'2. } >>").unwrap();
        assert_eq!(root.duration(), d(3, 4));
        let second = root.child(1).unwrap().child(0).unwrap();
        assert_eq!(second.start_offset(), d(0, 1));
    }

    #[test]
    fn test_grace_music_takes_no_time() {
        let root = parse_score("{ c'4 \\grace { d'16 e'16 } f'4 }").unwrap();
        let grace = root.child(1).unwrap();
        let grace_note = grace.child(1).unwrap();
        assert!(grace_note.is_grace_music());
        assert_eq!(grace_note.timespan(), Timespan::new(d(1, 4), d(1, 4)));
        assert_eq!(root.child(2).unwrap().start_offset(), d(1, 4));
        assert_eq!(root.duration(), d(1, 2));
    }

    #[test]
    fn test_seconds() {
        let root = parse_score("{ \\tempo 4=60 c'4 d'4 \\tempo 4=120 e'4 f'4 }").unwrap();
        let leaves = root.children();
        assert_eq!(leaves[1].duration_in_seconds().unwrap(), d(1, 1));
        assert_eq!(leaves[2].duration_in_seconds().unwrap(), d(1, 2));
        assert_eq!(root.duration_in_seconds().unwrap(), d(3, 1));

        let untimed = parse_score("{ c'4 }").unwrap();
        assert!(matches!(
            untimed.duration_in_seconds(),
            Err(Error::MissingMetronomeMark(_))
        ));
    }

    #[test]
    fn test_measure_numbers() {
        let root = parse_score("{ \\time 2/4 c'4 d'4 e'4 f'4 \\time 3/8 g'4. a'8 }").unwrap();
        let leaves = root.children();
        let numbers: Vec<usize> = leaves.iter().map(|l| l.measure_number()).collect();
        assert_eq!(numbers, vec![1, 1, 2, 2, 3, 4]);
        assert_eq!(MeasureMap::new(&root).measure_count(), 4);
    }

    #[test]
    fn test_zero_length_time_signature_is_ignored() {
        let root = parse_score("{ c'4 d'4 e'4 f'4 g'4 }").unwrap();
        let leaves = root.children();
        leaves[0].attach(Indicator::TimeSignature(TimeSignature::new(0, 4)));
        leaves[2].attach(Indicator::TimeSignature(TimeSignature::new(3, 0)));
        assert_eq!(MeasureMap::new(&root).measure_count(), 2);
        assert_eq!(leaves[4].measure_number(), 2);
    }
}
