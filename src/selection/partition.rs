use crate::error::{Error, Result};
use crate::selection::{Item, Selection};
use crate::sequence::{partition_by_counts, partition_integer_by_ratio};
use crate::types::duration::{Duration, zero};
use tracing::{debug, trace};

/// Options for [`Selection::partition_by_counts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CountsOptions {
    pub cyclic: bool,
    pub enchain: bool,
    /// Merge a short trailing part into the kept part before it.
    pub fuse_overhang: bool,
    /// Keep the first part when every part would be dropped.
    pub nonempty: bool,
    pub overhang: bool,
}

impl CountsOptions {
    pub fn cyclic() -> Self {
        CountsOptions {
            cyclic: true,
            ..CountsOptions::default()
        }
    }

    pub fn with_overhang(mut self, overhang: bool) -> Self {
        self.overhang = overhang;
        self
    }

    pub fn with_enchain(mut self, enchain: bool) -> Self {
        self.enchain = enchain;
        self
    }

    pub fn with_fuse_overhang(mut self, fuse_overhang: bool) -> Self {
        self.fuse_overhang = fuse_overhang;
        self
    }

    pub fn with_nonempty(mut self, nonempty: bool) -> Self {
        self.nonempty = nonempty;
        self
    }
}

/// What to do when an item would run past the current target duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Fill {
    /// Overshooting is an error.
    #[default]
    Exact,
    /// Close the part before the item; the item starts the next part.
    Less,
    /// Close the part after the item.
    More,
}

/// Options for [`Selection::partition_by_durations`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DurationsOptions {
    pub cyclic: bool,
    pub fill: Fill,
    /// Targets are seconds and items are measured under their metronome
    /// marks.
    pub in_seconds: bool,
    pub overhang: bool,
}

impl DurationsOptions {
    pub fn with_cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = cyclic;
        self
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_in_seconds(mut self, in_seconds: bool) -> Self {
        self.in_seconds = in_seconds;
        self
    }

    pub fn with_overhang(mut self, overhang: bool) -> Self {
        self.overhang = overhang;
        self
    }
}

fn selections(parts: Vec<Vec<Item>>) -> Selection {
    parts
        .into_iter()
        .map(|part| Item::Selection(Selection::new(part)))
        .collect()
}

impl Selection {
    /// Splits into consecutive parts sized by `counts`. Parts whose count
    /// is negative are measured but left out of the result.
    pub fn partition_by_counts(&self, counts: &[isize], options: CountsOptions) -> Result<Selection> {
        let sizes: Vec<usize> = counts.iter().map(|count| count.unsigned_abs()).collect();
        let mut parts = partition_by_counts(
            self.items(),
            &sizes,
            options.cyclic,
            options.enchain,
            options.overhang,
        )?;

        if options.overhang && options.fuse_overhang && parts.len() > 1 {
            let expected = sizes[(parts.len() - 1) % sizes.len()];
            if parts.last().is_some_and(|last| last.len() != expected)
                && let Some(tail) = parts.pop()
                && let Some(previous) = parts.last_mut()
            {
                trace!(tail = tail.len(), "fusing overhang");
                previous.extend(tail);
            }
        }

        let first = parts.first().cloned();
        let last = parts.len().saturating_sub(1);
        let mut kept = Vec::new();
        for (i, part) in parts.into_iter().enumerate() {
            // a trailing part shorter than its count is overhang: kept
            let overhang = options.overhang && i == last && part.len() < sizes[i % sizes.len()];
            let excluded = match counts.get(i) {
                _ if overhang => false,
                Some(count) => *count < 0,
                None if options.cyclic => counts[i % counts.len()] < 0,
                None => false,
            };
            if excluded {
                trace!(part = i, len = part.len(), "dropping negative-count part");
            } else {
                kept.push(part);
            }
        }

        if kept.is_empty()
            && options.nonempty
            && let Some(first) = first
        {
            debug!("every part dropped; keeping the first");
            kept.push(first);
        }
        Ok(selections(kept))
    }

    /// Accumulates item durations against successive target durations.
    pub fn partition_by_durations(
        &self,
        durations: &[Duration],
        options: DurationsOptions,
    ) -> Result<Selection> {
        if durations.is_empty() {
            return Err(Error::Value("durations must not be empty".to_string()));
        }
        let measure = |item: &Item| -> Result<Duration> {
            if options.in_seconds {
                item.duration_in_seconds()
            } else {
                Ok(item.duration())
            }
        };
        let target_at = |index: usize| -> Option<Duration> {
            if options.cyclic {
                Some(durations[index % durations.len()])
            } else {
                durations.get(index).copied()
            }
        };

        let mut result: Vec<Vec<Item>> = Vec::new();
        let mut part: Vec<Item> = Vec::new();
        let mut target_index = 0;
        let mut target = durations[0];
        let mut cumulative = zero();
        let mut consumed = 0;

        for item in self.iter() {
            consumed += 1;
            let candidate = cumulative + measure(item)?;
            if candidate < target {
                part.push(item.clone());
                cumulative = candidate;
                continue;
            }
            if candidate > target {
                match options.fill {
                    Fill::Exact => {
                        return Err(Error::Partition {
                            message: "items must fill each duration exactly".to_string(),
                            target,
                            cumulative: candidate,
                        });
                    }
                    Fill::Less => {
                        debug!(%target, %candidate, "closing part before overshooting item");
                        if !part.is_empty() {
                            result.push(std::mem::take(&mut part));
                        }
                        part.push(item.clone());
                        cumulative = measure(item)?;
                        target_index += 1;
                        let Some(next) = target_at(target_index) else {
                            break;
                        };
                        target = next;
                        if target < cumulative {
                            return Err(Error::Partition {
                                message: "target duration is less than cumulative duration"
                                    .to_string(),
                                target,
                                cumulative,
                            });
                        }
                        continue;
                    }
                    Fill::More => {
                        debug!(%target, %candidate, "closing part after overshooting item");
                    }
                }
            }
            part.push(item.clone());
            result.push(std::mem::take(&mut part));
            cumulative = zero();
            target_index += 1;
            match target_at(target_index) {
                Some(next) => target = next,
                None => break,
            }
        }

        if options.overhang {
            if !part.is_empty() {
                result.push(part);
            }
            let rest = &self.items()[consumed..];
            if !rest.is_empty() {
                result.push(rest.to_vec());
            }
        }
        Ok(selections(result))
    }

    /// Splits into `ratio.len()` parts whose sizes are proportional to
    /// `ratio`. Negative terms drop their part.
    pub fn partition_by_ratio(&self, ratio: &[i64]) -> Result<Selection> {
        let counts: Vec<isize> = partition_integer_by_ratio(self.len(), ratio)?
            .into_iter()
            .map(|count| count as isize)
            .collect();
        self.partition_by_counts(&counts, CountsOptions::default())
    }
}
