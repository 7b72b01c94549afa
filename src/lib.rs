//! Stave - symbolic music notation and selection library
//!
//! This library models scores as trees of leaves (notes, chords, rests) and
//! containers (tuplets, voices, staves), and provides a selection engine for
//! querying them: traversal by kind, pattern indexing, filtering, grouping
//! and partitioning by counts, durations or ratios. Queries can be recorded
//! as lazy [`Expression`]s and replayed against other scores.

pub mod error;
pub mod expression;
pub mod inequality;
pub mod pattern;
pub mod score;
pub mod selection;
pub mod sequence;
pub mod types;
pub mod util;

// Re-export commonly used types
pub use error::{Error, Result};
pub use expression::{Expression, Value, parse_pipeline, select};
pub use inequality::{
    Comparison, DurationInequality, LengthInequality, PitchInequality, SetOperator,
};
pub use pattern::{Cursor, Pattern};
pub use score::{Component, ContainerKind, LeafKind, LogicalVoice, MeasureMap, Timespan, parse_score};
pub use selection::{
    ComponentFilter, CountsOptions, DurationsOptions, Fill, Item, LeafFilter, Prototype,
    Selection, TieFilter, Trim,
};
pub use types::duration::{Duration, Multiplier, Offset};
pub use types::indicator::{Indicator, IndicatorKind, MetronomeMark, TimeSignature};
pub use types::pitch::Pitch;
