pub mod component;
pub mod lilypond;
pub mod parentage;
pub mod parser;
pub mod timing;

pub use component::{Component, ContainerKind, LeafKind};
pub use parentage::LogicalVoice;
pub use parser::parse_score;
pub use timing::{MeasureMap, Timespan};
