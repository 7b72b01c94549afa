use crate::types::duration::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Content of the wrong kind was handed to an operation.
    #[error("type error: {0}")]
    Type(String),

    /// A contiguity or same-parent precondition did not hold.
    #[error("structural precondition failed: {0}")]
    Structure(String),

    #[error("{message} (target {target}, cumulative {cumulative})")]
    Partition {
        message: String,
        target: Duration,
        cumulative: Duration,
    },

    #[error("invalid value: {0}")]
    Value(String),

    #[error("index {index} out of range for {length} items")]
    IndexOutOfRange { index: isize, length: usize },

    #[error("can not evaluate `{statement}`: {source}")]
    Evaluation {
        statement: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{class} has no method `{name}`")]
    UnknownMethod { class: String, name: String },

    #[error("no metronome mark in effect for {0}")]
    MissingMetronomeMark(String),

    #[error("duration {0} is not assignable")]
    Assignability(Duration),
}

impl Error {
    pub fn evaluation(statement: impl Into<String>, source: Error) -> Self {
        Error::Evaluation {
            statement: statement.into(),
            source: Box::new(source),
        }
    }
}
