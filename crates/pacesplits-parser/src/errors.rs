use thiserror::Error;

/// Failure to turn a single time cell into a timestamp. Always scoped to one
/// field of one row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("unparseable time '{raw}'")]
    Malformed { raw: String },

    #[error("time '{raw}' has {component} out of range")]
    OutOfRange { raw: String, component: &'static str },

    #[error("elapsed time '{raw}' is negative")]
    Negative { raw: String },
}

impl TimeParseError {
    pub fn raw(&self) -> &str {
        match self {
            TimeParseError::Malformed { raw }
            | TimeParseError::OutOfRange { raw, .. }
            | TimeParseError::Negative { raw } => raw,
        }
    }
}

/// Failures that make a whole year's table unusable.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("{parser} schema mismatch: missing required columns {missing:?}")]
    SchemaMismatch {
        parser: &'static str,
        missing: Vec<&'static str>,
    },

    #[error("{parser} column '{column}' appears more than once")]
    DuplicateColumn {
        parser: &'static str,
        column: String,
    },

    #[error("table has no header row")]
    MissingHeader,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
