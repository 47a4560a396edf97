//! Error types for clustmatch.

/// Errors raised by the detectors, the merge engine and the table readers.
///
/// `InvalidInterval` and `InconsistentGroup` describe a single record or
/// group; callers log them and carry on. The remaining variants describe a
/// structurally broken input and abort the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid interval {chrom}:{start}-{end}: start is greater than end")]
    InvalidInterval { chrom: String, start: i64, end: i64 },

    #[error("inconsistent group {id}: {reason}")]
    InconsistentGroup { id: String, reason: String },

    #[error("missing required column '{column}' in {table}")]
    MissingColumn { column: String, table: String },

    #[error("invalid value '{value}' for column '{column}' in {table} at line {line}")]
    InvalidValue {
        table: String,
        line: usize,
        column: String,
        value: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
