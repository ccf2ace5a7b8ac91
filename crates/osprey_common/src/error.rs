use thiserror::Error;

/// Convenience alias for `Result<T, OspreyError>`.
pub type OspreyResult<T> = Result<T, OspreyError>;

/// Top-level error type that all crate-specific errors convert into.
///
/// Recoverable input errors only. Invariant violations in the partition
/// state engine (metadata-delete for a missing block, compaction leaving
/// dangling index entries) are bugs, not errors: they panic and take the
/// applier task down, matching the strict apply-completely-or-not-at-all
/// contract.
#[derive(Error, Debug)]
pub enum OspreyError {
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Columnar batch decoding and access errors.
///
/// All of these surface before the first index mutation, so a failed
/// log-tail entry leaves the partition state untouched.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("column {index} missing: batch has {count} columns")]
    MissingColumn { index: usize, count: usize },

    #[error("column {index} is {actual}, expected {expected}")]
    ColumnType {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("column {index} has {len} rows, batch has {row_count}")]
    LengthMismatch {
        index: usize,
        len: usize,
        row_count: usize,
    },

    #[error("null bitmap row {row} out of range for column {index} ({len} rows)")]
    NullOutOfRange { index: usize, row: u32, len: usize },
}

/// Partition state engine errors.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("column kind {0} is not a supported primary key type")]
    UnsupportedKeyColumn(&'static str),
}
