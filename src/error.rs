//! Typed failure modes of the thread ETL. Pipeline and CLI code wraps these in
//! `anyhow::Error` with file context; callers that care can `downcast_ref::<EtlError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    /// A comment token appeared while no post was open, so it has no level-0 ancestor.
    #[error("line {line_no}: comment `{comment_id}` appears before any post sentinel")]
    MalformedInput { line_no: usize, comment_id: String },

    /// A required column is absent from the raw comment table.
    #[error("line {line_no}: comment table record is missing required field `{field}`")]
    MissingField { field: &'static str, line_no: usize },

    /// A comment table line could not be understood as a record.
    #[error("line {line_no}: invalid comment table record: {reason}")]
    InvalidRecord { line_no: usize, reason: String },
}

/// Non-fatal conditions surfaced next to a successful result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeWarning {
    /// The join matched no rows at all.
    EmptyJoin,
}
