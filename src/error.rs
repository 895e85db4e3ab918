use thiserror::Error;

/// Domain failures callers may want to tell apart from I/O errors.
///
/// These travel inside `anyhow::Error`; use `downcast_ref::<TaskError>()` to
/// match on them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("no task with id {0}")]
    NotFound(u64),

    #[error("unknown category '{name}' (expected one of: {allowed})")]
    UnknownCategory { name: String, allowed: String },

    #[error("invalid due date '{input}' (use YYYY-MM-DD, today, tomorrow or in Nd)")]
    InvalidDueDate { input: String },
}
