//! Typed error kinds at the Repository / Ingest Service boundary.
//!
//! `txnhook-db` returns `anyhow::Result` for plumbing (connection, IO); this
//! module is where those get mapped to the five named error kinds, which is
//! the only place the taxonomy matters — the HTTP layer maps kinds to
//! status codes, and the Background Processor matches on them to decide
//! whether to retry or persist a failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-range input, rejected before any Store access.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The Store could not be reached or timed out within the configured
    /// deadline.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A row expected to exist (e.g. immediately after a successful insert)
    /// was not found. Signals a bug or an external deletion.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// The Background Processor's own work failed (e.g. `fail_for_testing`
    /// or a downstream side effect raised).
    #[error("processing error: {0}")]
    ProcessingError(String),

    /// Processing was interrupted by a shutdown signal before it could
    /// reach a terminal state; the row was left retryable.
    #[error("interrupted by shutdown")]
    InterruptedByShutdown,
}
