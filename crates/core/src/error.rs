//! Error types for the property search engine
//!
//! This module defines the unified error type used throughout the engine.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations,
//! matching the error model used by every other crate in this workspace.
//!
//! ## Error Categories
//!
//! - **NotFound**: the requested entity does not exist in the index.
//! - **InvalidInput**: a request failed validation before any datastore call.
//! - **Timeout / Unavailable**: transient datastore failures, retried by the
//!   caller up to the policy in the concurrency crate.
//! - **ConflictingState**: a document was observed in a state inconsistent
//!   with the requested transition (e.g. delete-while-updating races).
//! - **IndexFault**: an invariant violation was detected; the offending id is
//!   enqueued on the repair queue and this error surfaces to the caller as
//!   `Internal`.
//! - **ScriptError**: the server-side script failed; callers degrade to the
//!   manual path for the same strategy.
//! - **EncodingError**: the codec could not round-trip a value.
//! - **Cancelled**: the caller's cancellation token fired.
//! - **RateLimited**: a circuit breaker or admission gate rejected the call.

use thiserror::Error;

/// Result type alias for propdex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the property search engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The datastore call exceeded its time budget.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The datastore connection is unavailable.
    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    /// A state transition conflicted with an in-flight mutation.
    #[error("conflicting state: {0}")]
    ConflictingState(String),

    /// An index invariant violation was detected for the given id.
    #[error("index fault for {entity}: {reason}")]
    IndexFault {
        /// The property or unit id whose indexes are suspected inconsistent.
        entity: String,
        /// Human-readable description of the violated invariant.
        reason: String,
    },

    /// The server-side script failed.
    #[error("script error in {script}: {reason}")]
    ScriptError {
        /// Name of the script that failed (e.g. `lua:search:complex`).
        script: String,
        /// Underlying failure reason.
        reason: String,
    },

    /// A value could not be encoded or decoded.
    #[error("encoding error: {0}")]
    EncodingError(String),

    /// The operation was cancelled by its caller.
    #[error("cancelled")]
    Cancelled,

    /// The operation was rejected by an admission gate or circuit breaker.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// An error surfaced to an external caller that should not see raw
    /// datastore internals (wraps an `IndexFault` or similar internal fault).
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is transient and eligible for retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::Unavailable(_))
    }

    /// The coarse kind name surfaced to callers, never the raw message.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NotFound",
            Error::InvalidInput(_) => "InvalidInput",
            Error::Timeout(_) => "Timeout",
            Error::Unavailable(_) => "Unavailable",
            Error::ConflictingState(_) => "ConflictingState",
            Error::IndexFault { .. } => "IndexFault",
            Error::ScriptError { .. } => "ScriptError",
            Error::EncodingError(_) => "EncodingError",
            Error::Cancelled => "Cancelled",
            Error::RateLimited(_) => "RateLimited",
            Error::Internal(_) => "InternalError",
        }
    }
}
