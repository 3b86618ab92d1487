//! Datastore-level error type. Every variant carries the originating
//! command name for diagnostics and converts into the
//! crate-wide [`propdex_core::Error`] at call sites.

use thiserror::Error;

/// Errors raised by a [`crate::Datastore`] implementation.
#[derive(Debug, Error)]
pub enum DatastoreError {
    /// A network-level failure occurred while issuing `command`.
    #[error("network error during {command}: {message}")]
    Network {
        /// The command that failed.
        command: String,
        /// Underlying failure description.
        message: String,
    },

    /// `command` exceeded its time budget.
    #[error("timeout during {command}")]
    Timeout {
        /// The command that timed out.
        command: String,
    },

    /// The datastore reported a server-side error for `command`.
    #[error("server error during {command}: {message}")]
    Server {
        /// The command that failed.
        command: String,
        /// Server-reported message.
        message: String,
    },

    /// The connection was disconnected while issuing `command`.
    #[error("disconnected during {command}")]
    Disconnected {
        /// The command that was in flight.
        command: String,
    },

    /// The named server-side script failed.
    #[error("script error in {script} during {command}: {message}")]
    Script {
        /// Script name (e.g. `lua:search:complex`).
        script: String,
        /// The command that invoked the script.
        command: String,
        /// Failure description.
        message: String,
    },
}

impl DatastoreError {
    /// Whether this failure is transient and retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DatastoreError::Timeout { .. } | DatastoreError::Disconnected { .. }
        )
    }
}

impl From<DatastoreError> for propdex_core::Error {
    fn from(e: DatastoreError) -> Self {
        match e {
            DatastoreError::Timeout { command } => propdex_core::Error::Timeout(command),
            DatastoreError::Disconnected { command } | DatastoreError::Network { command, .. } => {
                propdex_core::Error::Unavailable(command)
            }
            DatastoreError::Server { command, message } => {
                propdex_core::Error::Internal(format!("{command}: {message}"))
            }
            DatastoreError::Script {
                script, message, ..
            } => propdex_core::Error::ScriptError {
                script,
                reason: message,
            },
        }
    }
}
