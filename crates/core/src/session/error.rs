//! Error types for the session lifecycle

use taxdesk_domain::TaxDeskError;
use thiserror::Error;

/// Failures of the key/value persistence primitive
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read `{key}`: {message}")]
    Read { key: String, message: String },

    #[error("failed to write `{key}`: {message}")]
    Write { key: String, message: String },

    #[error("failed to encode session record: {0}")]
    Encode(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures surfaced by session operations
///
/// Refresh failures never reach callers of the manager; they end the session
/// instead. This type only escapes from `login` and from port adapters.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("refresh request failed: {0}")]
    Transport(String),

    #[error("remote logout failed: {0}")]
    RemoteLogout(String),
}

impl From<StorageError> for TaxDeskError {
    fn from(err: StorageError) -> Self {
        TaxDeskError::Storage(err.to_string())
    }
}

impl From<SessionError> for TaxDeskError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Storage(inner) => inner.into(),
            SessionError::Transport(message) | SessionError::RemoteLogout(message) => {
                TaxDeskError::Network(message)
            }
        }
    }
}
