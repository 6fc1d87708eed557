//! Port interfaces for the session lifecycle
//!
//! These traits define the boundaries between the session manager and the
//! platform it runs on: the backend refresh endpoint, durable key/value
//! storage, navigation and user notices.

use async_trait::async_trait;
use taxdesk_domain::Notice;

use super::error::{SessionError, StorageError};

/// Backend operations that renew or end a session
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Exchange ambient credentials for a new bearer token
    ///
    /// `Ok(None)` is an ordinary failure (rejected or no credentials).
    /// `Err` is a transport failure. Both end the session.
    async fn refresh(&self) -> Result<Option<String>, SessionError>;

    /// Tell the backend the user signed out
    async fn end_remote_session(&self) -> Result<(), SessionError>;
}

/// Synchronous string key/value storage that survives restarts
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads and changes the current location
pub trait Navigator: Send + Sync {
    /// Current path, including any query string
    fn current_path(&self) -> String;

    fn redirect(&self, path: &str);
}

/// Fire-and-forget user-visible messages
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
