//! Durable mirror of the session
//!
//! The token and the user profile are persisted under independent keys. The
//! user profile is stored as JSON; a record that no longer parses is logged,
//! treated as absent and flagged so the manager can force a logout.

use std::sync::Arc;

use taxdesk_domain::{SessionConfig, UserProfile};
use tracing::{debug, warn};

use super::error::StorageError;
use super::ports::StorageBackend;

/// Result of reading the persisted record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSession {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    /// A user record existed but could not be parsed
    pub corrupt: bool,
}

impl PersistedSession {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none() && !self.corrupt
    }
}

pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
    token_key: String,
    user_key: String,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_keys(backend, &SessionConfig::default())
    }

    pub fn with_keys(backend: Arc<dyn StorageBackend>, config: &SessionConfig) -> Self {
        Self { backend, token_key: config.token_key.clone(), user_key: config.user_key.clone() }
    }

    /// Persist token and user together
    ///
    /// The user record is encoded before anything is written, so an encoding
    /// failure leaves storage untouched.
    pub fn save(&self, token: &str, user: &UserProfile) -> Result<(), StorageError> {
        let record =
            serde_json::to_string(user).map_err(|e| StorageError::Encode(e.to_string()))?;

        self.backend.set(&self.user_key, &record)?;
        self.backend.set(&self.token_key, token)?;
        debug!(user_id = user.id, "Persisted session record");
        Ok(())
    }

    /// Replace only the token, keeping the stored user
    pub fn save_token(&self, token: &str) -> Result<(), StorageError> {
        self.backend.set(&self.token_key, token)
    }

    pub fn load(&self) -> Result<PersistedSession, StorageError> {
        let token = self.load_token()?;
        let (user, corrupt) = match self.backend.get(&self.user_key)? {
            None => (None, false),
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => (Some(user), false),
                Err(err) => {
                    warn!(error = %err, "Discarding unreadable persisted user record");
                    (None, true)
                }
            },
        };

        Ok(PersistedSession { token, user, corrupt })
    }

    /// Stored token; blank values read as absent
    pub fn load_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.backend.get(&self.token_key)?.filter(|token| !token.trim().is_empty()))
    }

    /// Remove both keys
    ///
    /// Both removals are attempted even if the first fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        let token = self.backend.remove(&self.token_key);
        let user = self.backend.remove(&self.user_key);
        debug!("Cleared persisted session record");
        token.and(user)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("token_key", &self.token_key)
            .field("user_key", &self.user_key)
            .finish_non_exhaustive()
    }
}
