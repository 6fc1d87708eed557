//! Platform keychain session storage
//!
//! Each key becomes one credential under the configured service name.

use keyring::Entry;
use taxdesk_core::{StorageBackend, StorageError};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct KeychainStorage {
    service_name: String,
}

impl KeychainStorage {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Entry::new(&self.service_name, key).map_err(|e| {
            StorageError::Unavailable(format!("keychain entry {}/{key}: {e}", self.service_name))
        })
    }
}

impl StorageBackend for KeychainStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Read { key: key.to_string(), message: e.to_string() }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!(service = %self.service_name, key, "Storing session value in keychain");
        self.entry(key)?
            .set_password(value)
            .map_err(|e| StorageError::Write { key: key.to_string(), message: e.to_string() })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::Write { key: key.to_string(), message: e.to_string() }),
        }
    }
}
