//! Durable key/value storage backends for the session record
//!
//! - [`FileStorage`]: a JSON object on disk, rewritten atomically
//! - [`KeychainStorage`]: one platform keychain entry per key
//!
//! [`open_backend`] picks one from [`StorageConfig`].

pub mod file;
pub mod keychain;

use std::sync::Arc;

use taxdesk_core::{MemoryStorage, StorageBackend, StorageError};
use taxdesk_domain::{StorageConfig, StorageKind};
use tracing::info;

pub use file::FileStorage;
pub use keychain::KeychainStorage;

/// Open the storage backend named by the configuration
///
/// # Errors
///
/// Returns [`StorageError`] when the file backend's location cannot be
/// prepared.
pub fn open_backend(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    info!(backend = %config.backend, "Opening session storage");

    let backend: Arc<dyn StorageBackend> = match config.backend {
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        StorageKind::File => Arc::new(FileStorage::open(&config.path)?),
        StorageKind::Keychain => Arc::new(KeychainStorage::new(config.keychain_service.clone())),
    };
    Ok(backend)
}
