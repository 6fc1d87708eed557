//! Shared test helpers for `taxdesk-core` integration tests.
//!
//! [`Harness`] wires an [`AuthSessionManager`] to in-memory storage, a
//! scripted refresh backend, a recording navigator and a recording notifier,
//! with wall-clock time pinned by a [`MockClock`].

#![allow(dead_code)]

pub mod mocks;

use std::sync::Arc;
use std::time::Duration;

use taxdesk_common::testing::{token_expiring_at, MockClock};
use taxdesk_common::Clock;
use taxdesk_core::{AuthSessionManager, MemoryStorage, SessionStore, StorageBackend};
use taxdesk_domain::UserProfile;

pub use mocks::{
    FlakyStorage, MockSessionBackend, RecordingNavigator, RecordingNotifier, RefreshReply,
};

/// Wall-clock instant every harness starts at
pub const NOW: i64 = 1_700_000_000;

pub struct Harness {
    pub clock: MockClock,
    pub storage: Arc<MemoryStorage>,
    pub store: Arc<SessionStore>,
    pub backend: Arc<MockSessionBackend>,
    pub navigator: Arc<RecordingNavigator>,
    pub notifier: Arc<RecordingNotifier>,
    pub manager: Arc<AuthSessionManager>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_backend(MockSessionBackend::new())
    }

    /// Harness whose refresh calls block until [`MockSessionBackend::release`]
    pub fn gated() -> Self {
        Self::with_backend(MockSessionBackend::gated())
    }

    pub fn with_backend(backend: MockSessionBackend) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        Self::with_storage(backend, storage.clone(), storage)
    }

    /// Harness over an arbitrary storage backend; `storage` is kept for
    /// inspection and must be the in-memory view of `backend_storage`
    pub fn with_storage(
        backend: MockSessionBackend,
        storage: Arc<MemoryStorage>,
        backend_storage: Arc<dyn StorageBackend>,
    ) -> Self {
        let clock = MockClock::at(NOW);
        let store = Arc::new(SessionStore::new(backend_storage));
        let backend = Arc::new(backend);
        let navigator = Arc::new(RecordingNavigator::at("/"));
        let notifier = Arc::new(RecordingNotifier::default());

        let manager = AuthSessionManager::builder(
            backend.clone(),
            store.clone(),
            navigator.clone(),
            notifier.clone(),
        )
        .clock(Arc::new(clock.clone()))
        .build();

        Self { clock, storage, store, backend, navigator, notifier, manager }
    }

    /// Token expiring `secs` after the harness clock's current time
    pub fn token_in(&self, secs: i64) -> String {
        token_expiring_at(self.clock.unix_timestamp() + secs)
    }

    pub fn persist(&self, token: &str, user: &UserProfile) {
        self.store.save(token, user).expect("persist session");
    }

    pub fn stored_token(&self) -> Option<String> {
        self.storage.get("token").expect("read token")
    }

    pub fn stored_user(&self) -> Option<String> {
        self.storage.get("user").expect("read user")
    }

    /// Write a raw value behind the manager's back
    pub fn storage_set(&self, key: &str, value: &str) {
        self.storage.set(key, value).expect("write storage");
    }

    pub fn storage_remove(&self, key: &str) {
        self.storage.remove(key).expect("remove from storage");
    }
}

pub fn user() -> UserProfile {
    UserProfile::new(42, "Ada Lovelace", "ada@example.com").with_role("client")
}

/// Let every runnable task make progress
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
