//! Scripted and recording doubles for the session ports

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use taxdesk_core::{
    MemoryStorage, Navigator, Notifier, SessionBackend, SessionError, StorageBackend,
    StorageError,
};
use taxdesk_domain::Notice;
use tokio::sync::Semaphore;

/// One scripted answer of the refresh endpoint
#[derive(Debug, Clone)]
pub enum RefreshReply {
    Token(String),
    Rejected,
    TransportError,
}

/// Refresh backend answering from a queue
///
/// An empty queue answers [`RefreshReply::Rejected`]. A gated backend holds
/// every refresh until [`MockSessionBackend::release`] is called.
#[derive(Default)]
pub struct MockSessionBackend {
    replies: Mutex<VecDeque<RefreshReply>>,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    fail_logout: AtomicBool,
    gate: Option<Arc<Semaphore>>,
}

impl MockSessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self { gate: Some(Arc::new(Semaphore::new(0))), ..Self::default() }
    }

    pub fn push(&self, reply: RefreshReply) {
        self.replies.lock().push_back(reply);
    }

    pub fn push_token(&self, token: impl Into<String>) {
        self.push(RefreshReply::Token(token.into()));
    }

    /// Let one held refresh proceed
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn fail_remote_logout(&self) {
        self.fail_logout.store(true, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionBackend for MockSessionBackend {
    async fn refresh(&self) -> Result<Option<String>, SessionError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let reply = self.replies.lock().pop_front().unwrap_or(RefreshReply::Rejected);
        match reply {
            RefreshReply::Token(token) => Ok(Some(token)),
            RefreshReply::Rejected => Ok(None),
            RefreshReply::TransportError => {
                Err(SessionError::Transport("connection refused".to_string()))
            }
        }
    }

    async fn end_remote_session(&self) -> Result<(), SessionError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(SessionError::RemoteLogout("503 Service Unavailable".to_string()));
        }
        Ok(())
    }
}

/// Navigator that records redirects and follows them
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    current: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Self {
        Self { current: Mutex::new(path.to_string()), redirects: Mutex::default() }
    }

    /// Simulate the user navigating somewhere
    pub fn visit(&self, path: &str) {
        *self.current.lock() = path.to_string();
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }

    pub fn last_redirect(&self) -> Option<String> {
        self.redirects.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.lock().clone()
    }

    fn redirect(&self, path: &str) {
        self.redirects.lock().push(path.to_string());
        *self.current.lock() = path.to_string();
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Storage whose reads or writes can be switched to fail
#[derive(Debug, Default)]
pub struct FlakyStorage {
    pub inner: Arc<MemoryStorage>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStorage {
    pub fn over(inner: Arc<MemoryStorage>) -> Self {
        Self { inner, ..Self::default() }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl StorageBackend for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Read { key: key.into(), message: "locked".into() });
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write { key: key.into(), message: "quota exceeded".into() });
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write { key: key.into(), message: "quota exceeded".into() });
        }
        self.inner.remove(key)
    }
}
