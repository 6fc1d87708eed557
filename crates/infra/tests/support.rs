//! Shared helpers for `taxdesk-infra` integration tests.

#![allow(dead_code)]

use std::path::Path;

use parking_lot::Mutex;
use taxdesk_common::testing::token_expiring_at;
use taxdesk_common::{Clock, SystemClock};
use taxdesk_core::{Navigator, Notifier};
use taxdesk_domain::{Config, Notice, StorageKind, UserProfile};
use wiremock::MockServer;

/// Navigator that records redirects and follows them
pub struct RecordingNavigator {
    current: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Self {
        Self { current: Mutex::new(path.to_string()), redirects: Mutex::new(Vec::new()) }
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
        *self.current.lock() = path.to_string();
        self.redirects.lock().push(path.to_string());
    }
}

#[derive(Default)]
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

/// Config pointing at `server` with in-memory storage
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}/api", server.uri());
    config.storage.backend = StorageKind::Memory;
    config
}

/// Config pointing at a local port nothing listens on
pub fn unreachable_config() -> Config {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local address").port();
    drop(listener);

    let mut config = Config::default();
    config.api.base_url = format!("http://127.0.0.1:{port}/api");
    config.storage.backend = StorageKind::Memory;
    config
}

/// Config pointing at `server` with file storage at `path`
pub fn file_config_for(server: &MockServer, path: &Path) -> Config {
    let mut config = config_for(server);
    config.storage.backend = StorageKind::File;
    config.storage.path = path.to_path_buf();
    config
}

/// Token expiring `secs` from the real wall clock
pub fn token_in(secs: i64) -> String {
    token_expiring_at(SystemClock.unix_timestamp() + secs)
}

pub fn user() -> UserProfile {
    UserProfile::new(42, "Ada Lovelace", "ada@example.com").with_role("client")
}
