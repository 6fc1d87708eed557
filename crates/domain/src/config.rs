//! Configuration structures
//!
//! Every section has serde defaults so a config file only needs to name the
//! values it overrides. Loading from environment or disk lives in
//! `taxdesk-infra`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AUTH_ROUTES, DEFAULT_API_BASE_URL, DEFAULT_GRACE_BUFFER_SECS, DEFAULT_REDIRECT_ROUTE,
    DEFAULT_REFRESH_LEAD_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_REVALIDATE_INTERVAL_SECS,
    DEFAULT_STORAGE_FILE, KEYCHAIN_SERVICE_NAME, LOGIN_ROUTE, LOGOUT_PATH,
    PROTECTED_ROUTE_PREFIXES, REDIRECT_QUERY_PARAM, REFRESH_TOKEN_PATH, TOKEN_STORAGE_KEY,
    USER_STORAGE_KEY,
};
use crate::impl_domain_enum_conversions;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub routes: RouteConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Backend API endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    pub refresh_path: String,
    pub logout_path: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_path: REFRESH_TOKEN_PATH.to_string(),
            logout_path: LOGOUT_PATH.to_string(),
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Join the base URL and an API path without doubling slashes
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Token timing used by the session lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Tokens expiring within this many seconds are already invalid
    pub grace_buffer_seconds: i64,
    /// Refresh this many seconds before expiry
    pub refresh_lead_seconds: i64,
    /// Safety-net re-validation period
    pub revalidate_interval_seconds: u64,
    pub token_key: String,
    pub user_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grace_buffer_seconds: DEFAULT_GRACE_BUFFER_SECS,
            refresh_lead_seconds: DEFAULT_REFRESH_LEAD_SECS,
            revalidate_interval_seconds: DEFAULT_REVALIDATE_INTERVAL_SECS,
            token_key: TOKEN_STORAGE_KEY.to_string(),
            user_key: USER_STORAGE_KEY.to_string(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_secs(self.revalidate_interval_seconds.max(1))
    }
}

/// Navigation targets used for redirects and route guarding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub login_path: String,
    pub default_redirect: String,
    /// Query parameter carrying the return path on the login page
    pub redirect_param: String,
    pub auth_paths: Vec<String>,
    pub protected_prefixes: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login_path: LOGIN_ROUTE.to_string(),
            default_redirect: DEFAULT_REDIRECT_ROUTE.to_string(),
            redirect_param: REDIRECT_QUERY_PARAM.to_string(),
            auth_paths: AUTH_ROUTES.iter().map(|p| (*p).to_string()).collect(),
            protected_prefixes: PROTECTED_ROUTE_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

/// Where the persisted session record lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Memory,
    #[default]
    File,
    Keychain,
}

impl_domain_enum_conversions!(StorageKind {
    Memory => "memory",
    File => "file",
    Keychain => "keychain",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageKind,
    /// File backend location
    pub path: PathBuf,
    /// Keychain backend service name
    pub keychain_service: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            path: PathBuf::from(DEFAULT_STORAGE_FILE),
            keychain_service: KEYCHAIN_SERVICE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl_domain_enum_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::default() }
    }
}
