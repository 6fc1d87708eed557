//! Configuration loader
//!
//! Every configuration value has a default, so loading never requires a
//! file. Sources are layered:
//!
//! 1. Built-in defaults
//! 2. The first config file found by [`probe_config_paths`] (JSON or TOML)
//! 3. `TAXDESK_*` environment variables
//!
//! ## Environment Variables
//! - `TAXDESK_API_BASE_URL`: API base URL including the `/api` prefix
//! - `TAXDESK_API_TIMEOUT`: request timeout in seconds
//! - `TAXDESK_GRACE_BUFFER_SECS`: tokens expiring sooner count as invalid
//! - `TAXDESK_REFRESH_LEAD_SECS`: refresh this long before expiry
//! - `TAXDESK_REVALIDATE_INTERVAL_SECS`: safety-net check period in seconds
//! - `TAXDESK_LOGIN_PATH`: login page route
//! - `TAXDESK_STORAGE_BACKEND`: `memory`, `file` or `keychain`
//! - `TAXDESK_STORAGE_PATH`: file backend location
//! - `TAXDESK_LOG_LEVEL`: default tracing filter
//! - `TAXDESK_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}` then `./taxdesk.{json,toml}`
//! 2. `../config.{json,toml}` and `../../config.{json,toml}`
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use taxdesk_domain::{Config, Result, TaxDeskError};

/// Load configuration from every source
///
/// A missing config file is not an error; defaults apply instead.
///
/// # Errors
/// Returns `TaxDeskError::Config` if a config file exists but cannot be
/// parsed, or an environment variable holds an invalid value.
pub fn load() -> Result<Config> {
    let config = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found; using defaults");
            Config::default()
        }
    };

    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Load configuration from defaults and environment variables only
///
/// # Errors
/// Returns `TaxDeskError::Config` if a variable holds an invalid value.
pub fn load_from_env() -> Result<Config> {
    let config = apply_env_overrides(Config::default(), |key| std::env::var(key).ok())?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `TaxDeskError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TaxDeskError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TaxDeskError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TaxDeskError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `TaxDeskError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TaxDeskError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TaxDeskError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(TaxDeskError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Overlay environment values onto `config`
///
/// `lookup` resolves a variable name; tests pass a map instead of the
/// process environment.
///
/// # Errors
/// Returns `TaxDeskError::Config` naming the variable that failed to parse.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(url) = get("TAXDESK_API_BASE_URL") {
        config.api.base_url = url;
    }
    if let Some(timeout) = parsed(&get, "TAXDESK_API_TIMEOUT")? {
        config.api.timeout_seconds = timeout;
    }
    if let Some(grace) = parsed(&get, "TAXDESK_GRACE_BUFFER_SECS")? {
        config.session.grace_buffer_seconds = grace;
    }
    if let Some(lead) = parsed(&get, "TAXDESK_REFRESH_LEAD_SECS")? {
        config.session.refresh_lead_seconds = lead;
    }
    if let Some(interval) = parsed(&get, "TAXDESK_REVALIDATE_INTERVAL_SECS")? {
        config.session.revalidate_interval_seconds = interval;
    }
    if let Some(login) = get("TAXDESK_LOGIN_PATH") {
        config.routes.login_path = login;
    }
    if let Some(backend) = parsed(&get, "TAXDESK_STORAGE_BACKEND")? {
        config.storage.backend = backend;
    }
    if let Some(path) = get("TAXDESK_STORAGE_PATH") {
        config.storage.path = PathBuf::from(path);
    }
    if let Some(level) = get("TAXDESK_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = parsed(&get, "TAXDESK_LOG_FORMAT")? {
        config.logging.format = format;
    }

    Ok(config)
}

fn parsed<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| TaxDeskError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("taxdesk.json"),
        dir.join("taxdesk.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}
