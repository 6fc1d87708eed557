//! # TaxDesk Infrastructure
//!
//! Infrastructure implementations of core session ports.
//!
//! This crate contains:
//! - The HTTP session backend and the authorized API client
//! - File and keychain storage for the session record
//! - Configuration loading from environment and files
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `taxdesk-core`
//! - Contains all "impure" code (network, disk, keychain)

pub mod api;
pub mod config;
pub mod observability;
pub mod portal;
pub mod storage;

// Re-export commonly used items
pub use api::{AccessTokenProvider, ApiClient, ApiError, HttpSessionBackend};
pub use observability::init_tracing;
pub use portal::PortalSession;
pub use storage::{open_backend, FileStorage, KeychainStorage};
