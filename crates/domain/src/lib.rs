//! # TaxDesk Domain
//!
//! Plain data shared by every TaxDesk crate.
//!
//! This crate contains:
//! - Session and user profile types observed by the portal UI
//! - Configuration structures with serde defaults
//! - Domain error types and Result definitions
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other TaxDesk crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
