//! Modular common utilities shared across TaxDesk crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: bearer token claim decoding, wall clock abstraction
//! - `runtime`: async infrastructure (cancellable timers)
//! - `test-utils`: mock clock and token fixtures for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;
#[cfg(feature = "foundation")]
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(all(feature = "foundation", any(feature = "test-utils", test)))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::{decode_claims, ClaimsError, TokenClaims};
#[cfg(feature = "foundation")]
pub use time::{Clock, SystemClock};
#[cfg(feature = "runtime")]
pub use time::timer::{TimerHandle, TimerSlot};
