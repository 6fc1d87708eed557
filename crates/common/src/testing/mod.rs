//! Testing utilities and helpers
//!
//! - **[`time`]**: Settable wall clock for deterministic expiry checks
//! - **[`tokens`]**: Unsigned bearer token fixtures with chosen claims
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # {
//! use taxdesk_common::testing::{token_expiring_at, MockClock};
//! use taxdesk_common::{decode_claims, Clock};
//!
//! let clock = MockClock::at(1_700_000_000);
//! let token = token_expiring_at(clock.unix_timestamp() + 3600);
//!
//! let claims = decode_claims(&token).unwrap();
//! assert_eq!(claims.seconds_until_expiry(clock.unix_timestamp()), Some(3600));
//! # }
//! ```

pub mod time;
pub mod tokens;

pub use time::MockClock;
pub use tokens::{token_expiring_at, token_with_claims, token_without_expiry};
