//! Time utilities and abstractions
//!
//! - **[`clock`]**: Wall clock abstraction used for token expiry checks
//! - **[`timer`]**: Single-slot cancellable one-shot timers
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # {
//! use taxdesk_common::testing::MockClock;
//! use taxdesk_common::time::Clock;
//!
//! let clock = MockClock::at(1_700_000_000);
//! clock.advance_secs(90);
//! assert_eq!(clock.unix_timestamp(), 1_700_000_090);
//! # }
//! ```

pub mod clock;
#[cfg(feature = "runtime")]
pub mod timer;

pub use clock::{Clock, SystemClock};
