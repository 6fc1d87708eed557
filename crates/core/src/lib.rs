//! # TaxDesk Core
//!
//! Session lifecycle logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Token validation, refresh scheduling and the session store
//! - The auth session manager state machine
//! - Route guarding for gated pages
//! - Port interfaces (traits) implemented by `taxdesk-infra`
//!
//! ## Architecture Principles
//! - Only depends on `taxdesk-common` and `taxdesk-domain`
//! - No HTTP, filesystem or platform code
//! - All external dependencies via traits

pub mod guard;
pub mod session;

pub use guard::{GuardDecision, RouteGuard};
pub use session::{
    AuthSessionManager, LogoutReason, MemoryStorage, Navigator, Notifier, PersistedSession,
    RefreshScheduler, RefreshTrigger, SessionBackend, SessionError, SessionManagerBuilder,
    SessionState, SessionStore, StorageBackend, StorageError, TokenValidator,
};
