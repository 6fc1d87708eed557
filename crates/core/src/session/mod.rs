//! Client session lifecycle
//!
//! - **[`validator`]**: bearer token expiry checks with a grace buffer
//! - **[`scheduler`]**: the single proactive refresh timer
//! - **[`store`]**: durable mirror of token and user profile
//! - **[`manager`]**: the session state machine composing the above
//! - **[`redirect`]**: login and post-login navigation targets
//! - **[`ports`]**: backend, storage, navigation and notice boundaries

pub mod error;
pub mod manager;
pub mod memory;
pub mod ports;
pub mod redirect;
pub mod scheduler;
pub mod store;
pub mod validator;

pub use error::{SessionError, StorageError};
pub use manager::{
    AuthSessionManager, LogoutReason, RefreshTrigger, SessionManagerBuilder, SessionState,
};
pub use memory::MemoryStorage;
pub use ports::{Navigator, Notifier, SessionBackend, StorageBackend};
pub use redirect::{is_auth_page, login_redirect, post_login_target};
pub use scheduler::RefreshScheduler;
pub use store::{PersistedSession, SessionStore};
pub use validator::TokenValidator;
