//! Session state observed by the portal
//!
//! These types describe what route guards and account widgets can see. The
//! lifecycle that produces them lives in `taxdesk-core`.

use serde::{Deserialize, Serialize};

use super::user::UserProfile;
use crate::impl_domain_enum_conversions;

/// Lifecycle phase of the session state machine
///
/// `Uninitialized -> Loading -> {Authenticated, Unauthenticated}`. Once the
/// bootstrap completes the session never returns to `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Loading,
    Authenticated,
    Unauthenticated,
}

impl_domain_enum_conversions!(SessionPhase {
    Uninitialized => "uninitialized",
    Loading => "loading",
    Authenticated => "authenticated",
    Unauthenticated => "unauthenticated",
});

/// Read-only view of the current session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub phase: SessionPhase,
}

impl SessionSnapshot {
    /// True iff a token is held and was validated (or refreshed) during the
    /// current lifecycle.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated && self.token.is_some()
    }

    /// True only while the initial bootstrap is running
    #[must_use]
    pub fn loading(&self) -> bool {
        self.phase == SessionPhase::Loading
    }
}

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

impl_domain_enum_conversions!(NoticeKind {
    Success => "success",
    Info => "info",
    Error => "error",
});

/// Transient toast shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }
}
