//! Route guarding for gated portal pages
//!
//! Guards never treat an in-progress bootstrap as "signed out": while the
//! session is loading the decision is [`GuardDecision::Pending`] and the page
//! should render a neutral waiting state.

use taxdesk_domain::{RouteConfig, SessionPhase, SessionSnapshot};

use crate::session::{login_redirect, AuthSessionManager};

/// Outcome of guarding a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session state is not known yet
    Pending,
    Allow,
    /// Send the user to this login URL
    Redirect(String),
}

#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    routes: RouteConfig,
}

impl RouteGuard {
    pub fn new(routes: RouteConfig) -> Self {
        Self { routes }
    }

    /// True when `location` falls under a protected prefix
    pub fn is_protected(&self, location: &str) -> bool {
        let path = location.split(['?', '#']).next().unwrap_or_default();
        self.routes.protected_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Decide from an already observed snapshot without waiting
    pub fn decide(&self, snapshot: &SessionSnapshot, location: &str) -> GuardDecision {
        if !self.is_protected(location) {
            return GuardDecision::Allow;
        }

        match snapshot.phase {
            SessionPhase::Uninitialized | SessionPhase::Loading => GuardDecision::Pending,
            _ if snapshot.is_authenticated() => GuardDecision::Allow,
            _ => GuardDecision::Redirect(login_redirect(location, &self.routes)),
        }
    }

    /// Decide after asking the manager, waiting out any bootstrap
    pub async fn authorize(&self, manager: &AuthSessionManager, location: &str) -> GuardDecision {
        if !self.is_protected(location) {
            return GuardDecision::Allow;
        }

        if manager.check_auth().await {
            GuardDecision::Allow
        } else {
            GuardDecision::Redirect(login_redirect(location, &self.routes))
        }
    }
}
