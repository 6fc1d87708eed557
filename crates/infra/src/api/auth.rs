//! Bearer token source for API calls
//!
//! The [`ApiClient`](super::ApiClient) never owns credentials. It asks an
//! [`AccessTokenProvider`] for the current token and, when the backend rejects
//! a call with 401, for a refreshed one.

use async_trait::async_trait;
use taxdesk_core::{AuthSessionManager, RefreshTrigger};
use tracing::debug;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Token to attach to the next request, if a session exists
    async fn access_token(&self) -> Option<String>;

    /// Renew the token after the backend rejected it
    ///
    /// Returns the new token, or `None` when the session could not be
    /// renewed. Implementations are expected to end the session in that case.
    async fn refresh_access_token(&self) -> Option<String>;
}

#[async_trait]
impl AccessTokenProvider for AuthSessionManager {
    async fn access_token(&self) -> Option<String> {
        self.token()
    }

    async fn refresh_access_token(&self) -> Option<String> {
        if self.refresh_session(RefreshTrigger::Unauthorized).await {
            self.token()
        } else {
            debug!("Session could not be renewed after 401");
            None
        }
    }
}
