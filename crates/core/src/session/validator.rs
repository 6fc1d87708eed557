//! Client-side bearer token validation
//!
//! Tokens are checked against the wall clock with a grace buffer: a token
//! expiring within the buffer is already treated as invalid so it cannot
//! lapse between the check and its use.

use std::sync::Arc;

use taxdesk_common::{decode_claims, Clock, SystemClock, TokenClaims};
use taxdesk_domain::SessionConfig;
use tracing::debug;

/// Decides whether a bearer token is still usable
#[derive(Clone)]
pub struct TokenValidator {
    clock: Arc<dyn Clock>,
    grace_buffer_secs: i64,
}

impl TokenValidator {
    pub fn new(clock: Arc<dyn Clock>, grace_buffer_secs: i64) -> Self {
        Self { clock, grace_buffer_secs: grace_buffer_secs.max(0) }
    }

    pub fn from_config(config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, config.grace_buffer_seconds)
    }

    /// Valid iff the token decodes and `exp - now > grace_buffer`
    ///
    /// Malformed tokens and tokens without `exp` are invalid. Never panics.
    pub fn is_valid(&self, token: &str) -> bool {
        match self.seconds_until_expiry(token) {
            Some(remaining) => remaining > self.grace_buffer_secs,
            None => false,
        }
    }

    /// Seconds until `exp`, without the grace buffer
    pub fn seconds_until_expiry(&self, token: &str) -> Option<i64> {
        self.claims(token)?.seconds_until_expiry(self.clock.unix_timestamp())
    }

    /// Subject identifier: `sub`, falling back to `user_id`
    pub fn subject(&self, token: &str) -> Option<String> {
        let claims = self.claims(token)?;
        claims.sub.or_else(|| claims.user_id.map(|id| id.to_string()))
    }

    pub fn grace_buffer_secs(&self) -> i64 {
        self.grace_buffer_secs
    }

    fn claims(&self, token: &str) -> Option<TokenClaims> {
        match decode_claims(token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                debug!(error = %err, "Bearer token could not be decoded");
                None
            }
        }
    }
}

impl Default for TokenValidator {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default(), Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator").field("grace_buffer_secs", &self.grace_buffer_secs).finish()
    }
}
