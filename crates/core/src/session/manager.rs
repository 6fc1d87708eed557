//! Auth session manager
//!
//! Composes the validator, the refresh scheduler and the session store into
//! the session state machine:
//!
//! ```text
//! Uninitialized -> Loading -> { Authenticated, Unauthenticated }
//! Authenticated -> Unauthenticated   (logout, refresh failure, re-validation failure)
//! ```
//!
//! State lives in a [`watch`] channel so route guards can await the end of
//! the bootstrap instead of polling. Every state change carries a generation
//! number; login, adoption and logout bump it, and a refresh that completes
//! under an older generation is discarded.
//!
//! Refreshes are single-flight: the scheduler, the re-validation loop,
//! `check_auth` and API clients all await the same in-flight attempt.
//!
//! Every session death goes through one teardown path which cancels the
//! timers, clears storage and memory, notifies on refresh failure and
//! redirects to the login page.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use taxdesk_common::{Clock, SystemClock};
use taxdesk_domain::constants::SESSION_EXPIRED_NOTICE;
use taxdesk_domain::{
    impl_domain_enum_conversions, Notice, RouteConfig, SessionConfig, SessionPhase,
    SessionSnapshot, UserProfile,
};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use super::error::SessionError;
use super::ports::{Navigator, Notifier, SessionBackend};
use super::redirect::{login_redirect, post_login_target};
use super::scheduler::RefreshScheduler;
use super::store::SessionStore;
use super::validator::TokenValidator;

/// What asked for a token refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Persisted token was stale at startup
    Bootstrap,
    /// Proactive timer fired ahead of expiry
    Scheduled,
    /// Periodic safety-net check found a stale token
    Revalidation,
    /// A consumer asked whether the session is usable
    CheckAuth,
    /// An API call was rejected with 401
    Unauthorized,
}

impl_domain_enum_conversions!(RefreshTrigger {
    Bootstrap => "bootstrap",
    Scheduled => "scheduled",
    Revalidation => "revalidation",
    CheckAuth => "check_auth",
    Unauthorized => "unauthorized",
});

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user signed out
    UserRequested,
    /// The refresh endpoint rejected the session or was unreachable
    RefreshFailed,
    /// Persisted session data could not be parsed
    CorruptRecord,
    /// Session storage could not be read or written
    StorageUnavailable,
}

impl_domain_enum_conversions!(LogoutReason {
    UserRequested => "user_requested",
    RefreshFailed => "refresh_failed",
    CorruptRecord => "corrupt_record",
    StorageUnavailable => "storage_unavailable",
});

impl LogoutReason {
    /// Only expiry-driven logouts are announced to the user
    fn notifies(self) -> bool {
        matches!(self, Self::RefreshFailed)
    }
}

/// Published session state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// What consumers observe
    pub snapshot: SessionSnapshot,
    generation: u64,
}

impl SessionState {
    /// Identity generation; changes on login, adoption and logout
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

type RefreshFlight = Shared<BoxFuture<'static, bool>>;

/// Builder for [`AuthSessionManager`]
pub struct SessionManagerBuilder {
    backend: Arc<dyn SessionBackend>,
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    session: SessionConfig,
    routes: RouteConfig,
}

impl SessionManagerBuilder {
    /// Use a different wall clock for token expiry checks
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Timing and storage-key settings
    pub fn session_config(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Login, default and auth-only routes used for redirects
    pub fn routes(mut self, routes: RouteConfig) -> Self {
        self.routes = routes;
        self
    }

    /// Build the manager; nothing is restored until `initialize`
    pub fn build(self) -> Arc<AuthSessionManager> {
        Arc::new_cyclic(|weak_self| AuthSessionManager {
            weak_self: weak_self.clone(),
            validator: TokenValidator::from_config(&self.session, self.clock),
            scheduler: RefreshScheduler::from_config(&self.session),
            store: self.store,
            backend: self.backend,
            navigator: self.navigator,
            notifier: self.notifier,
            state: watch::Sender::new(SessionState::default()),
            lifecycle: Mutex::new(()),
            bootstrap_started: AtomicBool::new(false),
            inflight: Mutex::new(None),
            next_flight: AtomicU64::new(0),
            revalidation: Mutex::new(None),
            session: self.session,
            routes: self.routes,
        })
    }
}

/// Owner of the client session lifecycle
///
/// Always held in an [`Arc`]; timers and the re-validation loop keep only weak
/// references, so dropping the last handle tears everything down. Methods
/// that arm timers must run inside a tokio runtime.
pub struct AuthSessionManager {
    weak_self: Weak<AuthSessionManager>,
    session: SessionConfig,
    routes: RouteConfig,
    validator: TokenValidator,
    scheduler: RefreshScheduler,
    store: Arc<SessionStore>,
    backend: Arc<dyn SessionBackend>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SessionState>,
    /// Serialises storage writes with the matching state transition
    lifecycle: Mutex<()>,
    bootstrap_started: AtomicBool,
    inflight: Mutex<Option<(u64, RefreshFlight)>>,
    next_flight: AtomicU64,
    revalidation: Mutex<Option<CancellationToken>>,
}

impl AuthSessionManager {
    /// Start building a manager over its four ports
    pub fn builder(
        backend: Arc<dyn SessionBackend>,
        store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> SessionManagerBuilder {
        SessionManagerBuilder {
            backend,
            store,
            navigator,
            notifier,
            clock: Arc::new(SystemClock),
            session: SessionConfig::default(),
            routes: RouteConfig::default(),
        }
    }

    // ------------------------------------------------------------------
    // Observable state
    // ------------------------------------------------------------------

    /// Current user, token and phase
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().snapshot.clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().snapshot.phase
    }

    /// Whether a session is active
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().snapshot.is_authenticated()
    }

    /// Whether the bootstrap has not finished yet
    pub fn is_loading(&self) -> bool {
        self.state.borrow().snapshot.loading()
    }

    /// Signed-in user, if any
    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().snapshot.user.clone()
    }

    /// Bearer token of the active session, if any
    pub fn token(&self) -> Option<String> {
        self.state.borrow().snapshot.token.clone()
    }

    /// Whether a proactive refresh timer is pending
    pub fn is_refresh_armed(&self) -> bool {
        self.scheduler.is_armed()
    }

    /// Whether the periodic re-validation loop is running
    pub fn is_revalidating(&self) -> bool {
        self.revalidation.lock().as_ref().is_some_and(|token| !token.is_cancelled())
    }

    /// Token validator sharing the manager's clock and grace buffer
    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Configured routes
    pub fn routes(&self) -> &RouteConfig {
        &self.routes
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Restore the persisted session
    ///
    /// Runs once per manager; later calls wait for the first bootstrap to
    /// finish. Always leaves the `Loading` phase.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        if self.bootstrap_started.swap(true, Ordering::AcqRel) {
            debug!("Session bootstrap already started; waiting for it");
            let mut rx = self.state.subscribe();
            let _ = rx
                .wait_for(|state| {
                    !matches!(
                        state.snapshot.phase,
                        SessionPhase::Uninitialized | SessionPhase::Loading
                    )
                })
                .await;
            return;
        }

        self.state.send_modify(|state| state.snapshot.phase = SessionPhase::Loading);
        info!("Initializing session");

        self.bootstrap().await;

        self.state.send_if_modified(|state| {
            if state.snapshot.phase != SessionPhase::Loading {
                return false;
            }
            state.snapshot = SessionSnapshot {
                phase: SessionPhase::Unauthenticated,
                ..SessionSnapshot::default()
            };
            true
        });
        info!(phase = %self.phase(), "Session bootstrap finished");
    }

    async fn bootstrap(&self) {
        let persisted = match self.store.load() {
            Ok(persisted) => persisted,
            Err(err) => {
                error!(error = %err, "Failed to read persisted session");
                self.end_session(LogoutReason::StorageUnavailable).await;
                return;
            }
        };

        if persisted.corrupt {
            self.end_session(LogoutReason::CorruptRecord).await;
            return;
        }

        let Some(token) = persisted.token else {
            if persisted.user.is_some() {
                debug!("Dropping user record without a token");
                if let Err(err) = self.store.clear() {
                    warn!(error = %err, "Failed to clear orphaned user record");
                }
            }
            info!("No persisted session");
            return;
        };

        let Some(user) = persisted.user else {
            warn!("Persisted token has no user record");
            self.end_session(LogoutReason::CorruptRecord).await;
            return;
        };

        self.stage(user, token.clone());

        if self.validator.is_valid(&token) {
            self.activate(&token);
        } else {
            info!("Persisted token is stale; attempting refresh");
            self.refresh_session(RefreshTrigger::Bootstrap).await;
        }
    }

    /// Start a session from a fresh credential exchange
    ///
    /// Persists first; a storage failure is returned and leaves the current
    /// state untouched. On success the user is redirected to `return_to` when
    /// it is a safe local path, otherwise to the default page.
    pub fn login(
        &self,
        user: UserProfile,
        token: impl Into<String>,
        return_to: Option<&str>,
    ) -> Result<(), SessionError> {
        let token = token.into();
        let user_id = user.id;

        {
            let _guard = self.lifecycle.lock();
            self.store.save(&token, &user)?;
            self.state.send_modify(|state| {
                state.snapshot = SessionSnapshot {
                    user: Some(user),
                    token: Some(token.clone()),
                    phase: SessionPhase::Authenticated,
                };
                state.generation += 1;
            });
            self.inflight.lock().take();
        }
        info!(user_id, "User logged in");

        self.activate(&token);

        let target = post_login_target(return_to, &self.routes);
        self.navigator.redirect(&target);
        Ok(())
    }

    /// End the session at the user's request
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.end_session(LogoutReason::UserRequested).await;
    }

    /// Whether the session is usable right now
    ///
    /// Waits out the bootstrap, refreshes a stale in-memory token once and,
    /// when memory holds no session, falls back to the persisted record.
    pub async fn check_auth(&self) -> bool {
        let mut rx = self.state.subscribe();
        let Ok(snapshot) = rx
            .wait_for(|state| !state.snapshot.loading())
            .await
            .map(|state| state.snapshot.clone())
        else {
            return false;
        };

        if snapshot.is_authenticated() {
            return match snapshot.token.as_deref() {
                Some(token) if self.validator.is_valid(token) => true,
                _ => self.refresh_session(RefreshTrigger::CheckAuth).await,
            };
        }

        let persisted = match self.store.load() {
            Ok(persisted) => persisted,
            Err(err) => {
                warn!(error = %err, "Failed to read persisted session during auth check");
                return false;
            }
        };

        let (Some(token), Some(user)) = (persisted.token, persisted.user) else {
            return false;
        };

        debug!(user_id = user.id, "Adopting persisted session");
        if !self.adopt(user, token.clone()) {
            return self.is_authenticated();
        }

        if self.validator.is_valid(&token) {
            self.activate(&token);
            true
        } else {
            self.refresh_session(RefreshTrigger::CheckAuth).await
        }
    }

    /// Refresh the token, joining any attempt already in flight
    ///
    /// Returns whether the session is authenticated afterwards. A failed
    /// refresh ends the session. Without a token in memory there is nothing
    /// to refresh and the backend is not called.
    pub async fn refresh_session(&self, trigger: RefreshTrigger) -> bool {
        let flight = {
            let mut inflight = self.inflight.lock();
            match inflight.as_ref() {
                Some((id, flight)) => {
                    debug!(%trigger, flight = id, "Joining in-flight refresh");
                    flight.clone()
                }
                None => {
                    let generation = {
                        let state = self.state.borrow();
                        if state.snapshot.token.is_none() {
                            debug!(%trigger, "No session token to refresh");
                            return false;
                        }
                        state.generation
                    };
                    let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
                    let flight = Self::run_refresh(
                        self.weak_self.clone(),
                        self.backend.clone(),
                        id,
                        trigger,
                        generation,
                    )
                    .boxed()
                    .shared();
                    *inflight = Some((id, flight.clone()));
                    flight
                }
            }
        };

        flight.await
    }

    /// One refresh attempt, shared by every caller joining it
    ///
    /// Holds the manager weakly: the flight itself lives in `inflight`.
    async fn run_refresh(
        manager: Weak<Self>,
        backend: Arc<dyn SessionBackend>,
        id: u64,
        trigger: RefreshTrigger,
        generation: u64,
    ) -> bool {
        info!(%trigger, "Refreshing session token");
        let reply = backend.refresh().await;

        let Some(this) = manager.upgrade() else {
            debug!(%trigger, "Session manager dropped during refresh");
            return false;
        };

        let outcome = match reply {
            Ok(Some(token)) if !token.trim().is_empty() => this.apply_refresh(token, generation),
            Ok(_) => {
                warn!(%trigger, "Refresh endpoint returned no token");
                this.fail_refresh(generation)
            }
            Err(err) => {
                warn!(%trigger, error = %err, "Refresh request failed");
                this.fail_refresh(generation)
            }
        };

        {
            let mut inflight = this.inflight.lock();
            if inflight.as_ref().is_some_and(|(current, _)| *current == id) {
                inflight.take();
            }
        }
        outcome
    }

    fn apply_refresh(&self, token: String, generation: u64) -> bool {
        let persisted = {
            let _guard = self.lifecycle.lock();
            if self.state.borrow().generation != generation {
                debug!("Discarding refresh result from an ended session");
                return self.is_authenticated();
            }

            match self.store.save_token(&token) {
                Ok(()) => {
                    self.state.send_modify(|state| {
                        state.snapshot.token = Some(token.clone());
                        state.snapshot.phase = SessionPhase::Authenticated;
                    });
                    true
                }
                Err(err) => {
                    error!(error = %err, "Failed to persist refreshed token");
                    false
                }
            }
        };

        if !persisted {
            self.teardown(LogoutReason::StorageUnavailable, Some(generation));
            return false;
        }

        debug!("Session token refreshed");
        self.activate(&token);
        true
    }

    fn fail_refresh(&self, generation: u64) -> bool {
        if !self.teardown(LogoutReason::RefreshFailed, Some(generation)) {
            debug!("Ignoring refresh failure from an ended session");
            return self.is_authenticated();
        }
        false
    }

    /// Stop timers and the re-validation loop without touching the session
    pub fn shutdown(&self) {
        self.scheduler.cancel();
        self.stop_revalidation();
        self.inflight.lock().take();
        debug!("Session manager timers stopped");
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Put a persisted identity in memory under a new generation
    fn stage(&self, user: UserProfile, token: String) {
        let _guard = self.lifecycle.lock();
        self.state.send_modify(|state| {
            state.snapshot.user = Some(user);
            state.snapshot.token = Some(token);
            state.generation += 1;
        });
        self.inflight.lock().take();
    }

    /// Stage a persisted identity unless a session appeared meanwhile
    fn adopt(&self, user: UserProfile, token: String) -> bool {
        let _guard = self.lifecycle.lock();
        let adopted = self.state.send_if_modified(|state| {
            if state.snapshot.is_authenticated() || state.snapshot.loading() {
                return false;
            }
            state.snapshot.user = Some(user);
            state.snapshot.token = Some(token);
            state.generation += 1;
            true
        });
        if adopted {
            self.inflight.lock().take();
        }
        adopted
    }

    /// Mark the staged session authenticated and start its timers
    fn activate(&self, token: &str) {
        self.state.send_if_modified(|state| {
            if state.snapshot.phase == SessionPhase::Authenticated {
                return false;
            }
            state.snapshot.phase = SessionPhase::Authenticated;
            true
        });
        self.arm_refresh(token);
        self.start_revalidation();
    }

    fn arm_refresh(&self, token: &str) {
        let Some(remaining) = self.validator.seconds_until_expiry(token) else {
            warn!("Token expiry is unreadable; proactive refresh disabled");
            self.scheduler.cancel();
            return;
        };

        let weak = self.weak_self.clone();
        self.scheduler.schedule(remaining, async move {
            if let Some(manager) = weak.upgrade() {
                manager.refresh_session(RefreshTrigger::Scheduled).await;
            }
        });
    }

    fn start_revalidation(&self) {
        let mut slot = self.revalidation.lock();
        if slot.as_ref().is_some_and(|token| !token.is_cancelled()) {
            return;
        }

        let cancel = CancellationToken::new();
        *slot = Some(cancel.clone());

        let weak = self.weak_self.clone();
        let period = self.session.revalidate_interval();
        debug!(period_secs = period.as_secs(), "Starting session re-validation");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(manager) = weak.upgrade() else {
                    break;
                };
                manager.revalidate().await;
            }
            debug!("Session re-validation stopped");
        });
    }

    fn stop_revalidation(&self) {
        if let Some(cancel) = self.revalidation.lock().take() {
            cancel.cancel();
        }
    }

    async fn revalidate(&self) {
        if !self.is_authenticated() {
            return;
        }

        match self.store.load_token() {
            Ok(Some(token)) if self.validator.is_valid(&token) => {
                trace!("Persisted token still valid");
            }
            Ok(_) => {
                info!("Persisted token failed re-validation");
                self.refresh_session(RefreshTrigger::Revalidation).await;
            }
            Err(err) => {
                error!(error = %err, "Failed to read persisted token during re-validation");
                self.end_session(LogoutReason::StorageUnavailable).await;
            }
        }
    }

    async fn end_session(&self, reason: LogoutReason) {
        if reason == LogoutReason::UserRequested {
            if let Err(err) = self.backend.end_remote_session().await {
                warn!(error = %err, "Remote logout failed; clearing local session anyway");
            }
        }
        self.teardown(reason, None);
    }

    /// The single path by which a session dies
    ///
    /// With `expected` set, nothing happens unless the session is still on
    /// that generation. Returns whether the teardown ran.
    fn teardown(&self, reason: LogoutReason, expected: Option<u64>) -> bool {
        {
            let _guard = self.lifecycle.lock();
            if expected.is_some_and(|generation| generation != self.state.borrow().generation) {
                return false;
            }

            self.scheduler.cancel();
            self.stop_revalidation();

            if let Err(err) = self.store.clear() {
                error!(error = %err, "Failed to clear persisted session");
            }

            self.state.send_modify(|state| {
                state.snapshot = SessionSnapshot {
                    phase: SessionPhase::Unauthenticated,
                    ..SessionSnapshot::default()
                };
                state.generation += 1;
            });
            self.inflight.lock().take();
        }
        info!(%reason, "Session ended");

        if reason.notifies() {
            self.notifier.notify(Notice::error(SESSION_EXPIRED_NOTICE));
        }

        let target = login_redirect(&self.navigator.current_path(), &self.routes);
        self.navigator.redirect(&target);
        true
    }
}

impl Drop for AuthSessionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AuthSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionManager")
            .field("state", &*self.state.borrow())
            .field("refresh_armed", &self.scheduler.is_armed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_refresh_failure_notifies() {
        assert!(LogoutReason::RefreshFailed.notifies());
        assert!(!LogoutReason::UserRequested.notifies());
        assert!(!LogoutReason::CorruptRecord.notifies());
        assert!(!LogoutReason::StorageUnavailable.notifies());
    }

    #[test]
    fn test_trigger_names_are_log_friendly() {
        assert_eq!(RefreshTrigger::CheckAuth.to_string(), "check_auth");
        assert_eq!("scheduled".parse::<RefreshTrigger>().unwrap(), RefreshTrigger::Scheduled);
    }

    #[test]
    fn test_default_state_is_uninitialized() {
        let state = SessionState::default();
        assert_eq!(state.snapshot.phase, SessionPhase::Uninitialized);
        assert_eq!(state.generation(), 0);
    }
}
