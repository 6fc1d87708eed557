//! Assembly of the session lifecycle from configuration

use std::sync::Arc;

use taxdesk_core::{AuthSessionManager, Navigator, Notifier, SessionStore};
use taxdesk_domain::{Config, Result};
use tracing::info;

use crate::api::{ApiClient, HttpSessionBackend};
use crate::storage::open_backend;

/// Session manager and API client sharing one session store
#[derive(Debug)]
pub struct PortalSession {
    pub manager: Arc<AuthSessionManager>,
    pub api: ApiClient,
    pub store: Arc<SessionStore>,
}

impl PortalSession {
    /// Wire storage, the HTTP backend, the manager and the API client
    ///
    /// Does not restore the persisted session; call
    /// [`AuthSessionManager::initialize`] once the UI can navigate.
    ///
    /// # Errors
    ///
    /// Returns `TaxDeskError::Storage` if storage cannot be opened and
    /// `TaxDeskError::Config` if an HTTP client cannot be built.
    pub fn connect(
        config: &Config,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let storage = open_backend(&config.storage)?;
        let store = Arc::new(SessionStore::with_keys(storage, &config.session));

        let backend = Arc::new(HttpSessionBackend::new(config.api.clone(), store.clone())?);
        let manager = AuthSessionManager::builder(backend, store.clone(), navigator, notifier)
            .session_config(config.session.clone())
            .routes(config.routes.clone())
            .build();

        let api = ApiClient::builder().config(config.api.clone()).auth(manager.clone()).build()?;

        info!(
            base_url = %config.api.base_url,
            storage = %config.storage.backend,
            "Portal session wired"
        );
        Ok(Self { manager, api, store })
    }
}
