//! HTTP implementation of the session backend port
//!
//! Refresh is `POST {base}/auth/refresh-token` with an empty JSON body and
//! the stored bearer token; a successful response carries `{"token": "..."}`.
//! Logout is `POST {base}/auth/logout`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use taxdesk_core::{SessionBackend, SessionError, SessionStore};
use taxdesk_domain::ApiConfig;
use tracing::{debug, instrument, warn};

use super::errors::ApiError;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Session backend talking to the portal API
pub struct HttpSessionBackend {
    client: Client,
    config: ApiConfig,
    store: Arc<SessionStore>,
}

impl HttpSessionBackend {
    /// Create a backend with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the HTTP client cannot be built.
    pub fn new(config: ApiConfig, store: Arc<SessionStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config, store))
    }

    /// Create a backend sharing an existing HTTP client
    pub fn with_client(client: Client, config: ApiConfig, store: Arc<SessionStore>) -> Self {
        Self { client, config, store }
    }

    fn stored_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.store.load_token()?)
    }
}

#[async_trait]
impl SessionBackend for HttpSessionBackend {
    #[instrument(skip(self))]
    async fn refresh(&self) -> Result<Option<String>, SessionError> {
        let Some(token) = self.stored_token()? else {
            debug!("No stored token; skipping refresh request");
            return Ok(None);
        };

        let url = self.config.endpoint(&self.config.refresh_path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| SessionError::from(ApiError::from_transport(&e, self.config.timeout())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status, &url, &body);
            warn!(%status, error = %err, "Refresh rejected");
            return Ok(None);
        }

        match response.json::<RefreshResponse>().await {
            Ok(RefreshResponse { token: Some(token) }) if !token.trim().is_empty() => {
                debug!("Refresh endpoint issued a new token");
                Ok(Some(token))
            }
            Ok(_) => {
                warn!("Refresh response carried no token");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Refresh response was not valid JSON");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn end_remote_session(&self) -> Result<(), SessionError> {
        let url = self.config.endpoint(&self.config.logout_path);
        let mut request = self.client.post(&url).json(&serde_json::json!({}));
        if let Some(token) = self.stored_token()? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            let err = ApiError::from_transport(&e, self.config.timeout());
            SessionError::RemoteLogout(err.to_string())
        })?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            debug!(%status, "Remote session ended");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SessionError::RemoteLogout(ApiError::from_status(status, &url, &body).to_string()))
    }
}

impl std::fmt::Debug for HttpSessionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSessionBackend")
            .field("base_url", &self.config.base_url)
            .field("refresh_path", &self.config.refresh_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use taxdesk_core::MemoryStorage;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn backend(server: &MockServer, token: Option<&str>) -> HttpSessionBackend {
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        if let Some(token) = token {
            store.save_token(token).unwrap();
        }
        let config = ApiConfig { base_url: format!("{}/api", server.uri()), ..ApiConfig::default() };
        HttpSessionBackend::new(config, store).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_posts_stored_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh-token"))
            .and(header("Authorization", "Bearer stale"))
            .and(body_json(serde_json::json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "fresh"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = backend(&server, Some("stale")).refresh().await.unwrap();
        assert_eq!(token.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_refresh_without_stored_token_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let token = backend(&server, None).refresh().await.unwrap();
        assert_eq!(token, None);
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_not_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh-token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "Refresh token expired"
            })))
            .mount(&server)
            .await;

        let token = backend(&server, Some("stale")).refresh().await.unwrap();
        assert_eq!(token, None);
    }

    #[tokio::test]
    async fn test_refresh_without_token_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "ok"
            })))
            .mount(&server)
            .await;

        let token = backend(&server, Some("stale")).refresh().await.unwrap();
        assert_eq!(token, None);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        store.save_token("stale").unwrap();
        let config =
            ApiConfig { base_url: format!("http://127.0.0.1:{port}/api"), ..ApiConfig::default() };
        let backend = HttpSessionBackend::new(config, store).unwrap();

        let result = backend.refresh().await;
        assert!(matches!(result, Err(SessionError::Transport(_))));
    }

    #[tokio::test]
    async fn test_end_remote_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .and(header("Authorization", "Bearer current"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server, Some("current")).end_remote_session().await.unwrap();
    }

    #[tokio::test]
    async fn test_end_remote_session_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = backend(&server, Some("current")).end_remote_session().await;
        assert!(matches!(result, Err(SessionError::RemoteLogout(_))));
    }
}
