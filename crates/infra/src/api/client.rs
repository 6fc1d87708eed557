//! Portal API client
//!
//! Attaches the session's bearer token to every call. When the backend
//! answers 401 to a request that carried a token, the client asks the token
//! provider for a renewed token and retries that request exactly once. Calls
//! to the refresh endpoint itself are never retried.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use taxdesk_domain::ApiConfig;
use tracing::{debug, info, instrument, warn};

use super::auth::AccessTokenProvider;
use super::errors::ApiError;

/// API client with session-aware authentication
pub struct ApiClient {
    http: Client,
    auth: Arc<dyn AccessTokenProvider>,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the HTTP client cannot be built.
    pub fn new(config: ApiConfig, auth: Arc<dyn AccessTokenProvider>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, auth, config })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, None).await?;
        let result = Self::decode(response).await?;
        info!(path = %path, "GET request successful");
        Ok(result)
    }

    /// Execute a POST request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Client(format!("Failed to serialize body: {e}")))?;
        let response = self.execute(Method::POST, path, Some(body)).await?;
        let result = Self::decode(response).await?;
        info!(path = %path, "POST request successful");
        Ok(result)
    }

    /// Execute a PUT request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn put<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Client(format!("Failed to serialize body: {e}")))?;
        let response = self.execute(Method::PUT, path, Some(body)).await?;
        Self::decode(response).await
    }

    /// Execute a DELETE request, ignoring any response body
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Send a request, renewing the token once on 401
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, ApiError> {
        let url = self.config.endpoint(path);
        let token = self.auth.access_token().await;

        debug!(%method, url = %url, authenticated = token.is_some(), "API request");
        let first = self.request(&method, &url, token.as_deref(), body.as_ref());
        let response = self.send(first).await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED
            && token.is_some()
            && !self.is_refresh_path(path)
        {
            debug!(url = %url, "Request unauthorized; renewing token");
            match self.auth.refresh_access_token().await {
                Some(renewed) => {
                    let retry = self.request(&method, &url, Some(&renewed), body.as_ref());
                    self.send(retry).await?
                }
                None => {
                    warn!(url = %url, "Token renewal failed");
                    response
                }
            }
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &url, &body));
        }

        Ok(response)
    }

    fn request(
        &self,
        method: &Method,
        url: &str,
        token: Option<&str>,
        body: Option<&serde_json::Value>,
    ) -> RequestBuilder {
        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        request.send().await.map_err(|e| ApiError::from_transport(&e, self.config.timeout()))
    }

    fn is_refresh_path(&self, path: &str) -> bool {
        path.trim_start_matches('/') == self.config.refresh_path.trim_start_matches('/')
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();

        // 204/205 have no body
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                ApiError::Client(format!(
                    "No content response ({}), but response type cannot be deserialized from empty body",
                    status.as_u16()
                ))
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Client(format!("Failed to parse response: {e}")))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.config.base_url).finish_non_exhaustive()
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiConfig>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the authentication provider
    pub fn auth(mut self, auth: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Override the configured request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let mut config = self.config.unwrap_or_default();
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout.as_secs().max(1);
        }
        let auth =
            self.auth.ok_or_else(|| ApiError::Config("Auth provider not set".to_string()))?;

        ApiClient::new(config, auth)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    struct MockAuthProvider {
        token: Mutex<Option<String>>,
        renewed: Option<String>,
        refreshes: AtomicUsize,
    }

    impl MockAuthProvider {
        fn new(token: Option<&str>, renewed: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                token: Mutex::new(token.map(str::to_string)),
                renewed: renewed.map(str::to_string),
                refreshes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AccessTokenProvider for MockAuthProvider {
        async fn access_token(&self) -> Option<String> {
            self.token.lock().clone()
        }

        async fn refresh_access_token(&self) -> Option<String> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            let renewed = self.renewed.clone();
            *self.token.lock() = renewed.clone();
            renewed
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Booking {
        id: u64,
    }

    fn client(server: &MockServer, auth: Arc<MockAuthProvider>) -> ApiClient {
        let config = ApiConfig { base_url: format!("{}/api", server.uri()), ..ApiConfig::default() };
        ApiClient::builder().config(config).auth(auth).build().unwrap()
    }

    #[tokio::test]
    async fn test_get_attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bookings/7"))
            .and(header("Authorization", "Bearer current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let auth = MockAuthProvider::new(Some("current"), None);
        let booking: Booking = client(&server, auth).get("/bookings/7").await.unwrap();

        assert_eq!(booking, Booking { id: 7 });
    }

    #[tokio::test]
    async fn test_unauthorized_renews_once_and_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bookings/7"))
            .and(header("Authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/bookings/7"))
            .and(header("Authorization", "Bearer renewed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let auth = MockAuthProvider::new(Some("stale"), Some("renewed"));
        let booking: Booking = client(&server, auth.clone()).get("/bookings/7").await.unwrap();

        assert_eq!(booking.id, 7);
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bookings/7"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "Not allowed"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let auth = MockAuthProvider::new(Some("stale"), Some("renewed"));
        let result: Result<Booking, _> = client(&server, auth.clone()).get("/bookings/7").await;

        assert!(matches!(result, Err(ApiError::Auth(ref msg)) if msg.ends_with("Not allowed")));
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_renewal_returns_original_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bookings/7"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let auth = MockAuthProvider::new(Some("stale"), None);
        let result: Result<Booking, _> = client(&server, auth.clone()).get("/bookings/7").await;

        assert!(matches!(result, Err(ApiError::Auth(_))));
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_anonymous_unauthorized_is_not_renewed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bookings/7"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let auth = MockAuthProvider::new(None, Some("renewed"));
        let result: Result<Booking, _> = client(&server, auth.clone()).get("/bookings/7").await;

        assert!(matches!(result, Err(ApiError::Auth(_))));
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_endpoint_is_never_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh-token"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let auth = MockAuthProvider::new(Some("stale"), Some("renewed"));
        let result: Result<serde_json::Value, _> = client(&server, auth.clone())
            .post("/auth/refresh-token", &serde_json::json!({}))
            .await;

        assert!(matches!(result, Err(ApiError::Auth(_))));
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_post_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/appointments"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let auth = MockAuthProvider::new(Some("current"), None);
        let result: Option<Booking> = client(&server, auth)
            .post("/appointments", &serde_json::json!({"slot": "09:00"}))
            .await
            .unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_client_error_uses_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/payment"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "error": "Card declined"
            })))
            .mount(&server)
            .await;

        let auth = MockAuthProvider::new(Some("current"), None);
        let result: Result<serde_json::Value, _> =
            client(&server, auth).post("/payment", &serde_json::json!({})).await;

        assert!(matches!(result, Err(ApiError::Client(ref msg)) if msg.ends_with("Card declined")));
    }

    #[tokio::test]
    async fn test_builder_requires_auth() {
        let result = ApiClient::builder().config(ApiConfig::default()).build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }
}
