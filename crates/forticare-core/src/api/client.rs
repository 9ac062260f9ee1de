//! API client for the FortiCare asset management REST API.
//!
//! `ApiClient` owns the `Session` and turns every logical operation into at
//! most two authenticated POSTs: the first with the current token, and a
//! single retry after re-authentication when the server reports the token as
//! invalid, expired or missing.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument, Span};

use super::error::{ApiError, Result};
use super::response::{classify, RequestOutcome};
use crate::auth::{AuthOutcome, Authenticator, Session, DEFAULT_CLIENT_ID, DEFAULT_OAUTH_URL, DEFAULT_TIMEOUT_SECS};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the registration API
pub const DEFAULT_API_URL: &str = "https://support.fortinet.com/ES/api/registration/v3";

/// Physical attempts per logical call: the original send plus one retry
/// after re-authentication.
const MAX_ATTEMPTS: u32 = 2;

/// Endpoints and timeouts used to build an `ApiClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub oauth_url: String,
    pub client_id: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// API client for FortiCare.
///
/// Operations take `&mut self`: the session token may be replaced during a
/// call, so one client serves one logical caller at a time.
pub struct ApiClient {
    client: Client,
    authenticator: Authenticator,
    session: Session,
    base_url: String,
    span: Span,
}

impl ApiClient {
    /// Create a client with default endpoints and auto-login disabled
    pub fn new(api_user: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::builder().credentials(api_user, api_key).build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticate and store the token in the session.
    ///
    /// Empty arguments fall back to the credentials already held.
    pub async fn authenticate(&mut self, api_user: &str, api_key: &str) -> Result<AuthOutcome> {
        let span = self.span.clone();
        self.authenticator
            .authenticate(&mut self.session, api_user, api_key)
            .instrument(span)
            .await
    }

    /// Retrieve a new token.
    ///
    /// Returns `false` for missing or rejected credentials. Any other
    /// failure of the token endpoint is an error.
    pub async fn login(&mut self, api_user: &str, api_key: &str) -> Result<bool> {
        match self.authenticate(api_user, api_key).await? {
            AuthOutcome::Success(_) => Ok(true),
            AuthOutcome::MissingCredentials | AuthOutcome::InvalidCredentials { .. } => Ok(false),
            outcome @ AuthOutcome::ServerError { .. } => outcome.into_token().map(|_| false),
        }
    }

    /// POST `body` to `endpoint` and return the parsed success body.
    ///
    /// A token rejected with one of the known token messages is refreshed
    /// once when auto-login is enabled; the request is then sent exactly one
    /// more time. Every other failure is returned as is.
    pub async fn execute(&mut self, endpoint: &str, body: &Value) -> Result<Value> {
        let span = self.span.clone();
        self.execute_inner(endpoint, body).instrument(span).await
    }

    async fn execute_inner(&mut self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut token = self.ensure_token().await?;
        let mut attempt = 1;

        loop {
            debug!(endpoint, attempt, body = %body, "POST");
            let (status, text) = self.send(&url, &token, body).await?;

            match classify(status, &text)? {
                RequestOutcome::Success(value) => {
                    debug!(endpoint, status = status.as_u16(), "Request succeeded");
                    return Ok(value);
                }
                RequestOutcome::SessionExpired { status, message } => {
                    let message = format!("POST {} {}", endpoint, message);
                    if !self.session.auto_login() {
                        warn!(endpoint, status, "Token rejected and auto-login is disabled");
                        return Err(ApiError::SessionExpired { status, message });
                    }
                    if attempt >= MAX_ATTEMPTS {
                        warn!(endpoint, status, "Refreshed token rejected, giving up");
                        return Err(ApiError::SessionExpired { status, message });
                    }
                    info!(endpoint, status, "Token rejected, re-authenticating");
                    token = self.reauthenticate().await?;
                    attempt += 1;
                }
                RequestOutcome::Failed { status, message } => {
                    debug!(endpoint, status, response = %ApiError::truncate_body(&text), "Request failed");
                    return Err(ApiError::Http {
                        status,
                        message: format!("POST {} {}", endpoint, message),
                    });
                }
            }
        }
    }

    /// Current token, logging in first when allowed.
    async fn ensure_token(&mut self) -> Result<String> {
        if let Some(token) = self.session.token() {
            return Ok(token.to_string());
        }
        if !self.session.auto_login() {
            return Err(ApiError::Configuration(
                "Token is missing. Please login first.".to_string(),
            ));
        }
        info!("No token held, logging in");
        self.reauthenticate().await
    }

    async fn reauthenticate(&mut self) -> Result<String> {
        self.authenticator
            .authenticate(&mut self.session, "", "")
            .await?
            .into_token()
    }

    fn auth_headers(token: &str) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        let value = header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ApiError::Configuration("Token contains characters not allowed in a header".to_string())
        })?;
        headers.insert(header::AUTHORIZATION, value);
        Ok(headers)
    }

    /// One physical request; transport errors propagate unchanged.
    async fn send(&self, url: &str, token: &str, body: &Value) -> Result<(StatusCode, String)> {
        let response = self
            .client
            .post(url)
            .headers(Self::auth_headers(token)?)
            .json(body)
            .timeout(self.session.timeout())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }
}

/// Builder for `ApiClient`
#[derive(Default)]
pub struct ApiClientBuilder {
    config: ClientConfig,
    api_user: String,
    api_key: String,
    auto_login: bool,
    span: Option<Span>,
}

impl ApiClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn oauth_url(mut self, url: impl Into<String>) -> Self {
        self.config.oauth_url = url.into();
        self
    }

    pub fn credentials(mut self, api_user: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.api_user = api_user.into();
        self.api_key = api_key.into();
        self
    }

    pub fn auto_login(mut self, auto_login: bool) -> Self {
        self.auto_login = auto_login;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Span every request and authentication event of the client is logged in
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let client = Client::builder().build()?;
        let base_url = self.config.base_url.trim_end_matches('/').to_string();
        let authenticator = Authenticator::new(client.clone(), self.config.oauth_url, self.config.client_id);
        let session = Session::new(self.api_user, self.api_key)
            .with_auto_login(self.auto_login)
            .with_timeout(self.config.timeout);
        let span = self
            .span
            .unwrap_or_else(|| info_span!("forticare", user = %session.user()));

        Ok(ApiClient {
            client,
            authenticator,
            session,
            base_url,
            span,
        })
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::test_support::{api_path, client, TOKEN_PATH};
    use super::*;

    fn expired(message: &str) -> Value {
        json!({
            "build": "1.0.0",
            "error": { "errorCode": 201, "message": message },
            "message": "Invalid incoming request.",
            "status": -1,
            "version": "3.0",
            "assets": null
        })
    }

    async fn mount_token(server: &MockServer, token: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": token })))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_success_sends_bearer_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path("/products/list")))
            .and(header("Authorization", "Bearer current"))
            .and(body_json(json!({"status": "Registered"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0, "assets": []})))
            .expect(1)
            .mount(&server)
            .await;
        mount_token(&server, "unused", 0).await;

        let mut api = client(&server, true, Some("current"));
        let body = api
            .execute("/products/list", &json!({"status": "Registered"}))
            .await
            .unwrap();
        assert_eq!(body["assets"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_token_without_auto_login_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let mut api = client(&server, false, None);
        let err = api.execute("/products/list", &json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_missing_token_with_auto_login_logs_in_first() {
        let server = MockServer::start().await;
        mount_token(&server, "fresh", 1).await;
        Mock::given(method("POST"))
            .and(path(api_path("/products/details")))
            .and(header("Authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"assetDetails": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let mut api = client(&server, true, None);
        api.execute("/products/details", &json!({})).await.unwrap();
        assert_eq!(api.session().token(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_login_failure_during_auto_login_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid credentials given."
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(api_path("/products/list")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let mut api = client(&server, true, None);
        let err = api.execute("/products/list", &json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::Authentication { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path("/products/list")))
            .and(header("Authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401).set_body_json(expired("Invalid security token.")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(api_path("/products/list")))
            .and(header("Authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0, "assets": []})))
            .expect(1)
            .mount(&server)
            .await;
        mount_token(&server, "fresh", 1).await;

        let mut api = client(&server, true, Some("stale"));
        let body = api.execute("/products/list", &json!({})).await.unwrap();

        assert_eq!(body["status"], json!(0));
        assert_eq!(api.session().token(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_failed_refresh_is_returned_and_keeps_old_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path("/products/list")))
            .and(header("Authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401).set_body_json(expired("Invalid security token.")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "bad"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut api = client(&server, true, Some("stale"));
        let err = api.execute("/products/list", &json!({})).await.unwrap_err();

        match err {
            ApiError::Authentication { status, description } => {
                assert_eq!(status, 401);
                assert_eq!(description, "bad");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(api.session().token(), Some("stale"));
    }

    #[tokio::test]
    async fn test_expired_token_without_auto_login_fails_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path("/products/list")))
            .respond_with(ResponseTemplate::new(401).set_body_json(expired("Invalid security token.")))
            .expect(1)
            .mount(&server)
            .await;
        mount_token(&server, "fresh", 0).await;

        let mut api = client(&server, false, Some("stale"));
        let err = api.execute("/products/list", &json!({})).await.unwrap_err();

        match err {
            ApiError::SessionExpired { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "POST /products/list Invalid security token.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(api.session().token(), Some("stale"));
    }

    #[tokio::test]
    async fn test_refreshed_token_still_rejected_stops_after_one_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path("/licenses/list")))
            .respond_with(ResponseTemplate::new(403).set_body_json(expired(
                "Access denied. No permission to access the requested action or resource.",
            )))
            .expect(2)
            .mount(&server)
            .await;
        mount_token(&server, "fresh", 1).await;

        let mut api = client(&server, true, Some("stale"));
        let err = api.execute("/licenses/list", &json!({})).await.unwrap_err();

        assert!(matches!(err, ApiError::SessionExpired { status: 403, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_other_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path("/products/register")))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "build": "1.0.0",
                "error": {
                    "errorCode": 302,
                    "message": "FG40FTK190001XXX | Product-> FortiCloud Key is Required."
                },
                "message": "Invalid incoming request.",
                "status": -1,
                "assets": null
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_token(&server, "fresh", 0).await;

        let mut api = client(&server, true, Some("current"));
        let err = api.execute("/products/register", &json!({})).await.unwrap_err();

        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(
                    message,
                    "POST /products/register FG40FTK190001XXX | Product-> FortiCloud Key is Required."
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let mut api = client(&server, true, Some("current"));
        let err = api.execute("/products/list", &json!({})).await.unwrap_err();
        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, 502);
                assert!(message.contains("Bad Gateway"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        let mut api = client(&server, false, Some("current"));
        let err = api.execute("/products/list", &json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_login_returns_false_for_bad_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid credentials given."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut api = client(&server, false, None);
        assert!(!api.login("u", "bad").await.unwrap());
        assert!(!api.session().has_token());
        assert_eq!(api.session().user(), "u");
    }

    #[tokio::test]
    async fn test_login_surfaces_token_endpoint_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let mut api = client(&server, false, None);
        let err = api.login("", "").await.unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }

    #[test]
    fn test_builder_defaults() {
        let api = ApiClient::new("api-user", "api-key").unwrap();
        assert_eq!(api.base_url(), DEFAULT_API_URL);
        assert!(!api.session().auto_login());
        assert_eq!(api.session().timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let api = ApiClient::builder()
            .base_url("http://localhost:8080/api/")
            .build()
            .unwrap();
        assert_eq!(api.base_url(), "http://localhost:8080/api");
    }
}
