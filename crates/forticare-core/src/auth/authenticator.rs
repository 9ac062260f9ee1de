//! OAuth password-grant exchange for FortiCare API users.
//!
//! The token endpoint lives on a different host than the registration API
//! and is only used to obtain a bearer token.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::session::Session;
use crate::api::error::{ApiError, Result};

/// OAuth token endpoint used for login only
pub const DEFAULT_OAUTH_URL: &str = "https://customerapiauth.fortinet.com/api/v1/oauth/token/";

/// Client identifier the API expects for password grants
pub const DEFAULT_CLIENT_ID: &str = "flexvm";

/// Result of one authentication attempt.
///
/// Expected failures are values, not errors. Only transport failures surface
/// as `Err` from [`Authenticator::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success(String),
    /// User or secret empty after falling back to the session; no request made.
    MissingCredentials,
    /// The token endpoint answered 400 or 401.
    InvalidCredentials { status: u16, description: String },
    /// Any other non-2xx answer. Must be surfaced to the caller.
    ServerError { status: u16, description: String },
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success(_))
    }

    /// Convert into the token or the matching error.
    pub fn into_token(self) -> Result<String> {
        match self {
            AuthOutcome::Success(token) => Ok(token),
            AuthOutcome::MissingCredentials => Err(ApiError::Configuration(
                "API user or API key is missing".to_string(),
            )),
            AuthOutcome::InvalidCredentials { status, description } => {
                Err(ApiError::Authentication { status, description })
            }
            AuthOutcome::ServerError { status, description } => Err(ApiError::Http {
                status,
                message: format!("POST oauth token {}", description),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    username: &'a str,
    password: &'a str,
    client_id: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct OAuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
}

fn error_description(text: &str) -> String {
    serde_json::from_str::<OAuthErrorBody>(text)
        .ok()
        .and_then(|body| body.error_description)
        .unwrap_or_default()
}

/// Exchanges API user and key for a bearer token.
/// Clone is cheap - reqwest::Client uses Arc internally.
#[derive(Debug, Clone)]
pub struct Authenticator {
    client: Client,
    token_url: String,
    client_id: String,
}

impl Authenticator {
    pub fn new(client: Client, token_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Retrieve a new token and store it in `session`.
    ///
    /// Empty `user`/`secret` fall back to the values held by the session.
    /// A failed attempt leaves the previous token untouched.
    pub async fn authenticate(&self, session: &mut Session, user: &str, secret: &str) -> Result<AuthOutcome> {
        let Some((user, secret)) = session.resolve_credentials(user, secret) else {
            error!("API user or API key is missing");
            return Ok(AuthOutcome::MissingCredentials);
        };

        let grant = PasswordGrant {
            username: &user,
            password: &secret,
            client_id: &self.client_id,
            grant_type: "password",
        };

        info!(user = %user, "Retrieving API token");
        let response = self
            .client
            .post(&self.token_url)
            .json(&grant)
            .timeout(session.timeout())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(status = %status, "Token response received");

        if status.is_success() {
            let token: TokenResponse = serde_json::from_str(&text).map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse token response: {}", e))
            })?;
            if token.access_token.is_empty() {
                return Err(ApiError::InvalidResponse(
                    "Token response carried an empty access_token".to_string(),
                ));
            }
            session.set_token(token.access_token.clone());
            return Ok(AuthOutcome::Success(token.access_token));
        }

        let description = error_description(&text);
        match status.as_u16() {
            code @ (400 | 401) => {
                error!(status = code, "Invalid credentials, or user improperly configured");
                Ok(AuthOutcome::InvalidCredentials { status: code, description })
            }
            code => {
                error!(status = code, description = %description, "Token endpoint returned an error");
                Ok(AuthOutcome::ServerError { status: code, description })
            }
        }
    }
}
