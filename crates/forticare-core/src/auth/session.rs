use std::fmt;
use std::time::Duration;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Credential and token state for one client.
///
/// The token is either absent or the non-empty bearer string returned by the
/// last successful authentication. A stale token is kept until the server
/// rejects it; nothing refreshes it in the background.
///
/// A session is owned by exactly one `ApiClient` and mutated through
/// `&mut` access only. Sharing it between tasks needs external locking.
#[derive(Clone)]
pub struct Session {
    user: String,
    secret: String,
    token: Option<String>,
    auto_login: bool,
    timeout: Duration,
}

impl Session {
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: secret.into(),
            token: None,
            auto_login: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_auto_login(mut self, auto_login: bool) -> Self {
        self.auto_login = auto_login;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn set_user(&mut self, user: impl Into<String>) {
        self.user = user.into();
    }

    pub fn set_secret(&mut self, secret: impl Into<String>) {
        self.secret = secret.into();
    }

    /// Get the bearer token if one is held
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Replace the bearer token. An empty string clears it.
    pub fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn auto_login(&self) -> bool {
        self.auto_login
    }

    pub fn set_auto_login(&mut self, auto_login: bool) {
        self.auto_login = auto_login;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Merge explicit credentials into the session.
    ///
    /// Non-empty arguments replace the stored values; empty ones fall back to
    /// them. Returns `None` when either value is still empty afterwards.
    pub(crate) fn resolve_credentials(&mut self, user: &str, secret: &str) -> Option<(String, String)> {
        if !user.is_empty() {
            self.user = user.to_string();
        }
        if !secret.is_empty() {
            self.secret = secret.to_string();
        }
        if self.user.is_empty() || self.secret.is_empty() {
            return None;
        }
        Some((self.user.clone(), self.secret.clone()))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("secret", &"[REDACTED]")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("auto_login", &self.auto_login)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FortiCare: logged with {}", self.user)
    }
}
