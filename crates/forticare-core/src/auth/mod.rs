//! Authentication module for FortiCare API users.
//!
//! This module provides:
//! - `Session`: user, key, bearer token and login policy for one client
//! - `Authenticator`: OAuth password-grant exchange producing `AuthOutcome`
//! - `CredentialStore`: OS keychain storage for API keys
//! - `SessionStore`: the last token, saved between runs
//!
//! Tokens are obtained lazily and refreshed only after the server rejects them.

pub mod authenticator;
pub mod credentials;
pub mod session;
pub mod session_store;

pub use authenticator::{AuthOutcome, Authenticator, DEFAULT_CLIENT_ID, DEFAULT_OAUTH_URL};
pub use credentials::CredentialStore;
pub use session::{Session, DEFAULT_TIMEOUT_SECS};
pub use session_store::{SessionData, SessionStore};
