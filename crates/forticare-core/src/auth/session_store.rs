use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::session::Session;

/// Application name used for the cache directory path
const APP_NAME: &str = "forticare";

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Bearer token saved between runs, bound to the API user that obtained it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub api_user: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(api_user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_user: api_user.into(),
            token: token.into(),
            created_at: Utc::now(),
        }
    }
}

/// On-disk copy of the last token, so a new process can reuse it.
///
/// There is no expiry check: a token the server no longer accepts is
/// handled like any other rejected token.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(SESSION_FILE),
        }
    }

    /// Store under `<cache_dir>/forticare/`
    pub fn default_location() -> Result<Self> {
        let cache_dir =
            dirs::cache_dir().ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(Self::new(cache_dir.join(APP_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved session of `api_user`, if any
    pub fn load(&self, api_user: &str) -> Result<Option<SessionData>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        if data.api_user != api_user {
            debug!(saved = %data.api_user, api_user, "Saved session belongs to another user");
            return Ok(None);
        }
        Ok(Some(data))
    }

    pub fn save(&self, data: &SessionData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    /// Put the saved token of the session's user into `session`.
    ///
    /// Returns whether a token was restored.
    pub fn restore(&self, session: &mut Session) -> Result<bool> {
        match self.load(session.user())? {
            Some(data) => {
                session.set_token(data.token);
                Ok(session.has_token())
            }
            None => Ok(false),
        }
    }

    /// Save the session's current token; a session without one is skipped.
    pub fn persist(&self, session: &Session) -> Result<()> {
        match session.token() {
            Some(token) => self.save(&SessionData::new(session.user(), token)),
            None => Ok(()),
        }
    }
}
