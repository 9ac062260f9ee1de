use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "forticare";

/// API keys kept in the OS keychain, one entry per API user.
pub struct CredentialStore;

impl CredentialStore {
    fn entry(api_user: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, api_user).context("Failed to create keyring entry")
    }

    /// Store the API key for an API user in the OS keychain
    pub fn store(api_user: &str, api_key: &str) -> Result<()> {
        Self::entry(api_user)?
            .set_password(api_key)
            .context("Failed to store API key in keychain")
    }

    /// Whether a key is stored for `api_user`; keychain failures are errors
    pub fn has_api_key(api_user: &str) -> Result<bool> {
        match Self::entry(api_user)?.get_password() {
            Ok(_) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e).context("Failed to read keychain"),
        }
    }

    /// Retrieve the API key for an API user from the OS keychain
    pub fn get_api_key(api_user: &str) -> Result<String> {
        Self::entry(api_user)?
            .get_password()
            .with_context(|| format!("No API key stored for {}", api_user))
    }

    /// Delete the stored API key; returns `false` when none was stored
    pub fn delete(api_user: &str) -> Result<bool> {
        match Self::entry(api_user)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e).context("Failed to delete API key from keychain"),
        }
    }
}
