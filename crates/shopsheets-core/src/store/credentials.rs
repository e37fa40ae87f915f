use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

use crate::config::{API_KEY_ENV, APP_NAME};

/// Keychain account holding the Sheets API key.
const API_KEY_ENTRY: &str = "googleSheetsApiKey";

pub struct ApiKeyStore;

impl ApiKeyStore {
    fn entry() -> Result<Entry> {
        Entry::new(APP_NAME, API_KEY_ENTRY).context("Failed to create keyring entry")
    }

    /// Store the Sheets API key in the OS keychain
    pub fn store(api_key: &str) -> Result<()> {
        Self::entry()?
            .set_password(api_key.trim())
            .context("Failed to store API key in keychain")?;
        Ok(())
    }

    pub fn get() -> Result<String> {
        Self::entry()?
            .get_password()
            .context("Failed to retrieve API key from keychain")
    }

    pub fn delete() -> Result<()> {
        Self::entry()?
            .delete_credential()
            .context("Failed to delete API key from keychain")?;
        Ok(())
    }

    /// The environment variable wins over the keychain.
    pub fn resolve() -> Option<String> {
        Self::pick(std::env::var(API_KEY_ENV).ok(), || Self::get().ok())
    }

    fn pick(env_value: Option<String>, stored: impl FnOnce() -> Option<String>) -> Option<String> {
        match env_value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(key) => {
                debug!("Using Sheets API key from environment");
                Some(key)
            }
            None => stored().filter(|k| !k.is_empty()),
        }
    }
}
