use anyhow::{anyhow, Result};
use keyring::Entry;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const SERVICE_NAME: &str = "heycli";
const KEYRING_USER: &str = "openai";

/// OpenAI API key storage in the OS keyring
#[derive(Debug, Clone)]
pub struct ApiKeyManager {
    service_name: String,
}

impl ApiKeyManager {
    pub fn new() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service_name, KEYRING_USER).map_err(|e| anyhow!("keyring unavailable: {}", e))
    }

    pub fn set_key(&self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(anyhow!("API key cannot be empty"));
        }
        self.entry()?
            .set_password(api_key)
            .map_err(|e| anyhow!("could not store API key in keyring: {}", e))
    }

    pub fn get_key(&self) -> Result<String> {
        self.entry()?
            .get_password()
            .map_err(|_| anyhow!("No API key found in keyring for {}", self.service_name))
    }

    pub fn remove_key(&self) -> Result<()> {
        self.entry()?
            .delete_password()
            .map_err(|e| anyhow!("could not remove API key from keyring: {}", e))
    }

    /// The key to use: `OPENAI_API_KEY` if set and non-blank, else the keyring
    pub fn resolve(&self) -> Option<String> {
        key_from_env_value(std::env::var(API_KEY_ENV).ok()).or_else(|| self.get_key().ok())
    }
}

impl Default for ApiKeyManager {
    fn default() -> Self {
        Self::new()
    }
}

fn key_from_env_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
