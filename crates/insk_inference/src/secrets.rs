//! Local secrets store: a TOML file with a `[google]` table.
//!
//! ```toml
//! [google]
//! api_key = "..."
//! ```

use std::path::Path;

use insk_core::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info};

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub google: Option<GoogleSecrets>,
}

#[derive(Clone, Default, Deserialize)]
pub struct GoogleSecrets {
    pub api_key: Option<String>,
}

impl std::fmt::Debug for GoogleSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSecrets")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Secrets {
    /// A missing file is not an error; the key may still come from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No secrets file at {}", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let secrets = Self::parse(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("🔑 Secrets loaded from {}", path.display());
        Ok(secrets)
    }

    pub fn parse(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn google_api_key(&self) -> Option<String> {
        self.google
            .as_ref()
            .and_then(|g| g.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }

    /// The environment wins over the file.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.google_api_key())
    }
}
