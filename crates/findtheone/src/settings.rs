//! Persistent client settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use findtheone_api::ApiConfig;
use findtheone_api::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};

/// Settings stored in `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Backend base URL, including the `/api` prefix.
    pub api_base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl AppSettings {
    /// Request timeout as a duration.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Client configuration for these settings.
    ///
    /// # Errors
    ///
    /// Fails for an unparsable URL or a zero timeout.
    pub fn api_config(&self) -> anyhow::Result<ApiConfig> {
        let config = ApiConfig::builder(&self.api_base_url)
            .timeout(self.timeout())
            .build()?;
        Ok(config)
    }

    /// Loads settings from the user's config directory.
    pub async fn load() -> anyhow::Result<Self> {
        Self::load_from(&settings_path()).await
    }

    /// Saves settings to the user's config directory.
    pub async fn save(&self) -> anyhow::Result<PathBuf> {
        let path = settings_path();
        self.save_to(&path).await?;
        Ok(path)
    }

    /// Loads settings from `path`, falling back to defaults if it is missing.
    pub async fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Writes settings to `path`, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        tracing::info!("Settings saved to {:?}", path);
        Ok(())
    }
}

fn settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("findtheone")
        .join("settings.json")
}
