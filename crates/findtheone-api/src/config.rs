//! Client configuration types.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8091/api";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST API, always ending in `/`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl ApiConfig {
    /// Creates a configuration for the given base URL with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(base_url: impl AsRef<str>) -> ApiConfigBuilder {
        ApiConfigBuilder::new(base_url)
    }

    /// Resolves an endpoint path (e.g., `messages/send`) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

impl Default for ApiConfig {
    #[allow(clippy::expect_used)] // Constant input
    fn default() -> Self {
        Self {
            base_url: normalize(Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")),
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }
}

/// Builder for API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfigBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ApiConfigBuilder {
    /// Creates a new builder with the given base URL.
    #[must_use]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().trim().to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute `http`/`https` URL
    /// or the timeout is zero.
    pub fn build(self) -> Result<ApiConfig> {
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "unsupported URL scheme: {}",
                url.scheme()
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be non-zero".into()));
        }

        Ok(ApiConfig {
            base_url: normalize(url),
            timeout: self.timeout,
            user_agent: self.user_agent.unwrap_or_else(default_user_agent),
        })
    }
}

/// Ensures the path ends in `/` so relative joins append instead of replace.
fn normalize(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn default_user_agent() -> String {
    format!("findtheone/{}", env!("CARGO_PKG_VERSION"))
}
