//! Configuration for a sync run
//!
//! `TapConfig` is the JSON document passed with `--config`. It carries the
//! credentials, the replication window and the knobs for the HTTP layer and
//! the association fetcher.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::state::convert_date_to_epoch;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Default API host
pub const DEFAULT_API_URL: &str = "https://api.hubapi.com";

/// Path of the OAuth2 token endpoint, relative to the API host
pub const TOKEN_PATH: &str = "/oauth/v1/token";

/// Complete tap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Private app / static bearer token
    #[serde(default)]
    pub access_token: Option<String>,

    /// OAuth app client ID
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth app client secret
    #[serde(default)]
    pub client_secret: Option<String>,

    /// OAuth refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Earliest record date to sync
    #[serde(default)]
    pub start_date: Option<String>,

    /// Latest record date to sync
    #[serde(default)]
    pub end_date: Option<String>,

    /// User-Agent header sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// API host (overridable for testing)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Timeout applied uniformly to every request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum retries for retryable HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Client-side rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Page size for list endpoints
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Concurrent association batch requests per association type
    #[serde(default = "default_association_workers")]
    pub association_workers: usize,

    /// Maximum ids per association batch, keyed by association type
    #[serde(default = "default_association_batch_sizes")]
    pub association_batch_sizes: HashMap<String, usize>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_page_size() -> u32 {
    100
}

fn default_association_workers() -> usize {
    4
}

fn default_association_batch_sizes() -> HashMap<String, usize> {
    HashMap::from([("contacts".to_string(), 1000), ("companies".to_string(), 100)])
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            start_date: None,
            end_date: None,
            user_agent: None,
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            requests_per_second: default_requests_per_second(),
            page_size: default_page_size(),
            association_workers: default_association_workers(),
            association_batch_sizes: default_association_batch_sizes(),
        }
    }
}

impl TapConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a config JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TapConfig = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate credentials, dates and numeric knobs
    pub fn validate(&self) -> Result<()> {
        if !self.has_oauth() && self.access_token.as_deref().unwrap_or("").is_empty() {
            return Err(Error::missing_field(
                "access_token (or client_id, client_secret and refresh_token)",
            ));
        }

        if self.has_oauth() {
            for (field, value) in [
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ] {
                if value.as_deref().unwrap_or("").is_empty() {
                    return Err(Error::missing_field(field));
                }
            }
        }

        for (field, value) in [("start_date", &self.start_date), ("end_date", &self.end_date)] {
            if let Some(date) = value {
                convert_date_to_epoch(&serde_json::Value::String(date.clone()))
                    .map_err(|e| Error::invalid_value(field, e.to_string()))?;
            }
        }

        if self.association_workers == 0 {
            return Err(Error::invalid_value(
                "association_workers",
                "must be at least 1",
            ));
        }

        if let Some((name, _)) = self
            .association_batch_sizes
            .iter()
            .find(|(_, size)| **size == 0)
        {
            return Err(Error::invalid_value(
                "association_batch_sizes",
                format!("batch size for '{name}' must be at least 1"),
            ));
        }

        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }

        url::Url::parse(&self.api_url)?;

        Ok(())
    }

    /// Whether the OAuth refresh flow is configured.
    ///
    /// The literal string `"None"` counts as absent; some orchestrators
    /// serialize unset secrets that way.
    pub fn has_oauth(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|t| !t.is_empty() && t != "None")
    }

    /// Build the auth config for this run
    pub fn auth_config(&self) -> AuthConfig {
        if self.has_oauth() {
            AuthConfig::Oauth2Refresh {
                token_url: format!("{}{TOKEN_PATH}", self.api_url.trim_end_matches('/')),
                client_id: self.client_id.clone().unwrap_or_default(),
                client_secret: self.client_secret.clone().unwrap_or_default(),
                refresh_token: self.refresh_token.clone().unwrap_or_default(),
            }
        } else {
            AuthConfig::Bearer {
                token: self.access_token.clone().unwrap_or_default(),
            }
        }
    }

    /// Build the HTTP client config for this run
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.api_url)
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .max_retries(self.max_retries)
            .rate_limit(RateLimiterConfig::new(
                self.requests_per_second,
                self.requests_per_second,
            ));

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }

    /// Batch size configured for an association type
    pub fn association_batch_size(&self, association: &str) -> Option<usize> {
        self.association_batch_sizes.get(association).copied()
    }
}
