//! Client configuration that downstream crates can serialize/deserialize.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the query/job/admin API (no trailing slash).
    pub api_url: String,

    /// Rows per page for interactive browsing.
    pub page_size: u64,

    /// Fixed delay between job status queries.
    pub poll_interval_ms: u64,

    /// Per-request timeout.
    pub request_timeout_secs: u64,

    /// Static bearer token (`id_token`), if any.
    pub id_token: Option<String>,

    /// JSON token file holding `id_token`; re-read on every request.
    pub token_file: Option<String>,

    /// Optional JSON view catalog replacing the built-in one.
    pub views_file: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            page_size: 4000,
            poll_interval_ms: 2_000,
            request_timeout_secs: 60,
            id_token: None,
            token_file: None,
            views_file: None,
        }
    }
}

impl ClientConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `VSWIR_API_URL`: API base URL
    /// - `VSWIR_PAGE_SIZE`: rows per page
    /// - `VSWIR_POLL_INTERVAL_MS`: job polling delay
    /// - `VSWIR_REQUEST_TIMEOUT_SECS`: request timeout
    /// - `VSWIR_ID_TOKEN`: bearer token
    /// - `VSWIR_TOKEN_FILE`: path to a JSON token file
    /// - `VSWIR_VIEWS_FILE`: path to a JSON view catalog
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("VSWIR_API_URL") {
            cfg.api_url = s.trim_end_matches('/').to_string();
        }

        if let Ok(s) = std::env::var("VSWIR_PAGE_SIZE") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.page_size = v;
            }
        }

        if let Ok(s) = std::env::var("VSWIR_POLL_INTERVAL_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.poll_interval_ms = v;
            }
        }

        if let Ok(s) = std::env::var("VSWIR_REQUEST_TIMEOUT_SECS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.request_timeout_secs = v;
            }
        }

        if let Ok(s) = std::env::var("VSWIR_ID_TOKEN") {
            cfg.id_token = Some(s);
        }

        if let Ok(s) = std::env::var("VSWIR_TOKEN_FILE") {
            cfg.token_file = Some(s);
        }

        if let Ok(s) = std::env::var("VSWIR_VIEWS_FILE") {
            cfg.views_file = Some(s);
        }

        cfg
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ClientConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.poll_interval(), Duration::from_secs(2));
        assert_eq!(cfg.page_size, 4000);
    }

    #[test]
    fn rejects_bad_url_and_zero_page() {
        let cfg = ClientConfig {
            api_url: "ftp://x".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = ClientConfig {
            page_size: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
