//! Bearer credentials.
//!
//! The identity provider owns the token. The HTTP client is handed a
//! [`CredentialProvider`] at construction and only ever reads from it.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use vswir_core::config::ClientConfig;

/// Source of the `id_token` attached as `Authorization: Bearer <token>`.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Anonymous access.
#[derive(Debug, Clone, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Token set as stored after the OAuth code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredTokens {
    pub id_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// JSON token file, re-read on every request so an external login tool can
/// refresh it underneath a running client.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Option<StoredTokens> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "token file unreadable");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "token file is not valid JSON");
                None
            }
        }
    }
}

impl CredentialProvider for TokenFile {
    fn bearer_token(&self) -> Option<String> {
        self.load().and_then(|t| t.id_token)
    }
}

/// Pick a provider from configuration: a static token wins over a token file.
pub fn credentials_from_config(cfg: &ClientConfig) -> Arc<dyn CredentialProvider> {
    if let Some(token) = cfg.id_token.as_ref().filter(|t| !t.is_empty()) {
        return Arc::new(StaticToken::new(token.clone()));
    }
    if let Some(path) = &cfg.token_file {
        return Arc::new(TokenFile::new(path));
    }
    Arc::new(NoCredentials)
}
