//! Unverified `id_token` claims.
//!
//! The identity provider owns issuance and validation. The client only peeks
//! at the payload to label the user and decide whether admin commands apply.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

pub const ADMIN_GROUP: &str = "admins";
pub const SUPERADMIN_GROUP: &str = "superadmins";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "cognito:username")]
    pub username: Option<String>,
    #[serde(default, rename = "cognito:groups")]
    groups: Option<Value>,
    #[serde(default)]
    pub exp: Option<u64>,
}

impl IdTokenClaims {
    /// Decode the payload segment of a JWT without checking its signature.
    pub fn decode(token: &str) -> Result<Self> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| Error::Validation("id token is not a JWT".into()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| Error::Validation(format!("id token payload: {e}")))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Group names; a single string claim is treated as one group.
    pub fn groups(&self) -> Vec<String> {
        match &self.groups {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        let groups = self.groups();
        groups.iter().any(|g| g == ADMIN_GROUP || g == SUPERADMIN_GROUP)
    }

    pub fn is_super_admin(&self) -> bool {
        self.groups().iter().any(|g| g == SUPERADMIN_GROUP)
    }

    /// Missing `exp` counts as expired.
    pub fn is_expired(&self, now_unix_secs: u64) -> bool {
        match self.exp {
            Some(exp) => now_unix_secs >= exp,
            None => true,
        }
    }
}
