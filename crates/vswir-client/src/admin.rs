//! User and group administration (`/admin/users`).
//!
//! Thin request/response mapping. The service decides who may call it; the
//! client only checks required fields before sending.

use serde::{Deserialize, Serialize};
use serde_json::json;

use vswir_core::claims::{ADMIN_GROUP, SUPERADMIN_GROUP};

use crate::error::{Error, Result};
use crate::http::HttpClient;

pub const USERS_GROUP: &str = "users";

/// Groups that can be assigned from the client.
pub const ALL_GROUPS: [&str; 3] = [USERS_GROUP, ADMIN_GROUP, SUPERADMIN_GROUP];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub temporary_password: String,
    pub groups: Vec<String>,
}

impl CreateUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        temporary_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            temporary_password: temporary_password.into(),
            groups: vec![USERS_GROUP.to_string()],
        }
    }

    pub fn validate(&self) -> Result<()> {
        let missing = [&self.username, &self.email, &self.temporary_password]
            .iter()
            .any(|f| f.trim().is_empty());
        if missing {
            return Err(Error::Validation("All fields are required.".into()));
        }
        Ok(())
    }
}

fn check_group(group: &str) -> Result<()> {
    if group.trim().is_empty() {
        return Err(Error::Validation("group is required".into()));
    }
    Ok(())
}

fn check_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(Error::Validation("username is required".into()));
    }
    Ok(())
}

impl HttpClient {
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let url = self.endpoint(&["admin", "users"])?;
        let resp = self.send(self.get(url)).await?;
        Ok(resp.json().await?)
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<()> {
        user.validate()?;
        let url = self.endpoint(&["admin", "users"])?;
        self.send(self.post(url).json(user)).await?;
        tracing::info!(username = %user.username, groups = ?user.groups, "user created");
        Ok(())
    }

    pub async fn delete_user(&self, username: &str) -> Result<()> {
        check_username(username)?;
        let url = self.endpoint(&["admin", "users", username])?;
        self.send(self.delete(url)).await?;
        tracing::info!(%username, "user deleted");
        Ok(())
    }

    pub async fn add_to_group(&self, username: &str, group: &str) -> Result<()> {
        check_username(username)?;
        check_group(group)?;
        let url = self.endpoint(&["admin", "users", username, "groups"])?;
        self.send(self.post(url).json(&json!({ "group": group })))
            .await?;
        tracing::info!(%username, %group, "added to group");
        Ok(())
    }

    pub async fn remove_from_group(&self, username: &str, group: &str) -> Result<()> {
        check_username(username)?;
        check_group(group)?;
        let url = self.endpoint(&["admin", "users", username, "groups", group])?;
        self.send(self.delete(url)).await?;
        tracing::info!(%username, %group, "removed from group");
        Ok(())
    }
}
