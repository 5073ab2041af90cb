//! reqwest-backed transport for the query, job and admin endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use vswir_core::config::ClientConfig;
use vswir_core::id::JobId;
use vswir_core::job::JobStatusBody;

use crate::auth::CredentialProvider;
use crate::error::{Error, Result};
use crate::query::QueryPayload;
use crate::service::{JobStatusSource, ViewService};

#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").field("base", &self.base.as_str()).finish()
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: Option<String>,
}

impl HttpClient {
    pub fn new(cfg: &ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        cfg.validate()?;
        let base = Url::parse(cfg.api_url.trim_end_matches('/'))?;
        if base.cannot_be_a_base() {
            return Err(vswir_core::Error::Config(format!("API URL cannot be a base: {base}")).into());
        }
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/{segments...}` with each segment percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Core(vswir_core::Error::Config("API URL cannot be a base".into())))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.authorized(self.http.get(url))
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.authorized(self.http.post(url))
    }

    pub(crate) fn delete(&self, url: Url) -> RequestBuilder {
        self.authorized(self.http.delete(url))
    }

    /// Send and reject non-2xx answers. 404 becomes [`Error::NotFound`].
    pub(crate) async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let url = resp.url().to_string();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(%url, status = status.as_u16(), "request rejected");
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url));
        }
        Err(Error::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ViewService for HttpClient {
    async fn query_view(&self, payload: &QueryPayload) -> Result<Bytes> {
        let url = self.endpoint(&["views", &payload.view])?;
        tracing::debug!(view = %payload.view, offset = ?payload.offset, limit = ?payload.limit, "query view");
        let resp = self.send(self.post(url).json(payload)).await?;
        Ok(resp.bytes().await?)
    }

    async fn submit_job(&self, payload: &QueryPayload) -> Result<JobId> {
        let url = self.endpoint(&["views", &payload.view])?;
        let resp = self.send(self.post(url).json(payload)).await?;
        let body: SubmitResponse = resp.json().await?;
        match body.job_id {
            Some(id) if !id.is_empty() => Ok(JobId::new(id)),
            _ => Err(Error::Malformed("job submission returned no job_id".into())),
        }
    }
}

#[async_trait]
impl JobStatusSource for HttpClient {
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusBody> {
        let url = self.endpoint(&["job_status", job_id.as_str()])?;
        let resp = self.send(self.get(url)).await?;
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoCredentials;

    fn client(api_url: &str) -> HttpClient {
        let cfg = ClientConfig {
            api_url: api_url.into(),
            ..Default::default()
        };
        HttpClient::new(&cfg, Arc::new(NoCredentials)).unwrap()
    }

    #[test]
    fn endpoints_are_joined_and_encoded() {
        let c = client("http://api.example/");
        assert_eq!(
            c.endpoint(&["views", "plot_pixels_mv"]).unwrap().as_str(),
            "http://api.example/views/plot_pixels_mv"
        );
        assert_eq!(
            c.endpoint(&["job_status", "a b/c"]).unwrap().as_str(),
            "http://api.example/job_status/a%20b%2Fc"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let c = client("http://api.example/prefix");
        assert_eq!(
            c.endpoint(&["admin", "users"]).unwrap().as_str(),
            "http://api.example/prefix/admin/users"
        );
    }

    #[test]
    fn rejects_bad_url() {
        let cfg = ClientConfig {
            api_url: "not a url".into(),
            ..Default::default()
        };
        assert!(HttpClient::new(&cfg, Arc::new(NoCredentials)).is_err());
    }
}
