//! Seams between the workflow logic and the remote services.
//!
//! [`crate::http::HttpClient`] implements both traits. Tests substitute
//! in-memory fakes.

use async_trait::async_trait;
use bytes::Bytes;

use vswir_core::id::JobId;
use vswir_core::job::JobStatusBody;

use crate::error::Result;
use crate::query::QueryPayload;

#[async_trait]
pub trait ViewService: Send + Sync {
    /// Run a view query and return the raw Parquet payload.
    async fn query_view(&self, payload: &QueryPayload) -> Result<Bytes>;

    /// Submit an extraction job and return its id.
    async fn submit_job(&self, payload: &QueryPayload) -> Result<JobId>;
}

#[async_trait]
pub trait JobStatusSource: Send + Sync {
    /// Current status of a job. A job unknown to the service is reported as
    /// [`crate::Error::NotFound`].
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusBody>;
}
