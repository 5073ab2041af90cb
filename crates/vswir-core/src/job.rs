//! Extraction job lifecycle.
//!
//! Lifecycle states only move forward: `Queued -> Running -> Complete`.
//! A polling failure is recorded separately in [`JobProgress::error`]; it
//! stops polling without saying anything about the job itself.

use serde::{Deserialize, Serialize};

use crate::id::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Complete,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Complete => "complete",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `GET /job_status/{job_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusBody {
    #[serde(default)]
    pub rows_processed: Option<u64>,
    #[serde(default)]
    pub presigned_url: Option<String>,
    /// Server-side status text; informational only.
    #[serde(default)]
    pub status: Option<String>,
}

/// One interpreted status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusReport {
    pub state: JobState,
    pub rows_processed: u64,
    pub download_url: Option<String>,
}

impl JobStatusReport {
    /// The job is not known to the status service yet.
    pub fn queued() -> Self {
        Self {
            state: JobState::Queued,
            rows_processed: 0,
            download_url: None,
        }
    }

    /// `Complete` iff a download reference is present, `Running` otherwise.
    pub fn from_body(body: JobStatusBody) -> Self {
        let state = if body.presigned_url.is_some() {
            JobState::Complete
        } else {
            JobState::Running
        };
        Self {
            state,
            rows_processed: body.rows_processed.unwrap_or(0),
            download_url: body.presigned_url,
        }
    }
}

/// Observable state of a polled job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: Option<JobId>,
    pub state: Option<JobState>,
    pub rows_processed: u64,
    pub download_url: Option<String>,
    pub error: Option<String>,
}

impl JobProgress {
    /// Fresh progress for a newly activated job.
    pub fn started(job_id: JobId) -> Self {
        Self {
            job_id: Some(job_id),
            state: Some(JobState::Queued),
            ..Default::default()
        }
    }

    /// Fold a status report in. The lifecycle state never moves backwards.
    pub fn apply(&mut self, report: JobStatusReport) {
        self.state = Some(self.state.map_or(report.state, |s| s.max(report.state)));
        self.rows_processed = report.rows_processed;
        if report.download_url.is_some() {
            self.download_url = report.download_url;
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn is_complete(&self) -> bool {
        self.state == Some(JobState::Complete)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_complete() || self.error.is_some()
    }
}
