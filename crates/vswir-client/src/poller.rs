//! Job status polling.
//!
//! One spawned task per activation: query immediately, then again a fixed
//! `interval` after each answer, until the job completes, a query fails, or
//! the poller is deactivated. Progress is published on a `watch` channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use vswir_core::id::{JobId, RequestSeq};
use vswir_core::job::{JobProgress, JobStatusReport};

use crate::error::Error;
use crate::sequence::RequestSequencer;
use crate::service::JobStatusSource;

pub struct JobPoller<S: ?Sized> {
    service: Arc<S>,
    interval: Duration,
    sequencer: RequestSequencer,
    state: Arc<watch::Sender<JobProgress>>,
    task: Option<JoinHandle<()>>,
}

impl<S> JobPoller<S>
where
    S: JobStatusSource + ?Sized + 'static,
{
    pub fn new(service: Arc<S>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(JobProgress::default());
        Self {
            service,
            interval,
            sequencer: RequestSequencer::new(),
            state: Arc::new(tx),
            task: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<JobProgress> {
        self.state.subscribe()
    }

    /// Snapshot of the current progress.
    pub fn progress(&self) -> JobProgress {
        self.state.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start following `job_id`, replacing any job followed so far.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(&mut self, job_id: JobId) {
        self.deactivate();
        let ticket = self.sequencer.issue();
        self.state.send_replace(JobProgress::started(job_id.clone()));
        tracing::info!(%job_id, interval_ms = self.interval.as_millis() as u64, "polling job");

        let task = PollTask {
            service: Arc::clone(&self.service),
            job_id,
            interval: self.interval,
            ticket,
            sequencer: self.sequencer.clone(),
            state: Arc::clone(&self.state),
        };
        self.task = Some(tokio::spawn(task.run()));
    }

    /// Wait until the current job completes or its polling fails.
    ///
    /// Does not resolve while the poller is inactive and non-terminal.
    pub async fn wait_for_terminal(&self) -> JobProgress {
        let mut rx = self.subscribe();
        let result = rx.wait_for(|p| p.is_terminal()).await.map(|p| p.clone());
        match result {
            Ok(p) => p,
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.progress(),
        }
    }
}

impl<S: ?Sized> JobPoller<S> {
    /// Stop polling. A query already in flight is abandoned and its answer
    /// can no longer touch the published progress.
    pub fn deactivate(&mut self) {
        self.sequencer.invalidate();
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("job polling stopped");
        }
    }
}

impl<S: ?Sized> Drop for JobPoller<S> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

struct PollTask<S: ?Sized> {
    service: Arc<S>,
    job_id: JobId,
    interval: Duration,
    ticket: RequestSeq,
    sequencer: RequestSequencer,
    state: Arc<watch::Sender<JobProgress>>,
}

impl<S: JobStatusSource + ?Sized> PollTask<S> {
    async fn run(self) {
        loop {
            let outcome = match self.service.job_status(&self.job_id).await {
                Ok(body) => Ok(JobStatusReport::from_body(body)),
                Err(Error::NotFound(_)) => Ok(JobStatusReport::queued()),
                Err(e) => Err(e),
            };

            let mut stop = false;
            let applied = self.state.send_if_modified(|progress| {
                if !self.sequencer.is_current(self.ticket) {
                    return false;
                }
                match &outcome {
                    Ok(report) => {
                        progress.apply(report.clone());
                        stop = progress.is_complete();
                    }
                    Err(e) => {
                        progress.fail(e.to_string());
                        stop = true;
                    }
                }
                true
            });

            if !applied {
                tracing::debug!(job_id = %self.job_id, ticket = %self.ticket, "discarding stale job status");
                return;
            }
            match &outcome {
                Ok(report) if stop => {
                    tracing::info!(job_id = %self.job_id, rows = report.rows_processed, "job complete");
                    return;
                }
                Ok(report) => {
                    tracing::debug!(job_id = %self.job_id, state = %report.state, rows = report.rows_processed, "job status");
                }
                Err(e) => {
                    tracing::warn!(job_id = %self.job_id, error = %e, "job status query failed");
                    return;
                }
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}
