//! Status polling for a single transcription job.
//!
//! At most one poller per job per process is assumed: the job view is owned by
//! the caller and moved through [`JobPoller::await_terminal`].

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancel::Outcome;
use crate::error::Result;
use crate::progress::ProgressSink;
use crate::remote::TranscriptionService;
use crate::state_machine::{
    JobState, StateMachine, TranscriptionJob, Transition, classify_remote_status,
};

pub struct JobPoller<'a, T, P> {
    service: &'a T,
    sink: &'a P,
    interval: Duration,
}

impl<'a, T, P> JobPoller<'a, T, P>
where
    T: TranscriptionService,
    P: ProgressSink,
{
    pub fn new(service: &'a T, sink: &'a P, interval: Duration) -> Self {
        Self {
            service,
            sink,
            interval,
        }
    }

    /// One status query, folded into `job`.
    pub async fn check_once(&self, job: &mut TranscriptionJob) -> Result<JobState> {
        self.poll(job).await?;
        Ok(job.state)
    }

    /// Polls every `interval` until the job is terminal.
    ///
    /// A job that turns terminal on the N-th query returns after N - 1 sleeps.
    /// Cancellation is checked during each query and each sleep, and only
    /// detaches this observer; the remote job keeps running.
    pub async fn await_terminal(
        &self,
        mut job: TranscriptionJob,
        cancel: &CancellationToken,
    ) -> Result<Outcome<TranscriptionJob>> {
        let started = Instant::now();
        loop {
            let transition = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
                polled = self.poll(&mut job) => polled?,
            };

            match transition {
                Transition::Advanced { from, to } => {
                    info!(job = %job.job_name, %from, %to, "job state changed");
                    self.sink.on_state_change(&job.job_name, from, to);
                }
                Transition::Unchanged(_) | Transition::Ignored { .. } => {
                    self.sink.on_heartbeat(&job.job_name, started.elapsed());
                }
            }

            if job.state.is_terminal() {
                debug!(job = %job.job_name, trace = ?job.trace(), "job reached terminal state");
                return Ok(Outcome::Finished(job));
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(job = %job.job_name, "stopped waiting, job continues remotely");
                    return Ok(Outcome::Cancelled);
                }
                _ = sleep(self.interval) => {}
            }
        }
    }

    async fn poll(&self, job: &mut TranscriptionJob) -> Result<Transition> {
        let record = self.service.get_status(&job.job_name).await?;
        let observed = classify_remote_status(&record.status)?;
        debug!(job = %job.job_name, remote = %record.status, "polled job status");

        let transition = StateMachine::observe(job, observed);
        if let Transition::Ignored { current, observed } = transition {
            warn!(job = %job.job_name, %current, %observed, "ignoring regressive status");
        }
        if record.failure_reason.is_some() {
            job.failure_reason = record.failure_reason;
        }
        if record.transcript_uri.is_some() {
            job.transcript_uri = record.transcript_uri;
        }
        Ok(transition)
    }
}
