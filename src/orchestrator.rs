use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cancel::Outcome;
use crate::config::TranscribeConfig;
use crate::error::Result;
use crate::identity;
use crate::materializer::ResultMaterializer;
use crate::poller::JobPoller;
use crate::progress::ProgressSink;
use crate::remote::{BlobStore, TranscriptionService};
use crate::state_machine::{JobState, TranscriptionJob};
use crate::submitter::ArtifactSubmitter;

/// Knobs for one run, fixed before any remote call.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub poll_interval: Duration,
    pub progress_interval: Duration,
    pub output_dir: PathBuf,
    pub language_code: String,
}

impl From<&TranscribeConfig> for RunSettings {
    fn from(config: &TranscribeConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            progress_interval: config.progress_interval(),
            output_dir: config.output_dir.clone(),
            language_code: config.language_code.clone(),
        }
    }
}

/// What a command achieved. Errors travel separately as `TranscribeError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// Uploaded and registered, not waited on.
    Submitted { job_name: String },
    /// Transcript written to `path`.
    Saved { job_name: String, path: PathBuf },
    /// Fetch without `--wait` found the job still running.
    Pending { job_name: String, state: JobState },
    /// Interrupted while waiting; the job keeps running remotely.
    Detached { job_name: String },
    /// Interrupted during upload; no job was registered.
    UploadCancelled { storage_key: String },
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub input: PathBuf,
    pub key: Option<String>,
    pub job_name: Option<String>,
    pub wait: bool,
}

/// Wires the pipeline stages together for the two user commands.
pub struct Orchestrator<B, T, P> {
    pub store: B,
    pub service: T,
    pub sink: P,
    pub settings: RunSettings,
}

impl<B, T, P> Orchestrator<B, T, P>
where
    B: BlobStore,
    T: TranscriptionService,
    P: ProgressSink,
{
    pub fn new(store: B, service: T, sink: P, settings: RunSettings) -> Self {
        Self {
            store,
            service,
            sink,
            settings,
        }
    }

    /// Resolves, uploads and registers the input; optionally waits for the
    /// job and saves its transcript under the output directory.
    pub async fn upload(
        &self,
        request: &UploadRequest,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        // Format and key are settled before the file is even opened.
        let artifact = identity::resolve(&request.input, request.key.as_deref())?;
        let file = File::open(&request.input).await?;

        let submitter = ArtifactSubmitter::new(
            &self.store,
            &self.service,
            &self.sink,
            self.settings.progress_interval,
            &self.settings.language_code,
        );
        let job = match submitter
            .submit(&artifact, file, request.job_name.as_deref(), cancel)
            .await?
        {
            Outcome::Finished(job) => job,
            Outcome::Cancelled => {
                return Ok(RunReport::UploadCancelled {
                    storage_key: artifact.storage_key,
                });
            }
        };

        if !request.wait {
            return Ok(RunReport::Submitted {
                job_name: job.job_name,
            });
        }
        self.wait_and_materialize(job, None, cancel).await
    }

    /// Looks up a job by name and saves its transcript once COMPLETED.
    ///
    /// Without `wait` a single status query decides: a running job is
    /// reported as pending rather than treated as an error.
    pub async fn fetch(
        &self,
        job_name: &str,
        output: Option<&Path>,
        wait: bool,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        let job = TranscriptionJob::detached(job_name);
        if wait {
            return self.wait_and_materialize(job, output, cancel).await;
        }

        let mut job = job;
        let state = self.poller().check_once(&mut job).await?;
        if state.is_terminal() {
            self.materialize(&job, output).await
        } else {
            info!(job = %job.job_name, %state, "job not finished yet");
            Ok(RunReport::Pending {
                job_name: job.job_name,
                state,
            })
        }
    }

    async fn wait_and_materialize(
        &self,
        job: TranscriptionJob,
        output: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        let job_name = job.job_name.clone();
        match self.poller().await_terminal(job, cancel).await? {
            Outcome::Finished(job) => self.materialize(&job, output).await,
            Outcome::Cancelled => Ok(RunReport::Detached { job_name }),
        }
    }

    async fn materialize(&self, job: &TranscriptionJob, output: Option<&Path>) -> Result<RunReport> {
        let materializer =
            ResultMaterializer::new(&self.store, &self.service, &self.settings.output_dir);
        let saved = materializer.materialize(job, output).await?;
        Ok(RunReport::Saved {
            job_name: saved.transcript.job_name,
            path: saved.path,
        })
    }

    fn poller(&self) -> JobPoller<'_, T, P> {
        JobPoller::new(&self.service, &self.sink, self.settings.poll_interval)
    }
}
