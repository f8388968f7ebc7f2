//! Uploads the artifact and registers its transcription job.

use std::time::Duration;

use tokio::fs::File;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cancel::Outcome;
use crate::error::Result;
use crate::identity::{self, ArtifactReference};
use crate::progress::{ProgressSink, ProgressThrottle};
use crate::remote::{BlobStore, JobRequest, TranscriptionService, UploadBody};
use crate::state_machine::TranscriptionJob;

pub struct ArtifactSubmitter<'a, B, T, P> {
    store: &'a B,
    service: &'a T,
    sink: &'a P,
    progress_interval: Duration,
    language_code: &'a str,
}

impl<'a, B, T, P> ArtifactSubmitter<'a, B, T, P>
where
    B: BlobStore,
    T: TranscriptionService,
    P: ProgressSink,
{
    pub fn new(
        store: &'a B,
        service: &'a T,
        sink: &'a P,
        progress_interval: Duration,
        language_code: &'a str,
    ) -> Self {
        Self {
            store,
            service,
            sink,
            progress_interval,
            language_code,
        }
    }

    /// Streams `file` to the store under the artifact's key, then registers a
    /// job for the stored object.
    ///
    /// The job is named `job_name` when given, otherwise after the storage key.
    /// Cancellation is honored between chunks; once the upload finished the
    /// job is always registered. A failure during registration leaves the
    /// uploaded object in place.
    pub async fn submit(
        &self,
        artifact: &ArtifactReference,
        file: File,
        job_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Outcome<TranscriptionJob>> {
        let total = file.metadata().await?.len();
        info!(key = %artifact.storage_key, bytes = total, "uploading artifact");
        self.sink.on_upload_start(&artifact.display_name(), total);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut throttle = ProgressThrottle::new(self.progress_interval);
        let upload = self
            .store
            .put(&artifact.storage_key, UploadBody::new(file, total, tx));
        tokio::pin!(upload);

        let object_uri = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(key = %artifact.storage_key, "upload cancelled");
                    return Ok(Outcome::Cancelled);
                }
                result = &mut upload => break result?,
                Some(transferred) = rx.recv() => self.report(&mut throttle, transferred, total),
            }
        };
        while let Ok(transferred) = rx.try_recv() {
            self.report(&mut throttle, transferred, total);
        }
        self.report(&mut throttle, total, total);
        info!(%object_uri, "upload complete");

        let request = JobRequest {
            job_name: job_name
                .map(str::to_string)
                .unwrap_or_else(|| identity::default_job_name(&artifact.storage_key)),
            media_uri: object_uri,
            media_format: artifact.source_format,
            language_code: self.language_code.to_string(),
        };
        let registered = self.service.create_job(&request).await?;
        info!(job = %registered, format = %request.media_format, "transcription job registered");

        Ok(Outcome::Finished(TranscriptionJob::submitted(
            registered,
            artifact.clone(),
        )))
    }

    fn report(&self, throttle: &mut ProgressThrottle, transferred: u64, total: u64) {
        if throttle.should_emit(transferred, total) {
            self.sink.on_bytes(transferred, total);
        }
    }
}
