//! Turns a COMPLETED job into a transcript file on disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Result, TranscribeError};
use crate::remote::{BlobStore, TranscriptDocument, TranscriptionService};
use crate::state_machine::{JobState, TranscriptResult, TranscriptionJob};

const TRANSCRIPT_EXTENSION: &str = "txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub transcript: TranscriptResult,
    pub path: PathBuf,
}

pub struct ResultMaterializer<'a, B, T> {
    store: &'a B,
    service: &'a T,
    output_dir: &'a Path,
}

impl<'a, B, T> ResultMaterializer<'a, B, T>
where
    B: BlobStore,
    T: TranscriptionService,
{
    pub fn new(store: &'a B, service: &'a T, output_dir: &'a Path) -> Self {
        Self {
            store,
            service,
            output_dir,
        }
    }

    /// Fetches the transcript of `job` and writes it as UTF-8 text.
    ///
    /// The file lands at `output_path` when given (or `{job}.txt` inside it if
    /// it names a directory), else at `{output_dir}/{job}.txt`. An existing
    /// file is either fully replaced or left alone.
    pub async fn materialize(
        &self,
        job: &TranscriptionJob,
        output_path: Option<&Path>,
    ) -> Result<Materialized> {
        match job.state {
            JobState::Completed => {}
            JobState::Failed => {
                return Err(TranscribeError::JobFailed {
                    job_name: job.job_name.clone(),
                    reason: job.failure_reason.clone(),
                });
            }
            state => {
                return Err(TranscribeError::NotComplete {
                    job_name: job.job_name.clone(),
                    state,
                });
            }
        }

        let source_uri = match &job.transcript_uri {
            Some(uri) => uri.clone(),
            None => self.service.get_transcript_uri(&job.job_name).await?,
        };
        debug!(job = %job.job_name, uri = %source_uri, "fetching transcript");

        let payload = self.store.get(&source_uri).await?;
        let document: TranscriptDocument = serde_json::from_slice(&payload)?;
        let transcript = TranscriptResult {
            job_name: job.job_name.clone(),
            text: document.text(),
            source_uri,
        };

        let path = write_transcript(
            self.output_dir.to_path_buf(),
            output_path.map(Path::to_path_buf),
            job.job_name.clone(),
            transcript.text.clone().into_bytes(),
        )
        .await?;
        info!(job = %job.job_name, path = %path.display(), "transcript saved");

        Ok(Materialized { transcript, path })
    }
}

/// Where the transcript of `job_name` lands. An explicit path that exists as a
/// directory, or ends with a separator, receives `{job_name}.txt`.
fn destination(output_dir: &Path, job_name: &str, output_path: Option<&Path>) -> PathBuf {
    let file_name = format!("{job_name}.{TRANSCRIPT_EXTENSION}");
    match output_path {
        Some(path) if names_directory(path) => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => output_dir.join(file_name),
    }
}

fn names_directory(path: &Path) -> bool {
    path.as_os_str()
        .to_string_lossy()
        .ends_with(std::path::is_separator)
        || path.is_dir()
}

/// Resolves the destination and writes `contents` there off the async runtime.
/// The text goes to a temporary sibling first and is renamed into place.
async fn write_transcript(
    output_dir: PathBuf,
    output_path: Option<PathBuf>,
    job_name: String,
    contents: Vec<u8>,
) -> Result<PathBuf> {
    tokio::task::spawn_blocking(move || -> Result<PathBuf> {
        let path = destination(&output_dir, &job_name, output_path.as_deref());
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut staged = NamedTempFile::new_in(&dir)?;
        staged.write_all(&contents)?;
        staged.as_file().sync_all()?;
        staged.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    })
    .await
    .map_err(std::io::Error::other)?
}
