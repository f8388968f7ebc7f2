//! Remote collaborators: the blob store holding uploaded audio and the
//! transcription service running the jobs.

pub mod client;
#[cfg(test)]
pub mod mock;
pub mod types;

use std::io;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::fs::File;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::io::ReaderStream;

use crate::error::Result;

pub use client::{HttpBlobStore, HttpTranscriptionService};
pub use types::{JobRecord, JobRequest, TranscriptDocument};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

pub trait BlobStore {
    /// Stores `body` under `key` and returns the object URI.
    async fn put(&self, key: &str, body: UploadBody) -> Result<String>;

    async fn get(&self, uri: &str) -> Result<Vec<u8>>;
}

pub trait TranscriptionService {
    /// Registers a job and returns the name the service assigned to it.
    async fn create_job(&self, request: &JobRequest) -> Result<String>;

    async fn get_status(&self, job_name: &str) -> Result<JobRecord>;

    /// Only meaningful once the job is COMPLETED.
    async fn get_transcript_uri(&self, job_name: &str) -> Result<String>;
}

/// A local file streamed in fixed-size chunks. Each chunk pulled by the store
/// pushes the cumulative byte count onto `progress`.
pub struct UploadBody {
    file: File,
    len: u64,
    progress: UnboundedSender<u64>,
}

impl UploadBody {
    pub fn new(file: File, len: u64, progress: UnboundedSender<u64>) -> Self {
        Self {
            file,
            len,
            progress,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        let progress = self.progress;
        let mut sent = 0u64;
        ReaderStream::with_capacity(self.file, UPLOAD_CHUNK_SIZE).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                // Receiver gone means nobody is watching; the upload goes on.
                let _ = progress.send(sent);
            }
            chunk
        })
    }
}
