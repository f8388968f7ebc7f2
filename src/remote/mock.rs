//! In-memory collaborators for driving the core without HTTP.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::TryStreamExt;

use super::types::{JobRecord, JobRequest};
use super::{BlobStore, TranscriptionService, UploadBody};
use crate::error::{Result, TranscribeError};

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn with_object(uri: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let store = Self::default();
        store
            .objects
            .lock()
            .unwrap()
            .insert(uri.to_string(), bytes.into());
        store
    }

    pub fn object(&self, uri: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(uri).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, body: UploadBody) -> Result<String> {
        let bytes: Vec<u8> = body
            .into_stream()
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        let uri = format!("mem://audio/{key}");
        self.objects.lock().unwrap().insert(uri.clone(), bytes);
        Ok(uri)
    }

    async fn get(&self, uri: &str) -> Result<Vec<u8>> {
        self.object(uri).ok_or_else(|| TranscribeError::RemoteStatus {
            status: 404,
            message: format!("no object at {uri}"),
        })
    }
}

/// Transcription service answering status queries from a script. Once the
/// script runs out the last code repeats.
#[derive(Debug, Default)]
pub struct ScriptedService {
    script: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    existing: Mutex<HashSet<String>>,
    created: Mutex<Vec<JobRequest>>,
    failure_reason: Option<String>,
    transcript_uri: Option<String>,
    queries: AtomicUsize,
}

impl ScriptedService {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(codes.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn with_transcript_uri(mut self, uri: &str) -> Self {
        self.transcript_uri = Some(uri.to_string());
        self
    }

    pub fn with_failure_reason(mut self, reason: &str) -> Self {
        self.failure_reason = Some(reason.to_string());
        self
    }

    pub fn with_existing_job(self, name: &str) -> Self {
        self.existing.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn created(&self) -> Vec<JobRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn status_queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl TranscriptionService for ScriptedService {
    async fn create_job(&self, request: &JobRequest) -> Result<String> {
        if !self
            .existing
            .lock()
            .unwrap()
            .insert(request.job_name.clone())
        {
            return Err(TranscribeError::DuplicateJob(request.job_name.clone()));
        }
        self.created.lock().unwrap().push(request.clone());
        Ok(request.job_name.clone())
    }

    async fn get_status(&self, job_name: &str) -> Result<JobRecord> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let code = match next {
            Some(code) => {
                *self.last.lock().unwrap() = Some(code.clone());
                code
            }
            None => self.last.lock().unwrap().clone().ok_or_else(|| {
                TranscribeError::RemoteStatus {
                    status: 404,
                    message: format!("job {job_name} not found"),
                }
            })?,
        };
        let done = matches!(code.as_str(), "COMPLETED" | "FAILED" | "ERROR");
        Ok(JobRecord {
            job_name: job_name.to_string(),
            failure_reason: done.then(|| self.failure_reason.clone()).flatten(),
            transcript_uri: (code == "COMPLETED")
                .then(|| self.transcript_uri.clone())
                .flatten(),
            status: code,
        })
    }

    async fn get_transcript_uri(&self, job_name: &str) -> Result<String> {
        self.transcript_uri
            .clone()
            .ok_or_else(|| TranscribeError::MissingTranscript(job_name.to_string()))
    }
}
