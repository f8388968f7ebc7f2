//! Wire types for the transcription service and the transcript payload.

use serde::{Deserialize, Serialize};

use crate::identity::SourceFormat;

/// Body of `POST /jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_name: String,
    pub media_uri: String,
    pub media_format: SourceFormat,
    pub language_code: String,
}

/// Answer to `POST /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_name: String,
}

/// Answer to `GET /jobs/{name}`. `status` is the raw remote code; it is
/// classified by the poller, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_uri: Option<String>,
}

/// Transcript document produced by a completed job.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptDocument {
    pub results: TranscriptResults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptResults {
    #[serde(default)]
    pub transcripts: Vec<TranscriptSegment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptSegment {
    pub transcript: String,
}

impl TranscriptDocument {
    /// Segment texts joined by single newlines, without a trailing one.
    pub fn text(&self) -> String {
        self.results
            .transcripts
            .iter()
            .map(|s| s.transcript.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
