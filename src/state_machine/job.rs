use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::JobState;
use crate::identity::ArtifactReference;

/// Transient local view of a server-side transcription job.
///
/// `job_name` is the remote primary key and never changes. Only the poller
/// touches `state`, and only through [`StateMachine`](super::StateMachine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionJob {
    pub job_name: String,
    /// Known when this process submitted the job; `None` on the fetch path.
    pub artifact: Option<ArtifactReference>,
    pub state: JobState,
    pub state_history: Vec<JobState>,
    pub failure_reason: Option<String>,
    pub transcript_uri: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TranscriptionJob {
    /// A job this process just registered.
    pub fn submitted(job_name: String, artifact: ArtifactReference) -> Self {
        Self {
            artifact: Some(artifact),
            ..Self::detached(job_name)
        }
    }

    /// A job known only by name, as on the fetch path.
    pub fn detached(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            artifact: None,
            state: JobState::Queued,
            state_history: Vec::new(),
            failure_reason: None,
            transcript_uri: None,
            created_at: Utc::now(),
        }
    }

    /// Every state this job has held locally, current one last.
    pub fn trace(&self) -> Vec<JobState> {
        let mut trace = self.state_history.clone();
        trace.push(self.state);
        trace
    }
}

/// Transcript text of a COMPLETED job. Consumed once written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptResult {
    pub job_name: String,
    pub text: String,
    pub source_uri: String,
}
