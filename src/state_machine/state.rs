use std::fmt;

use serde::{Deserialize, Serialize};

use super::job::TranscriptionJob;
use crate::error::{Result, TranscribeError};

/// Local view of a remote transcription job's lifecycle.
///
/// QUEUED → IN_PROGRESS → COMPLETED | FAILED. States only move forward;
/// COMPLETED and FAILED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,
    InProgress,
    Completed,
    Failed,
}

impl JobState {
    fn rank(self) -> u8 {
        match self {
            JobState::Queued => 0,
            JobState::InProgress => 1,
            JobState::Completed | JobState::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether moving from `self` to `next` is a forward step.
    pub fn can_advance_to(self, next: JobState) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "QUEUED"),
            JobState::InProgress => write!(f, "IN_PROGRESS"),
            JobState::Completed => write!(f, "COMPLETED"),
            JobState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Remote status vocabulary. Exhaustive on purpose: a code missing from this
/// table is an error, never an implicit "still running".
const REMOTE_STATUS_TABLE: &[(&str, JobState)] = &[
    ("QUEUED", JobState::Queued),
    ("IN_PROGRESS", JobState::InProgress),
    ("COMPLETED", JobState::Completed),
    ("FAILED", JobState::Failed),
    ("ERROR", JobState::Failed),
];

/// Translates a remote status code into a [`JobState`].
pub fn classify_remote_status(code: &str) -> Result<JobState> {
    let code = code.trim();
    REMOTE_STATUS_TABLE
        .iter()
        .find(|(remote, _)| *remote == code)
        .map(|&(_, state)| state)
        .ok_or_else(|| TranscribeError::UnknownRemoteState(code.to_string()))
}

/// What applying one remote observation did to the local job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The observation matched the current state.
    Unchanged(JobState),
    /// The job moved forward.
    Advanced { from: JobState, to: JobState },
    /// The observation would have moved the job backwards (or between
    /// terminal states) and was dropped.
    Ignored { current: JobState, observed: JobState },
}

/// Applies remote observations to a [`TranscriptionJob`].
pub struct StateMachine;

impl StateMachine {
    pub fn observe(job: &mut TranscriptionJob, observed: JobState) -> Transition {
        let current = job.state;
        if observed == current {
            Transition::Unchanged(current)
        } else if current.can_advance_to(observed) {
            job.state_history.push(current);
            job.state = observed;
            Transition::Advanced {
                from: current,
                to: observed,
            }
        } else {
            Transition::Ignored { current, observed }
        }
    }
}
