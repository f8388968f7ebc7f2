use std::fmt;

use thiserror::Error;

use crate::state_machine::JobState;

pub type Result<T> = std::result::Result<T, TranscribeError>;

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("unsupported audio format: {0:?}")]
    UnsupportedFormat(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned status {status}: {message}")]
    RemoteStatus { status: u16, message: String },

    #[error("malformed remote payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("job {0} has no transcript location")]
    MissingTranscript(String),

    #[error("a job named {0:?} already exists, pick another name")]
    DuplicateJob(String),

    #[error("remote rejected the artifact: {0}")]
    InvalidArtifact(String),

    #[error("unrecognized remote job status {0:?}")]
    UnknownRemoteState(String),

    #[error("job {job_name} failed: {}", .reason.as_deref().unwrap_or("no reason reported"))]
    JobFailed {
        job_name: String,
        reason: Option<String>,
    },

    #[error("job {job_name} is still {state}")]
    NotComplete { job_name: String, state: JobState },

    #[error("missing configuration: {0}")]
    ConfigurationMissing(&'static str),

    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("config file {path} not found")]
    ConfigFileMissing { path: String },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification printed alongside every error the CLI reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedFormat,
    TransportFailure,
    DuplicateJob,
    InvalidArtifact,
    UnknownRemoteState,
    JobFailed,
    JobNotComplete,
    ConfigurationMissing,
    LocalIo,
}

impl TranscribeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranscribeError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            TranscribeError::Http(_)
            | TranscribeError::RemoteStatus { .. }
            | TranscribeError::Payload(_)
            | TranscribeError::MissingTranscript(_) => ErrorKind::TransportFailure,
            TranscribeError::DuplicateJob(_) => ErrorKind::DuplicateJob,
            TranscribeError::InvalidArtifact(_) => ErrorKind::InvalidArtifact,
            TranscribeError::UnknownRemoteState(_) => ErrorKind::UnknownRemoteState,
            TranscribeError::JobFailed { .. } => ErrorKind::JobFailed,
            TranscribeError::NotComplete { .. } => ErrorKind::JobNotComplete,
            TranscribeError::ConfigurationMissing(_)
            | TranscribeError::InvalidConfig { .. }
            | TranscribeError::ConfigFileMissing { .. }
            | TranscribeError::Toml(_) => ErrorKind::ConfigurationMissing,
            TranscribeError::Io(_) => ErrorKind::LocalIo,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedFormat => "UnsupportedFormat",
            ErrorKind::TransportFailure => "TransportFailure",
            ErrorKind::DuplicateJob => "DuplicateJob",
            ErrorKind::InvalidArtifact => "InvalidArtifact",
            ErrorKind::UnknownRemoteState => "UnknownRemoteState",
            ErrorKind::JobFailed => "JobFailed",
            ErrorKind::JobNotComplete => "JobNotComplete",
            ErrorKind::ConfigurationMissing => "ConfigurationMissing",
            ErrorKind::LocalIo => "LocalIo",
        };
        f.write_str(name)
    }
}
