//! Configuration loaded once at start-up from `transcribe.toml`.
//!
//! Values missing from the file fall back to defaults. Environment variables
//! take precedence over the file. Nothing here changes after loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, TranscribeError};

const DEFAULT_CONFIG_FILE: &str = "transcribe.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeConfig {
    /// Credential sent with every request to the remote services.
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub region: String,

    /// Bucket that receives uploaded audio.
    #[serde(default)]
    pub bucket: String,

    /// Base URL of the blob store.
    #[serde(default)]
    pub storage_url: String,

    /// Base URL of the transcription service.
    #[serde(default)]
    pub service_url: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Minimum gap between two upload progress updates.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    #[serde(default = "default_language_code")]
    pub language_code: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./transcripts")
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_progress_interval_ms() -> u64 {
    100
}

fn default_language_code() -> String {
    "en-US".to_string()
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            region: String::new(),
            bucket: String::new(),
            storage_url: String::new(),
            service_url: String::new(),
            output_dir: default_output_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            progress_interval_ms: default_progress_interval_ms(),
            language_code: default_language_code(),
        }
    }
}

impl TranscribeConfig {
    /// Loads `path`, or `transcribe.toml` in the current directory when no
    /// path is given. An explicit path must exist; the default one may not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if !path.exists() => {
                return Err(TranscribeError::ConfigFileMissing {
                    path: path.display().to_string(),
                });
            }
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Overrides fields from environment-style variables. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = get("TRANSCRIBE_API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = get("TRANSCRIBE_REGION") {
            self.region = v;
        }
        if let Some(v) = get("TRANSCRIBE_BUCKET") {
            self.bucket = v;
        }
        if let Some(v) = get("TRANSCRIBE_STORAGE_URL") {
            self.storage_url = v;
        }
        if let Some(v) = get("TRANSCRIBE_SERVICE_URL") {
            self.service_url = v;
        }
        if let Some(v) = get("DEFAULT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
    }

    /// Settings the upload path needs on top of [`require_service`](Self::require_service).
    pub fn require_storage(&self) -> Result<()> {
        require("bucket", &self.bucket)?;
        require("storage_url", &self.storage_url)
    }

    pub fn require_service(&self) -> Result<()> {
        require("api_key", &self.api_key)?;
        require("region", &self.region)?;
        require("service_url", &self.service_url)
    }

    /// A zero poll interval would turn waiting into a tight query loop.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(TranscribeError::InvalidConfig {
                field: "poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(TranscribeError::ConfigurationMissing(field))
    } else {
        Ok(())
    }
}
