//! Derives the storage key, source format and default job name for an upload.
//!
//! Everything here is pure: no filesystem access, no clock. The same input path
//! and optional key always produce the same [`ArtifactReference`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TranscribeError};

/// Media formats the transcription service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Mp3,
    Wav,
    Flac,
    Ogg,
    Mp4,
}

/// Extension to format table. The service has no M4A tag, so `m4a` rides as MP4.
const EXTENSION_FORMATS: &[(&str, SourceFormat)] = &[
    ("mp3", SourceFormat::Mp3),
    ("wav", SourceFormat::Wav),
    ("flac", SourceFormat::Flac),
    ("ogg", SourceFormat::Ogg),
    ("mp4", SourceFormat::Mp4),
    ("m4a", SourceFormat::Mp4),
];

impl SourceFormat {
    /// Looks up a file extension (without the dot), ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSION_FORMATS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map(|&(_, format)| format)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Mp3 => "mp3",
            SourceFormat::Wav => "wav",
            SourceFormat::Flac => "flac",
            SourceFormat::Ogg => "ogg",
            SourceFormat::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an uploaded input object. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub storage_key: String,
    pub source_format: SourceFormat,
    pub origin_path: PathBuf,
}

impl ArtifactReference {
    /// File name shown next to the upload progress bar.
    pub fn display_name(&self) -> String {
        self.origin_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.storage_key.clone())
    }
}

/// Resolves the artifact identity for `input`, optionally stored under `key`.
///
/// - no key: the base file name of `input`, extension preserved
/// - key with a recognized audio extension: used verbatim
/// - any other key: the extension of `input` is appended
pub fn resolve(input: &Path, key: Option<&str>) -> Result<ArtifactReference> {
    let origin_ext = extension_of(input);

    let storage_key = match key.map(str::trim).filter(|k| !k.is_empty()) {
        None => input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| TranscribeError::UnsupportedFormat(input.display().to_string()))?,
        Some(key) if audio_extension(key).is_some() => key.to_string(),
        Some(key) => match &origin_ext {
            Some(ext) => format!("{key}.{ext}"),
            None => return Err(TranscribeError::UnsupportedFormat(key.to_string())),
        },
    };

    let source_format = audio_extension(&storage_key).ok_or_else(|| {
        TranscribeError::UnsupportedFormat(extension_of(Path::new(&storage_key)).unwrap_or_default())
    })?;

    Ok(ArtifactReference {
        storage_key,
        source_format,
        origin_path: input.to_path_buf(),
    })
}

/// Job name used when the caller supplies none: the key's file stem with
/// every character outside `[A-Za-z0-9._-]` replaced by `-`.
pub fn default_job_name(storage_key: &str) -> String {
    let stem = Path::new(storage_key)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| storage_key.to_string());
    sanitize_job_name(&stem)
}

pub fn sanitize_job_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .filter(|e| !e.is_empty())
}

fn audio_extension(key: &str) -> Option<SourceFormat> {
    extension_of(Path::new(key)).and_then(|ext| SourceFormat::from_extension(&ext))
}
