//! Command-line interface built on clap.
//!
//! Two subcommands, [`Command::Upload`] and [`Command::Fetch`], plus global
//! flags for the config file, poll interval and verbosity.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Submit audio for transcription and collect the transcripts.
#[derive(Debug, Parser)]
#[command(name = "transcribe", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file to load instead of ./transcribe.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seconds between two status queries while waiting.
    #[arg(long, global = true, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload an audio file and start a transcription job for it.
    Upload {
        /// Local audio file (mp3, wav, flac, ogg, mp4, m4a).
        #[arg(long, value_name = "PATH")]
        input_file: PathBuf,

        /// Storage key; the input's extension is appended when it has none.
        #[arg(long)]
        key: Option<String>,

        /// Job name; defaults to the storage key without its extension.
        #[arg(long)]
        job_name: Option<String>,

        /// Wait for the job and save its transcript.
        #[arg(long, default_value_t = false)]
        wait: bool,
    },

    /// Save the transcript of an existing job.
    Fetch {
        #[arg(long)]
        job_name: String,

        /// Target file or directory; defaults to the configured output directory.
        #[arg(long, value_name = "PATH")]
        output_file: Option<PathBuf>,

        /// Keep polling until the job finishes.
        #[arg(long, default_value_t = false)]
        wait: bool,
    },
}
