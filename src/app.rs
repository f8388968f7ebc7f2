//! Glue between the parsed command line and the orchestrator.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::config::TranscribeConfig;
use crate::error::Result;
use crate::orchestrator::{Orchestrator, RunReport, RunSettings, UploadRequest};
use crate::progress::ProgressSink;
use crate::remote::{HttpBlobStore, HttpTranscriptionService};

/// Loads configuration and runs the selected command.
pub async fn execute<P: ProgressSink>(
    cli: &Cli,
    sink: P,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    let config = TranscribeConfig::load(cli.config.as_deref())?;
    run(cli, config, sink, cancel).await
}

pub async fn run<P: ProgressSink>(
    cli: &Cli,
    mut config: TranscribeConfig,
    sink: P,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    apply_overrides(cli, &mut config);
    config.validate()?;
    config.require_service()?;
    if matches!(cli.command, Command::Upload { .. }) {
        config.require_storage()?;
    }
    debug!(
        service = %config.service_url,
        poll_ms = config.poll_interval_ms,
        "configuration resolved"
    );

    let orchestrator = Orchestrator::new(
        HttpBlobStore::new(&config)?,
        HttpTranscriptionService::new(&config)?,
        sink,
        RunSettings::from(&config),
    );

    match &cli.command {
        Command::Upload {
            input_file,
            key,
            job_name,
            wait,
        } => {
            let request = UploadRequest {
                input: input_file.clone(),
                key: key.clone(),
                job_name: job_name.clone(),
                wait: *wait,
            };
            orchestrator.upload(&request, cancel).await
        }
        Command::Fetch {
            job_name,
            output_file,
            wait,
        } => {
            orchestrator
                .fetch(job_name, output_file.as_deref(), *wait, cancel)
                .await
        }
    }
}

fn apply_overrides(cli: &Cli, config: &mut TranscribeConfig) {
    if let Some(secs) = cli.poll_interval {
        config.poll_interval_ms = secs.saturating_mul(1000);
    }
}

/// Process exit status for a finished run: 0 on success, 1 on any error.
/// Cancellation is a success; the report says what was left behind.
pub fn exit_status(result: &Result<RunReport>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
