//! Terminal output: upload bar, waiting spinner and the final report.
//!
//! Uses `indicatif` for progress and `console` for colors. Everything here
//! goes to stderr except the saved-transcript line, so stdout stays pipeable.

use std::sync::Mutex;
use std::time::Duration;

use console::Style;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};

use crate::error::TranscribeError;
use crate::orchestrator::RunReport;
use crate::progress::ProgressSink;
use crate::state_machine::JobState;

/// [`ProgressSink`] drawing to the terminal.
///
/// Bars are created lazily on the first event of their kind, so a run that
/// never uploads never shows an upload bar.
pub struct TerminalProgress {
    upload: Mutex<Option<ProgressBar>>,
    waiting: Mutex<Option<ProgressBar>>,
    green: Style,
    yellow: Style,
    cyan: Style,
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self {
            upload: Mutex::new(None),
            waiting: Mutex::new(None),
            green: Style::new().green().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
        }
    }
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn upload_bar(label: &str, total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        pb.set_style(style);
        pb.set_message(format!("Uploading {label}"));
        pb
    }

    fn spinner(job_name: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Waiting for {job_name}"));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    fn with_spinner(&self, job_name: &str, f: impl FnOnce(&ProgressBar)) {
        if let Ok(mut waiting) = self.waiting.lock() {
            let pb = waiting.get_or_insert_with(|| Self::spinner(job_name));
            f(pb);
        }
    }

    fn finish(&self) {
        for slot in [&self.upload, &self.waiting] {
            if let Some(pb) = slot.lock().ok().and_then(|mut bar| bar.take()) {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn on_upload_start(&self, label: &str, total: u64) {
        if let Ok(mut upload) = self.upload.lock() {
            *upload = Some(Self::upload_bar(label, total));
        }
    }

    fn on_bytes(&self, transferred: u64, total: u64) {
        if let Ok(mut upload) = self.upload.lock() {
            let pb = upload.get_or_insert_with(|| Self::upload_bar("audio", total));
            pb.set_position(transferred);
            if transferred >= total {
                pb.finish_with_message("Uploaded");
            }
        }
    }

    fn on_heartbeat(&self, job_name: &str, elapsed: Duration) {
        self.with_spinner(job_name, |pb| {
            pb.set_message(format!(
                "Waiting for {job_name} ({})",
                HumanDuration(elapsed)
            ));
        });
    }

    fn on_state_change(&self, job_name: &str, from: JobState, to: JobState) {
        let style = match to {
            JobState::Completed => &self.green,
            JobState::Failed => &self.yellow,
            _ => &self.cyan,
        };
        self.with_spinner(job_name, |pb| {
            pb.println(format!(
                "  {} {job_name}: {from} -> {}",
                style.apply_to("●"),
                style.apply_to(to)
            ));
            pb.set_message(format!("Waiting for {job_name} ({to})"));
        });
        if to.is_terminal() {
            self.finish();
        }
    }
}

/// Prints the outcome of a successful run.
pub fn print_report(report: &RunReport) {
    let green = Style::new().green().bold();
    let yellow = Style::new().yellow();
    match report {
        RunReport::Submitted { job_name } => {
            eprintln!("  {} Job {job_name} submitted", green.apply_to("✓"));
            print_fetch_hint(job_name);
        }
        RunReport::Saved { job_name, path } => {
            eprintln!("  {} Job {job_name} completed", green.apply_to("✓"));
            println!("{}", path.display());
        }
        RunReport::Pending { job_name, state } => {
            eprintln!("  {} Job {job_name} is {state}", yellow.apply_to("…"));
            print_fetch_hint(job_name);
        }
        RunReport::Detached { job_name } => {
            eprintln!(
                "  {} Stopped waiting; {job_name} keeps running remotely",
                yellow.apply_to("↻")
            );
            print_fetch_hint(job_name);
        }
        RunReport::UploadCancelled { storage_key } => {
            eprintln!(
                "  {} Upload of {storage_key} cancelled, no job was started",
                yellow.apply_to("✗")
            );
        }
    }
}

fn print_fetch_hint(job_name: &str) {
    eprintln!("    later: transcribe fetch --job-name {job_name}");
}

/// Prints one `error[<kind>]: <detail>` line to stderr.
pub fn print_error(err: &TranscribeError) {
    eprintln!("{}", format_error(err));
}

fn format_error(err: &TranscribeError) -> String {
    // Details may carry remote text with line breaks; the report stays on one line.
    let detail = err.to_string().lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ");
    format!(
        "{}: {detail}",
        Style::new().red().bold().apply_to(format!("error[{}]", err.kind()))
    )
}
