mod app;
mod cancel;
mod cli;
mod config;
mod error;
mod identity;
mod logging;
mod materializer;
mod orchestrator;
mod poller;
mod progress;
mod remote;
mod state_machine;
mod submitter;
mod ui;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use ui::TerminalProgress;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{e}");
    }

    let cancel = cancel::cancel_on_interrupt();
    let result = app::execute(&cli, TerminalProgress::new(), &cancel).await;
    match &result {
        Ok(report) => ui::print_report(report),
        Err(e) => ui::print_error(e),
    }
    ExitCode::from(app::exit_status(&result))
}
