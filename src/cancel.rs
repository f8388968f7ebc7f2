//! Cooperative cancellation for the two places the pipeline waits: between
//! upload chunks and between status polls.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Result of an operation the operator may interrupt. Cancellation is a clean
/// early return, not an error.
#[derive(Debug)]
pub enum Outcome<T> {
    Finished(T),
    Cancelled,
}

#[cfg(test)]
impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}

/// Token that fires on Ctrl-C. The handler only flips the token; the loops
/// watching it decide how to stop.
pub fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, detaching");
            trigger.cancel();
        }
    });
    token
}
