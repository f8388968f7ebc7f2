use anyhow::anyhow;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

/// Installs the global subscriber. Logs go to stderr so they never mix with
/// the transcript path printed on stdout.
///
/// `RUST_LOG` wins when set; otherwise only warnings show, or this crate's
/// debug output with `verbose`. `LOG_FORMAT=json` switches to JSON lines.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let json = std::env::var(LOG_FORMAT_VAR).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "warn,transcribe=debug" } else { "warn" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_enables_crate_debug() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "warn,transcribe=debug");
    }
}
