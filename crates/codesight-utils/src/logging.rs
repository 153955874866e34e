//! Logging infrastructure for codesight
//!
//! All crates log through `tracing`; the CLI installs the subscriber once via
//! [`init_tracing`]. Logs go to stderr so stdout stays clean for summaries.

use tracing::{Level, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize tracing subscriber for structured logging
///
/// `RUST_LOG` takes precedence. Otherwise verbose mode enables debug output
/// for codesight crates and adds span timings.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("codesight=debug,info")
            } else {
                EnvFilter::try_new("codesight=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .without_time()
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span for one pipeline stage (`discover`, `assemble`, ...) of a project.
pub fn stage_span(stage: &str, project: &str) -> tracing::Span {
    span!(Level::INFO, "stage", stage = %stage, project = %project)
}

/// Log stage completion with duration and item count
pub fn log_stage_complete(stage: &str, items: usize, duration_ms: u128) {
    info!(
        stage = %stage,
        items = items,
        duration_ms = %duration_ms,
        "stage completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_span_is_creatable_without_subscriber() {
        let span = stage_span("discover", "demo");
        let _guard = span.enter();
        log_stage_complete("discover", 3, 12);
    }
}
