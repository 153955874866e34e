//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, installs logging, dispatches to a command handler
//! and owns all error output.

use anyhow::Result;
use clap::Parser;
use codesight_utils::error::CodesightError;
use codesight_utils::exit_codes::ExitCode;
use codesight_utils::logging::init_tracing;

use super::args::{Cli, Commands};
use super::commands;

/// Main CLI execution function.
///
/// Returns `Err(ExitCode)` after printing the error report; main.rs only
/// calls `std::process::exit()` with it.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let operation = cli.command.name();
    let config_path = cli.config.as_deref();

    let result = match &cli.command {
        Commands::Collect(args) => commands::execute_collect_command(args, config_path),
        Commands::Tokens {
            dir,
            limit,
            selectors,
        } => commands::execute_tokens_command(dir.as_deref(), *limit, selectors, config_path),
        Commands::Init { dir, add_gitignore } => {
            commands::execute_init_command(dir.as_deref(), *add_gitignore)
        }
        Commands::Config { dir } => commands::execute_config_command(dir.as_deref(), config_path),
    };

    result.map_err(|error| report_error(&error, operation))
}

/// Print an error report and pick the exit code
fn report_error(error: &anyhow::Error, operation: &str) -> ExitCode {
    let codesight_error = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CodesightError>());

    match codesight_error {
        Some(err) => {
            eprint!("{}", err.display_for_user());
            if error.chain().count() > 1 {
                eprintln!("\nDetails ({operation}): {error:#}");
            }
            err.to_exit_code()
        }
        None => {
            eprintln!("✗ Unexpected error during {operation}: {error:#}");
            eprintln!("\n  General troubleshooting:");
            eprintln!("    - Run with --verbose for more detailed output");
            eprintln!("    - Set RUST_LOG=codesight=debug for per-file decisions");
            ExitCode::INTERNAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use codesight_utils::error::{ConfigError, DiscoveryError};

    #[test]
    fn test_wrapped_codesight_error_keeps_exit_code() {
        let err: anyhow::Error = Err::<(), _>(CodesightError::from(DiscoveryError::RootNotFound {
            path: "/missing".to_string(),
        }))
        .context("Failed to build snapshot")
        .unwrap_err();
        assert_eq!(report_error(&err, "collect"), ExitCode::ROOT_NOT_FOUND);
    }

    #[test]
    fn test_config_error_is_cli_args() {
        let err = anyhow::Error::new(CodesightError::Config(ConfigError::InvalidFile(
            "bad".to_string(),
        )));
        assert_eq!(report_error(&err, "config"), ExitCode::CLI_ARGS);
    }

    #[test]
    fn test_foreign_error_is_internal() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(report_error(&err, "tokens"), ExitCode::INTERNAL);
    }
}
