//! Config command implementation
//!
//! Handles `codesight config`: print the effective configuration with the
//! source of every value.

use anyhow::Result;
use camino::Utf8Path;
use codesight_config::{CliArgs, Config};

use super::common::resolve_project_root;

/// Execute the config command
pub fn execute_config_command(dir: Option<&Utf8Path>, config_path: Option<&Utf8Path>) -> Result<()> {
    let root = resolve_project_root(dir)?;
    let cli_args = CliArgs {
        config_path: config_path.map(Utf8Path::to_path_buf),
        ..CliArgs::default()
    };
    let config = Config::discover_from(&root, &cli_args)?;
    print!("{}", format_config(&config));
    Ok(())
}

fn format_config(config: &Config) -> String {
    let mut out = String::from("CodeSight Configuration:\n========================\n");
    match &config.config_file {
        Some(path) => out.push_str(&format!("Config file: {path}\n")),
        None => out.push_str("Config file: (none, using defaults)\n"),
    }
    out.push('\n');
    for (key, (value, source)) in config.effective_config() {
        out.push_str(&format!("  {key} = {value} (from {source})\n"));
    }
    out
}
