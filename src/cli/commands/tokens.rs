//! Tokens command implementation
//!
//! Handles `codesight tokens`: where do the tokens of a project go?

use anyhow::{Context, Result};
use camino::Utf8Path;
use codesight_config::Config;
use codesight_packet::{TiktokenCounter, TokenReport, analyze_token_usage};
use codesight_selectors::ExclusionRules;

use super::common::resolve_project_root;
use crate::cli::args::SelectorArgs;

/// Execute the tokens command
pub fn execute_tokens_command(
    dir: Option<&Utf8Path>,
    limit: usize,
    selectors: &SelectorArgs,
    config_path: Option<&Utf8Path>,
) -> Result<()> {
    let root = resolve_project_root(dir)?;
    let config = Config::discover_from(&root, &selectors.to_cli_args(config_path))?;
    let options = config.to_snapshot_options();

    let rules = ExclusionRules::for_project(&root, &options.selectors, &options.output_path(&root))
        .with_context(|| format!("Failed to build exclusion rules for {root}"))?;
    let counter = TiktokenCounter::cl100k()?;

    let report = analyze_token_usage(&root, &rules, &counter, limit)?;
    print!("{}", format_report(&report, options.token_limit));
    Ok(())
}

fn format_report(report: &TokenReport, token_limit: usize) -> String {
    let mut out = String::new();
    out.push_str("Token usage\n");
    out.push_str("===========\n");
    out.push_str(&format!("Total tokens:    {}\n", report.total_tokens));
    out.push_str(&format!("Token limit:     {token_limit}\n"));
    out.push_str(&format!("Files processed: {}\n", report.processed_files));
    out.push_str(&format!("Files skipped:   {}\n", report.skipped_files));
    if report.total_tokens > token_limit {
        out.push_str(&format!(
            "\nOver budget by {} tokens; older files will be truncated or skipped.\n",
            report.total_tokens - token_limit
        ));
    }

    out.push_str("\nLargest files:\n");
    for (path, tokens) in &report.top_files {
        out.push_str(&format!("  {tokens:>8}  {path}\n"));
    }

    out.push_str("\nLargest directories:\n");
    for (path, tokens) in &report.top_dirs {
        let shown = if path.as_str().is_empty() { "." } else { path.as_str() };
        out.push_str(&format!("  {tokens:>8}  {shown}/\n"));
    }
    out
}
