//! Collect command implementation
//!
//! Handles `codesight collect`: build the snapshot, write it, copy it to the
//! clipboard and print a one-line summary.

use anyhow::{Context, Result};
use camino::Utf8Path;
use chrono::Utc;
use codesight_config::Config;
use codesight_packet::{SnapshotBuilder, SnapshotStats, TokenCounter};
use codesight_update::{GithubReleases, UpdateChecker};
use codesight_utils::cache::FileKvCache;
use tracing::{debug, warn};

use super::common::resolve_project_root;
use crate::cli::args::CollectArgs;
use crate::clipboard::{ClipboardSink, SystemClipboard};

/// Repository whose releases are checked for updates
const RELEASES_REPO: &str = "mattsilv/codesight-python";

/// Execute the collect command
pub fn execute_collect_command(args: &CollectArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let root = resolve_project_root(args.dir.as_deref())?;
    let config = Config::discover_from(&root, &args.to_cli_args(config_path))?;

    if config.check_updates() {
        check_for_updates();
    }

    let mut options = config.to_snapshot_options();
    options.bug_description = args.bug.clone();

    let builder = SnapshotBuilder::new(options)?;
    let snapshot = builder
        .build(&root)
        .with_context(|| format!("Failed to build snapshot of {root}"))?;

    let output_path = builder.options().output_path(&root);
    println!("Saving output to: {output_path}");
    snapshot.write_to(&output_path)?;

    let copied = config.clipboard() && copy_to_clipboard(&snapshot.content);

    // The budget excludes some framing lines; report what the document really costs.
    let tokens = builder.counter().count(&snapshot.content);
    println!("{}", summary_line(&snapshot.stats, tokens));
    if copied {
        println!("Content copied to clipboard!");
    }
    println!("Output saved to {output_path}");

    Ok(())
}

/// `CodeSight: Processed N files (B bytes, T tokens)` plus a breakdown when
/// anything was reduced, skipped or unreadable.
#[must_use]
pub fn summary_line(stats: &SnapshotStats, tokens: usize) -> String {
    let mut line = format!(
        "CodeSight: Processed {} files ({} bytes, {} tokens)",
        stats.file_count, stats.byte_count, tokens
    );

    let mut notes = Vec::new();
    if stats.truncated > 0 {
        notes.push(format!("{} truncated", stats.truncated));
    }
    if stats.skipped > 0 {
        notes.push(format!("{} skipped", stats.skipped));
    }
    if stats.errored > 0 {
        notes.push(format!("{} unreadable", stats.errored));
    }
    if !notes.is_empty() {
        line.push_str(&format!(" [{}]", notes.join(", ")));
    }
    line
}

fn copy_to_clipboard(content: &str) -> bool {
    let Some(clipboard) = SystemClipboard::detect() else {
        warn!("No clipboard tool found (pbcopy, wl-copy, xclip, xsel or clip); skipping copy");
        return false;
    };
    match clipboard.copy(content) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to copy to clipboard: {e:#}");
            false
        }
    }
}

/// Print a notice to stderr when a newer release exists. Never fails.
fn check_for_updates() {
    let current = env!("CARGO_PKG_VERSION");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            debug!("Update check skipped, no runtime: {e}");
            return;
        }
    };
    let source = match GithubReleases::new(RELEASES_REPO, current) {
        Ok(source) => source,
        Err(e) => {
            debug!("Update check skipped: {e}");
            return;
        }
    };
    let mut cache = match FileKvCache::open_default() {
        Ok(cache) => cache,
        Err(e) => {
            debug!("Update check skipped, cache unavailable: {e:#}");
            return;
        }
    };

    let checker = UpdateChecker::new(source);
    if let Some(notice) = rt.block_on(checker.check(&mut cache, current, Utc::now())) {
        eprintln!("{}", notice.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_check_targets_project_repository() {
        assert!(env!("CARGO_PKG_REPOSITORY").ends_with(RELEASES_REPO));
    }

    #[test]
    fn test_summary_line_plain() {
        let stats = SnapshotStats {
            file_count: 3,
            included: 3,
            byte_count: 1200,
            ..SnapshotStats::default()
        };
        assert_eq!(
            summary_line(&stats, 321),
            "CodeSight: Processed 3 files (1200 bytes, 321 tokens)"
        );
    }

    #[test]
    fn test_summary_line_lists_reductions() {
        let stats = SnapshotStats {
            file_count: 5,
            included: 2,
            truncated: 1,
            skipped: 1,
            errored: 1,
            byte_count: 10,
            ..SnapshotStats::default()
        };
        assert!(
            summary_line(&stats, 7).ends_with("[1 truncated, 1 skipped, 1 unreadable]"),
            "{}",
            summary_line(&stats, 7)
        );
    }
}
