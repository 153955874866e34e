//! Helpers shared by the command handlers

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use codesight_packet::canonical_root;

/// Absolute project root for an optional `DIR` argument (default `.`)
pub(super) fn resolve_project_root(dir: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
    let dir = dir.unwrap_or(Utf8Path::new("."));
    Ok(canonical_root(dir)?)
}
