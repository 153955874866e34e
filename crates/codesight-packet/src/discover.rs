//! Project tree enumeration with parallel filtering.

use crate::model::{DiscoveredFiles, FileRecord};
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use codesight_selectors::ExclusionRules;
use codesight_utils::error::DiscoveryError;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::thread;

/// Number of listed paths each filtering worker handles
pub const CHUNK_SIZE: usize = 1000;

/// Enumerate every file under `root` that `rules` does not exclude.
///
/// Only a missing or unreadable root is an error. Anything that goes wrong
/// for an individual entry (a stat race, a permission problem, a non UTF-8
/// name) drops that entry and is logged at debug level.
pub fn discover_files(
    root: &Utf8Path,
    rules: &ExclusionRules,
) -> Result<DiscoveredFiles, DiscoveryError> {
    check_root(root)?;

    let mut listing = Vec::new();
    let top = fs::read_dir(root).map_err(|e| DiscoveryError::Unreadable {
        path: root.to_string(),
        reason: e.to_string(),
    })?;
    list_entries(top, root, rules, &mut listing);
    tracing::debug!(entries = listing.len(), "listed project tree");

    let chunk_results = thread::scope(|s| {
        let handles: Vec<_> = listing
            .chunks(CHUNK_SIZE)
            .map(|chunk| s.spawn(move || filter_chunk(chunk, root, rules)))
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.join() {
                Ok(records) => results.push(records),
                Err(_) => {
                    return Err(DiscoveryError::Unreadable {
                        path: root.to_string(),
                        reason: "worker thread panicked during discovery".to_string(),
                    });
                }
            }
        }
        Ok(results)
    })?;

    Ok(chunk_results.into_iter().flatten().collect())
}

fn check_root(root: &Utf8Path) -> Result<(), DiscoveryError> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(DiscoveryError::RootNotDirectory {
            path: root.to_string(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(DiscoveryError::RootNotFound {
            path: root.to_string(),
        }),
        Err(e) => Err(DiscoveryError::Unreadable {
            path: root.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Depth-first listing, entries sorted by name at every level. Symlinked
/// directories and directories the rules exclude are not descended into.
fn list_entries(
    dir: fs::ReadDir,
    root: &Utf8Path,
    rules: &ExclusionRules,
    out: &mut Vec<PathBuf>,
) {
    let mut entries: Vec<fs::DirEntry> = dir
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable directory entry: {e}");
                None
            }
        })
        .collect();
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let is_dir = entry.file_type().is_ok_and(|ft| ft.is_dir());
        if is_dir {
            let Some(relative) =
                Utf8Path::from_path(&path).and_then(|p| p.strip_prefix(root).ok())
            else {
                tracing::debug!("Skipping directory with non UTF-8 path {}", path.display());
                continue;
            };
            if rules.is_dir_excluded(relative) {
                tracing::trace!("Pruning excluded directory {relative}");
                continue;
            }
            match fs::read_dir(&path) {
                Ok(children) => list_entries(children, root, rules, out),
                Err(e) => tracing::debug!("Skipping directory {}: {e}", path.display()),
            }
        } else {
            out.push(path);
        }
    }
}

fn filter_chunk(chunk: &[PathBuf], root: &Utf8Path, rules: &ExclusionRules) -> Vec<FileRecord> {
    let mut records = Vec::with_capacity(chunk.len());
    for path in chunk {
        let Some(utf8) = Utf8Path::from_path(path) else {
            tracing::debug!("Skipping non UTF-8 path {}", path.display());
            continue;
        };
        let Ok(relative) = utf8.strip_prefix(root) else {
            continue;
        };
        if rules.is_excluded(relative) {
            continue;
        }

        let meta = match fs::symlink_metadata(utf8) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!("Skipping {relative}: {e}");
                continue;
            }
        };
        if !meta.file_type().is_file() {
            continue;
        }
        let mtime = match meta.modified() {
            Ok(mtime) => DateTime::<Utc>::from(mtime),
            Err(e) => {
                tracing::debug!("Skipping {relative}: no modification time: {e}");
                continue;
            }
        };

        records.push(FileRecord {
            path: utf8.to_path_buf(),
            relative: relative.to_path_buf(),
            mtime,
        });
    }
    records
}
