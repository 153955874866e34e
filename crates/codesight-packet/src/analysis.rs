//! Token usage report over the files a snapshot would consider.

use crate::discover::discover_files;
use crate::model::FileRecord;
use crate::tokenizer::TokenCounter;
use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use codesight_selectors::ExclusionRules;
use codesight_utils::error::CodesightError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::thread;

/// Token totals per file and per directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenReport {
    pub total_tokens: usize,
    pub processed_files: usize,
    /// Files that were not valid UTF-8 text or could not be read
    pub skipped_files: usize,
    /// Largest files first, at most `limit` entries
    pub top_files: Vec<(Utf8PathBuf, usize)>,
    /// Largest directories first, at most `limit` entries
    pub top_dirs: Vec<(Utf8PathBuf, usize)>,
}

/// Count raw (unoptimized) tokens of every file `rules` keeps under `root`.
pub fn analyze_token_usage(
    root: &Utf8Path,
    rules: &ExclusionRules,
    counter: &dyn TokenCounter,
    limit: usize,
) -> Result<TokenReport> {
    let discovered = discover_files(root, rules).map_err(CodesightError::from)?;
    let records: Vec<&FileRecord> = discovered.files().collect();

    let counts = count_all(&records, counter);

    let mut report = TokenReport::default();
    let mut files = Vec::new();
    let mut dirs: BTreeMap<Utf8PathBuf, usize> = BTreeMap::new();

    for (record, count) in records.iter().zip(counts) {
        match count {
            Some(tokens) => {
                report.total_tokens += tokens;
                report.processed_files += 1;
                *dirs.entry(record.relative_dir().to_path_buf()).or_default() += tokens;
                files.push((record.relative.clone(), tokens));
            }
            None => report.skipped_files += 1,
        }
    }

    files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    files.truncate(limit);

    let mut dirs: Vec<(Utf8PathBuf, usize)> = dirs.into_iter().collect();
    dirs.sort_by(|a, b| b.1.cmp(&a.1));
    dirs.truncate(limit);

    report.top_files = files;
    report.top_dirs = dirs;
    Ok(report)
}

fn count_all(records: &[&FileRecord], counter: &dyn TokenCounter) -> Vec<Option<usize>> {
    if records.is_empty() {
        return Vec::new();
    }
    let workers = thread::available_parallelism().map_or(4, |n| n.get());
    let chunk_size = records.len().div_ceil(workers);

    thread::scope(|s| {
        let handles: Vec<_> = records
            .chunks(chunk_size)
            .map(|chunk| {
                let handle = s.spawn(move || {
                    chunk
                        .iter()
                        .map(|record| count_file(record, counter))
                        .collect::<Vec<_>>()
                });
                (chunk.len(), handle)
            })
            .collect();

        let mut all = Vec::with_capacity(records.len());
        for (len, handle) in handles {
            match handle.join() {
                Ok(counts) => all.extend(counts),
                Err(_) => all.extend(std::iter::repeat_n(None, len)),
            }
        }
        all
    })
}

fn count_file(record: &FileRecord, counter: &dyn TokenCounter) -> Option<usize> {
    match fs::read(&record.path).map(String::from_utf8) {
        Ok(Ok(text)) => Some(counter.count(&text)),
        Ok(Err(_)) => {
            tracing::debug!("Not counting {}: not UTF-8 text", record.relative);
            None
        }
        Err(e) => {
            tracing::debug!("Not counting {}: {e}", record.relative);
            None
        }
    }
}
