use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// A discovered file that survived exclusion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path
    pub path: Utf8PathBuf,
    /// Path relative to the project root
    pub relative: Utf8PathBuf,
    /// Last modification time
    pub mtime: DateTime<Utc>,
}

impl FileRecord {
    /// Bare file name, as shown in section headers
    #[must_use]
    pub fn name(&self) -> &str {
        self.relative.file_name().unwrap_or(self.relative.as_str())
    }

    /// Parent directory relative to the root (empty for top-level files)
    #[must_use]
    pub fn relative_dir(&self) -> &Utf8Path {
        self.relative.parent().unwrap_or(Utf8Path::new(""))
    }

    /// True when the file is older than `threshold` at `now`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now.signed_duration_since(self.mtime) > threshold
    }
}

/// Insertion-ordered `parent dir -> files` mapping produced by discovery.
///
/// Directory order is the order in which each directory's first file was
/// discovered; file order within a directory is discovery order.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    dirs: Vec<(Utf8PathBuf, Vec<FileRecord>)>,
    index: HashMap<Utf8PathBuf, usize>,
}

impl DiscoveredFiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: FileRecord) {
        let dir = record.relative_dir().to_path_buf();
        match self.index.get(&dir) {
            Some(&slot) => self.dirs[slot].1.push(record),
            None => {
                self.index.insert(dir.clone(), self.dirs.len());
                self.dirs.push((dir, vec![record]));
            }
        }
    }

    /// Number of files across all directories
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.dirs.iter().map(|(_, files)| files.len()).sum()
    }

    #[must_use]
    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Utf8Path, &[FileRecord])> {
        self.dirs
            .iter()
            .map(|(dir, files)| (dir.as_path(), files.as_slice()))
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.dirs.iter().flat_map(|(_, files)| files.iter())
    }
}

impl IntoIterator for DiscoveredFiles {
    type Item = (Utf8PathBuf, Vec<FileRecord>);
    type IntoIter = std::vec::IntoIter<(Utf8PathBuf, Vec<FileRecord>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.dirs.into_iter()
    }
}

impl FromIterator<FileRecord> for DiscoveredFiles {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut discovered = Self::new();
        for record in iter {
            discovered.push(record);
        }
        discovered
    }
}

/// Files of one directory together with their newest modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    /// Directory relative to the project root (empty for the root itself)
    pub relative: Utf8PathBuf,
    pub files: Vec<FileRecord>,
    pub max_mtime: DateTime<Utc>,
}

impl DirectoryGroup {
    /// Files newest first; ties keep discovery order.
    #[must_use]
    pub fn files_by_recency(&self) -> Vec<&FileRecord> {
        let mut files: Vec<&FileRecord> = self.files.iter().collect();
        files.sort_by(|a, b| b.mtime.cmp(&a.mtime));
        files
    }

    /// Files ordered by name, as listed in the manifest
    #[must_use]
    pub fn files_by_name(&self) -> Vec<&FileRecord> {
        let mut files: Vec<&FileRecord> = self.files.iter().collect();
        files.sort_by(|a, b| a.name().cmp(b.name()));
        files
    }
}

/// Running totals of one assembly pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyState {
    pub total_tokens: usize,
    pub truncated_any: bool,
}

impl AssemblyState {
    /// Whether `tokens` more still fits in `budget` (inclusive).
    #[must_use]
    pub const fn fits(&self, tokens: usize, budget: usize) -> bool {
        self.total_tokens.saturating_add(tokens) <= budget
    }
}

/// How a file ended up in the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Included,
    Truncated,
    Skipped,
    Errored,
}

/// One file's section of the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub header: String,
    pub body: String,
    /// Tokens charged against the budget for this section
    pub token_count: usize,
    pub status: FileStatus,
}

impl RenderedFile {
    /// The text appended to the snapshot for this file
    #[must_use]
    pub fn section(&self) -> String {
        crate::render::section(&self.header, &self.body)
    }
}

/// Per-file summary kept on the finished snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub relative: Utf8PathBuf,
    pub status: FileStatus,
    pub token_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(relative: &str, secs: i64) -> FileRecord {
        FileRecord {
            path: Utf8PathBuf::from("/p").join(relative),
            relative: Utf8PathBuf::from(relative),
            mtime: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_discovered_files_keep_insertion_order() {
        let discovered: DiscoveredFiles = [
            record("src/b.py", 1),
            record("main.py", 2),
            record("src/a.py", 3),
        ]
        .into_iter()
        .collect();

        let dirs: Vec<&str> = discovered.iter().map(|(dir, _)| dir.as_str()).collect();
        assert_eq!(dirs, vec!["src", ""]);
        assert_eq!(discovered.file_count(), 3);

        let src: Vec<&str> = discovered
            .iter()
            .next()
            .unwrap()
            .1
            .iter()
            .map(FileRecord::name)
            .collect();
        assert_eq!(src, vec!["b.py", "a.py"]);
    }

    #[test]
    fn test_staleness_is_strictly_greater() {
        let now = Utc.timestamp_opt(10 * 86_400, 0).unwrap();
        let threshold = Duration::days(7);

        assert!(!record("a.py", 3 * 86_400).is_stale(now, threshold));
        assert!(record("a.py", 3 * 86_400 - 1).is_stale(now, threshold));
    }

    #[test]
    fn test_budget_check_is_inclusive() {
        let state = AssemblyState {
            total_tokens: 90,
            truncated_any: false,
        };
        assert!(state.fits(10, 100));
        assert!(!state.fits(11, 100));
        assert!(!state.fits(usize::MAX, 100));
    }

    #[test]
    fn test_group_orderings_are_stable() {
        let group = DirectoryGroup {
            relative: Utf8PathBuf::from("src"),
            files: vec![record("src/z.py", 5), record("src/a.py", 5), record("src/m.py", 9)],
            max_mtime: Utc.timestamp_opt(9, 0).unwrap(),
        };

        let by_recency: Vec<&str> = group.files_by_recency().iter().map(|f| f.name()).collect();
        assert_eq!(by_recency, vec!["m.py", "z.py", "a.py"]);

        let by_name: Vec<&str> = group.files_by_name().iter().map(|f| f.name()).collect();
        assert_eq!(by_name, vec!["a.py", "m.py", "z.py"]);
    }
}
