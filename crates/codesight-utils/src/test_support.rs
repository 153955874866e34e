//! Fixture helpers shared by tests across the workspace.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Write `content` to `path` (creating parents) and backdate its mtime by `age`.
pub fn write_file_aged(path: &Path, content: &str, age: Duration) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    set_mtime(path, SystemTime::now() - age)
}

/// Set the modification time of an existing file.
pub fn set_mtime(path: &Path, mtime: SystemTime) -> io::Result<()> {
    let file = fs::File::options().write(true).open(path)?;
    file.set_modified(mtime)
}

/// Convenience for whole days
#[must_use]
pub const fn days(n: u64) -> Duration {
    Duration::from_secs(n * 24 * 60 * 60)
}

/// Convenience for whole hours
#[must_use]
pub const fn hours(n: u64) -> Duration {
    Duration::from_secs(n * 60 * 60)
}
