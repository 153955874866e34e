//! Text fragments of a snapshot document.
//!
//! Every fragment that follows the prompt starts with a newline; the
//! assembler joins fragments with another newline, which leaves one blank
//! line between sections.

use crate::model::DirectoryGroup;
use camino::Utf8Path;
use chrono::{DateTime, Utc};

pub const START_MARKER: &str = "\n# --- Start Code Files ---";
pub const END_MARKER: &str = "\n# --- End Code Files ---";
pub const TRUNCATION_NOTE: &str =
    "\n# Note: Some older files were truncated to stay within token limits.";

/// Render a directory path with `/` separators regardless of platform.
#[must_use]
pub fn slash_path(path: &Utf8Path) -> String {
    path.components()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

/// `# --- <name> (<relative time>) ---`
#[must_use]
pub fn file_header(name: &str, mtime: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format!("# --- {name} ({}) ---", relative_time(mtime, now))
}

/// `# <name>: skipped (token limit)`
#[must_use]
pub fn skipped_header(name: &str) -> String {
    format!("# {name}: skipped (token limit)")
}

/// Header and body of the inline note for a file that could not be read
#[must_use]
pub fn error_note(relative: &Utf8Path, reason: &str) -> (String, String) {
    (
        format!("# --- Error reading file: {} ---", slash_path(relative)),
        format!("# Error: {reason}"),
    )
}

/// `\n# Directory: <rel>/`, with `.` for the project root
#[must_use]
pub fn directory_header(relative: &Utf8Path) -> String {
    let dir = slash_path(relative);
    if dir.is_empty() {
        "\n# Directory: ./".to_string()
    } else {
        format!("\n# Directory: {dir}/")
    }
}

/// A file's section as it appears in the document
#[must_use]
pub fn section(header: &str, body: &str) -> String {
    if body.is_empty() {
        format!("\n{header}")
    } else {
        format!("\n{header}\n{body}")
    }
}

/// Prompt, project line, manifest and start marker.
///
/// The manifest lists directories in group order and file names sorted
/// within each directory.
#[must_use]
pub fn front_matter(
    prompt: &str,
    project_name: &str,
    now: DateTime<Utc>,
    groups: &[DirectoryGroup],
) -> Vec<String> {
    let mut parts = Vec::with_capacity(4 + groups.iter().map(|g| g.files.len()).sum::<usize>());
    parts.push(prompt.to_string());
    parts.push(format!(
        "\n# CodeSight: {project_name} ({})",
        now.format("%Y-%m-%d")
    ));
    parts.push("\n# Files:".to_string());

    for group in groups {
        let dir = slash_path(&group.relative);
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        for file in group.files_by_name() {
            parts.push(format!("# - {prefix}{}", file.name()));
        }
    }

    parts.push(START_MARKER.to_string());
    parts
}

/// Human readable age such as `3 hours ago`.
///
/// Times in the future (clock skew) read as `now`.
#[must_use]
pub fn relative_time(mtime: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(mtime).num_seconds();
    if secs < 1 {
        return "now".to_string();
    }

    let minutes = secs / 60;
    let hours = secs / 3_600;
    let days = secs / 86_400;

    if secs == 1 {
        "a second ago".to_string()
    } else if secs < 60 {
        format!("{secs} seconds ago")
    } else if minutes == 1 {
        "a minute ago".to_string()
    } else if hours == 0 {
        format!("{minutes} minutes ago")
    } else if hours == 1 {
        "an hour ago".to_string()
    } else if days == 0 {
        format!("{hours} hours ago")
    } else if days == 1 {
        "a day ago".to_string()
    } else if days < 30 {
        format!("{days} days ago")
    } else if days < 365 {
        // 30.5 day months
        match days * 10 / 305 {
            0 | 1 => "a month ago".to_string(),
            months => format!("{months} months ago"),
        }
    } else {
        match days / 365 {
            1 => "a year ago".to_string(),
            years => format!("{years} years ago"),
        }
    }
}
