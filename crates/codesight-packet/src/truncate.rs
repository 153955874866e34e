//! Definitions-only reduction for stale files that do not fit the budget.

use regex::Regex;
use std::sync::LazyLock;

/// Marker separating the kept imports from the kept signatures
pub const TRUNCATION_MARKER: &str = "# File truncated - showing only definitions:";

/// Import and include statements at column zero.
static IMPORT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^(?:",
        r"import\s.*",
        r"|from\s+\S+\s+import\s.*",
        r"|(?:pub(?:\([^)]*\))?\s+)?use\s.*",
        r"|extern\s+crate\s.*",
        r"|#include\s*[<\x22].*",
        r"|(?:const|let|var)\s+\w+\s*=\s*require\(.*",
        r"|require(?:_relative)?[\s(].*",
        r")$"
    ))
    .unwrap()
});

/// Top-level function, class and type signatures at column zero.
static DEFINITION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^(?:",
        r"(?:async\s+)?def\s+\w+.*",
        r"|(?:export\s+(?:default\s+)?)?(?:abstract\s+)?(?:class|interface)\s+\w+.*",
        r"|(?:pub(?:\([^)]*\))?\s+)?(?:(?:const|async|unsafe|extern\s+\x22[^\x22]*\x22)\s+)*",
        r"(?:fn|struct|enum|trait|impl|mod|type|union)\b.*",
        r"|func\s.*",
        r"|(?:export\s+(?:default\s+)?)?(?:async\s+)?function\b.*",
        r")$"
    ))
    .unwrap()
});

/// Keep only import lines and top-level signatures of `content`.
///
/// A signature line that opens a block (`{` at the end) is cut before the
/// brace. The result always contains [`TRUNCATION_MARKER`], even when no
/// line matched.
#[must_use]
pub fn definitions_only(content: &str) -> String {
    let imports: Vec<&str> = IMPORT_PATTERN
        .find_iter(content)
        .map(|m| m.as_str().trim_end())
        .collect();
    let definitions: Vec<&str> = DEFINITION_PATTERN
        .find_iter(content)
        .map(|m| signature(m.as_str()))
        .collect();

    let mut out = imports.join("\n");
    out.push_str("\n\n");
    out.push_str(TRUNCATION_MARKER);
    out.push('\n');
    out.push_str(&definitions.join("\n"));
    out
}

fn signature(line: &str) -> &str {
    let line = line.trim_end();
    match line.strip_suffix('{') {
        Some(head) => head.trim_end(),
        None => line,
    }
}
