use regex::Regex;
use std::sync::LazyLock;

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static TRAILING_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[ \t\r]+$").unwrap());

/// Shrink file content without changing its meaning.
///
/// Trailing spaces, tabs and carriage returns are removed from every line,
/// runs of blank lines collapse to one, surrounding whitespace is trimmed and
/// the result ends in exactly one newline. Applying it twice gives the same
/// text as applying it once.
#[must_use]
pub fn optimize_content(content: &str) -> String {
    let stripped = TRAILING_WS.replace_all(content, "");
    let collapsed = BLANK_RUNS.replace_all(&stripped, "\n\n");
    let mut out = collapsed.trim().to_string();
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_collapses_blank_runs() {
        assert_eq!(optimize_content("a\n\n\n\nb"), "a\n\nb\n");
        assert_eq!(optimize_content("a\n\nb"), "a\n\nb\n");
    }

    #[test]
    fn test_strips_trailing_whitespace() {
        assert_eq!(optimize_content("def f():  \n    return 1\t\n"), "def f():\n    return 1\n");
    }

    #[test]
    fn test_whitespace_only_lines_collapse_too() {
        assert_eq!(optimize_content("a\n  \n\t\n \nb\n"), "a\n\nb\n");
    }

    #[test]
    fn test_trims_and_terminates() {
        assert_eq!(optimize_content("\n\n  x = 1  \n\n\n"), "x = 1\n");
        assert_eq!(optimize_content(""), "\n");
        assert_eq!(optimize_content("   \n\t"), "\n");
    }

    #[test]
    fn test_crlf_is_normalized() {
        assert_eq!(optimize_content("a \r\nb\r\n"), "a\nb\n");
    }

    proptest! {
        #[test]
        fn prop_idempotent(text in "[a-c \t\r\n]{0,80}") {
            let once = optimize_content(&text);
            prop_assert_eq!(optimize_content(&once), once.clone());
            prop_assert!(once.ends_with('\n'));
            prop_assert!(!once.contains("\n\n\n"));
        }
    }
}
