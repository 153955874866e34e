use crate::Selectors;
use codesight_utils::paths::PROJECT_DIR_NAME;

/// Always excluded: build output, virtualenvs, caches and data/binary files.
pub const STANDARD_EXCLUDES: &[&str] = &[
    ".hg/",
    ".svn/",
    "__pycache__/",
    "*.pyc",
    "*.pyo",
    "*.so",
    "build/",
    "dist/",
    "target/",
    "node_modules/",
    "*.egg-info/",
    ".env",
    ".venv/",
    "venv/",
    "env/",
    "*.log",
    ".DS_Store",
    "*.bak",
    // data
    "*.csv",
    "*.json",
    "*.xml",
    "*.yaml",
    "*.yml",
    "*.lock",
    "*.pkl",
    "*.pickle",
    "*.parquet",
    "*.db",
    "*.sqlite",
    "*.sqlite3",
    // images
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.gif",
    "*.bmp",
    "*.ico",
    "*.svg",
    "*.webp",
    // archives
    "*.zip",
    "*.tar",
    "*.gz",
    "*.tgz",
    "*.bz2",
    "*.xz",
    "*.7z",
    "*.rar",
    // office documents
    "*.pdf",
    "*.doc",
    "*.docx",
    "*.xls",
    "*.xlsx",
    "*.ppt",
    "*.pptx",
];

/// Excluded unless tests are requested.
pub const TEST_EXCLUDES: &[&str] = &[
    "test/",
    "tests/",
    "*_test.py",
    "test_*.py",
    "*_test.go",
    "*.test.js",
    "*.test.ts",
    "*.spec.js",
    "*.spec.ts",
    "*_test.rs",
];

/// Excluded unless structural files are requested.
pub const STRUCTURAL_EXCLUDES: &[&str] = &[
    "*.toml",
    "setup.py",
    "setup.cfg",
    "requirements.txt",
    "package.json",
    "LICENSE*",
    "Dockerfile",
    "docker-compose.yml",
    "Makefile",
    "__init__.py",
    "__main__.py",
    "conftest.py",
    "go.sum",
];

/// Patterns that keep the tool from reading its own artifacts.
///
/// `output_name` is the bare file name of the snapshot; it is excluded at
/// any depth.
#[must_use]
pub fn self_reference_patterns(output_name: &str) -> Vec<String> {
    let mut patterns = Vec::with_capacity(6);
    if !output_name.is_empty() {
        patterns.push(output_name.to_string());
    }
    patterns.extend([
        format!("/{PROJECT_DIR_NAME}/prompts/"),
        "prompts/".to_string(),
        format!("/{PROJECT_DIR_NAME}/config.toml"),
        format!("/{PROJECT_DIR_NAME}/cache/"),
        ".gitignore".to_string(),
    ]);
    patterns
}

/// Assemble the ordered pattern list.
///
/// Order: `.git`, the project's `.gitignore` lines, standard excludes, test
/// excludes, structural excludes, user excludes, self-reference excludes.
/// Self-reference patterns come last so no earlier `!` rule can re-include
/// them.
#[must_use]
pub fn exclusion_patterns(
    gitignore_lines: Vec<String>,
    selectors: &Selectors,
    output_name: &str,
) -> Vec<String> {
    let mut patterns = vec![".git".to_string()];
    patterns.extend(gitignore_lines);

    patterns.extend(STANDARD_EXCLUDES.iter().map(|p| (*p).to_string()));
    if !selectors.dogfood {
        patterns.push(format!("{PROJECT_DIR_NAME}/"));
    }
    if !selectors.include_tests {
        patterns.extend(TEST_EXCLUDES.iter().map(|p| (*p).to_string()));
    }
    if !selectors.include_structural {
        patterns.extend(STRUCTURAL_EXCLUDES.iter().map(|p| (*p).to_string()));
    }

    patterns.extend(selectors.exclude.iter().cloned());
    patterns.extend(self_reference_patterns(output_name));
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_puts_self_reference_last() {
        let selectors = Selectors {
            exclude: vec!["docs/".to_string()],
            ..Selectors::default()
        };
        let patterns = exclusion_patterns(vec!["!llm.txt".to_string()], &selectors, "llm.txt");

        assert_eq!(patterns[0], ".git");
        assert_eq!(patterns[1], "!llm.txt");

        let user = patterns.iter().position(|p| p == "docs/").unwrap();
        let own_output = patterns.iter().rposition(|p| p == "llm.txt").unwrap();
        assert!(user < own_output);
        assert_eq!(patterns.last().map(String::as_str), Some(".gitignore"));
    }

    #[test]
    fn test_toggles_drop_their_groups() {
        let selectors = Selectors {
            include_tests: true,
            include_structural: true,
            dogfood: true,
            ..Selectors::default()
        };
        let patterns = exclusion_patterns(Vec::new(), &selectors, "llm.txt");

        assert!(!patterns.iter().any(|p| p == "tests/"));
        assert!(!patterns.iter().any(|p| p == "*.toml"));
        assert!(!patterns.iter().any(|p| p == ".codesight/"));
        assert!(patterns.iter().any(|p| p == "/.codesight/prompts/"));
    }

    #[test]
    fn test_empty_output_name_is_not_a_pattern() {
        let patterns = self_reference_patterns("");
        assert!(patterns.iter().all(|p| !p.is_empty()));
    }
}
