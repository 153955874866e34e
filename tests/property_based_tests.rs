//! Property-based tests for codesight
//!
//! These drive the public pipeline (`SnapshotBuilder`, `ExclusionRules`,
//! `optimize_content`) with generated projects and contents.
//!
//! ## Configuration
//!
//! - `PROPTEST_CASES`: Number of test cases per property (default: 64)
//! - `PROPTEST_MAX_SHRINK_ITERS`: Max shrinking iterations on failure (default: 1000)
//!
//! ```bash
//! PROPTEST_CASES=256 cargo test --test property_based_tests
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::env;
use std::sync::Arc;
use tempfile::TempDir;

use codesight_packet::{SnapshotBuilder, SnapshotOptions, WordCounter, optimize_content};
use codesight_selectors::{ExclusionRules, Selectors};
use codesight_utils::paths::with_isolated_home;
use codesight_utils::test_support::{hours, write_file_aged};

const DEFAULT_PROPTEST_CASES: u32 = 64;
const DEFAULT_MAX_SHRINK_ITERS: u32 = 1000;

/// ProptestConfig honoring `PROPTEST_CASES`, capped at `max_cases` for
/// properties that touch the filesystem.
fn proptest_config(max_cases: Option<u32>) -> ProptestConfig {
    let env_cases = env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_PROPTEST_CASES);

    let env_shrink_iters = env::var("PROPTEST_MAX_SHRINK_ITERS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_MAX_SHRINK_ITERS);

    let cases = match max_cases {
        Some(max) => env_cases.min(max),
        None => env_cases,
    };

    ProptestConfig {
        cases,
        max_shrink_iters: env_shrink_iters,
        max_shrink_time: 30000,
        ..ProptestConfig::default()
    }
}

/// (relative path, content, age in hours)
fn arb_project() -> impl Strategy<Value = Vec<(String, String, u64)>> {
    let file = (
        prop::sample::select(vec!["", "src/", "lib/", "src/core/", "app/"]),
        "[a-z]{1,8}",
        prop::sample::select(vec!["py", "rs", "js", "go"]),
        prop::collection::vec("[a-z]{1,6}( [a-z]{1,6}){0,6}", 1..30),
        0u64..(24 * 30),
    )
        .prop_map(|(dir, stem, ext, lines, age)| {
            (format!("{dir}{stem}.{ext}"), lines.join("\n"), age)
        });
    prop::collection::vec(file, 0..12)
}

fn write_project(files: &[(String, String, u64)]) -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf())
        .unwrap()
        .canonicalize_utf8()
        .unwrap();
    for (relative, content, age) in files {
        write_file_aged(root.join(relative).as_std_path(), content, hours(*age)).unwrap();
    }
    (temp, root)
}

fn builder(token_limit: usize) -> SnapshotBuilder {
    let options = SnapshotOptions {
        token_limit,
        ..SnapshotOptions::default()
    };
    SnapshotBuilder::with_counter(options, Arc::new(WordCounter))
        .at(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
}

proptest! {
    #![proptest_config(proptest_config(Some(16)))]

    #[test]
    fn prop_budget_is_respected(files in arb_project(), limit in 1usize..400) {
        let _home = with_isolated_home();
        let (_temp, root) = write_project(&files);

        let snapshot = builder(limit).build(&root).unwrap();
        let stats = &snapshot.stats;

        prop_assert!(
            stats.budget_tokens <= limit.max(stats.front_matter_tokens),
            "charged {} of {} (front matter {})",
            stats.budget_tokens,
            limit,
            stats.front_matter_tokens
        );
        prop_assert_eq!(
            stats.included + stats.truncated + stats.skipped + stats.errored,
            stats.file_count
        );
    }

    #[test]
    fn prop_snapshot_is_deterministic(files in arb_project(), limit in 1usize..400) {
        let _home = with_isolated_home();
        let (_temp, root) = write_project(&files);

        let first = builder(limit).build(&root).unwrap();
        let second = builder(limit).build(&root).unwrap();
        prop_assert_eq!(first.content, second.content);
        prop_assert_eq!(first.blake3_hash, second.blake3_hash);
    }
}

proptest! {
    #![proptest_config(proptest_config(None))]

    #[test]
    fn prop_optimize_is_idempotent(content in "[a-z \t\r\n{}();]{0,200}") {
        let once = optimize_content(&content);
        prop_assert_eq!(optimize_content(&once), once);
    }

    #[test]
    fn prop_self_artifacts_always_excluded(
        include_tests in any::<bool>(),
        include_structural in any::<bool>(),
        dogfood in any::<bool>(),
        output_name in "[a-z]{1,8}\\.txt",
        negated in prop::collection::vec(
            prop::sample::select(vec![
                "prompts/bugfix.md",
                ".codesight/prompts/improvement.md",
                ".codesight/config.toml",
                ".codesight/cache/kv.json",
                ".gitignore",
                ".git/HEAD",
            ]),
            0..4,
        ),
    ) {
        let root = Utf8Path::new("/project");
        let mut exclude: Vec<String> = negated.iter().map(|path| format!("!{path}")).collect();
        exclude.push(format!("!{output_name}"));
        let selectors = Selectors {
            exclude,
            include_tests,
            include_structural,
            dogfood,
        };
        let output = root.join(".codesight").join(&output_name);
        let rules = ExclusionRules::for_project(root, &selectors, &output).unwrap();

        prop_assert!(rules.is_excluded(Utf8Path::new(&output_name)));
        prop_assert!(rules.is_excluded(&Utf8Path::new(".codesight").join(&output_name)));
        prop_assert!(rules.is_excluded(Utf8Path::new(".codesight/config.toml")));
        prop_assert!(rules.is_excluded(Utf8Path::new(".codesight/prompts/bugfix.md")));
        prop_assert!(rules.is_excluded(Utf8Path::new("prompts/bugfix.md")));
        prop_assert!(rules.is_excluded(Utf8Path::new(".codesight/cache/kv.json")));
        prop_assert!(rules.is_excluded(Utf8Path::new(".git/HEAD")));
    }
}
