//! Snapshot construction for codesight.
//!
//! The pipeline runs in four stages:
//!
//! 1. [`discover_files`] lists the project tree and filters it through the
//!    exclusion rules in parallel chunks.
//! 2. [`group_by_recency`] groups files by directory, newest directory first.
//! 3. [`Assembler`] renders every file, measures it with a [`TokenCounter`]
//!    and includes, reduces or skips it against the token budget.
//! 4. The finished document is hashed and returned as a [`Snapshot`].
//!
//! [`SnapshotBuilder`] wires the stages together from one [`SnapshotOptions`].

mod analysis;
mod assemble;
mod discover;
mod group;
mod model;
mod optimize;
mod render;
mod tokenizer;
mod truncate;

pub use analysis::{TokenReport, analyze_token_usage};
pub use assemble::{Assembler, Assembly};
pub use discover::{CHUNK_SIZE, discover_files};
pub use group::group_by_recency;
pub use model::{
    AssemblyState, DirectoryGroup, DiscoveredFiles, FileOutcome, FileRecord, FileStatus,
    RenderedFile,
};
pub use optimize::optimize_content;
pub use render::{front_matter, relative_time};
#[cfg(any(test, feature = "test-utils"))]
pub use tokenizer::WordCounter;
pub use tokenizer::{TiktokenCounter, TokenCounter};
pub use truncate::{TRUNCATION_MARKER, definitions_only};

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Duration, Utc};
use codesight_selectors::{ExclusionRules, Selectors};
use codesight_templates::{PromptTemplate, PromptType};
use codesight_utils::atomic_write::write_file_atomic;
use codesight_utils::error::{CodesightError, DiscoveryError};
use codesight_utils::logging::{log_stage_complete, stage_span};
use codesight_utils::paths::{DEFAULT_OUTPUT_FILE, ensure_dir_all, resolve_output_path};
use serde::Serialize;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Instant;

/// Default token budget
pub const DEFAULT_TOKEN_LIMIT: usize = 100_000;

/// Files older than this many days may be reduced to their definitions
pub const DEFAULT_STALE_AFTER_DAYS: u32 = 7;

/// Everything that shapes one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub token_limit: usize,
    pub selectors: Selectors,
    /// Output file as configured; see [`SnapshotOptions::output_path`]
    pub output_file: Utf8PathBuf,
    pub prompt_type: PromptType,
    /// Fills the bug placeholders of the prompt when set
    pub bug_description: Option<String>,
    pub stale_after: Duration,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            token_limit: DEFAULT_TOKEN_LIMIT,
            selectors: Selectors::default(),
            output_file: Utf8PathBuf::from(DEFAULT_OUTPUT_FILE),
            prompt_type: PromptType::default(),
            bug_description: None,
            stale_after: Duration::days(i64::from(DEFAULT_STALE_AFTER_DAYS)),
        }
    }
}

impl SnapshotOptions {
    /// Where the snapshot for `root` is written
    #[must_use]
    pub fn output_path(&self, root: &Utf8Path) -> Utf8PathBuf {
        resolve_output_path(root, &self.output_file)
    }
}

/// Counts describing a finished snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    pub file_count: usize,
    pub included: usize,
    pub truncated: usize,
    pub skipped: usize,
    pub errored: usize,
    /// Tokens charged against the budget, front matter included
    pub budget_tokens: usize,
    pub front_matter_tokens: usize,
    pub token_limit: usize,
    pub byte_count: usize,
}

/// The assembled document and what went into it
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub content: String,
    /// BLAKE3 hash of `content`
    pub blake3_hash: String,
    pub files: Vec<FileOutcome>,
    pub stats: SnapshotStats,
}

impl Snapshot {
    #[must_use]
    pub fn from_assembly(assembly: Assembly, token_limit: usize) -> Self {
        let mut stats = SnapshotStats {
            file_count: assembly.files.len(),
            budget_tokens: assembly.state.total_tokens,
            front_matter_tokens: assembly.front_matter_tokens,
            token_limit,
            byte_count: assembly.content.len(),
            ..SnapshotStats::default()
        };
        for file in &assembly.files {
            match file.status {
                FileStatus::Included => stats.included += 1,
                FileStatus::Truncated => stats.truncated += 1,
                FileStatus::Skipped => stats.skipped += 1,
                FileStatus::Errored => stats.errored += 1,
            }
        }

        Self {
            blake3_hash: blake3::hash(assembly.content.as_bytes()).to_hex().to_string(),
            content: assembly.content,
            files: assembly.files,
            stats,
        }
    }

    /// Write the document atomically, creating parent directories.
    pub fn write_to(&self, path: &Utf8Path) -> Result<(), CodesightError> {
        let output_error = |reason: String| CodesightError::Output {
            path: path.to_string(),
            reason,
        };
        if let Some(parent) = path.parent() {
            ensure_dir_all(parent).map_err(|e| output_error(e.to_string()))?;
        }
        write_file_atomic(path, &self.content).map_err(|e| output_error(format!("{e:#}")))?;
        tracing::debug!("Wrote {} bytes to {path}", self.content.len());
        Ok(())
    }
}

/// Runs the whole pipeline for a project root
pub struct SnapshotBuilder {
    options: SnapshotOptions,
    counter: Arc<dyn TokenCounter>,
    now: Option<DateTime<Utc>>,
}

impl SnapshotBuilder {
    /// Builder using the `cl100k_base` tokenizer
    pub fn new(options: SnapshotOptions) -> Result<Self, CodesightError> {
        Ok(Self::with_counter(options, Arc::new(TiktokenCounter::cl100k()?)))
    }

    #[must_use]
    pub fn with_counter(options: SnapshotOptions, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            options,
            counter,
            now: None,
        }
    }

    /// Pin the clock used for ages and the project date line.
    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    #[must_use]
    pub const fn options(&self) -> &SnapshotOptions {
        &self.options
    }

    #[must_use]
    pub fn counter(&self) -> &dyn TokenCounter {
        self.counter.as_ref()
    }

    /// Build the snapshot of the project at `root`.
    ///
    /// Fails only when the root cannot be enumerated or a prompt template
    /// exists but cannot be read. Errors carry a [`CodesightError`].
    pub fn build(&self, root: &Utf8Path) -> Result<Snapshot> {
        let root = canonical_root(root)?;
        let now = self.now.unwrap_or_else(Utc::now);
        let project = root.file_name().unwrap_or(root.as_str()).to_string();

        let discover_span = stage_span("discover", &project);
        let groups = {
            let _enter = discover_span.enter();
            let started = Instant::now();

            let rules = ExclusionRules::for_project(
                &root,
                &self.options.selectors,
                &self.options.output_path(&root),
            )
            .with_context(|| format!("Failed to build exclusion rules for {root}"))?;
            let discovered = discover_files(&root, &rules).map_err(CodesightError::from)?;
            let groups = group_by_recency(discovered);

            log_stage_complete(
                "discover",
                groups.iter().map(|g| g.files.len()).sum(),
                started.elapsed().as_millis(),
            );
            groups
        };

        let mut template = PromptTemplate::load(&root, self.options.prompt_type)?;
        if let Some(description) = &self.options.bug_description {
            template = template.with_bug_description(description);
        }

        let assemble_span = stage_span("assemble", &project);
        let _enter = assemble_span.enter();
        let started = Instant::now();

        let front = front_matter(template.rendered(), &project, now, &groups);
        let assembly = Assembler::new(
            self.counter.as_ref(),
            self.options.token_limit,
            self.options.stale_after,
            now,
        )
        .assemble(front, &groups);
        let snapshot = Snapshot::from_assembly(assembly, self.options.token_limit);

        log_stage_complete("assemble", snapshot.files.len(), started.elapsed().as_millis());
        tracing::info!(
            included = snapshot.stats.included,
            truncated = snapshot.stats.truncated,
            skipped = snapshot.stats.skipped,
            errored = snapshot.stats.errored,
            tokens = snapshot.stats.budget_tokens,
            limit = self.options.token_limit,
            "snapshot assembled"
        );
        Ok(snapshot)
    }
}

/// Resolve `root` to an absolute path so the project name is meaningful
/// even for `.`.
pub fn canonical_root(root: &Utf8Path) -> Result<Utf8PathBuf, CodesightError> {
    match root.canonicalize_utf8() {
        Ok(path) => Ok(path),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(DiscoveryError::RootNotFound {
            path: root.to_string(),
        }
        .into()),
        Err(e) if e.kind() == ErrorKind::InvalidData => Err(DiscoveryError::NonUtf8Root {
            path: root.to_string(),
        }
        .into()),
        Err(e) => Err(DiscoveryError::Unreadable {
            path: root.to_string(),
            reason: e.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesight_utils::paths::with_isolated_home;
    use codesight_utils::test_support::{days, hours, write_file_aged};
    use std::fs;
    use tempfile::TempDir;

    fn project() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf())
            .unwrap()
            .canonicalize_utf8()
            .unwrap();
        (temp, root)
    }

    fn builder(options: SnapshotOptions) -> SnapshotBuilder {
        SnapshotBuilder::with_counter(options, Arc::new(WordCounter))
    }

    #[test]
    fn test_build_end_to_end() -> Result<()> {
        let _home = with_isolated_home();
        let (_temp, root) = project();
        write_file_aged(root.join("src/app.py").as_std_path(), "print('hi')\n", hours(1))?;
        write_file_aged(root.join("README.md").as_std_path(), "# Demo\n", days(2))?;
        write_file_aged(root.join("build/gen.py").as_std_path(), "x = 1\n", hours(1))?;

        let snapshot = builder(SnapshotOptions::default()).build(&root)?;

        assert!(snapshot.content.starts_with(codesight_templates::IMPROVEMENT_TEMPLATE));
        let name = root.file_name().unwrap();
        assert!(snapshot.content.contains(&format!("# CodeSight: {name} (")));
        assert!(snapshot.content.contains("# Files:\n# - src/app.py\n# - README.md\n"));
        assert!(!snapshot.content.contains("gen.py"));
        assert_eq!(snapshot.stats.file_count, 2);
        assert_eq!(snapshot.stats.included, 2);
        assert_eq!(snapshot.stats.byte_count, snapshot.content.len());
        assert_eq!(snapshot.blake3_hash.len(), 64);
        Ok(())
    }

    #[test]
    fn test_build_is_deterministic_with_pinned_clock() -> Result<()> {
        let _home = with_isolated_home();
        let (_temp, root) = project();
        for i in 0..25u64 {
            write_file_aged(
                root.join(format!("pkg{}/mod{i}.py", i % 4)).as_std_path(),
                &format!("def f{i}():\n    return {i}\n"),
                hours(i + 1),
            )?;
        }
        let options = SnapshotOptions {
            token_limit: 150,
            ..SnapshotOptions::default()
        };
        let now = Utc::now();

        let first = builder(options.clone()).at(now).build(&root)?;
        let second = builder(options).at(now).build(&root)?;

        assert_eq!(first.content, second.content);
        assert_eq!(first.blake3_hash, second.blake3_hash);
        assert!(first.stats.skipped > 0);
        Ok(())
    }

    #[test]
    fn test_bug_description_reaches_prompt() -> Result<()> {
        let _home = with_isolated_home();
        let (_temp, root) = project();
        let options = SnapshotOptions {
            prompt_type: PromptType::Bugfix,
            bug_description: Some("login fails".to_string()),
            ..SnapshotOptions::default()
        };

        let snapshot = builder(options).build(&root)?;
        assert!(snapshot.content.contains("## Bug description\nlogin fails"));
        assert!(!snapshot.content.contains("PLACEHOLDER_"));
        Ok(())
    }

    #[test]
    fn test_missing_root_is_a_discovery_error() {
        let (_temp, root) = project();
        let err = builder(SnapshotOptions::default())
            .build(&root.join("missing"))
            .unwrap_err();
        let err = err.downcast_ref::<CodesightError>().unwrap();
        assert!(matches!(
            err,
            CodesightError::Discovery(DiscoveryError::RootNotFound { .. })
        ));
    }

    #[test]
    fn test_previous_output_is_never_read_back() -> Result<()> {
        let _home = with_isolated_home();
        let (_temp, root) = project();
        write_file_aged(root.join("main.py").as_std_path(), "x = 1\n", hours(1))?;
        let options = SnapshotOptions {
            selectors: Selectors {
                dogfood: true,
                ..Selectors::default()
            },
            ..SnapshotOptions::default()
        };
        let builder = builder(options);

        let first = builder.build(&root)?;
        first.write_to(&builder.options().output_path(&root))?;
        let second = builder.build(&root)?;

        assert_eq!(second.stats.file_count, 1);
        assert!(!second.content.contains("# - .codesight/llm.txt"));
        Ok(())
    }

    #[test]
    fn test_write_to_reports_output_error() -> Result<()> {
        let (_temp, root) = project();
        fs::write(root.join("blocker"), "not a dir")?;
        let snapshot = Snapshot::from_assembly(
            Assembly {
                content: "x".to_string(),
                files: Vec::new(),
                state: AssemblyState::default(),
                front_matter_tokens: 0,
            },
            10,
        );

        let err = snapshot.write_to(&root.join("blocker/out.txt")).unwrap_err();
        assert!(matches!(err, CodesightError::Output { .. }));
        Ok(())
    }
}
