//! Token-budgeted assembly of directory groups into one document.

use crate::model::{
    AssemblyState, DirectoryGroup, FileOutcome, FileRecord, FileStatus, RenderedFile,
};
use crate::optimize::optimize_content;
use crate::render::{
    END_MARKER, TRUNCATION_NOTE, directory_header, error_note, file_header, section,
    skipped_header,
};
use crate::tokenizer::TokenCounter;
use crate::truncate::definitions_only;
use chrono::{DateTime, Duration, Utc};
use codesight_utils::error::RenderError;
use std::fs;
use std::io;
use std::thread;

/// Result of one assembly pass
#[derive(Debug, Clone)]
pub struct Assembly {
    pub content: String,
    pub files: Vec<FileOutcome>,
    pub state: AssemblyState,
    pub front_matter_tokens: usize,
}

/// A file read, optimized and measured by a worker, before any budget
/// decision has been made.
#[derive(Debug)]
enum Prepared {
    Ready {
        header: String,
        body: String,
        tokens: usize,
    },
    Failed(RenderError),
}

/// Walks directory groups in order and decides, file by file, whether each
/// one is included whole, reduced to its definitions, or skipped.
pub struct Assembler<'a> {
    counter: &'a dyn TokenCounter,
    token_limit: usize,
    stale_after: Duration,
    now: DateTime<Utc>,
}

impl<'a> Assembler<'a> {
    #[must_use]
    pub fn new(
        counter: &'a dyn TokenCounter,
        token_limit: usize,
        stale_after: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            counter,
            token_limit,
            stale_after,
            now,
        }
    }

    /// Assemble `groups` after `front_matter`.
    ///
    /// The front matter is always kept whole and its cost seeds the running
    /// total. Files of a group are prepared in parallel, then decided in
    /// recency order by this thread alone. Never fails: unreadable files
    /// become inline notes.
    #[must_use]
    pub fn assemble(&self, front_matter: Vec<String>, groups: &[DirectoryGroup]) -> Assembly {
        let mut parts = front_matter;
        let front_matter_tokens = self.counter.count(&parts.join("\n"));
        let mut state = AssemblyState {
            total_tokens: front_matter_tokens,
            truncated_any: false,
        };
        let mut files = Vec::new();

        for group in groups {
            parts.push(directory_header(&group.relative));

            let ordered = group.files_by_recency();
            let prepared = self.prepare_all(&ordered);

            for (record, prepared) in ordered.into_iter().zip(prepared) {
                let rendered = self.decide(record, prepared, &mut state);
                tracing::debug!(
                    file = %record.relative,
                    status = ?rendered.status,
                    tokens = rendered.token_count,
                    total = state.total_tokens,
                    "file assembled"
                );
                parts.push(rendered.section());
                files.push(FileOutcome {
                    relative: record.relative.clone(),
                    status: rendered.status,
                    token_count: rendered.token_count,
                });
            }
        }

        if state.truncated_any {
            parts.push(TRUNCATION_NOTE.to_string());
        }
        parts.push(END_MARKER.to_string());

        Assembly {
            content: parts.join("\n"),
            files,
            state,
            front_matter_tokens,
        }
    }

    /// Read, optimize and measure every file, preserving input order.
    fn prepare_all(&self, records: &[&FileRecord]) -> Vec<Prepared> {
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
                        chunk.iter().map(|record| self.prepare(record)).collect::<Vec<_>>()
                    });
                    (chunk.len(), handle)
                })
                .collect();

            let mut all = Vec::with_capacity(records.len());
            for (len, handle) in handles {
                match handle.join() {
                    Ok(results) => all.extend(results),
                    Err(_) => {
                        tracing::warn!("Worker thread panicked while reading files");
                        all.extend((0..len).map(|_| {
                            Prepared::Failed(RenderError::Read(io::Error::other(
                                "worker thread panicked",
                            )))
                        }));
                    }
                }
            }
            all
        })
    }

    fn prepare(&self, record: &FileRecord) -> Prepared {
        match read_text(record) {
            Ok(raw) => {
                let header = file_header(record.name(), record.mtime, self.now);
                let body = optimize_content(&raw);
                let tokens = self.counter.count(&section(&header, &body));
                Prepared::Ready {
                    header,
                    body,
                    tokens,
                }
            }
            Err(err) => Prepared::Failed(err),
        }
    }

    fn decide(
        &self,
        record: &FileRecord,
        prepared: Prepared,
        state: &mut AssemblyState,
    ) -> RenderedFile {
        let (header, body, tokens) = match prepared {
            Prepared::Ready {
                header,
                body,
                tokens,
            } => (header, body, tokens),
            Prepared::Failed(err) => {
                tracing::debug!("Could not read {}: {err}", record.relative);
                let (header, body) = error_note(&record.relative, &err.to_string());
                let token_count = self.counter.count(&section(&header, &body));
                state.total_tokens += token_count;
                return RenderedFile {
                    header,
                    body,
                    token_count,
                    status: FileStatus::Errored,
                };
            }
        };

        if state.fits(tokens, self.token_limit) {
            state.total_tokens += tokens;
            return RenderedFile {
                header,
                body,
                token_count: tokens,
                status: FileStatus::Included,
            };
        }

        // Recent files are skipped whole rather than shown partially.
        if record.is_stale(self.now, self.stale_after) {
            let reduced = definitions_only(&body);
            let reduced_tokens = self.counter.count(&section(&header, &reduced));
            if state.fits(reduced_tokens, self.token_limit) {
                state.total_tokens += reduced_tokens;
                state.truncated_any = true;
                return RenderedFile {
                    header,
                    body: reduced,
                    token_count: reduced_tokens,
                    status: FileStatus::Truncated,
                };
            }
        }

        RenderedFile {
            header: skipped_header(record.name()),
            body: String::new(),
            token_count: 0,
            status: FileStatus::Skipped,
        }
    }
}

fn read_text(record: &FileRecord) -> Result<String, RenderError> {
    let bytes = fs::read(&record.path)?;
    String::from_utf8(bytes).map_err(|_| RenderError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::front_matter;
    use crate::tokenizer::WordCounter;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        root: Utf8PathBuf,
        now: DateTime<Utc>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
            Self {
                _temp: temp,
                root,
                now: Utc::now(),
            }
        }

        /// Write a file and describe it as modified `age` before `now`.
        fn file(&self, relative: &str, content: &[u8], age: Duration) -> FileRecord {
            let path = self.root.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            FileRecord {
                path,
                relative: Utf8PathBuf::from(relative),
                mtime: self.now - age,
            }
        }

        fn group(&self, relative: &str, files: Vec<FileRecord>) -> DirectoryGroup {
            let max_mtime = files.iter().map(|f| f.mtime).max().unwrap();
            DirectoryGroup {
                relative: Utf8PathBuf::from(relative),
                files,
                max_mtime,
            }
        }

        fn section_cost(&self, record: &FileRecord, content: &str) -> usize {
            let header = file_header(record.name(), record.mtime, self.now);
            WordCounter.count(&section(&header, &optimize_content(content)))
        }
    }

    fn front(fx: &Fixture, groups: &[DirectoryGroup]) -> Vec<String> {
        front_matter("Review this.", "demo", fx.now, groups)
    }

    fn front_cost(fx: &Fixture, groups: &[DirectoryGroup]) -> usize {
        WordCounter.count(&front(fx, groups).join("\n"))
    }

    const STALE_SOURCE: &str = "import os\n\ndef helper(x):\n    value = x * 2\n    return value + 1\n\nclass Thing:\n    size = 10\n    name = 'thing'\n";

    #[test]
    fn test_everything_fits() {
        let fx = Fixture::new();
        let a = fx.file("src/a.py", b"print('a')\n", Duration::hours(1));
        let b = fx.file("src/b.py", b"print('b')\n", Duration::hours(2));
        let groups = vec![fx.group("src", vec![b, a])];

        let assembly = Assembler::new(&WordCounter, 10_000, Duration::days(7), fx.now)
            .assemble(front(&fx, &groups), &groups);

        assert!(assembly.files.iter().all(|f| f.status == FileStatus::Included));
        assert!(!assembly.state.truncated_any);
        let a_pos = assembly.content.find("# --- a.py (an hour ago) ---").unwrap();
        let b_pos = assembly.content.find("# --- b.py (2 hours ago) ---").unwrap();
        assert!(a_pos < b_pos, "newer file first");
        assert!(assembly.content.contains("\n\n# Directory: src/\n\n# --- a.py"));
        assert!(assembly.content.ends_with("print('b')\n\n\n# --- End Code Files ---"));
        assert!(!assembly.content.contains("truncated"));
    }

    #[test]
    fn test_stale_file_is_truncated_when_over_budget() {
        let fx = Fixture::new();
        let f1 = fx.file("pkg/one.py", b"alpha beta gamma\n", Duration::hours(1));
        let f2 = fx.file("pkg/two.py", b"delta epsilon\n", Duration::hours(2));
        let f3 = fx.file("pkg/three.py", STALE_SOURCE.as_bytes(), Duration::days(10));

        let costs = (
            fx.section_cost(&f1, "alpha beta gamma\n"),
            fx.section_cost(&f2, "delta epsilon\n"),
        );
        let groups = vec![fx.group("pkg", vec![f1, f2, f3])];
        let budget = front_cost(&fx, &groups) + costs.0 + costs.1 + 22;

        let assembly = Assembler::new(&WordCounter, budget, Duration::days(7), fx.now)
            .assemble(front(&fx, &groups), &groups);

        let statuses: Vec<FileStatus> = assembly.files.iter().map(|f| f.status).collect();
        assert_eq!(
            statuses,
            vec![FileStatus::Included, FileStatus::Included, FileStatus::Truncated]
        );
        assert!(assembly.state.truncated_any);
        assert!(assembly.state.total_tokens <= budget);
        assert!(assembly.content.contains(
            "# File truncated - showing only definitions:\ndef helper(x):\nclass Thing:"
        ));
        assert!(!assembly.content.contains("return value + 1"));
        assert!(assembly.content.ends_with(
            "\n# Note: Some older files were truncated to stay within token limits.\n\n# --- End Code Files ---"
        ));
    }

    #[test]
    fn test_fresh_file_is_skipped_not_truncated() {
        let fx = Fixture::new();
        let big = fx.file("app.py", STALE_SOURCE.as_bytes(), Duration::hours(1));
        let groups = vec![fx.group("", vec![big])];
        let budget = front_cost(&fx, &groups) + 3;

        let assembly = Assembler::new(&WordCounter, budget, Duration::days(7), fx.now)
            .assemble(front(&fx, &groups), &groups);

        assert_eq!(assembly.files[0].status, FileStatus::Skipped);
        assert_eq!(assembly.files[0].token_count, 0);
        assert!(assembly.content.contains("\n# Directory: ./\n\n# app.py: skipped (token limit)"));
        assert!(!assembly.content.contains("File truncated"));
        assert!(!assembly.state.truncated_any);
    }

    #[test]
    fn test_stale_file_skipped_when_even_reduction_does_not_fit() {
        let fx = Fixture::new();
        let old = fx.file("old.py", STALE_SOURCE.as_bytes(), Duration::days(30));
        let groups = vec![fx.group("", vec![old])];
        let budget = front_cost(&fx, &groups) + 1;

        let assembly = Assembler::new(&WordCounter, budget, Duration::days(7), fx.now)
            .assemble(front(&fx, &groups), &groups);

        assert_eq!(assembly.files[0].status, FileStatus::Skipped);
        assert!(!assembly.state.truncated_any);
    }

    #[test]
    fn test_exact_budget_is_included() {
        let fx = Fixture::new();
        let f = fx.file("a.py", b"one two three\n", Duration::hours(1));
        let cost = fx.section_cost(&f, "one two three\n");
        let groups = vec![fx.group("", vec![f])];
        let budget = front_cost(&fx, &groups) + cost;

        let assembly = Assembler::new(&WordCounter, budget, Duration::days(7), fx.now)
            .assemble(front(&fx, &groups), &groups);

        assert_eq!(assembly.files[0].status, FileStatus::Included);
        assert_eq!(assembly.state.total_tokens, budget);
    }

    #[test]
    fn test_later_smaller_file_can_still_fit() {
        let fx = Fixture::new();
        let big = fx.file("big.py", STALE_SOURCE.as_bytes(), Duration::hours(1));
        let small = fx.file("small.py", b"x\n", Duration::hours(2));
        let small_cost = fx.section_cost(&small, "x\n");
        let groups = vec![fx.group("", vec![big, small])];
        let budget = front_cost(&fx, &groups) + small_cost;

        let assembly = Assembler::new(&WordCounter, budget, Duration::days(7), fx.now)
            .assemble(front(&fx, &groups), &groups);

        let statuses: Vec<FileStatus> = assembly.files.iter().map(|f| f.status).collect();
        assert_eq!(statuses, vec![FileStatus::Skipped, FileStatus::Included]);
    }

    #[test]
    fn test_unreadable_file_becomes_inline_note() {
        let fx = Fixture::new();
        let binary = fx.file("data/blob.bin", &[0xff, 0xfe, 0x00, 0x9f], Duration::hours(1));
        let text = fx.file("data/ok.py", b"pass\n", Duration::hours(2));
        let missing = FileRecord {
            path: fx.root.join("data/gone.py"),
            relative: Utf8PathBuf::from("data/gone.py"),
            mtime: fx.now - Duration::hours(3),
        };
        let groups = vec![fx.group("data", vec![binary, text, missing])];

        let assembly = Assembler::new(&WordCounter, 10_000, Duration::days(7), fx.now)
            .assemble(front(&fx, &groups), &groups);

        let statuses: Vec<FileStatus> = assembly.files.iter().map(|f| f.status).collect();
        assert_eq!(
            statuses,
            vec![FileStatus::Errored, FileStatus::Included, FileStatus::Errored]
        );
        assert!(assembly.content.contains(
            "# --- Error reading file: data/blob.bin ---\n# Error: file is not valid UTF-8 text"
        ));
        assert!(assembly.content.contains("# --- Error reading file: data/gone.py ---"));
        assert!(assembly.files[0].token_count > 0);
    }

    #[test]
    fn test_empty_project_still_has_front_matter() {
        let fx = Fixture::new();
        let assembly = Assembler::new(&WordCounter, 100, Duration::days(7), fx.now)
            .assemble(front(&fx, &[]), &[]);

        assert!(assembly.files.is_empty());
        assert!(assembly.content.starts_with("Review this.\n\n# CodeSight: demo ("));
        assert!(assembly.content.ends_with(
            "# Files:\n\n# --- Start Code Files ---\n\n# --- End Code Files ---"
        ));
        assert_eq!(assembly.state.total_tokens, assembly.front_matter_tokens);
    }

    #[test]
    fn test_front_matter_over_budget_is_kept_whole() {
        let fx = Fixture::new();
        let f = fx.file("a.py", b"x\n", Duration::hours(1));
        let groups = vec![fx.group("", vec![f])];

        let assembly = Assembler::new(&WordCounter, 1, Duration::days(7), fx.now)
            .assemble(front(&fx, &groups), &groups);

        assert!(assembly.content.starts_with("Review this."));
        assert!(assembly.content.contains("# - a.py"));
        assert_eq!(assembly.files[0].status, FileStatus::Skipped);
    }

    #[test]
    fn test_output_is_deterministic() {
        let fx = Fixture::new();
        let mut records = Vec::new();
        for i in 0..40 {
            let content = format!("value_{i} = {i}\n");
            records.push(fx.file(
                &format!("m/f{i:02}.py"),
                content.as_bytes(),
                Duration::minutes(i),
            ));
        }
        let groups = vec![fx.group("m", records)];
        let assembler = Assembler::new(&WordCounter, 120, Duration::days(7), fx.now);

        let first = assembler.assemble(front(&fx, &groups), &groups);
        let second = assembler.assemble(front(&fx, &groups), &groups);
        assert_eq!(first.content, second.content);
        assert_eq!(first.files, second.files);
    }

    #[test]
    fn test_directory_headers_follow_group_order() {
        let fx = Fixture::new();
        let newer = fx.file("b/x.py", b"x\n", Duration::hours(1));
        let older = fx.file("a/y.py", b"y\n", Duration::hours(5));
        let groups = vec![fx.group("b", vec![newer]), fx.group("a", vec![older])];

        let assembly = Assembler::new(&WordCounter, 10_000, Duration::days(7), fx.now)
            .assemble(front(&fx, &groups), &groups);

        let b = assembly.content.find("# Directory: b/").unwrap();
        let a = assembly.content.find("# Directory: a/").unwrap();
        assert!(b < a);
    }
}
