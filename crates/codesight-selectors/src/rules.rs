use crate::{Selectors, exclusion_patterns, self_reference_patterns};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::io::ErrorKind;

/// Compiled exclusion matcher for one project root.
///
/// Immutable once built; `is_excluded` takes `&self` so discovery workers can
/// share a single instance across threads.
///
/// The tool's own artifacts are also compiled into a separate negation-free
/// matcher that is consulted first, so no user or `.gitignore` rule can
/// re-include them.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    root: Utf8PathBuf,
    matcher: Gitignore,
    pinned: Gitignore,
    patterns: Vec<String>,
    dropped: Vec<String>,
}

impl ExclusionRules {
    /// Build the rule set for `root` from its `.gitignore`, the selector
    /// settings and the snapshot output path.
    pub fn for_project(
        root: &Utf8Path,
        selectors: &Selectors,
        output_file: &Utf8Path,
    ) -> Result<Self> {
        let gitignore = read_gitignore(root)?;
        let output_name = output_file.file_name().unwrap_or_default();
        let patterns = exclusion_patterns(gitignore, selectors, output_name);
        let mut rules = Self::from_patterns(root, patterns)?;
        let (pinned, _) = compile(root, &self_reference_patterns(output_name))?;
        rules.pinned = pinned;
        Ok(rules)
    }

    /// Compile an already ordered pattern list.
    ///
    /// A line the glob compiler rejects is retried as an escaped literal. If
    /// that fails too the line is dropped with a warning.
    pub fn from_patterns(root: &Utf8Path, patterns: Vec<String>) -> Result<Self> {
        let (matcher, dropped) = compile(root, &patterns)?;

        tracing::debug!(
            rules = matcher.num_ignores() + matcher.num_whitelists(),
            dropped = dropped.len(),
            "exclusion rules compiled"
        );

        Ok(Self {
            root: root.to_owned(),
            matcher,
            pinned: Gitignore::empty(),
            patterns,
            dropped,
        })
    }

    /// Whether the file at `relative` (relative to the project root) is
    /// excluded.
    ///
    /// As in git, a file inside an excluded directory stays excluded even if
    /// a later `!` rule names the file itself.
    #[must_use]
    pub fn is_excluded(&self, relative: &Utf8Path) -> bool {
        let Some(relative) = self.relativize(relative) else {
            return false;
        };

        if self
            .pinned
            .matched_path_or_any_parents(relative.as_std_path(), false)
            .is_ignore()
        {
            return true;
        }
        if relative
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_str().is_empty())
            .any(|dir| self.matcher.matched(dir.as_std_path(), true).is_ignore())
        {
            return true;
        }
        self.matcher
            .matched(relative.as_std_path(), false)
            .is_ignore()
    }

    /// Whether the directory at `relative` is excluded by a rule naming the
    /// directory itself. Discovery prunes such directories without listing
    /// them.
    #[must_use]
    pub fn is_dir_excluded(&self, relative: &Utf8Path) -> bool {
        let Some(relative) = self.relativize(relative) else {
            return false;
        };
        self.pinned.matched(relative.as_std_path(), true).is_ignore()
            || self.matcher.matched(relative.as_std_path(), true).is_ignore()
    }

    fn relativize<'p>(&self, path: &'p Utf8Path) -> Option<&'p Utf8Path> {
        let relative = if path.has_root() {
            path.strip_prefix(&self.root).ok()?
        } else {
            path
        };
        (!relative.as_str().is_empty()).then_some(relative)
    }

    /// The ordered source patterns, including any that were dropped.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Lines that could not be compiled even as literals.
    #[must_use]
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

/// Read the lines of `<root>/.gitignore`, or nothing if there is none.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_gitignore(root: &Utf8Path) -> Result<Vec<String>> {
    let path = root.join(".gitignore");
    match fs::read(&path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            Ok(Vec::new())
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            tracing::warn!("Cannot read {path}, continuing without it: {e}");
            Ok(Vec::new())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {path}")),
    }
}

/// Compile `patterns` in order. A line the glob compiler rejects is retried
/// as an escaped literal; if that fails too it is returned as dropped.
fn compile(root: &Utf8Path, patterns: &[String]) -> Result<(Gitignore, Vec<String>)> {
    let mut builder = GitignoreBuilder::new(root.as_std_path());
    let mut dropped = Vec::new();

    for line in patterns {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Err(err) = builder.add_line(None, line) {
            let escaped = escape_literal(line);
            match builder.add_line(None, &escaped) {
                Ok(_) => {
                    tracing::debug!("Treating exclusion pattern {line:?} as a literal: {err}");
                }
                Err(_) => {
                    tracing::warn!("Ignoring malformed exclusion pattern {line:?}: {err}");
                    dropped.push(line.to_string());
                }
            }
        }
    }

    let matcher = builder
        .build()
        .with_context(|| format!("Failed to compile exclusion rules for {root}"))?;
    Ok((matcher, dropped))
}

fn escape_literal(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 4);
    for (i, ch) in line.chars().enumerate() {
        match ch {
            '*' | '?' | '[' | ']' | '{' | '}' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '!' | '#' if i == 0 => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}
