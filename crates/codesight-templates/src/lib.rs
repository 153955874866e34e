//! Prompt templates for codesight snapshots
//!
//! A snapshot starts with prompt text telling the model what to do with the
//! code that follows. Two prompt types exist. Each is looked up first in the
//! project (`.codesight/prompts/<type>.md`), then in the codesight home
//! directory, and finally falls back to the built-in text below.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use codesight_utils::error::CodesightError;
use codesight_utils::paths::{PROJECT_DIR_NAME, codesight_home};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::str::FromStr;

/// Placeholder replaced by the user's bug description.
pub const BUG_DESCRIPTION_PLACEHOLDER: &str = "PLACEHOLDER_BUG_DESCRIPTION";
/// Placeholder replaced by a note about expected behavior.
pub const EXPECTED_BEHAVIOR_PLACEHOLDER: &str = "PLACEHOLDER_EXPECTED_BEHAVIOR";
/// Placeholder replaced by a note about reproduction steps.
pub const REPRODUCTION_STEPS_PLACEHOLDER: &str = "PLACEHOLDER_REPRODUCTION_STEPS";

const EXPECTED_BEHAVIOR_NOTE: &str =
    "Expected behavior should be inferred from the bug description.";
const REPRODUCTION_STEPS_NOTE: &str = "Please analyze the code to determine reproduction steps.";

/// Built-in text for [`PromptType::Improvement`].
pub const IMPROVEMENT_TEMPLATE: &str = "\
You are an expert software engineer. Analyze the following codebase from my project.
The goal is to find concrete improvements: bugs, unclear code, missing error handling,
performance problems and simplifications.

The code is organized by directories, with most recently modified files first.
Each file shows how recently it was modified to help you focus on recent changes.

Please provide your analysis with specific, actionable feedback.";

/// Built-in text for [`PromptType::Bugfix`].
pub const BUGFIX_TEMPLATE: &str = "\
You are an expert software engineer helping me fix a bug in the following codebase.

## Bug description
PLACEHOLDER_BUG_DESCRIPTION

## Expected behavior
PLACEHOLDER_EXPECTED_BEHAVIOR

## Reproduction steps
PLACEHOLDER_REPRODUCTION_STEPS

The code is organized by directories, with most recently modified files first.
Each file shows how recently it was modified; recent changes are the most likely cause.

Identify the root cause, point to the exact lines involved and propose a minimal fix.";

/// Which prompt to prepend to the snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    /// General review and improvement suggestions
    #[default]
    Improvement,
    /// Focused help with a described bug
    Bugfix,
}

impl PromptType {
    /// Parse a prompt type name (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not recognized.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "improvement" | "improve" => Ok(Self::Improvement),
            "bugfix" | "bug" => Ok(Self::Bugfix),
            _ => Err(format!(
                "Unknown prompt type '{s}'. Available prompt types: improvement, bugfix"
            )),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Improvement => "improvement",
            Self::Bugfix => "bugfix",
        }
    }

    /// Template file name, e.g. `bugfix.md`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.md", self.as_str())
    }

    #[must_use]
    pub const fn builtin(&self) -> &'static str {
        match self {
            Self::Improvement => IMPROVEMENT_TEMPLATE,
            Self::Bugfix => BUGFIX_TEMPLATE,
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::Improvement, Self::Bugfix]
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Where a template's text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Project(Utf8PathBuf),
    Home(Utf8PathBuf),
    BuiltIn,
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(path) | Self::Home(path) => write!(f, "{path}"),
            Self::BuiltIn => f.write_str("built-in"),
        }
    }
}

/// Prompt text ready to be placed at the top of a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub prompt_type: PromptType,
    pub text: String,
    pub source: TemplateSource,
}

impl PromptTemplate {
    /// Load the template for `prompt_type` as seen from project `root`.
    ///
    /// A missing file moves on to the next location; any other read failure
    /// is an error rather than a silent fallback.
    pub fn load(root: &Utf8Path, prompt_type: PromptType) -> Result<Self, CodesightError> {
        let file_name = prompt_type.file_name();
        let candidates = [
            TemplateSource::Project(project_prompts_dir(root).join(&file_name)),
            TemplateSource::Home(codesight_home().join("prompts").join(&file_name)),
        ];

        for source in candidates {
            let path = match &source {
                TemplateSource::Project(path) | TemplateSource::Home(path) => path,
                TemplateSource::BuiltIn => continue,
            };
            match fs::read_to_string(path) {
                Ok(text) => {
                    tracing::debug!("Using {prompt_type} prompt from {path}");
                    return Ok(Self {
                        prompt_type,
                        text,
                        source,
                    });
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CodesightError::Template(format!("{path}: {e}")));
                }
            }
        }

        Ok(Self::builtin(prompt_type))
    }

    #[must_use]
    pub fn builtin(prompt_type: PromptType) -> Self {
        Self {
            prompt_type,
            text: prompt_type.builtin().to_string(),
            source: TemplateSource::BuiltIn,
        }
    }

    /// Fill the bug placeholders. The template on disk is never modified.
    #[must_use]
    pub fn with_bug_description(mut self, description: &str) -> Self {
        self.text = fill_bug_placeholders(&self.text, description);
        self
    }

    /// Template text without trailing whitespace, as placed in the snapshot
    #[must_use]
    pub fn rendered(&self) -> &str {
        self.text.trim_end()
    }
}

/// Replace the three bug placeholders in `template`.
#[must_use]
pub fn fill_bug_placeholders(template: &str, description: &str) -> String {
    template
        .replace(BUG_DESCRIPTION_PLACEHOLDER, description.trim())
        .replace(EXPECTED_BEHAVIOR_PLACEHOLDER, EXPECTED_BEHAVIOR_NOTE)
        .replace(REPRODUCTION_STEPS_PLACEHOLDER, REPRODUCTION_STEPS_NOTE)
}

/// `<root>/.codesight/prompts`
#[must_use]
pub fn project_prompts_dir(root: &Utf8Path) -> Utf8PathBuf {
    root.join(PROJECT_DIR_NAME).join("prompts")
}

/// Write the built-in templates into `dir`, keeping any that already exist.
///
/// Returns the paths that were created.
pub fn write_default_templates(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    codesight_utils::paths::ensure_dir_all(dir)
        .with_context(|| format!("Failed to create prompts directory: {dir}"))?;

    let mut created = Vec::new();
    for prompt_type in PromptType::all() {
        let path = dir.join(prompt_type.file_name());
        if path.exists() {
            tracing::debug!("Keeping existing template {path}");
            continue;
        }
        let mut text = prompt_type.builtin().to_string();
        text.push('\n');
        codesight_utils::atomic_write::write_file_atomic(&path, &text)
            .with_context(|| format!("Failed to write template: {path}"))?;
        created.push(path);
    }
    Ok(created)
}
