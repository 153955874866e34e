use camino::{Utf8Path, Utf8PathBuf};
use chrono::Duration;
use codesight_packet::{DEFAULT_STALE_AFTER_DAYS, DEFAULT_TOKEN_LIMIT, SnapshotOptions};
use codesight_selectors::Selectors;
use codesight_templates::PromptType;
use codesight_utils::paths::{DEFAULT_OUTPUT_FILE, PROJECT_DIR_NAME};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Name of the config file inside `.codesight/`
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Largest accepted token budget
pub const MAX_TOKEN_LIMIT: usize = 10_000_000;

/// Largest accepted staleness threshold, in days
pub const MAX_STALE_AFTER_DAYS: u32 = 3650;

/// Config file written by `codesight init`
pub const DEFAULT_CONFIG_TOML: &str = r#"# codesight configuration
#
# Values given on the command line take precedence over this file.

[defaults]
token_limit = 100000
prompt = "improvement"
output_file = "llm.txt"
stale_after_days = 7
clipboard = true
check_updates = true

[selectors]
# Extra gitignore-style patterns to leave out of the snapshot
exclude = []
include_tests = false
include_structural = false
dogfood = false
"#;

/// Main configuration structure
///
/// # Example config file
///
/// ```toml
/// [defaults]
/// token_limit = 50000
/// prompt = "bugfix"
///
/// [selectors]
/// exclude = ["*.generated.rs", "fixtures/"]
/// include_tests = true
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Default values for snapshot settings.
    pub defaults: Defaults,
    /// File selection switches and extra excludes.
    pub selectors: Selectors,
    /// The config file that was loaded, if any.
    pub config_file: Option<Utf8PathBuf>,
    /// Source attribution for each setting (for `codesight config`).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Default configuration values
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    pub token_limit: Option<usize>,
    pub prompt: Option<PromptType>,
    pub output_file: Option<String>,
    pub stale_after_days: Option<u32>,
    /// Copy the snapshot to the system clipboard after writing it.
    pub clipboard: Option<bool>,
    /// Look up the latest release at most once a day.
    pub check_updates: Option<bool>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            token_limit: Some(DEFAULT_TOKEN_LIMIT),
            prompt: Some(PromptType::default()),
            output_file: Some(DEFAULT_OUTPUT_FILE.to_string()),
            stale_after_days: Some(DEFAULT_STALE_AFTER_DAYS),
            clipboard: Some(true),
            check_updates: Some(true),
        }
    }
}

/// Source of a configuration value.
///
/// Precedence: CLI arguments > config file > programmatic > built-in defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Cli,
    Config,
    Programmatic,
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Config => "config",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command-line overrides fed into discovery.
///
/// Boolean switches only ever turn a setting on; `None`/`false` leaves the
/// lower-precedence value in place.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<Utf8PathBuf>,
    pub token_limit: Option<usize>,
    pub prompt: Option<PromptType>,
    pub output_file: Option<String>,
    pub stale_after_days: Option<u32>,
    /// Appended to the excludes from the config file
    pub exclude: Vec<String>,
    pub include_tests: bool,
    pub include_structural: bool,
    pub dogfood: bool,
    pub no_clipboard: bool,
    pub no_update_check: bool,
}

impl Config {
    #[must_use]
    pub fn token_limit(&self) -> usize {
        self.defaults.token_limit.unwrap_or(DEFAULT_TOKEN_LIMIT)
    }

    #[must_use]
    pub fn prompt(&self) -> PromptType {
        self.defaults.prompt.unwrap_or_default()
    }

    #[must_use]
    pub fn output_file(&self) -> &str {
        self.defaults
            .output_file
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_FILE)
    }

    #[must_use]
    pub fn stale_after_days(&self) -> u32 {
        self.defaults
            .stale_after_days
            .unwrap_or(DEFAULT_STALE_AFTER_DAYS)
    }

    #[must_use]
    pub fn clipboard(&self) -> bool {
        self.defaults.clipboard.unwrap_or(true)
    }

    #[must_use]
    pub fn check_updates(&self) -> bool {
        self.defaults.check_updates.unwrap_or(true)
    }

    /// The single set of options the snapshot pipeline runs from.
    #[must_use]
    pub fn to_snapshot_options(&self) -> SnapshotOptions {
        SnapshotOptions {
            token_limit: self.token_limit(),
            selectors: self.selectors.clone(),
            output_file: Utf8PathBuf::from(self.output_file()),
            prompt_type: self.prompt(),
            bug_description: None,
            stale_after: Duration::days(i64::from(self.stale_after_days())),
        }
    }

    /// `<root>/.codesight/config.toml`
    #[must_use]
    pub fn project_config_path(root: &Utf8Path) -> Utf8PathBuf {
        root.join(PROJECT_DIR_NAME).join(CONFIG_FILE_NAME)
    }
}
