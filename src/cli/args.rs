//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and all subcommand enums.

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use codesight_config::CliArgs;
use codesight_templates::PromptType;

/// codesight - token-budgeted project snapshots for LLM prompts
#[derive(Parser, Debug)]
#[command(name = "codesight")]
#[command(about = "Collect a project's source into one token-budgeted document for an LLM")]
#[command(long_about = r#"
codesight gathers the source files of a project into a single text document
sized to fit an LLM context window. Recently changed directories come first;
older files are reduced to their definitions when the budget runs short.

EXAMPLES:
  # Snapshot the current project into .codesight/llm.txt
  codesight collect

  # Snapshot another directory with a smaller budget
  codesight collect ../service --token-limit 40000

  # Ask for help with a specific bug
  codesight collect --bug "Login fails after password reset"

  # Show which files and directories use the most tokens
  codesight tokens --limit 15

  # Set up .codesight/ with config and prompt templates
  codesight init --add-gitignore

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  The config file is discovered by searching upward from the project directory
  for .codesight/config.toml. Use --config to specify an explicit path.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a snapshot, save it and copy it to the clipboard
    Collect(CollectArgs),

    /// Report token usage per file and per directory
    Tokens {
        /// Project directory (default: current directory)
        dir: Option<Utf8PathBuf>,

        /// Number of files and directories to list
        #[arg(long, default_value_t = 10)]
        limit: usize,

        #[command(flatten)]
        selectors: SelectorArgs,
    },

    /// Create .codesight/ with a config file and prompt templates
    Init {
        /// Project directory (default: current directory)
        dir: Option<Utf8PathBuf>,

        /// Append .codesight/ to .gitignore when it is not ignored yet
        #[arg(long)]
        add_gitignore: bool,
    },

    /// Show the effective configuration and where each value comes from
    Config {
        /// Project directory (default: current directory)
        dir: Option<Utf8PathBuf>,
    },
}

impl Commands {
    /// Operation name used in error reports
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Collect(_) => "collect",
            Self::Tokens { .. } => "tokens",
            Self::Init { .. } => "init",
            Self::Config { .. } => "config",
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct CollectArgs {
    /// Project directory (default: current directory)
    pub dir: Option<Utf8PathBuf>,

    /// Token budget for the whole document
    #[arg(long)]
    pub token_limit: Option<usize>,

    #[command(flatten)]
    pub selectors: SelectorArgs,

    /// Output file; relative names are placed under .codesight/
    #[arg(long)]
    pub output_file: Option<String>,

    /// Prompt to put in front of the code: improvement or bugfix
    #[arg(long)]
    pub prompt: Option<PromptType>,

    /// Describe a bug; selects the bugfix prompt and fills in its description
    #[arg(long, value_name = "DESCRIPTION")]
    pub bug: Option<String>,

    /// Files untouched for more than this many days may be reduced to definitions
    #[arg(long)]
    pub stale_after_days: Option<u32>,

    /// Do not copy the snapshot to the clipboard
    #[arg(long)]
    pub no_clipboard: bool,

    /// Skip the once-a-day check for a newer release
    #[arg(long)]
    pub no_update_check: bool,
}

/// File selection flags shared by `collect` and `tokens`
#[derive(Args, Debug, Default, Clone)]
pub struct SelectorArgs {
    /// Extra gitignore-style pattern to leave out (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Keep test files and directories
    #[arg(long)]
    pub include_tests: bool,

    /// Keep manifests, lockfiles and other structural files
    #[arg(long)]
    pub include_structural: bool,

    /// Include codesight's own files (for working on codesight itself)
    #[arg(long)]
    pub dogfood: bool,
}

impl SelectorArgs {
    /// Overrides for configuration discovery carrying only file selection
    #[must_use]
    pub fn to_cli_args(&self, config_path: Option<&Utf8Path>) -> CliArgs {
        CliArgs {
            config_path: config_path.map(Utf8Path::to_path_buf),
            exclude: self.exclude.clone(),
            include_tests: self.include_tests,
            include_structural: self.include_structural,
            dogfood: self.dogfood,
            ..CliArgs::default()
        }
    }
}

impl CollectArgs {
    /// Overrides for configuration discovery
    #[must_use]
    pub fn to_cli_args(&self, config_path: Option<&Utf8Path>) -> CliArgs {
        let prompt = if self.bug.is_some() {
            Some(PromptType::Bugfix)
        } else {
            self.prompt
        };

        CliArgs {
            token_limit: self.token_limit,
            prompt,
            output_file: self.output_file.clone(),
            stale_after_days: self.stale_after_days,
            no_clipboard: self.no_clipboard,
            no_update_check: self.no_update_check,
            ..self.selectors.to_cli_args(config_path)
        }
    }
}

/// Build the clap command (for help text checks and completions)
#[must_use]
pub fn build_cli() -> clap::Command {
    use clap::CommandFactory;
    Cli::command()
}
