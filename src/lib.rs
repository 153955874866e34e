//! codesight - token-budgeted project snapshots for LLM prompts
//!
//! codesight walks a project, drops build output, secrets, tests and other
//! noise, orders what is left by recency and packs it into one text document
//! that fits a token budget. Old files are reduced to their imports and
//! definitions before anything is dropped.
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Create .codesight/ with a config file and prompt templates
//! codesight init
//!
//! # Write .codesight/llm.txt and copy it to the clipboard
//! codesight collect
//!
//! # Ask for help with a bug instead of a general review
//! codesight collect --bug "Saving twice drops the second edit"
//!
//! # See where the tokens go
//! codesight tokens --limit 20
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use codesight::{Config, SnapshotBuilder};
//! use camino::Utf8Path;
//!
//! let root = Utf8Path::new(".");
//! let config = Config::discover_from(root, &Default::default())?;
//! let snapshot = SnapshotBuilder::new(config.to_snapshot_options())?.build(root)?;
//! println!("{} files, {} bytes", snapshot.stats.file_count, snapshot.stats.byte_count);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod clipboard;

pub use codesight_config::{CliArgs, Config, ConfigBuilder, ConfigSource};
pub use codesight_packet::{
    Snapshot, SnapshotBuilder, SnapshotOptions, SnapshotStats, TiktokenCounter, TokenCounter,
};
pub use codesight_selectors::{ExclusionRules, Selectors};
pub use codesight_templates::PromptType;
pub use codesight_utils::error::{CodesightError, UserFriendlyError};
pub use codesight_utils::exit_codes::ExitCode;
