//! Command-line interface for codesight
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions and parsing structures (clap)
//! - `run`: Main entry point and command dispatch
//! - `commands`: Command implementations and helpers

pub mod args;
mod commands;
mod run;

pub use args::{Cli, CollectArgs, Commands, SelectorArgs, build_cli};
pub use commands::summary_line;
pub use run::run;
