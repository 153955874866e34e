//! Configuration management for codesight
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. The TOML file lives at `.codesight/config.toml` and
//! has optional `[defaults]` and `[selectors]` sections.

mod builder;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use discovery::detect_dogfood;
pub use model::*;
