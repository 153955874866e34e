//! CLI command implementations (facade).
//!
//! `run.rs` dispatches to the handlers re-exported here. Implementations live
//! in `commands/*`.

mod collect;
mod common;
mod config_cmd;
mod init;
mod tokens;

pub use collect::{execute_collect_command, summary_line};
pub use config_cmd::execute_config_command;
pub use init::execute_init_command;
pub use tokens::execute_tokens_command;
