use std::fmt;
use std::io;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// Only conditions that stop a whole run end up here. Per-file problems
/// during discovery or assembly are absorbed by the pipeline (skipped files,
/// inline error notes) and never surface as a `CodesightError`.
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration/CLI argument errors |
/// | 3 | Project root missing or not a directory |
/// | 4 | Snapshot output could not be written |
/// | 1 | Other errors |
///
/// Library code returns `CodesightError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum CodesightError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Failed to write snapshot to {path}: {reason}")]
    Output { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    FileSystem,
    Tokenizer,
    Output,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::FileSystem => write!(f, "File System"),
            Self::Tokenizer => write!(f, "Tokenizer"),
            Self::Output => write!(f, "Output"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with optional [defaults] and [selectors] sections."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific format requirements."
            )),
            Self::NotFound { .. } => Some(
                "codesight searches for .codesight/config.toml from the project root upward."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .codesight/config.toml".to_string(),
                "Run 'codesight init' in a scratch directory to see a valid example".to_string(),
            ],
            Self::InvalidValue { key, .. } => vec![
                format!("Fix the value of '{key}' in the config file or on the command line"),
                "Run 'codesight config' to see the effective configuration".to_string(),
            ],
            Self::NotFound { path } => vec![
                format!("Check that {path} exists"),
                "Omit --config to use automatic discovery".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Whole-run discovery failures. Per-file stat errors never produce these.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Project root does not exist: {path}")]
    RootNotFound { path: String },

    #[error("Project root is not a directory: {path}")]
    RootNotDirectory { path: String },

    #[error("Project root path is not valid UTF-8: {path}")]
    NonUtf8Root { path: String },

    #[error("Failed to enumerate project root {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

impl UserFriendlyError for DiscoveryError {
    fn user_message(&self) -> String {
        match self {
            Self::RootNotFound { path } => format!("Directory '{path}' does not exist"),
            Self::RootNotDirectory { path } => format!("'{path}' is not a directory"),
            Self::NonUtf8Root { path } => format!("Directory '{path}' has a non UTF-8 path"),
            Self::Unreadable { path, reason } => {
                format!("Could not list files under '{path}': {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        Some("codesight needs a readable project directory to build a snapshot.".to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::RootNotFound { .. } | Self::RootNotDirectory { .. } => vec![
                "Pass the project directory as the first argument".to_string(),
                "Run from inside the project to use the current directory".to_string(),
            ],
            Self::NonUtf8Root { .. } => {
                vec!["Move or rename the project to a UTF-8 path".to_string()]
            }
            Self::Unreadable { .. } => vec!["Check directory permissions".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::FileSystem
    }
}

/// Per-file failure while rendering a section. Converted into an inline
/// note in the snapshot; never propagated out of assembly.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{0}")]
    Read(#[from] io::Error),

    #[error("file is not valid UTF-8 text")]
    Decode,
}

impl UserFriendlyError for CodesightError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Discovery(err) => err.user_message(),
            Self::Tokenizer(reason) => format!("Failed to load the tokenizer: {reason}"),
            Self::Template(reason) => format!("Failed to load prompt template: {reason}"),
            Self::Output { path, reason } => {
                format!("Failed to write snapshot to {path}: {reason}")
            }
            Self::Io(err) => format!("File system operation failed: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Discovery(err) => err.context(),
            Self::Tokenizer(_) => {
                Some("Token counts use the cl100k_base encoding bundled with codesight.".to_string())
            }
            Self::Template(_) => Some(
                "Prompt templates are read from .codesight/prompts/<type>.md when present."
                    .to_string(),
            ),
            Self::Output { .. } => {
                Some("The snapshot is always written under .codesight/ unless an absolute path is given.".to_string())
            }
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Discovery(err) => err.suggestions(),
            Self::Tokenizer(_) => vec!["Reinstall codesight".to_string()],
            Self::Template(_) => vec![
                "Check permissions of .codesight/prompts/".to_string(),
                "Delete the template to fall back to the built-in prompt".to_string(),
            ],
            Self::Output { .. } => vec![
                "Check that the output directory is writable".to_string(),
                "Pass --output-file with a different location".to_string(),
            ],
            Self::Io(_) => vec!["Check file permissions and available disk space".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Discovery(err) => err.category(),
            Self::Tokenizer(_) => ErrorCategory::Tokenizer,
            Self::Template(_) | Self::Io(_) => ErrorCategory::FileSystem,
            Self::Output { .. } => ErrorCategory::Output,
        }
    }
}

impl CodesightError {
    /// Get a user-friendly error message with context and actionable suggestions.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the appropriate CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Discovery(DiscoveryError::Unreadable { .. }) => ExitCode::INTERNAL,
            Self::Discovery(_) => ExitCode::ROOT_NOT_FOUND,
            Self::Output { .. } => ExitCode::OUTPUT_FAILED,
            Self::Tokenizer(_) | Self::Template(_) | Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}
