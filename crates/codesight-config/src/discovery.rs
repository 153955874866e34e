use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use codesight_selectors::Selectors;
use codesight_templates::PromptType;
use codesight_utils::error::{CodesightError, ConfigError};
use codesight_utils::paths::PROJECT_DIR_NAME;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::{CliArgs, Config, ConfigSource, Defaults};

/// Keys tracked in the source attribution map
pub(crate) const DEFAULT_KEYS: &[&str] = &[
    "token_limit",
    "prompt",
    "output_file",
    "stale_after_days",
    "clipboard",
    "check_updates",
    "exclude",
    "include_tests",
    "include_structural",
    "dogfood",
];

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    defaults: Option<FileDefaults>,
    selectors: Option<FileSelectors>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct FileDefaults {
    token_limit: Option<usize>,
    prompt: Option<String>,
    output_file: Option<String>,
    stale_after_days: Option<u32>,
    clipboard: Option<bool>,
    check_updates: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct FileSelectors {
    exclude: Option<Vec<String>>,
    include_tests: Option<bool>,
    include_structural: Option<bool>,
    dogfood: Option<bool>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// The config file is `cli_args.config_path` when given, otherwise the
    /// first `.codesight/config.toml` found walking upward from `root`.
    pub fn discover_from(root: &Utf8Path, cli_args: &CliArgs) -> Result<Self> {
        let mut source_attribution: HashMap<String, ConfigSource> = DEFAULT_KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();

        let mut defaults = Defaults::default();
        let mut selectors = Selectors::default();

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(CodesightError::Config(ConfigError::NotFound {
                        path: explicit.to_string(),
                    })
                    .into());
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(root),
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {path}"))?;
            let src = ConfigSource::Config;

            if let Some(file_defaults) = file_config.defaults {
                if let Some(token_limit) = file_defaults.token_limit {
                    defaults.token_limit = Some(token_limit);
                    source_attribution.insert("token_limit".to_string(), src);
                }
                if let Some(prompt) = file_defaults.prompt {
                    let parsed = prompt.parse::<PromptType>().map_err(|reason: String| {
                        CodesightError::Config(ConfigError::InvalidValue {
                            key: "prompt".to_string(),
                            value: reason,
                        })
                    })?;
                    defaults.prompt = Some(parsed);
                    source_attribution.insert("prompt".to_string(), src);
                }
                if let Some(output_file) = file_defaults.output_file {
                    defaults.output_file = Some(output_file);
                    source_attribution.insert("output_file".to_string(), src);
                }
                if let Some(days) = file_defaults.stale_after_days {
                    defaults.stale_after_days = Some(days);
                    source_attribution.insert("stale_after_days".to_string(), src);
                }
                if let Some(clipboard) = file_defaults.clipboard {
                    defaults.clipboard = Some(clipboard);
                    source_attribution.insert("clipboard".to_string(), src);
                }
                if let Some(check_updates) = file_defaults.check_updates {
                    defaults.check_updates = Some(check_updates);
                    source_attribution.insert("check_updates".to_string(), src);
                }
            }

            if let Some(file_selectors) = file_config.selectors {
                if let Some(exclude) = file_selectors.exclude {
                    selectors.exclude = exclude;
                    source_attribution.insert("exclude".to_string(), src);
                }
                if let Some(include_tests) = file_selectors.include_tests {
                    selectors.include_tests = include_tests;
                    source_attribution.insert("include_tests".to_string(), src);
                }
                if let Some(include_structural) = file_selectors.include_structural {
                    selectors.include_structural = include_structural;
                    source_attribution.insert("include_structural".to_string(), src);
                }
                if let Some(dogfood) = file_selectors.dogfood {
                    selectors.dogfood = dogfood;
                    source_attribution.insert("dogfood".to_string(), src);
                }
            }
        }

        // CLI overrides
        let cli = ConfigSource::Cli;
        if let Some(token_limit) = cli_args.token_limit {
            defaults.token_limit = Some(token_limit);
            source_attribution.insert("token_limit".to_string(), cli);
        }
        if let Some(prompt) = cli_args.prompt {
            defaults.prompt = Some(prompt);
            source_attribution.insert("prompt".to_string(), cli);
        }
        if let Some(output_file) = &cli_args.output_file {
            defaults.output_file = Some(output_file.clone());
            source_attribution.insert("output_file".to_string(), cli);
        }
        if let Some(days) = cli_args.stale_after_days {
            defaults.stale_after_days = Some(days);
            source_attribution.insert("stale_after_days".to_string(), cli);
        }
        if cli_args.no_clipboard {
            defaults.clipboard = Some(false);
            source_attribution.insert("clipboard".to_string(), cli);
        }
        if cli_args.no_update_check {
            defaults.check_updates = Some(false);
            source_attribution.insert("check_updates".to_string(), cli);
        }
        if !cli_args.exclude.is_empty() {
            selectors.exclude.extend(cli_args.exclude.iter().cloned());
            source_attribution.insert("exclude".to_string(), cli);
        }
        if cli_args.include_tests {
            selectors.include_tests = true;
            source_attribution.insert("include_tests".to_string(), cli);
        }
        if cli_args.include_structural {
            selectors.include_structural = true;
            source_attribution.insert("include_structural".to_string(), cli);
        }
        if cli_args.dogfood {
            selectors.dogfood = true;
            source_attribution.insert("dogfood".to_string(), cli);
        }

        if !selectors.dogfood && detect_dogfood(root) {
            debug!("Dogfood mode enabled for the codesight source tree at {root}");
            selectors.dogfood = true;
        }

        let config = Self {
            defaults,
            selectors,
            config_file: config_path,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Walk up from `start_dir` looking for `.codesight/config.toml`, stopping
    /// at repository root markers (.git, .hg, .svn) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let config_path = Self::project_config_path(dir);
            if config_path.is_file() {
                return Some(config_path);
            }

            if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
            {
                break;
            }

            current = dir.parent();
        }

        None
    }

    fn load_config_file(path: &Utf8Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                CodesightError::Config(ConfigError::InvalidFile(format!("{path}: {e}"))).into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read config file {path}")),
        }
    }
}

/// True when `root` is the codesight source tree itself: it has a
/// `.codesight/` directory and a `Cargo.toml` for the `codesight` package.
#[must_use]
pub fn detect_dogfood(root: &Utf8Path) -> bool {
    if !root.join(PROJECT_DIR_NAME).is_dir() {
        return false;
    }
    let Ok(manifest) = std::fs::read_to_string(root.join("Cargo.toml")) else {
        return false;
    };
    let Ok(manifest) = toml::from_str::<toml::Table>(&manifest) else {
        return false;
    };
    manifest
        .get("package")
        .and_then(|package| package.get("name"))
        .and_then(|name| name.as_str())
        == Some("codesight")
}
