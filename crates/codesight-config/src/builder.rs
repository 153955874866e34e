use codesight_selectors::Selectors;
use codesight_templates::PromptType;
use codesight_utils::error::CodesightError;

use super::discovery::DEFAULT_KEYS;
use super::{Config, ConfigSource, Defaults};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// ```rust
    /// use codesight_config::Config;
    ///
    /// let config = Config::builder()
    ///     .token_limit(20_000)
    ///     .include_tests(true)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.token_limit(), 20_000);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for a `Config` that never touches config files.
///
/// Every value set here is attributed to `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    token_limit: Option<usize>,
    prompt: Option<PromptType>,
    output_file: Option<String>,
    stale_after_days: Option<u32>,
    clipboard: Option<bool>,
    check_updates: Option<bool>,
    exclude: Option<Vec<String>>,
    include_tests: Option<bool>,
    include_structural: Option<bool>,
    dogfood: Option<bool>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn token_limit(mut self, limit: usize) -> Self {
        self.token_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn prompt(mut self, prompt: PromptType) -> Self {
        self.prompt = Some(prompt);
        self
    }

    #[must_use]
    pub fn output_file(mut self, output_file: impl Into<String>) -> Self {
        self.output_file = Some(output_file.into());
        self
    }

    #[must_use]
    pub fn stale_after_days(mut self, days: u32) -> Self {
        self.stale_after_days = Some(days);
        self
    }

    #[must_use]
    pub fn clipboard(mut self, enabled: bool) -> Self {
        self.clipboard = Some(enabled);
        self
    }

    #[must_use]
    pub fn check_updates(mut self, enabled: bool) -> Self {
        self.check_updates = Some(enabled);
        self
    }

    /// Replace the extra exclude patterns
    #[must_use]
    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn include_tests(mut self, include: bool) -> Self {
        self.include_tests = Some(include);
        self
    }

    #[must_use]
    pub fn include_structural(mut self, include: bool) -> Self {
        self.include_structural = Some(include);
        self
    }

    #[must_use]
    pub fn dogfood(mut self, dogfood: bool) -> Self {
        self.dogfood = Some(dogfood);
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `CodesightError::Config` when a value is out of range.
    pub fn build(self) -> Result<Config, CodesightError> {
        let mut source_attribution = DEFAULT_KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect::<std::collections::HashMap<_, _>>();
        let mut mark = |key: &str| {
            source_attribution.insert(key.to_string(), ConfigSource::Programmatic);
        };

        let mut defaults = Defaults::default();
        let mut selectors = Selectors::default();

        if let Some(v) = self.token_limit {
            defaults.token_limit = Some(v);
            mark("token_limit");
        }
        if let Some(v) = self.prompt {
            defaults.prompt = Some(v);
            mark("prompt");
        }
        if let Some(v) = self.output_file {
            defaults.output_file = Some(v);
            mark("output_file");
        }
        if let Some(v) = self.stale_after_days {
            defaults.stale_after_days = Some(v);
            mark("stale_after_days");
        }
        if let Some(v) = self.clipboard {
            defaults.clipboard = Some(v);
            mark("clipboard");
        }
        if let Some(v) = self.check_updates {
            defaults.check_updates = Some(v);
            mark("check_updates");
        }
        if let Some(v) = self.exclude {
            selectors.exclude = v;
            mark("exclude");
        }
        if let Some(v) = self.include_tests {
            selectors.include_tests = v;
            mark("include_tests");
        }
        if let Some(v) = self.include_structural {
            selectors.include_structural = v;
            mark("include_structural");
        }
        if let Some(v) = self.dogfood {
            selectors.dogfood = v;
            mark("dogfood");
        }

        let config = Config {
            defaults,
            selectors,
            config_file: None,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}
