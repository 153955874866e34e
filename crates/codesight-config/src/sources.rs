use std::collections::BTreeMap;

use super::{Config, ConfigSource};

impl Config {
    fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }

    /// Effective configuration as `key -> (value, source)`, sorted by key
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: String| {
            let source = self.source_of(key).as_str().to_string();
            config.insert(key.to_string(), (value, source));
        };

        add("token_limit", self.token_limit().to_string());
        add("prompt", self.prompt().to_string());
        add("output_file", self.output_file().to_string());
        add("stale_after_days", self.stale_after_days().to_string());
        add("clipboard", self.clipboard().to_string());
        add("check_updates", self.check_updates().to_string());
        add("exclude", self.selectors.exclude.join(", "));
        add("include_tests", self.selectors.include_tests.to_string());
        add(
            "include_structural",
            self.selectors.include_structural.to_string(),
        );
        add("dogfood", self.selectors.dogfood.to_string());

        config
    }
}
