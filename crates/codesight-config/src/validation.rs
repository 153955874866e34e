use codesight_utils::error::{CodesightError, ConfigError};

use super::{Config, MAX_STALE_AFTER_DAYS, MAX_TOKEN_LIMIT};

fn invalid(key: &str, value: impl Into<String>) -> CodesightError {
    CodesightError::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    })
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), CodesightError> {
        if let Some(token_limit) = self.defaults.token_limit {
            if token_limit == 0 {
                return Err(invalid("token_limit", "must be greater than 0"));
            }
            if token_limit > MAX_TOKEN_LIMIT {
                return Err(invalid(
                    "token_limit",
                    format!("exceeds maximum limit of {MAX_TOKEN_LIMIT}"),
                ));
            }
        }

        if let Some(days) = self.defaults.stale_after_days
            && days > MAX_STALE_AFTER_DAYS
        {
            return Err(invalid(
                "stale_after_days",
                format!("exceeds maximum of {MAX_STALE_AFTER_DAYS} days"),
            ));
        }

        if let Some(output_file) = &self.defaults.output_file
            && output_file.trim().is_empty()
        {
            return Err(invalid("output_file", "must not be empty"));
        }

        Ok(())
    }
}
