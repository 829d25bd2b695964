use std::path::Path;

use serde::{Deserialize, Serialize};

use fixtura_generate::GeneratorSettings;

use crate::errors::ConfigError;

/// Environment variable overriding the configured seed.
pub const SEED_ENV: &str = "FIXTURA_SEED";
/// Rows fetched by the bounded select of read-only entity types.
pub const SELECT_FETCH_COUNT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TestUnitConfig {
    /// Generator seed; drawn at random when unset.
    pub seed: Option<u64>,
    pub select_fetch_count: usize,
    pub generator: GeneratorSettings,
}

impl Default for TestUnitConfig {
    fn default() -> Self {
        Self {
            seed: None,
            select_fetch_count: SELECT_FETCH_COUNT,
            generator: GeneratorSettings::default(),
        }
    }
}

impl TestUnitConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TestUnitConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let generator = &self.generator;
        if !generator.global_min.is_finite() || !generator.global_max.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "generator fences must be finite, got [{}, {}]",
                generator.global_min, generator.global_max
            )));
        }
        if !(generator.global_min <= generator.global_max) {
            return Err(ConfigError::Invalid(format!(
                "generator.global_min ({}) exceeds generator.global_max ({})",
                generator.global_min, generator.global_max
            )));
        }
        if !(generator.global_max - generator.global_min).is_finite() {
            return Err(ConfigError::Invalid(format!(
                "generator fence span [{}, {}] overflows",
                generator.global_min, generator.global_max
            )));
        }
        if self.select_fetch_count == 0 {
            return Err(ConfigError::Invalid(
                "select_fetch_count must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies a `FIXTURA_SEED` style override; `None` keeps the config.
    pub fn with_seed_override(mut self, value: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(value) = value {
            let seed = value.trim().parse::<u64>().map_err(|err| {
                ConfigError::Invalid(format!("{SEED_ENV}={value:?} is not a seed: {err}"))
            })?;
            self.seed = Some(seed);
        }
        Ok(self)
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let value = std::env::var(SEED_ENV).ok();
        self.with_seed_override(value.as_deref())
    }
}

/// Loads a TOML config file and applies environment overrides.
pub fn load_config(path: &Path) -> Result<TestUnitConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    TestUnitConfig::from_toml_str(&content)?.with_env_overrides()
}
