use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_concurrent: {0}. Must be between 1 and 64")]
    InvalidMaxConcurrent(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid fuzzy_threshold: {0}. Must be within 0.0..=1.0")]
    InvalidFuzzyThreshold(f64),

    #[error("Invalid agent timeout: {0}. Must be at least 1 second")]
    InvalidAgentTimeout(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. .gauntlet/config.yaml (project config)
    /// 3. .gauntlet/local.yaml (local overrides, optional)
    /// 4. Environment variables (GAUNTLET_* prefix)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".gauntlet/config.yaml"))
            .merge(Yaml::file(".gauntlet/local.yaml"))
            .merge(Env::prefixed("GAUNTLET_").split("__"))
            .extract()
            .context("Failed to extract configuration")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.runner.max_concurrent == 0 || config.runner.max_concurrent > 64 {
            return Err(ConfigError::InvalidMaxConcurrent(config.runner.max_concurrent));
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(ConfigError::InvalidLogLevel(other.to_string())),
        }

        match config.logging.format.as_str() {
            "json" | "pretty" => {}
            other => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        }

        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        if !(0.0..=1.0).contains(&config.evaluation.fuzzy_threshold) {
            return Err(ConfigError::InvalidFuzzyThreshold(config.evaluation.fuzzy_threshold));
        }

        if config.agent.timeout_secs == 0 {
            return Err(ConfigError::InvalidAgentTimeout(config.agent.timeout_secs));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{EvaluationConfig, RunnerConfig};
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let config = Config {
            evaluation: EvaluationConfig { fuzzy_threshold: 1.5, ..EvaluationConfig::default() },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidFuzzyThreshold(_))
        ));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let config = Config {
            runner: RunnerConfig { max_concurrent: 0 },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConcurrent(0))
        ));
    }

    #[test]
    fn test_load_from_file_merges_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "runner:\n  max_concurrent: 2").unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.runner.max_concurrent, 2);
        assert_eq!(config.logging.level, "info");
    }
}
