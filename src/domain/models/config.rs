//! Configuration tree, loaded by the figment-based loader.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub agent: AgentConfig,
    pub runner: RunnerConfig,
    pub evaluation: EvaluationConfig,
}

/// SQLite storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: ".gauntlet/gauntlet.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    pub level: String,
    /// pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// External dialog agent endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the agent's REST endpoint
    pub base_url: String,
    /// Agent identifier within the endpoint
    pub agent_id: String,
    /// Bearer token; `GAUNTLET_AGENT__API_TOKEN` env override applies
    pub api_token: Option<String>,
    pub language_code: String,
    /// Per-call timeout; expiry surfaces as an adapter call error
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8300".to_string(),
            agent_id: "default".to_string(),
            api_token: None,
            language_code: "en".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Batch execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Units allowed in flight simultaneously
    pub max_concurrent: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// Fuzzy comparison settings for the response evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub ignore_case: bool,
    pub ignore_punctuation: bool,
    pub ignore_whitespace: bool,
    /// Minimum similarity score for two strings to count as a match
    pub fuzzy_threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            ignore_case: true,
            ignore_punctuation: true,
            ignore_whitespace: true,
            fuzzy_threshold: 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.runner.max_concurrent, 4);
        assert!((config.evaluation.fuzzy_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("runner:\n  max_concurrent: 2\n").unwrap();
        assert_eq!(config.runner.max_concurrent, 2);
        assert_eq!(config.database.max_connections, 5);
    }
}
