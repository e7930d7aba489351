//! CLI command implementations.

pub mod coverage;
pub mod export;
pub mod history;
pub mod results;
pub mod run;
pub mod status;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::agent::{RestAgentClient, RestAgentConfig};
use crate::adapters::sqlite::{initialize_database, SqliteJobRepository};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{ExecutorConfig, JobManager};

/// Everything a command needs: loaded config, the repository, and a
/// manager wired to the configured agent endpoint.
pub(crate) struct CommandContext {
    pub config: Config,
    pub repository: Arc<SqliteJobRepository>,
    pub manager: JobManager,
}

pub(crate) async fn build_context() -> Result<CommandContext> {
    let config = ConfigLoader::load()?;
    let pool = initialize_database(&config.database)
        .await
        .context("Failed to open the gauntlet database")?;

    let repository = Arc::new(SqliteJobRepository::new(pool));
    let client = Arc::new(
        RestAgentClient::new(RestAgentConfig::from_agent_config(&config.agent))
            .context("Failed to construct the agent client")?,
    );

    let manager = JobManager::new(
        repository.clone(),
        client,
        ExecutorConfig {
            max_concurrent: config.runner.max_concurrent,
            language_code: config.agent.language_code.clone(),
        },
        config.evaluation.clone(),
    );

    Ok(CommandContext { config, repository, manager })
}
