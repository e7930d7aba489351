//! Gauntlet - Conversation Test Harness
//!
//! Gauntlet replays scripted and adversarial conversations against an
//! external dialog agent, scores every exchange with a fuzzy comparison
//! engine, and aggregates the outcomes into durable, queryable test runs.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, ports, and errors
//! - **Service Layer** (`services`): Job orchestration, bounded execution,
//!   the response evaluator, coverage, and export
//! - **Adapters** (`adapters`): SQLite persistence and agent clients
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gauntlet::adapters::agent::MockAgentClient;
//! use gauntlet::adapters::sqlite::{create_test_pool, all_embedded_migrations, Migrator, SqliteJobRepository};
//! use gauntlet::domain::models::{EvaluationConfig, TestUnit};
//! use gauntlet::services::{ExecutorConfig, JobManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = create_test_pool().await?;
//!     Migrator::new(pool.clone()).run_embedded_migrations(all_embedded_migrations()).await?;
//!
//!     let manager = JobManager::new(
//!         Arc::new(SqliteJobRepository::new(pool)),
//!         Arc::new(MockAgentClient::new()),
//!         ExecutorConfig::default(),
//!         EvaluationConfig::default(),
//!     );
//!
//!     let unit = TestUnit::adversarial("smoke", "hello there");
//!     let job_id = manager.create_job("my-agent", vec![unit], None).await?;
//!     println!("created job {job_id}");
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AgentInventory, AgentReply, Config, CoverageReport, EvaluationConfig, JobStatus, JobSummary,
    TestJob, TestSuite, TestTurn, TestUnit, TurnResult,
};
pub use domain::ports::{AgentClient, AgentClientError, JobRepository, JobStatusUpdate};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{BatchExecutor, ExecutorConfig, JobManager};
