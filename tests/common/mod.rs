//! Common test utilities for integration tests.

use std::sync::Arc;

use gauntlet::adapters::agent::MockAgentClient;
use gauntlet::adapters::sqlite::{all_embedded_migrations, create_test_pool, Migrator, SqliteJobRepository};
use gauntlet::domain::models::EvaluationConfig;
use gauntlet::services::{ExecutorConfig, JobManager};
use sqlx::SqlitePool;

/// In-memory database with the schema applied.
pub async fn setup_pool() -> SqlitePool {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    Migrator::new(pool.clone())
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .expect("Failed to run migrations");
    pool
}

/// Manager over a mock agent, sharing the given pool.
#[allow(dead_code)]
pub fn manager_with(pool: &SqlitePool, client: Arc<MockAgentClient>, max_concurrent: usize) -> JobManager {
    JobManager::new(
        Arc::new(SqliteJobRepository::new(pool.clone())),
        client,
        ExecutorConfig {
            max_concurrent,
            language_code: "en".to_string(),
        },
        EvaluationConfig::default(),
    )
}

/// Poll until a predicate over the job holds, panicking after ~5 seconds.
#[allow(dead_code)]
pub async fn wait_for_job<F>(
    manager: &JobManager,
    job_id: uuid::Uuid,
    mut predicate: F,
) -> gauntlet::TestJob
where
    F: FnMut(&gauntlet::TestJob) -> bool,
{
    for _ in 0..500 {
        if let Some(job) = manager.get_job(job_id).await.expect("poll failed") {
            if predicate(&job) {
                return job;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach the expected state in time");
}
