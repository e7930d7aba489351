//! Job manager: owns the job lifecycle from creation to terminal status.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EvaluationConfig, JobStatus, JobSummary, TestJob, TestUnit};
use crate::domain::ports::{AgentClient, JobRepository, JobStatusUpdate};
use crate::services::executor::{BatchExecutor, ExecutorConfig};
use crate::services::export;

/// Message stored for callers when orchestration itself breaks. Raw error
/// text stays in the log.
const FAILURE_MESSAGE: &str = "The test run failed before completing; see the service log.";

const RESULT_CHANNEL_CAPACITY: usize = 64;

/// Drives test jobs: validates batches, spawns background execution,
/// persists incremental progress, and answers polls.
///
/// The repository is the authority; the in-memory map is a write-through
/// cache for jobs mid-flight and is never required for correctness.
#[derive(Clone)]
pub struct JobManager {
    repository: Arc<dyn JobRepository>,
    client: Arc<dyn AgentClient>,
    executor_config: ExecutorConfig,
    evaluation: EvaluationConfig,
    cache: Arc<RwLock<HashMap<Uuid, TestJob>>>,
}

impl JobManager {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        client: Arc<dyn AgentClient>,
        executor_config: ExecutorConfig,
        evaluation: EvaluationConfig,
    ) -> Self {
        Self {
            repository,
            client,
            executor_config,
            evaluation,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a job and start executing it in the background.
    ///
    /// Returns the job id immediately; progress is observable via
    /// [`JobManager::get_job`]. An empty or invalid batch fails
    /// synchronously and no job is created.
    pub async fn create_job(
        &self,
        agent_key: &str,
        units: Vec<TestUnit>,
        evaluation_override: Option<EvaluationConfig>,
    ) -> DomainResult<Uuid> {
        if units.is_empty() {
            return Err(DomainError::ValidationFailed(
                "no test units supplied: provide at least one conversation or prompt".to_string(),
            ));
        }
        for unit in &units {
            unit.validate().map_err(DomainError::ValidationFailed)?;
        }

        let total = units.iter().map(TestUnit::turn_count).sum();
        let job = TestJob::new(agent_key, total);
        let job_id = job.id;

        self.repository.create_job(&job).await?;
        {
            let mut cache = self.cache.write().await;
            cache.insert(job_id, job);
        }

        let manager = self.clone();
        let evaluation = evaluation_override.unwrap_or_else(|| manager.evaluation.clone());
        tokio::spawn(async move {
            manager.process(job_id, units, evaluation).await;
        });

        Ok(job_id)
    }

    /// Freshest known state of a job: the cache when the job is live here,
    /// otherwise reconstructed from the store.
    pub async fn get_job(&self, job_id: Uuid) -> DomainResult<Option<TestJob>> {
        {
            let cache = self.cache.read().await;
            if let Some(job) = cache.get(&job_id) {
                return Ok(Some(job.clone()));
            }
        }
        self.repository.get_job(job_id).await
    }

    /// Past jobs for an agent, most recent first, results omitted.
    pub async fn get_history(&self, agent_key: &str, limit: i64) -> DomainResult<Vec<TestJob>> {
        self.repository.list_by_agent(agent_key, limit).await
    }

    /// Tabular export of a completed job's results.
    pub async fn export_job(&self, job_id: Uuid) -> DomainResult<String> {
        let job = self
            .get_job(job_id)
            .await?
            .ok_or(DomainError::JobNotFound(job_id))?;

        if job.status != JobStatus::Completed {
            return Err(DomainError::ValidationFailed(format!(
                "job is {}; export requires a completed job",
                job.status.as_str()
            )));
        }

        Ok(export::to_csv(&job.results))
    }

    /// Background driver. Never propagates: any orchestration error marks
    /// the job failed with a sanitized message.
    async fn process(&self, job_id: Uuid, units: Vec<TestUnit>, evaluation: EvaluationConfig) {
        if let Err(err) = self.run_to_completion(job_id, units, evaluation).await {
            tracing::error!(%job_id, error = %err, "test job failed");

            let update = JobStatusUpdate {
                completed_at: Some(Utc::now()),
                error: Some(FAILURE_MESSAGE.to_string()),
                ..JobStatusUpdate::default()
            };
            if let Err(store_err) = self
                .repository
                .update_status(job_id, JobStatus::Failed, update)
                .await
            {
                tracing::error!(%job_id, error = %store_err, "failed to persist job failure");
            }

            let mut cache = self.cache.write().await;
            if let Some(job) = cache.get_mut(&job_id) {
                job.fail(FAILURE_MESSAGE, Utc::now());
            }
        }

        // Terminal either way; the store now owns the record.
        let mut cache = self.cache.write().await;
        cache.remove(&job_id);
    }

    async fn run_to_completion(
        &self,
        job_id: Uuid,
        units: Vec<TestUnit>,
        evaluation: EvaluationConfig,
    ) -> DomainResult<()> {
        let started_at = Utc::now();
        self.repository
            .update_status(
                job_id,
                JobStatus::Processing,
                JobStatusUpdate { started_at: Some(started_at), ..JobStatusUpdate::default() },
            )
            .await?;
        {
            let mut cache = self.cache.write().await;
            if let Some(job) = cache.get_mut(&job_id) {
                job.begin(started_at);
            }
        }

        let (tx, mut rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let executor = BatchExecutor::new(
            Arc::clone(&self.client),
            evaluation,
            self.executor_config.clone(),
        );
        let execution = tokio::spawn(executor.run(units, tx));

        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            // Durable first; only then is progress considered advanced.
            self.repository.append_result(job_id, &result).await?;

            let mut cache = self.cache.write().await;
            if let Some(job) = cache.get_mut(&job_id) {
                job.record_result(result.clone());
            }
            drop(cache);

            results.push(result);
        }

        execution
            .await
            .map_err(|e| DomainError::ExecutionFailed(e.to_string()))?;

        let summary = JobSummary::from_results(&results);
        let completed_at = Utc::now();
        self.repository
            .update_status(
                job_id,
                JobStatus::Completed,
                JobStatusUpdate {
                    completed_at: Some(completed_at),
                    summary: Some(summary.clone()),
                    ..JobStatusUpdate::default()
                },
            )
            .await?;

        {
            let mut cache = self.cache.write().await;
            if let Some(job) = cache.get_mut(&job_id) {
                job.complete(summary, completed_at);
            }
        }

        tracing::info!(%job_id, results = results.len(), "test job completed");
        Ok(())
    }
}
