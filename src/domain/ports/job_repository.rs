//! Repository port for durable job and result persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{JobStatus, JobSummary, TestJob, TurnResult};

/// Fields applied together with a status transition.
///
/// Each timestamp is set at most once; the repository keeps existing values
/// when a field is `None`.
#[derive(Debug, Clone, Default)]
pub struct JobStatusUpdate {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub summary: Option<JobSummary>,
    pub error: Option<String>,
}

/// Durable system of record for test jobs.
///
/// All writes are safely retryable: `append_result` is idempotent on the
/// result id, and status updates never leave a terminal state. After a
/// process restart an equivalent job must be reconstructable purely from
/// persisted rows.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Persist the initial job row.
    async fn create_job(&self, job: &TestJob) -> DomainResult<()>;

    /// Durably append one result. Duplicate ids are ignored.
    async fn append_result(&self, job_id: Uuid, result: &TurnResult) -> DomainResult<()>;

    /// Transition a job's status, applying terminal fields.
    async fn update_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        update: JobStatusUpdate,
    ) -> DomainResult<()>;

    /// Reconstruct a job, results included, from persisted rows.
    async fn get_job(&self, id: Uuid) -> DomainResult<Option<TestJob>>;

    /// Results for a job in completion order.
    async fn list_results(&self, job_id: Uuid) -> DomainResult<Vec<TurnResult>>;

    /// Jobs for one agent, most recent first, results omitted.
    async fn list_by_agent(&self, agent_key: &str, limit: i64) -> DomainResult<Vec<TestJob>>;
}
