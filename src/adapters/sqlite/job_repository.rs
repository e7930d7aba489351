//! SQLite implementation of the JobRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{JobStatus, JobSummary, TestJob, TurnResult};
use crate::domain::ports::{JobRepository, JobStatusUpdate};

use super::{parse_datetime, parse_optional_datetime, parse_uuid};

const TERMINAL_GUARD: &str = "status NOT IN ('completed', 'failed')";

#[derive(Clone)]
pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_job_row(&self, id: Uuid) -> DomainResult<Option<JobRow>> {
        let row: Option<JobRow> = sqlx::query_as("SELECT * FROM test_jobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn create_job(&self, job: &TestJob) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO test_jobs (id, agent_key, status, total, summary, error,
               created_at, started_at, completed_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(job.id.to_string())
        .bind(&job.agent_key)
        .bind(job.status.as_str())
        .bind(job.total as i64)
        .bind(job.summary.as_ref().map(serde_json::to_string).transpose()?)
        .bind(&job.error)
        .bind(job.created_at.to_rfc3339())
        .bind(job.started_at.map(|t| t.to_rfc3339()))
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_result(&self, job_id: Uuid, result: &TurnResult) -> DomainResult<()> {
        // INSERT OR IGNORE keeps retried writes idempotent on the result id.
        sqlx::query(
            r#"INSERT OR IGNORE INTO turn_results (id, job_id, conversation_id, turn_number,
               category, input, agent_response, expected_intent, expected_response,
               expected_parameters, matched_intent, confidence, parameters, page,
               intent_matched, response_matched, parameters_matched, score, differences,
               execution_time_ms, error, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(result.id.to_string())
        .bind(job_id.to_string())
        .bind(&result.conversation_id)
        .bind(i64::from(result.turn_number))
        .bind(&result.category)
        .bind(&result.input)
        .bind(&result.agent_response)
        .bind(&result.expected_intent)
        .bind(&result.expected_response)
        .bind(result.expected_parameters.as_ref().map(serde_json::to_string).transpose()?)
        .bind(&result.matched_intent)
        .bind(result.confidence)
        .bind(result.parameters.as_ref().map(serde_json::to_string).transpose()?)
        .bind(&result.page)
        .bind(result.intent_matched)
        .bind(result.response_matched)
        .bind(result.parameters_matched)
        .bind(result.score)
        .bind(serde_json::to_string(&result.differences)?)
        .bind(result.execution_time_ms as i64)
        .bind(&result.error)
        .bind(result.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        update: JobStatusUpdate,
    ) -> DomainResult<()> {
        // COALESCE keeps set-once fields; the guard keeps terminal jobs immutable.
        let query = format!(
            r#"UPDATE test_jobs SET status = ?,
               started_at = COALESCE(?, started_at),
               completed_at = COALESCE(?, completed_at),
               summary = COALESCE(?, summary),
               error = COALESCE(?, error)
               WHERE id = ? AND {TERMINAL_GUARD}"#
        );

        let result = sqlx::query(&query)
            .bind(status.as_str())
            .bind(update.started_at.map(|t| t.to_rfc3339()))
            .bind(update.completed_at.map(|t| t.to_rfc3339()))
            .bind(update.summary.as_ref().map(serde_json::to_string).transpose()?)
            .bind(&update.error)
            .bind(job_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.get_job_row(job_id).await? {
                Some(row) => Err(DomainError::InvalidStateTransition {
                    from: row.status,
                    to: status.as_str().to_string(),
                }),
                None => Err(DomainError::JobNotFound(job_id)),
            };
        }

        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> DomainResult<Option<TestJob>> {
        let Some(row) = self.get_job_row(id).await? else {
            return Ok(None);
        };

        let results = self.list_results(id).await?;
        let mut job: TestJob = row.try_into()?;
        job.progress = results.len();
        job.results = results;
        Ok(Some(job))
    }

    async fn list_results(&self, job_id: Uuid) -> DomainResult<Vec<TurnResult>> {
        // rowid order is insertion order, which is completion order.
        let rows: Vec<ResultRow> =
            sqlx::query_as("SELECT * FROM turn_results WHERE job_id = ? ORDER BY rowid")
                .bind(job_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_by_agent(&self, agent_key: &str, limit: i64) -> DomainResult<Vec<TestJob>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"SELECT * FROM test_jobs WHERE agent_key = ?
               ORDER BY created_at DESC LIMIT ?"#,
        )
        .bind(agent_key)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            let mut job: TestJob = row.try_into()?;
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM turn_results WHERE job_id = ?")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            job.progress = count as usize;
            jobs.push(job);
        }
        Ok(jobs)
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    agent_key: String,
    status: String,
    total: i64,
    summary: Option<String>,
    error: Option<String>,
    created_at: String,
    started_at: Option<String>,
    completed_at: Option<String>,
}

impl TryFrom<JobRow> for TestJob {
    type Error = DomainError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid status: {}", row.status)))?;

        let summary: Option<JobSummary> =
            row.summary.as_deref().map(serde_json::from_str).transpose()?;

        Ok(TestJob {
            id: parse_uuid(&row.id)?,
            agent_key: row.agent_key,
            status,
            progress: 0,
            total: row.total as usize,
            results: Vec::new(),
            summary,
            error: row.error,
            created_at: parse_datetime(&row.created_at)?,
            started_at: parse_optional_datetime(row.started_at)?,
            completed_at: parse_optional_datetime(row.completed_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResultRow {
    id: String,
    #[allow(dead_code)]
    job_id: String,
    conversation_id: String,
    turn_number: i64,
    category: Option<String>,
    input: String,
    agent_response: String,
    expected_intent: Option<String>,
    expected_response: Option<String>,
    expected_parameters: Option<String>,
    matched_intent: Option<String>,
    confidence: Option<f64>,
    parameters: Option<String>,
    page: Option<String>,
    intent_matched: bool,
    response_matched: bool,
    parameters_matched: bool,
    score: f64,
    differences: Option<String>,
    execution_time_ms: i64,
    error: Option<String>,
    created_at: String,
}

impl TryFrom<ResultRow> for TurnResult {
    type Error = DomainError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        let differences: Vec<String> =
            row.differences.as_deref().map(serde_json::from_str).transpose()?.unwrap_or_default();

        Ok(TurnResult {
            id: parse_uuid(&row.id)?,
            conversation_id: row.conversation_id,
            turn_number: row.turn_number as u32,
            category: row.category,
            input: row.input,
            agent_response: row.agent_response,
            expected_intent: row.expected_intent,
            expected_response: row.expected_response,
            expected_parameters: row.expected_parameters.as_deref().map(serde_json::from_str).transpose()?,
            matched_intent: row.matched_intent,
            confidence: row.confidence,
            parameters: row.parameters.as_deref().map(serde_json::from_str).transpose()?,
            page: row.page,
            intent_matched: row.intent_matched,
            response_matched: row.response_matched,
            parameters_matched: row.parameters_matched,
            score: row.score,
            differences,
            execution_time_ms: row.execution_time_ms as u64,
            error: row.error,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}
