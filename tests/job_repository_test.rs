//! Integration tests for the SQLite job repository.

mod common;

use chrono::Utc;
use gauntlet::adapters::sqlite::SqliteJobRepository;
use gauntlet::domain::models::{JobStatus, JobSummary, TestJob, TurnResult};
use gauntlet::domain::ports::{JobRepository, JobStatusUpdate};
use gauntlet::DomainError;

fn sample_result(conversation: &str, turn: u32) -> TurnResult {
    let mut result = TurnResult::blank(conversation, turn, format!("input {turn}"), "reply");
    result.intent_matched = true;
    result.response_matched = true;
    result.parameters_matched = true;
    result.score = 1.0;
    result
}

#[tokio::test]
async fn test_job_round_trip() {
    let pool = common::setup_pool().await;
    let repo = SqliteJobRepository::new(pool);

    let job = TestJob::new("travel-bot", 3);
    repo.create_job(&job).await.unwrap();

    let loaded = repo.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, job.id);
    assert_eq!(loaded.agent_key, "travel-bot");
    assert_eq!(loaded.status, JobStatus::Pending);
    assert_eq!(loaded.total, 3);
    assert_eq!(loaded.progress, 0);
    assert!(loaded.summary.is_none() && loaded.error.is_none());
}

#[tokio::test]
async fn test_unknown_job_is_none() {
    let pool = common::setup_pool().await;
    let repo = SqliteJobRepository::new(pool);

    assert!(repo.get_job(uuid::Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_append_result_is_idempotent() {
    let pool = common::setup_pool().await;
    let repo = SqliteJobRepository::new(pool);

    let job = TestJob::new("travel-bot", 2);
    repo.create_job(&job).await.unwrap();

    let result = sample_result("conv", 1);
    repo.append_result(job.id, &result).await.unwrap();
    // A retried write of the same result must not duplicate the row.
    repo.append_result(job.id, &result).await.unwrap();
    repo.append_result(job.id, &sample_result("conv", 2)).await.unwrap();

    let results = repo.list_results(job.id).await.unwrap();
    assert_eq!(results.len(), 2);

    let loaded = repo.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.progress, 2);
    assert_eq!(loaded.results.len(), loaded.progress);
}

#[tokio::test]
async fn test_results_come_back_in_completion_order() {
    let pool = common::setup_pool().await;
    let repo = SqliteJobRepository::new(pool);

    let job = TestJob::new("travel-bot", 3);
    repo.create_job(&job).await.unwrap();

    // Completion order deliberately disagrees with turn numbering.
    repo.append_result(job.id, &sample_result("b", 2)).await.unwrap();
    repo.append_result(job.id, &sample_result("a", 1)).await.unwrap();
    repo.append_result(job.id, &sample_result("b", 3)).await.unwrap();

    let results = repo.list_results(job.id).await.unwrap();
    let order: Vec<(String, u32)> = results
        .iter()
        .map(|r| (r.conversation_id.clone(), r.turn_number))
        .collect();
    assert_eq!(
        order,
        vec![("b".to_string(), 2), ("a".to_string(), 1), ("b".to_string(), 3)]
    );
}

#[tokio::test]
async fn test_status_transitions_and_terminal_guard() {
    let pool = common::setup_pool().await;
    let repo = SqliteJobRepository::new(pool);

    let job = TestJob::new("travel-bot", 1);
    repo.create_job(&job).await.unwrap();

    repo.update_status(
        job.id,
        JobStatus::Processing,
        JobStatusUpdate { started_at: Some(Utc::now()), ..JobStatusUpdate::default() },
    )
    .await
    .unwrap();

    repo.update_status(
        job.id,
        JobStatus::Completed,
        JobStatusUpdate {
            completed_at: Some(Utc::now()),
            summary: Some(JobSummary::default()),
            ..JobStatusUpdate::default()
        },
    )
    .await
    .unwrap();

    // Terminal jobs are immutable.
    let err = repo
        .update_status(
            job.id,
            JobStatus::Failed,
            JobStatusUpdate { error: Some("late".to_string()), ..JobStatusUpdate::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidStateTransition { .. }));

    let loaded = repo.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Completed);
    assert!(loaded.summary.is_some());
    assert!(loaded.error.is_none());
}

#[tokio::test]
async fn test_update_status_unknown_job() {
    let pool = common::setup_pool().await;
    let repo = SqliteJobRepository::new(pool);

    let err = repo
        .update_status(uuid::Uuid::new_v4(), JobStatus::Processing, JobStatusUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::JobNotFound(_)));
}

#[tokio::test]
async fn test_reconstruction_from_rows_alone() {
    let pool = common::setup_pool().await;

    let job = TestJob::new("travel-bot", 2);
    {
        let repo = SqliteJobRepository::new(pool.clone());
        repo.create_job(&job).await.unwrap();
        repo.update_status(
            job.id,
            JobStatus::Processing,
            JobStatusUpdate { started_at: Some(Utc::now()), ..JobStatusUpdate::default() },
        )
        .await
        .unwrap();
        repo.append_result(job.id, &sample_result("conv", 1)).await.unwrap();
        repo.append_result(job.id, &sample_result("conv", 2)).await.unwrap();

        let summary = JobSummary::from_results(&repo.list_results(job.id).await.unwrap());
        repo.update_status(
            job.id,
            JobStatus::Completed,
            JobStatusUpdate {
                completed_at: Some(Utc::now()),
                summary: Some(summary),
                ..JobStatusUpdate::default()
            },
        )
        .await
        .unwrap();
    }

    // A fresh repository over the same database must see an equivalent job.
    let repo = SqliteJobRepository::new(pool);
    let loaded = repo.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Completed);
    assert_eq!(loaded.progress, 2);
    assert_eq!(loaded.results.len(), 2);
    let summary = loaded.summary.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 2);
}

#[tokio::test]
async fn test_list_by_agent_most_recent_first_without_results() {
    let pool = common::setup_pool().await;
    let repo = SqliteJobRepository::new(pool);

    let mut old = TestJob::new("travel-bot", 1);
    old.created_at = Utc::now() - chrono::Duration::minutes(5);
    let recent = TestJob::new("travel-bot", 1);
    let other = TestJob::new("support-bot", 1);

    repo.create_job(&old).await.unwrap();
    repo.create_job(&recent).await.unwrap();
    repo.create_job(&other).await.unwrap();
    repo.append_result(recent.id, &sample_result("conv", 1)).await.unwrap();

    let jobs = repo.list_by_agent("travel-bot", 10).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, recent.id);
    assert_eq!(jobs[1].id, old.id);

    // Results omitted for compactness, progress still populated.
    assert!(jobs[0].results.is_empty());
    assert_eq!(jobs[0].progress, 1);
}
