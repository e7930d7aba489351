//! Test job domain model.
//!
//! A job is one batch of conversational units replayed against an external
//! agent. Jobs move `pending -> processing -> {completed, failed}` and are
//! immutable once terminal.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::TurnResult;

/// Status of a test job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job registered, background execution not yet started
    Pending,
    /// Units are being replayed against the agent
    Processing,
    /// Every unit produced a result and the summary is persisted
    Completed,
    /// An orchestration error aborted the job
    Failed,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<JobStatus> {
        match self {
            Self::Pending => vec![Self::Processing, Self::Failed],
            Self::Processing => vec![Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// Pass/total counts for one breakdown bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketStats {
    pub total: usize,
    pub passed: usize,
}

impl BucketStats {
    fn record(&mut self, passed: bool) {
        self.total += 1;
        if passed {
            self.passed += 1;
        }
    }
}

/// Derived aggregate over a job's full result set.
///
/// Always produced by one pure reduction over the results, never mutated
/// field-by-field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub average_score: f64,
    /// Pass counts per adversarial prompt category.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, BucketStats>,
    /// Pass counts per observed intent.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub intents: BTreeMap<String, BucketStats>,
    /// Pass counts per observed page.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pages: BTreeMap<String, BucketStats>,
}

impl JobSummary {
    /// Reduce a result set into a summary. Recomputable at any time.
    pub fn from_results(results: &[TurnResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };

        let mut score_sum = 0.0;
        for result in results {
            let passed = result.passed();
            if passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            score_sum += result.score;

            if let Some(ref category) = result.category {
                summary.categories.entry(category.clone()).or_default().record(passed);
            }
            if let Some(ref intent) = result.matched_intent {
                summary.intents.entry(intent.clone()).or_default().record(passed);
            }
            if let Some(ref page) = result.page {
                summary.pages.entry(page.clone()).or_default().record(passed);
            }
        }

        if !results.is_empty() {
            summary.average_score = score_sum / results.len() as f64;
        }

        summary
    }
}

/// A batch of conversational units replayed against one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestJob {
    /// Unique identifier, generated at creation
    pub id: Uuid,
    /// The agent under test (owner key for history queries)
    pub agent_key: String,
    /// Current status
    pub status: JobStatus,
    /// Count of turn results produced so far
    pub progress: usize,
    /// Count of turns scheduled at creation, immutable once set
    pub total: usize,
    /// Results in completion order (not submission order)
    pub results: Vec<TurnResult>,
    /// Present only when status is `Completed`
    pub summary: Option<JobSummary>,
    /// Human-safe failure message, present only when status is `Failed`
    pub error: Option<String>,
    /// When the job was registered
    pub created_at: DateTime<Utc>,
    /// When background execution began
    pub started_at: Option<DateTime<Utc>>,
    /// When a terminal status was reached
    pub completed_at: Option<DateTime<Utc>>,
}

impl TestJob {
    pub fn new(agent_key: impl Into<String>, total: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_key: agent_key.into(),
            status: JobStatus::default(),
            progress: 0,
            total,
            results: Vec::new(),
            summary: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Append a result and advance progress in one step.
    ///
    /// Invariant: `results.len() == progress <= total`.
    pub fn record_result(&mut self, result: TurnResult) {
        self.results.push(result);
        self.progress = self.results.len();
    }

    /// Mark the job as processing.
    pub fn begin(&mut self, at: DateTime<Utc>) {
        if self.status.can_transition_to(JobStatus::Processing) {
            self.status = JobStatus::Processing;
            self.started_at = Some(at);
        }
    }

    /// Mark the job as completed with its summary.
    pub fn complete(&mut self, summary: JobSummary, at: DateTime<Utc>) {
        if self.status.can_transition_to(JobStatus::Completed) {
            self.status = JobStatus::Completed;
            self.summary = Some(summary);
            self.completed_at = Some(at);
        }
    }

    /// Mark the job as failed with a human-safe message.
    pub fn fail(&mut self, error: impl Into<String>, at: DateTime<Utc>) {
        if self.status.can_transition_to(JobStatus::Failed) {
            self.status = JobStatus::Failed;
            self.error = Some(error.into());
            self.completed_at = Some(at);
        }
    }

    /// Copy of this job without its result rows, for compact listings.
    pub fn without_results(&self) -> Self {
        Self {
            results: Vec::new(),
            ..self.clone()
        }
    }
}
