//! Show the status of a job.

use anyhow::{Context, Result};
use clap::Args;
use uuid::Uuid;

use crate::cli::output::{output, CommandOutput};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Job id
    pub job_id: Uuid,
}

#[derive(Debug, serde::Serialize)]
struct StatusOutput {
    id: String,
    agent_key: String,
    status: String,
    progress: usize,
    total: usize,
    started_at: Option<String>,
    completed_at: Option<String>,
    error: Option<String>,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Job: {}", self.id),
            format!("Agent: {}", self.agent_key),
            format!("Status: {}", self.status),
            format!("Progress: {}/{}", self.progress, self.total),
        ];
        if let Some(ref started) = self.started_at {
            lines.push(format!("Started: {started}"));
        }
        if let Some(ref completed) = self.completed_at {
            lines.push(format!("Completed: {completed}"));
        }
        if let Some(ref error) = self.error {
            lines.push(format!("Error: {error}"));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: StatusArgs, json_mode: bool) -> Result<()> {
    let context = super::build_context().await?;

    let job = context
        .manager
        .get_job(args.job_id)
        .await?
        .with_context(|| format!("No job with id {}", args.job_id))?;

    output(
        &StatusOutput {
            id: job.id.to_string(),
            agent_key: job.agent_key.clone(),
            status: job.status.as_str().to_string(),
            progress: job.progress,
            total: job.total,
            started_at: job.started_at.map(|t| t.to_rfc3339()),
            completed_at: job.completed_at.map(|t| t.to_rfc3339()),
            error: job.error.clone(),
        },
        json_mode,
    );
    Ok(())
}
