//! List past jobs for an agent.

use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::TestJob;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Agent key the jobs were recorded under
    pub agent_key: String,

    /// Maximum number of jobs to list
    #[arg(long, default_value_t = 20)]
    pub limit: i64,
}

#[derive(Debug, serde::Serialize)]
struct HistoryRowOutput {
    id: String,
    status: String,
    progress: usize,
    total: usize,
    passed: Option<usize>,
    failed: Option<usize>,
    created_at: String,
}

impl From<&TestJob> for HistoryRowOutput {
    fn from(job: &TestJob) -> Self {
        Self {
            id: job.id.to_string(),
            status: job.status.as_str().to_string(),
            progress: job.progress,
            total: job.total,
            passed: job.summary.as_ref().map(|s| s.passed),
            failed: job.summary.as_ref().map(|s| s.failed),
            created_at: job.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct HistoryOutput {
    agent_key: String,
    jobs: Vec<HistoryRowOutput>,
}

impl CommandOutput for HistoryOutput {
    fn to_human(&self) -> String {
        if self.jobs.is_empty() {
            return format!("No jobs recorded for agent '{}'.", self.agent_key);
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec!["id", "status", "progress", "passed", "failed", "created"]);

        for job in &self.jobs {
            table.add_row(vec![
                job.id.clone(),
                job.status.clone(),
                format!("{}/{}", job.progress, job.total),
                job.passed.map_or_else(|| "-".to_string(), |p| p.to_string()),
                job.failed.map_or_else(|| "-".to_string(), |f| f.to_string()),
                job.created_at.clone(),
            ]);
        }
        format!("{table}")
    }
}

pub async fn execute(args: HistoryArgs, json_mode: bool) -> Result<()> {
    let context = super::build_context().await?;

    let jobs = context.manager.get_history(&args.agent_key, args.limit).await?;

    output(
        &HistoryOutput {
            agent_key: args.agent_key,
            jobs: jobs.iter().map(HistoryRowOutput::from).collect(),
        },
        json_mode,
    );
    Ok(())
}
