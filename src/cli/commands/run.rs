//! Run a YAML test suite against the configured agent.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{EvaluationConfig, JobStatus, TestSuite};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to a YAML test suite
    pub suite: PathBuf,

    /// Agent key to record the run under (defaults to the suite's, then
    /// the configured agent id)
    #[arg(long)]
    pub agent_key: Option<String>,

    /// Override the fuzzy match threshold for this run
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Poll interval while waiting, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub poll_ms: u64,
}

#[derive(Debug, serde::Serialize)]
struct RunOutput {
    job_id: String,
    status: String,
    total: usize,
    passed: usize,
    failed: usize,
    average_score: f64,
    error: Option<String>,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        if let Some(ref error) = self.error {
            return format!("{} job {}: {}", style("failed").red().bold(), self.job_id, error);
        }
        let verdict = if self.failed == 0 {
            style("passed").green().bold()
        } else {
            style("failed").red().bold()
        };
        format!(
            "{verdict} job {}: {}/{} turns passed, average score {:.3}",
            self.job_id, self.passed, self.total, self.average_score
        )
    }
}

pub async fn execute(args: RunArgs, json_mode: bool) -> Result<()> {
    let context = super::build_context().await?;

    let document = std::fs::read_to_string(&args.suite)
        .with_context(|| format!("Failed to read suite {}", args.suite.display()))?;
    let suite = TestSuite::from_yaml(&document)
        .with_context(|| format!("Failed to parse suite {}", args.suite.display()))?;

    let agent_key = args
        .agent_key
        .or_else(|| suite.agent_key.clone())
        .unwrap_or_else(|| context.config.agent.agent_id.clone());

    let evaluation = args.threshold.map(|fuzzy_threshold| EvaluationConfig {
        fuzzy_threshold,
        ..context.config.evaluation.clone()
    });

    let units = suite.into_units();
    let job_id = context.manager.create_job(&agent_key, units, evaluation).await?;

    if !json_mode {
        eprintln!("job {job_id} created, waiting for completion");
    }

    // Poll the status contract until the job goes terminal.
    let job = loop {
        tokio::time::sleep(Duration::from_millis(args.poll_ms)).await;

        let job = context
            .manager
            .get_job(job_id)
            .await?
            .context("job disappeared while polling")?;

        if job.status.is_terminal() {
            break job;
        }
        if !json_mode {
            eprintln!("  {}/{} turns", job.progress, job.total);
        }
    };

    let summary = job.summary.clone().unwrap_or_default();
    output(
        &RunOutput {
            job_id: job.id.to_string(),
            status: job.status.as_str().to_string(),
            total: job.total,
            passed: summary.passed,
            failed: summary.failed,
            average_score: summary.average_score,
            error: job.error.clone(),
        },
        json_mode,
    );

    if job.status == JobStatus::Failed || summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
