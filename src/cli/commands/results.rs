//! Show the results and summary of a job.

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};
use uuid::Uuid;

use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{JobSummary, TurnResult};

#[derive(Args, Debug)]
pub struct ResultsArgs {
    /// Job id
    pub job_id: Uuid,

    /// Only show failing turns
    #[arg(long)]
    pub failures_only: bool,
}

#[derive(Debug, serde::Serialize)]
struct ResultRowOutput {
    conversation_id: String,
    turn_number: u32,
    input: String,
    matched_intent: Option<String>,
    score: f64,
    passed: bool,
    differences: Vec<String>,
    error: Option<String>,
}

impl From<&TurnResult> for ResultRowOutput {
    fn from(result: &TurnResult) -> Self {
        Self {
            conversation_id: result.conversation_id.clone(),
            turn_number: result.turn_number,
            input: result.input.clone(),
            matched_intent: result.matched_intent.clone(),
            score: result.score,
            passed: result.passed(),
            differences: result.differences.clone(),
            error: result.error.clone(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct ResultsOutput {
    job_id: String,
    status: String,
    results: Vec<ResultRowOutput>,
    summary: Option<JobSummary>,
}

impl CommandOutput for ResultsOutput {
    fn to_human(&self) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec!["conversation", "turn", "input", "intent", "score", "verdict"]);

        for row in &self.results {
            let verdict = if row.passed {
                "pass".to_string()
            } else if row.error.is_some() {
                "error".to_string()
            } else {
                "fail".to_string()
            };
            table.add_row(vec![
                truncate(&row.conversation_id, 24),
                row.turn_number.to_string(),
                truncate(&row.input, 40),
                truncate(row.matched_intent.as_deref().unwrap_or("-"), 24),
                format!("{:.3}", row.score),
                verdict,
            ]);
        }

        let mut out = format!("{table}");
        if let Some(ref summary) = self.summary {
            out.push_str(&format!(
                "\n{} passed, {} failed of {} turns (average score {:.3})",
                summary.passed, summary.failed, summary.total, summary.average_score
            ));
        } else {
            out.push_str(&format!("\njob is {}, no summary yet", self.status));
        }
        out
    }
}

pub async fn execute(args: ResultsArgs, json_mode: bool) -> Result<()> {
    let context = super::build_context().await?;

    let job = context
        .manager
        .get_job(args.job_id)
        .await?
        .with_context(|| format!("No job with id {}", args.job_id))?;

    let results = job
        .results
        .iter()
        .map(ResultRowOutput::from)
        .filter(|row| !args.failures_only || !row.passed)
        .collect();

    output(
        &ResultsOutput {
            job_id: job.id.to_string(),
            status: job.status.as_str().to_string(),
            results,
            summary: job.summary.clone(),
        },
        json_mode,
    );
    Ok(())
}
