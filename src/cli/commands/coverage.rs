//! Report intent/page coverage over stored results.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use uuid::Uuid;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{AgentInventory, CoverageReport};
use crate::domain::ports::JobRepository;
use crate::services::coverage_report;

#[derive(Args, Debug)]
pub struct CoverageArgs {
    /// Scope to one job
    #[arg(long, conflicts_with = "agent_key")]
    pub job_id: Option<Uuid>,

    /// Scope to every stored job of one agent
    #[arg(long)]
    pub agent_key: Option<String>,

    /// YAML file with the agent's full intent/page inventory
    #[arg(long)]
    pub inventory: Option<PathBuf>,

    /// Maximum history depth when scoping by agent
    #[arg(long, default_value_t = 100)]
    pub limit: i64,
}

#[derive(Debug, serde::Serialize)]
struct CoverageOutput {
    scope: String,
    report: CoverageReport,
}

impl CommandOutput for CoverageOutput {
    fn to_human(&self) -> String {
        let report = &self.report;
        let mut lines = vec![
            format!("Coverage for {}", self.scope),
            format!("Intents observed: {}", report.observed_intents.len()),
            format!("Pages observed: {}", report.observed_pages.len()),
        ];
        if let Some(coverage) = report.intent_coverage {
            lines.push(format!(
                "Intent coverage: {:.1}% ({} untested)",
                coverage * 100.0,
                report.untested_intents.len()
            ));
        }
        if let Some(coverage) = report.page_coverage {
            lines.push(format!(
                "Page coverage: {:.1}% ({} untested)",
                coverage * 100.0,
                report.untested_pages.len()
            ));
        }
        if !report.untested_intents.is_empty() {
            lines.push(format!("Untested intents: {}", report.untested_intents.join(", ")));
        }
        if !report.untested_pages.is_empty() {
            lines.push(format!("Untested pages: {}", report.untested_pages.join(", ")));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: CoverageArgs, json_mode: bool) -> Result<()> {
    let context = super::build_context().await?;

    let inventory: Option<AgentInventory> = match args.inventory {
        Some(ref path) => {
            let document = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read inventory {}", path.display()))?;
            Some(serde_yaml::from_str(&document).context("Failed to parse inventory")?)
        }
        None => None,
    };

    let (scope, results) = match (args.job_id, args.agent_key) {
        (Some(job_id), _) => {
            let results = context.repository.list_results(job_id).await?;
            (format!("job {job_id}"), results)
        }
        (None, Some(agent_key)) => {
            let mut results = Vec::new();
            for job in context.repository.list_by_agent(&agent_key, args.limit).await? {
                results.extend(context.repository.list_results(job.id).await?);
            }
            (format!("agent '{agent_key}'"), results)
        }
        (None, None) => bail!("supply either --job-id or --agent-key"),
    };

    let report = coverage_report(&results, inventory.as_ref());
    output(&CoverageOutput { scope, report }, json_mode);
    Ok(())
}
