//! Export a completed job's results as CSV.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Job id (must be completed)
    pub job_id: Uuid,

    /// Write to a file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub async fn execute(args: ExportArgs, _json_mode: bool) -> Result<()> {
    let context = super::build_context().await?;

    let csv = context.manager.export_job(args.job_id).await?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}
