//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gauntlet", version, about = "Conversation test harness for external dialog agents")]
pub struct Cli {
    /// Emit machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a test suite against the configured agent
    Run(commands::run::RunArgs),
    /// Show the status of a job
    Status(commands::status::StatusArgs),
    /// Show the results and summary of a job
    Results(commands::results::ResultsArgs),
    /// List past jobs for an agent
    History(commands::history::HistoryArgs),
    /// Export a completed job's results as CSV
    Export(commands::export::ExportArgs),
    /// Report intent/page coverage over stored results
    Coverage(commands::coverage::CoverageArgs),
}

/// Print an error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) {
    if json_mode {
        let payload = serde_json::json!({ "error": err.to_string() });
        println!("{payload}");
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}
