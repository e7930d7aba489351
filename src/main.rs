//! Gauntlet CLI entry point.

use clap::Parser;

use gauntlet::cli::{Cli, Commands};
use gauntlet::domain::models::LoggingConfig;
use gauntlet::infrastructure::config::ConfigLoader;
use gauntlet::infrastructure::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging first; fall back to defaults if the config is unreadable so
    // the real error surfaces through the command itself.
    let logging_config: LoggingConfig = ConfigLoader::load().map(|c| c.logging).unwrap_or_default();
    logging::init(&logging_config);

    let result = match cli.command {
        Commands::Run(args) => gauntlet::cli::commands::run::execute(args, cli.json).await,
        Commands::Status(args) => gauntlet::cli::commands::status::execute(args, cli.json).await,
        Commands::Results(args) => gauntlet::cli::commands::results::execute(args, cli.json).await,
        Commands::History(args) => gauntlet::cli::commands::history::execute(args, cli.json).await,
        Commands::Export(args) => gauntlet::cli::commands::export::execute(args, cli.json).await,
        Commands::Coverage(args) => gauntlet::cli::commands::coverage::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        gauntlet::cli::handle_error(err, cli.json);
    }
}
