mod run;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "billa-cli")]
#[command(about = "Billa price tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape the catalog, append changed prices, log the run (default)
    Run {
        /// Fetch and diff, but write nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Regenerate the HTML report from the existing run log
    Report,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = billa_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run { dry_run: false }) {
        Commands::Run { dry_run } => run::run_tracker(&config, dry_run).await,
        Commands::Report => run::regenerate_report(&config),
    }
}
