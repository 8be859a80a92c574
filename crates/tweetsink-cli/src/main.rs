mod run;
mod schedule;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tweetsink_pipeline::TriggerPayload;

#[derive(Debug, Parser)]
#[command(name = "tweetsink")]
#[command(about = "Incremental Twitter timeline ingest into BigQuery")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the pipeline once and exit.
    Run {
        /// Base64-encoded JSON trigger payload (logged only).
        #[arg(long, env = "TWEETSINK_TRIGGER_MESSAGE", default_value = "")]
        message: String,
    },
    /// Run the pipeline on a cron schedule until interrupted.
    Schedule {
        /// Six-field cron expression; defaults to `TWEETSINK_SCHEDULE`.
        #[arg(long)]
        cron: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Arc::new(tweetsink_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(env = %config.env, source = %config.config_source, "loaded app config");

    match cli.command {
        Commands::Run { message } => {
            let trigger = TriggerPayload::decode_or_default(&message);
            let summary = run::run_once(&config, &trigger).await?;
            println!("{}", summary.message());
            println!(
                "  accounts: {}  posts: {}  eligible rows: {}  pages: {} ({} partial, {} failed)",
                summary.accounts,
                summary.posts_fetched,
                summary.rows_eligible,
                summary.pages,
                summary.pages_partially_failed,
                summary.pages_failed,
            );
        }
        Commands::Schedule { cron } => {
            let cron = cron.unwrap_or_else(|| config.schedule.clone());
            schedule::run_scheduled(&cron, config).await?;
        }
    }

    Ok(())
}
