mod ingest;
mod review;
mod store;

use clap::{Parser, Subcommand};
use snoowatch_core::Label;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "snoowatch-cli")]
#[command(about = "Reddit mention monitoring: ingest, classify, review")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Fetch recent Reddit mentions, classify them, and persist the results
    Ingest {
        /// Classify into an in-memory store without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Show how often reviewers agree with the automated labels
    Stats {
        /// Number of least reliable keywords to list
        #[arg(long, default_value = "10")]
        keywords: usize,
    },
    /// Clear the ignored flag on every mention
    ResetIgnored,
    /// Record a manual label (and optional score) for a mention
    Tag {
        /// Mention identity, e.g. `t3_abc123`
        id: String,
        #[arg(long)]
        label: Label,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        score: Option<u8>,
        /// Who made the correction
        #[arg(long)]
        by: String,
    },
    /// Mark a mention as ignored
    Ignore {
        id: String,
        /// Clear the flag instead of setting it
        #[arg(long)]
        undo: bool,
    },
    /// Mark a mention as urgent
    Urgent {
        id: String,
        /// Clear the flag instead of setting it
        #[arg(long)]
        undo: bool,
    },
    /// List recent ingestion runs
    Runs {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("snoowatch-cli: no command given; see --help");
        return Ok(());
    };

    dotenvy::dotenv().ok();
    let config = snoowatch_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Dry runs never open a database connection.
    if let Commands::Ingest { dry_run: true } = command {
        return ingest::run_ingest_dry_run(&config).await;
    }

    let pool_config = snoowatch_db::PoolConfig::from_app_config(&config);
    let pool = snoowatch_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => review::run_migrate(&pool).await,
        Commands::Ingest { .. } => ingest::run_ingest(&pool, &config).await,
        Commands::Stats { keywords } => review::run_stats(&pool, keywords).await,
        Commands::ResetIgnored => review::run_reset_ignored(&pool).await,
        Commands::Tag {
            id,
            label,
            score,
            by,
        } => review::run_tag(&pool, &id, label, score, &by).await,
        Commands::Ignore { id, undo } => review::run_ignore(&pool, &id, !undo).await,
        Commands::Urgent { id, undo } => review::run_urgent(&pool, &id, !undo).await,
        Commands::Runs { limit } => review::run_runs(&pool, limit).await,
    }
}

#[cfg(test)]
mod tests;
