//! `ingest` command: fetch from Reddit, classify, persist, record the run.

use anyhow::Context;
use snoowatch_core::{AppConfig, Lexicon};
use snoowatch_sentiment::{run_ingestion, MemoryStore, RedditSettings, RedditSource, RunSummary};

use crate::store::PgMentionStore;

fn load_lexicon(config: &AppConfig) -> anyhow::Result<Lexicon> {
    snoowatch_core::load_lexicon(&config.lexicon_path)
        .with_context(|| format!("loading lexicon from {}", config.lexicon_path.display()))
}

/// Search terms from config, falling back to every lexicon keyword.
fn search_terms(config: &AppConfig, lexicon: &Lexicon) -> Vec<String> {
    if config.search_terms.is_empty() {
        lexicon.terms().map(ToString::to_string).collect()
    } else {
        config.search_terms.clone()
    }
}

fn build_source(config: &AppConfig, lexicon: &Lexicon) -> anyhow::Result<RedditSource> {
    let credentials = config.reddit.clone().context(
        "REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET and REDDIT_USER_AGENT must be set to ingest",
    )?;
    let settings = RedditSettings {
        credentials,
        subreddits: config.subreddits.clone(),
        search_terms: search_terms(config, lexicon),
        request_timeout_secs: config.request_timeout_secs,
        max_retries: config.max_retries,
        retry_backoff_base_ms: config.retry_backoff_base_ms,
    };
    Ok(RedditSource::new(settings)?)
}

/// Classify the current Reddit batch into an in-memory store and print the summary.
///
/// # Errors
///
/// Returns an error if the lexicon or Reddit credentials are unusable, or the
/// fetch fails outright.
pub(crate) async fn run_ingest_dry_run(config: &AppConfig) -> anyhow::Result<()> {
    let lexicon = load_lexicon(config)?;
    let source = build_source(config, &lexicon)?;
    let store = MemoryStore::new();

    let summary = run_ingestion(&lexicon, &source, &store).await?;
    println!("dry-run: nothing was written to the database");
    print_summary(&summary);
    Ok(())
}

/// Run one ingestion batch against Postgres, tracked as an `ingestion_runs` row.
///
/// # Errors
///
/// Returns an error if the run cannot be created, the batch fails as a whole,
/// or the run cannot be marked complete. Per-mention failures are reported in
/// the summary instead.
pub(crate) async fn run_ingest(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let lexicon = load_lexicon(config)?;
    let source = build_source(config, &lexicon)?;
    let store = PgMentionStore::new(pool.clone());

    let run = snoowatch_db::create_ingestion_run(pool, "cli").await?;
    tracing::info!(run_id = run.id, public_id = %run.public_id, "ingestion run started");

    let summary = match run_ingestion(&lexicon, &source, &store).await {
        Ok(summary) => summary,
        Err(e) => {
            fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
            return Err(e.into());
        }
    };

    let summary_json = serde_json::to_value(&summary)?;
    if let Err(err) =
        snoowatch_db::complete_ingestion_run(pool, run.id, run_counts(&summary), summary_json).await
    {
        fail_run_best_effort(pool, run.id, format!("{err:#}")).await;
        return Err(err.into());
    }

    print_summary(&summary);
    Ok(())
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn run_counts(summary: &RunSummary) -> snoowatch_db::IngestionRunCounts {
    snoowatch_db::IngestionRunCounts {
        new_mentions: count(summary.new_mentions),
        updated_mentions: count(summary.updated_mentions),
        unchanged_mentions: count(summary.unchanged_mentions),
        total_processed: count(summary.total_processed),
        error_count: count(summary.errors.len()),
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "ingestion complete: {} processed, {} new, {} updated, {} unchanged, {} errors",
        summary.total_processed,
        summary.new_mentions,
        summary.updated_mentions,
        summary.unchanged_mentions,
        summary.errors.len()
    );

    if !summary.top_negative.is_empty() {
        println!();
        println!("{:<14}{:<7}{:<22}PERMALINK", "ID", "SCORE", "SUBREDDIT");
        for m in &summary.top_negative {
            println!(
                "{:<14}{:<7}{:<22}{}",
                m.id,
                m.effective_score(),
                m.subreddit,
                m.permalink
            );
        }
    }

    for err in &summary.errors {
        println!(
            "error: {}: {}",
            err.candidate_id.as_deref().unwrap_or("<no id>"),
            err.reason
        );
    }
}

/// Attempt to mark an ingestion run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = snoowatch_db::fail_ingestion_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark ingestion run as failed"
        );
    }
}
