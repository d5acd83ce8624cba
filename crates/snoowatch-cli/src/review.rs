//! Review-workflow and maintenance command handlers.
//!
//! Everything here except `stats` and `runs` writes to the database.

use anyhow::Context;
use chrono::Utc;
use snoowatch_core::Label;
use snoowatch_db::DbError;
use snoowatch_sentiment::{learning_stats, reset_ignored_in_store, LearningStats};

use crate::store::PgMentionStore;

/// Turn a row-level `NotFound` into a message naming the mention.
fn not_found_as_context(id: &str, result: Result<(), DbError>) -> anyhow::Result<()> {
    match result {
        Err(DbError::NotFound) => anyhow::bail!("mention '{id}' not found"),
        other => other.with_context(|| format!("updating mention '{id}'")),
    }
}

pub(crate) async fn run_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = snoowatch_db::run_migrations(pool).await?;
    snoowatch_db::health_check(pool).await?;
    println!("migrations applied: {applied}");
    Ok(())
}

pub(crate) async fn run_stats(pool: &sqlx::PgPool, keyword_limit: usize) -> anyhow::Result<()> {
    let store = PgMentionStore::new(pool.clone());
    let stats = learning_stats(&store).await?;
    print_stats(&stats, keyword_limit);
    Ok(())
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r * 100.0))
}

fn print_stats(stats: &LearningStats, keyword_limit: usize) {
    println!("mentions:  {}", stats.total_mentions);
    println!("tagged:    {}", stats.tagged_count);
    println!("agreement: {}", format_rate(stats.overall_agreement));

    let weakest = stats.least_reliable_keywords(keyword_limit);
    if weakest.is_empty() {
        return;
    }
    println!();
    println!("{:<24}{:<10}{:<10}AGREEMENT", "KEYWORD", "MATCHED", "TAGGED");
    for (keyword, rate) in weakest {
        let counts = stats.per_keyword.get(keyword).copied().unwrap_or_default();
        println!(
            "{:<24}{:<10}{:<10}{}",
            keyword,
            counts.matched,
            counts.tagged,
            format_rate(Some(rate))
        );
    }
}

pub(crate) async fn run_reset_ignored(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let store = PgMentionStore::new(pool.clone());
    let reset = reset_ignored_in_store(&store).await?;
    println!("cleared ignored flag on {reset} mentions");
    Ok(())
}

pub(crate) async fn run_tag(
    pool: &sqlx::PgPool,
    id: &str,
    label: Label,
    score: Option<u8>,
    tagged_by: &str,
) -> anyhow::Result<()> {
    let result = snoowatch_db::tag_mention(pool, id, label, score, tagged_by, Utc::now()).await;
    not_found_as_context(id, result)?;
    tracing::info!(mention_id = id, label = %label, tagged_by, "mention tagged");
    println!("tagged {id} as {label}");
    Ok(())
}

pub(crate) async fn run_ignore(pool: &sqlx::PgPool, id: &str, ignored: bool) -> anyhow::Result<()> {
    let result = snoowatch_db::set_mention_ignored(pool, id, ignored, Utc::now()).await;
    not_found_as_context(id, result)?;
    println!("{id}: ignored = {ignored}");
    Ok(())
}

pub(crate) async fn run_urgent(pool: &sqlx::PgPool, id: &str, urgent: bool) -> anyhow::Result<()> {
    let result = snoowatch_db::set_mention_urgent(pool, id, urgent).await;
    not_found_as_context(id, result)?;
    println!("{id}: urgent = {urgent}");
    Ok(())
}

pub(crate) async fn run_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = snoowatch_db::list_ingestion_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no ingestion runs recorded; run `ingest` first");
        return Ok(());
    }

    println!(
        "{:<8}{:<12}{:<18}{:<6}{:<9}{:<11}ERRORS",
        "ID", "STATUS", "STARTED", "NEW", "UPDATED", "PROCESSED"
    );
    for run in &runs {
        let started = run.started_at.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{:<8}{:<12}{:<18}{:<6}{:<9}{:<11}{}",
            run.id,
            run.status,
            started,
            run.new_mentions,
            run.updated_mentions,
            run.total_processed,
            run.error_count
        );
        if let Some(message) = &run.error_message {
            println!("        {message}");
        }
    }
    Ok(())
}
