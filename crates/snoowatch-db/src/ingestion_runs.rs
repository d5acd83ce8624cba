//! Database operations for `ingestion_runs`.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const RUN_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, completed_at, \
     new_mentions, updated_mentions, unchanged_mentions, total_processed, error_count, \
     summary, error_message";

/// A row from the `ingestion_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestionRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub new_mentions: i32,
    pub updated_mentions: i32,
    pub unchanged_mentions: i32,
    pub total_processed: i32,
    pub error_count: i32,
    /// Serialized run summary, set on success.
    pub summary: Option<Value>,
    pub error_message: Option<String>,
}

/// Counters written when a run succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionRunCounts {
    pub new_mentions: i32,
    pub updated_mentions: i32,
    pub unchanged_mentions: i32,
    pub total_processed: i32,
    pub error_count: i32,
}

/// Creates a run in `running` status with `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_ingestion_run(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<IngestionRunRow, DbError> {
    let row = sqlx::query_as::<_, IngestionRunRow>(&format!(
        "INSERT INTO ingestion_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'running') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a running run as `succeeded` and records its counters and summary.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestionRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_ingestion_run(
    pool: &PgPool,
    id: i64,
    counts: IngestionRunCounts,
    summary: Value,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingestion_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             new_mentions = $1, updated_mentions = $2, unchanged_mentions = $3, \
             total_processed = $4, error_count = $5, summary = $6 \
         WHERE id = $7 AND status = 'running'",
    )
    .bind(counts.new_mentions)
    .bind(counts.updated_mentions)
    .bind(counts.unchanged_mentions)
    .bind(counts.total_processed)
    .bind(counts.error_count)
    .bind(summary)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestionRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a running run as `failed` with `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestionRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_ingestion_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingestion_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestionRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ingestion_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<IngestionRunRow>, DbError> {
    let rows = sqlx::query_as::<_, IngestionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM ingestion_runs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
