//! Database operations for the `mentions` table.
//!
//! Ingestion writes only the automated judgment and `num_comments` of an
//! existing row. Manual override fields and the `ignored`/`urgent` workflow
//! flags are written exclusively by the tagging and flag operations below.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use snoowatch_core::{Label, Mention};
use sqlx::PgPool;

use crate::{is_unique_violation, DbError};

const MENTION_COLUMNS: &str = "id, kind, subreddit, permalink, author, title, body, \
     created_utc, ingested_at, label, confidence, score, keywords_matched, \
     manual_label, manual_score, tagged_by, tagged_at, ignored, ignored_at, urgent, \
     num_comments, updated_at";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `mentions` table, with enums stored as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MentionRow {
    pub id: String,
    pub kind: String,
    pub subreddit: String,
    pub permalink: String,
    pub author: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    pub label: String,
    pub confidence: f64,
    /// `SMALLINT CHECK (score BETWEEN 1 AND 100)`.
    pub score: i16,
    pub keywords_matched: Vec<String>,
    pub manual_label: Option<String>,
    pub manual_score: Option<i16>,
    pub tagged_by: Option<String>,
    pub tagged_at: Option<DateTime<Utc>>,
    pub ignored: bool,
    pub ignored_at: Option<DateTime<Utc>>,
    pub urgent: bool,
    pub num_comments: i32,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MentionRow> for Mention {
    type Error = DbError;

    fn try_from(row: MentionRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse().map_err(|reason| DbError::InvalidValue {
            column: "kind",
            reason,
        })?;
        let label = parse_label("label", &row.label)?;
        let manual_label = row
            .manual_label
            .as_deref()
            .map(|l| parse_label("manual_label", l))
            .transpose()?;
        let score = score_from_column("score", row.score)?;
        let manual_score = row
            .manual_score
            .map(|s| score_from_column("manual_score", s))
            .transpose()?;
        let num_comments =
            u32::try_from(row.num_comments).map_err(|e| DbError::InvalidValue {
                column: "num_comments",
                reason: e.to_string(),
            })?;

        Ok(Mention {
            id: row.id,
            kind,
            subreddit: row.subreddit,
            permalink: row.permalink,
            author: row.author,
            title: row.title,
            body: row.body,
            created_utc: row.created_utc,
            ingested_at: row.ingested_at,
            label,
            confidence: row.confidence,
            score,
            keywords_matched: row.keywords_matched.into_iter().collect::<BTreeSet<_>>(),
            manual_label,
            manual_score,
            tagged_by: row.tagged_by,
            tagged_at: row.tagged_at,
            ignored: row.ignored,
            ignored_at: row.ignored_at,
            urgent: row.urgent,
            num_comments,
        })
    }
}

fn parse_label(column: &'static str, value: &str) -> Result<Label, DbError> {
    value
        .parse()
        .map_err(|reason| DbError::InvalidValue { column, reason })
}

fn score_from_column(column: &'static str, value: i16) -> Result<u8, DbError> {
    u8::try_from(value)
        .ok()
        .filter(|s| (1..=100).contains(s))
        .ok_or_else(|| DbError::InvalidValue {
            column,
            reason: format!("{value} is outside 1..=100"),
        })
}

fn keywords_column(mention: &Mention) -> Vec<String> {
    mention.keywords_matched.iter().cloned().collect()
}

fn num_comments_column(mention: &Mention) -> i32 {
    i32::try_from(mention.num_comments).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetch one mention by platform identity.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::InvalidValue`] if the stored row cannot be decoded.
pub async fn get_mention(pool: &PgPool, id: &str) -> Result<Option<Mention>, DbError> {
    let row = sqlx::query_as::<_, MentionRow>(&format!(
        "SELECT {MENTION_COLUMNS} FROM mentions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Mention::try_from).transpose()
}

/// Every stored mention, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::InvalidValue`] if a stored row cannot be decoded.
pub async fn list_mentions(pool: &PgPool) -> Result<Vec<Mention>, DbError> {
    let rows = sqlx::query_as::<_, MentionRow>(&format!(
        "SELECT {MENTION_COLUMNS} FROM mentions ORDER BY created_utc DESC, id"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Mention::try_from).collect()
}

// ---------------------------------------------------------------------------
// Ingestion writes
// ---------------------------------------------------------------------------

/// Insert a newly seen mention.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if a row with the same `id` already exists,
/// or [`DbError::Sqlx`] for any other failure.
pub async fn insert_mention(pool: &PgPool, mention: &Mention) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO mentions \
             (id, kind, subreddit, permalink, author, title, body, created_utc, ingested_at, \
              label, confidence, score, keywords_matched, \
              manual_label, manual_score, tagged_by, tagged_at, \
              ignored, ignored_at, urgent, num_comments) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
                 $14, $15, $16, $17, $18, $19, $20, $21)",
    )
    .bind(&mention.id)
    .bind(mention.kind.as_str())
    .bind(&mention.subreddit)
    .bind(&mention.permalink)
    .bind(mention.author.as_deref())
    .bind(mention.title.as_deref())
    .bind(mention.body.as_deref())
    .bind(mention.created_utc)
    .bind(mention.ingested_at)
    .bind(mention.label.as_str())
    .bind(mention.confidence)
    .bind(i16::from(mention.score))
    .bind(keywords_column(mention))
    .bind(mention.manual_label.map(Label::as_str))
    .bind(mention.manual_score.map(i16::from))
    .bind(mention.tagged_by.as_deref())
    .bind(mention.tagged_at)
    .bind(mention.ignored)
    .bind(mention.ignored_at)
    .bind(mention.urgent)
    .bind(num_comments_column(mention))
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            DbError::Conflict(mention.id.clone())
        } else {
            DbError::Sqlx(e)
        }
    })?;

    Ok(())
}

/// Refresh the automated judgment and `num_comments` of an existing mention.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_mention_ingest(pool: &PgPool, mention: &Mention) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE mentions \
         SET label = $1, confidence = $2, score = $3, keywords_matched = $4, \
             num_comments = $5, updated_at = NOW() \
         WHERE id = $6",
    )
    .bind(mention.label.as_str())
    .bind(mention.confidence)
    .bind(i16::from(mention.score))
    .bind(keywords_column(mention))
    .bind(num_comments_column(mention))
    .bind(&mention.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Review workflow writes
// ---------------------------------------------------------------------------

/// Record a human correction. `score` is clamped to 1..=100.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn tag_mention(
    pool: &PgPool,
    id: &str,
    label: Label,
    score: Option<u8>,
    tagged_by: &str,
    tagged_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE mentions \
         SET manual_label = $1, manual_score = $2, tagged_by = $3, tagged_at = $4, \
             updated_at = NOW() \
         WHERE id = $5",
    )
    .bind(label.as_str())
    .bind(score.map(|s| i16::from(s.clamp(1, 100))))
    .bind(tagged_by)
    .bind(tagged_at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Set or clear the `ignored` flag. `ignored_at` is `at` when set, null when cleared.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_mention_ignored(
    pool: &PgPool,
    id: &str,
    ignored: bool,
    at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE mentions \
         SET ignored = $1, ignored_at = CASE WHEN $1 THEN $2 ELSE NULL END, \
             updated_at = NOW() \
         WHERE id = $3",
    )
    .bind(ignored)
    .bind(at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_mention_urgent(pool: &PgPool, id: &str, urgent: bool) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE mentions SET urgent = $1, updated_at = NOW() WHERE id = $2")
        .bind(urgent)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Clear `ignored` on every ignored mention in one statement.
///
/// Returns the number of rows changed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn reset_ignored_mentions(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE mentions \
         SET ignored = FALSE, ignored_at = NULL, updated_at = NOW() \
         WHERE ignored",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
