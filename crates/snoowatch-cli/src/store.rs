//! Postgres-backed [`MentionStore`] for the ingestion pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snoowatch_core::Mention;
use snoowatch_db::DbError;
use snoowatch_sentiment::{MentionStore, StoreError};
use sqlx::PgPool;

pub(crate) struct PgMentionStore {
    pool: PgPool,
}

impl PgMentionStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_store_error(id: &str, err: DbError) -> StoreError {
    match err {
        DbError::Conflict(id) => StoreError::Conflict(id),
        DbError::NotFound => StoreError::NotFound(id.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl MentionStore for PgMentionStore {
    async fn lookup(&self, id: &str) -> Result<Option<Mention>, StoreError> {
        snoowatch_db::get_mention(&self.pool, id)
            .await
            .map_err(|e| to_store_error(id, e))
    }

    async fn insert(&self, mention: &Mention) -> Result<(), StoreError> {
        snoowatch_db::insert_mention(&self.pool, mention)
            .await
            .map_err(|e| to_store_error(&mention.id, e))
    }

    async fn update(&self, mention: &Mention) -> Result<(), StoreError> {
        snoowatch_db::update_mention_ingest(&self.pool, mention)
            .await
            .map_err(|e| to_store_error(&mention.id, e))
    }

    async fn scan_all(&self) -> Result<Vec<Mention>, StoreError> {
        snoowatch_db::list_mentions(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn set_ignored(
        &self,
        id: &str,
        ignored: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        snoowatch_db::set_mention_ignored(&self.pool, id, ignored, at)
            .await
            .map_err(|e| to_store_error(id, e))
    }

    async fn reset_ignored(&self) -> Result<usize, StoreError> {
        let reset = snoowatch_db::reset_ignored_mentions(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(usize::try_from(reset).unwrap_or(usize::MAX))
    }
}
