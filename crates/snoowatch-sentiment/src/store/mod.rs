//! Persistence collaborator contract.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snoowatch_core::Mention;

use crate::error::StoreError;

/// Storage for mentions keyed by platform identity.
///
/// Implementations must enforce identity uniqueness: a second `insert` for an
/// existing `id` fails with [`StoreError::Conflict`] rather than overwriting.
#[async_trait]
pub trait MentionStore: Send + Sync {
    async fn lookup(&self, id: &str) -> Result<Option<Mention>, StoreError>;

    async fn insert(&self, mention: &Mention) -> Result<(), StoreError>;

    /// Persist the automated judgment and `num_comments` of a known mention.
    ///
    /// Manual override fields and workflow flags are not written here.
    async fn update(&self, mention: &Mention) -> Result<(), StoreError>;

    async fn scan_all(&self) -> Result<Vec<Mention>, StoreError>;

    async fn set_ignored(&self, id: &str, ignored: bool, at: DateTime<Utc>)
        -> Result<(), StoreError>;

    /// Clear `ignored` on every ignored mention and return how many changed.
    ///
    /// The default walks [`MentionStore::scan_all`]; backends with a bulk
    /// update should override it.
    async fn reset_ignored(&self) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut reset = 0;
        for mention in self.scan_all().await? {
            if mention.ignored {
                self.set_ignored(&mention.id, false, now).await?;
                reset += 1;
            }
        }
        Ok(reset)
    }
}
