use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snoowatch_core::{Label, Mention};

use super::MentionStore;
use crate::error::StoreError;

/// In-process store used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    mentions: Mutex<BTreeMap<String, Mention>>,
    pending_conflicts: Mutex<u32>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mentions(mentions: impl IntoIterator<Item = Mention>) -> Self {
        let store = Self::new();
        {
            let mut map = store.lock_mentions();
            for m in mentions {
                map.insert(m.id.clone(), m);
            }
        }
        store
    }

    /// Make the next `count` inserts fail with [`StoreError::Conflict`],
    /// as if a concurrent run had created the identity first.
    pub fn inject_conflicts(&self, count: u32) {
        *self
            .pending_conflicts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = count;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_mentions().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_mentions().is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Mention> {
        self.lock_mentions().get(id).cloned()
    }

    /// Manual tagging, as the review workflow would do it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown identity.
    pub fn tag(
        &self,
        id: &str,
        label: Label,
        score: Option<u8>,
        tagged_by: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.with_mention(id, |m| m.tag(label, score, tagged_by, at))
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown identity.
    pub fn set_urgent(&self, id: &str, urgent: bool) -> Result<(), StoreError> {
        self.with_mention(id, |m| m.urgent = urgent)
    }

    fn with_mention(&self, id: &str, f: impl FnOnce(&mut Mention)) -> Result<(), StoreError> {
        let mut map = self.lock_mentions();
        let mention = map
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        f(mention);
        Ok(())
    }

    fn lock_mentions(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Mention>> {
        self.mentions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn take_conflict(&self) -> bool {
        let mut pending = self
            .pending_conflicts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *pending > 0 {
            *pending -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl MentionStore for MemoryStore {
    async fn lookup(&self, id: &str) -> Result<Option<Mention>, StoreError> {
        Ok(self.get(id))
    }

    async fn insert(&self, mention: &Mention) -> Result<(), StoreError> {
        if self.take_conflict() {
            return Err(StoreError::Conflict(mention.id.clone()));
        }
        let mut map = self.lock_mentions();
        if map.contains_key(&mention.id) {
            return Err(StoreError::Conflict(mention.id.clone()));
        }
        map.insert(mention.id.clone(), mention.clone());
        Ok(())
    }

    async fn update(&self, mention: &Mention) -> Result<(), StoreError> {
        self.with_mention(&mention.id, |stored| {
            stored.label = mention.label;
            stored.score = mention.score;
            stored.confidence = mention.confidence;
            stored.keywords_matched.clone_from(&mention.keywords_matched);
            stored.num_comments = mention.num_comments;
        })
    }

    async fn scan_all(&self) -> Result<Vec<Mention>, StoreError> {
        Ok(self.lock_mentions().values().cloned().collect())
    }

    async fn set_ignored(
        &self,
        id: &str,
        ignored: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.with_mention(id, |m| m.set_ignored(ignored, at))
    }
}
