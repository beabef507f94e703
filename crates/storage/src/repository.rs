use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use srs_core::model::{CardRef, DeckId, ProgressRecord, ReviewLog, SessionSummary};
use srs_core::time::Timestamp;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A finished session as the host persists it.
///
/// `studied_on` is the learner's local calendar date, already resolved by the
/// caller; dashboards bucket on it rather than on `completed_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummaryRecord {
    pub deck_ids: Vec<DeckId>,
    pub studied_on: NaiveDate,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub summary: SessionSummary,
}

/// Persisted summary with its storage id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummaryRow {
    pub id: i64,
    pub record: SessionSummaryRecord,
}

impl SessionSummaryRow {
    #[must_use]
    pub fn new(id: i64, record: SessionSummaryRecord) -> Self {
        Self { id, record }
    }
}

/// Per-card scheduling state.
///
/// `save` is last-write-wins: whatever is written most recently replaces the
/// stored record, with no attempt to reconcile concurrent ratings.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the record for a card, `None` if it was never rated.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the stored row is invalid.
    async fn load(&self, card: CardRef) -> Result<Option<ProgressRecord>, StorageError>;

    /// Insert or overwrite the record for `record.card()`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Fetch every existing record among `cards`. Unrated cards are simply absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or a stored row is invalid.
    async fn load_many(
        &self,
        cards: &[CardRef],
    ) -> Result<HashMap<CardRef, ProgressRecord>, StorageError>;
}

/// Append-only history of applied ratings.
#[async_trait]
pub trait ReviewLogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_log(&self, log: &ReviewLog) -> Result<i64, StorageError>;

    /// Entries for one card, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or a stored row is invalid.
    async fn logs_for_card(&self, card: CardRef) -> Result<Vec<ReviewLog>, StorageError>;
}

/// Atomic write of a rating's two effects: the new record and its log entry.
#[async_trait]
pub trait ReviewPersistence: Send + Sync {
    /// Save `record` and append `log` together. Returns the log id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if `log` belongs to a different card,
    /// or other storage errors; on error neither write is visible.
    async fn apply_review(&self, record: &ProgressRecord, log: &ReviewLog)
    -> Result<i64, StorageError>;
}

/// Deck membership: which cards belong to which deck, in catalog order.
#[async_trait]
pub trait DeckCatalog: Send + Sync {
    /// Register `card` in its deck. Adding the same card twice keeps its
    /// original position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the membership cannot be stored.
    async fn add_card(&self, card: CardRef) -> Result<(), StorageError>;

    /// Cards of `deck` in the order they were added. Unknown decks are empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn card_ids(&self, deck: DeckId) -> Result<Vec<CardRef>, StorageError>;
}

#[async_trait]
pub trait SessionSummaryRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the summary cannot be stored.
    async fn append_summary(&self, record: &SessionSummaryRecord) -> Result<i64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no summary has this id.
    async fn get_summary(&self, id: i64) -> Result<SessionSummaryRecord, StorageError>;

    /// Summaries studied on `from..=until`, ordered by date then id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or a stored row is invalid.
    async fn list_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<SessionSummaryRow>, StorageError>;
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<CardRef, ProgressRecord>>>,
    logs: Arc<Mutex<Vec<ReviewLog>>>,
    decks: Arc<Mutex<HashMap<DeckId, Vec<CardRef>>>>,
    summaries: Arc<Mutex<Vec<SessionSummaryRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load(&self, card: CardRef) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.get(&card).cloned())
    }

    async fn save(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        guard.insert(record.card(), record.clone());
        Ok(())
    }

    async fn load_many(
        &self,
        cards: &[CardRef],
    ) -> Result<HashMap<CardRef, ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(cards
            .iter()
            .filter_map(|card| guard.get(card).map(|r| (*card, r.clone())))
            .collect())
    }
}

#[async_trait]
impl ReviewLogRepository for InMemoryRepository {
    async fn append_log(&self, log: &ReviewLog) -> Result<i64, StorageError> {
        let mut guard = self.logs.lock().map_err(poisoned)?;
        guard.push(log.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Serialization("log id overflow".into()))
    }

    async fn logs_for_card(&self, card: CardRef) -> Result<Vec<ReviewLog>, StorageError> {
        let guard = self.logs.lock().map_err(poisoned)?;
        let mut out: Vec<ReviewLog> = guard.iter().filter(|l| l.card == card).cloned().collect();
        out.sort_by_key(|l| l.reviewed_at);
        Ok(out)
    }
}

#[async_trait]
impl ReviewPersistence for InMemoryRepository {
    async fn apply_review(
        &self,
        record: &ProgressRecord,
        log: &ReviewLog,
    ) -> Result<i64, StorageError> {
        if log.card != record.card() {
            return Err(StorageError::Conflict);
        }
        // Lock order: progress, then logs.
        let mut progress = self.progress.lock().map_err(poisoned)?;
        let mut logs = self.logs.lock().map_err(poisoned)?;
        progress.insert(record.card(), record.clone());
        logs.push(log.clone());
        i64::try_from(logs.len()).map_err(|_| StorageError::Serialization("log id overflow".into()))
    }
}

#[async_trait]
impl DeckCatalog for InMemoryRepository {
    async fn add_card(&self, card: CardRef) -> Result<(), StorageError> {
        let mut guard = self.decks.lock().map_err(poisoned)?;
        let cards = guard.entry(card.deck_id).or_default();
        if !cards.contains(&card) {
            cards.push(card);
        }
        Ok(())
    }

    async fn card_ids(&self, deck: DeckId) -> Result<Vec<CardRef>, StorageError> {
        let guard = self.decks.lock().map_err(poisoned)?;
        Ok(guard.get(&deck).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl SessionSummaryRepository for InMemoryRepository {
    async fn append_summary(&self, record: &SessionSummaryRecord) -> Result<i64, StorageError> {
        let mut guard = self.summaries.lock().map_err(poisoned)?;
        let id = i64::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("summary id overflow".into()))?;
        guard.push(SessionSummaryRow::new(id, record.clone()));
        Ok(id)
    }

    async fn get_summary(&self, id: i64) -> Result<SessionSummaryRecord, StorageError> {
        let guard = self.summaries.lock().map_err(poisoned)?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.record.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<SessionSummaryRow>, StorageError> {
        let guard = self.summaries.lock().map_err(poisoned)?;
        let mut out: Vec<SessionSummaryRow> = guard
            .iter()
            .filter(|row| (from..=until).contains(&row.record.studied_on))
            .cloned()
            .collect();
        out.sort_by_key(|row| (row.record.studied_on, row.id));
        Ok(out)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub reviews: Arc<dyn ReviewPersistence>,
    pub review_logs: Arc<dyn ReviewLogRepository>,
    pub catalog: Arc<dyn DeckCatalog>,
    pub summaries: Arc<dyn SessionSummaryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            progress: Arc::new(repo.clone()),
            reviews: Arc::new(repo.clone()),
            review_logs: Arc::new(repo.clone()),
            catalog: Arc::new(repo.clone()),
            summaries: Arc::new(repo),
        }
    }
}
