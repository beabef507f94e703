use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CardId, CardRef, DeckId};
use crate::time::Timestamp;

/// Lowest ease factor any record may carry.
pub const EASE_FLOOR: f64 = 1.3;

/// Ease factor assigned when a card first enters Review.
pub const DEFAULT_EASE: f64 = 2.5;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejections raised when rehydrating a record that breaks its invariants.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("ease factor must be finite and >= {EASE_FLOOR}, got {provided}")]
    InvalidEase { provided: f64 },

    #[error("reviewed card must have a positive interval")]
    ZeroInterval,

    #[error("reviewed card is missing last_reviewed_at or next_review_at")]
    MissingTimestamps,

    #[error("next_review_at is before last_reviewed_at")]
    ScheduledBeforeReview,

    #[error("card in status New cannot carry review history")]
    NewWithHistory,

    #[error("card in status New cannot be scheduled")]
    NewWithSchedule,

    #[error("unknown card status: {0}")]
    UnknownStatus(String),
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Scheduling state of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    New,
    Learning,
    Review,
    Mastered,
}

impl CardStatus {
    /// Storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CardStatus::New => "new",
            CardStatus::Learning => "learning",
            CardStatus::Review => "review",
            CardStatus::Mastered => "mastered",
        }
    }

    /// Parses the storage representation produced by `as_str`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownStatus` for any other string.
    pub fn parse(s: &str) -> Result<Self, ProgressError> {
        match s {
            "new" => Ok(CardStatus::New),
            "learning" => Ok(CardStatus::Learning),
            "review" => Ok(CardStatus::Review),
            "mastered" => Ok(CardStatus::Mastered),
            other => Err(ProgressError::UnknownStatus(other.to_owned())),
        }
    }

    /// Review and Mastered share the same interval/ease arithmetic.
    #[must_use]
    pub fn is_graduated(self) -> bool {
        matches!(self, CardStatus::Review | CardStatus::Mastered)
    }
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

/// Flat, serializable field set a host must be able to store.
///
/// Converting it into a `ProgressRecord` validates every invariant, so a
/// corrupted row is rejected instead of silently scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub card_id: CardId,
    pub deck_id: DeckId,
    pub status: CardStatus,
    pub interval_minutes: u32,
    pub ease_factor: f64,
    pub learning_step: u32,
    pub lapses: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub last_reviewed_at: Option<Timestamp>,
    pub next_review_at: Option<Timestamp>,
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Scheduling state for one (user, card) pair.
///
/// Only the scheduler produces new versions of a record; hosts load and save it
/// as an opaque value (see `ProgressSnapshot` for the stored field set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProgressSnapshot", into = "ProgressSnapshot")]
pub struct ProgressRecord {
    pub(crate) card: CardRef,
    pub(crate) status: CardStatus,
    pub(crate) interval_minutes: u32,
    pub(crate) ease_factor: f64,
    pub(crate) learning_step: u32,
    pub(crate) lapses: u32,
    pub(crate) correct_count: u32,
    pub(crate) incorrect_count: u32,
    pub(crate) last_reviewed_at: Option<Timestamp>,
    pub(crate) next_review_at: Option<Timestamp>,
}

impl ProgressRecord {
    /// A card that has never been rated. Due immediately.
    #[must_use]
    pub fn new_card(card: CardRef) -> Self {
        Self {
            card,
            status: CardStatus::New,
            interval_minutes: 0,
            ease_factor: DEFAULT_EASE,
            learning_step: 0,
            lapses: 0,
            correct_count: 0,
            incorrect_count: 0,
            last_reviewed_at: None,
            next_review_at: None,
        }
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the snapshot violates a record invariant.
    pub fn from_persisted(snapshot: ProgressSnapshot) -> Result<Self, ProgressError> {
        if !snapshot.ease_factor.is_finite() || snapshot.ease_factor < EASE_FLOOR {
            return Err(ProgressError::InvalidEase {
                provided: snapshot.ease_factor,
            });
        }

        if snapshot.status == CardStatus::New {
            if snapshot.last_reviewed_at.is_some() {
                return Err(ProgressError::NewWithHistory);
            }
            if snapshot.next_review_at.is_some() {
                return Err(ProgressError::NewWithSchedule);
            }
        } else {
            let (Some(last), Some(next)) = (snapshot.last_reviewed_at, snapshot.next_review_at)
            else {
                return Err(ProgressError::MissingTimestamps);
            };
            if snapshot.interval_minutes == 0 {
                return Err(ProgressError::ZeroInterval);
            }
            if next < last {
                return Err(ProgressError::ScheduledBeforeReview);
            }
        }

        Ok(Self {
            card: CardRef::new(snapshot.deck_id, snapshot.card_id),
            status: snapshot.status,
            interval_minutes: snapshot.interval_minutes,
            ease_factor: snapshot.ease_factor,
            learning_step: snapshot.learning_step,
            lapses: snapshot.lapses,
            correct_count: snapshot.correct_count,
            incorrect_count: snapshot.incorrect_count,
            last_reviewed_at: snapshot.last_reviewed_at,
            next_review_at: snapshot.next_review_at,
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            card_id: self.card.card_id,
            deck_id: self.card.deck_id,
            status: self.status,
            interval_minutes: self.interval_minutes,
            ease_factor: self.ease_factor,
            learning_step: self.learning_step,
            lapses: self.lapses,
            correct_count: self.correct_count,
            incorrect_count: self.incorrect_count,
            last_reviewed_at: self.last_reviewed_at,
            next_review_at: self.next_review_at,
        }
    }

    #[must_use]
    pub fn card(&self) -> CardRef {
        self.card
    }

    #[must_use]
    pub fn card_id(&self) -> CardId {
        self.card.card_id
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.card.deck_id
    }

    #[must_use]
    pub fn status(&self) -> CardStatus {
        self.status
    }

    /// Interval until the next review, in minutes.
    #[must_use]
    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::minutes(i64::from(self.interval_minutes))
    }

    #[must_use]
    pub fn ease_factor(&self) -> f64 {
        self.ease_factor
    }

    /// Index into the learning ladder; meaningful only while `Learning`.
    #[must_use]
    pub fn learning_step(&self) -> u32 {
        self.learning_step
    }

    #[must_use]
    pub fn lapses(&self) -> u32 {
        self.lapses
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    #[must_use]
    pub fn total_reviews(&self) -> u32 {
        self.correct_count.saturating_add(self.incorrect_count)
    }

    #[must_use]
    pub fn last_reviewed_at(&self) -> Option<Timestamp> {
        self.last_reviewed_at
    }

    #[must_use]
    pub fn next_review_at(&self) -> Option<Timestamp> {
        self.next_review_at
    }

    /// A record without a scheduled time is due immediately.
    #[must_use]
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review_at.is_none_or(|at| at <= now)
    }

    /// How late the card is at `now`; zero when not yet due or never scheduled.
    #[must_use]
    pub fn overdue_by(&self, now: Timestamp) -> Duration {
        match self.next_review_at {
            Some(at) if at <= now => now - at,
            _ => Duration::zero(),
        }
    }
}

impl TryFrom<ProgressSnapshot> for ProgressRecord {
    type Error = ProgressError;

    fn try_from(snapshot: ProgressSnapshot) -> Result<Self, Self::Error> {
        Self::from_persisted(snapshot)
    }
}

impl From<ProgressRecord> for ProgressSnapshot {
    fn from(record: ProgressRecord) -> Self {
        record.snapshot()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
