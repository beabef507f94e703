use chrono::{FixedOffset, NaiveDate};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use srs_core::SessionAggregator;
use srs_core::model::{CardRef, DeckId, ProgressRecord, Quality, SessionSummary};
use srs_core::time::Timestamp;
use storage::repository::SessionSummaryRecord;

use super::plan::SessionPlan;
use super::progress::SessionProgress;
use crate::error::SessionError;
use crate::review_service::{ReviewResult, ReviewService};

//
// ─── REVIEW RESULT WITH CARD ───────────────────────────────────────────────────
//

/// Captures the outcome of reviewing a card within a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReview {
    pub card: CardRef,
    pub result: ReviewResult,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory review session over a fixed worklist.
///
/// Steps through the planned cards in order, applying ratings via
/// `ReviewService` and tallying them for the session summary.
pub struct SessionService {
    deck_ids: Vec<DeckId>,
    cards: Vec<CardRef>,
    progress: HashMap<CardRef, ProgressRecord>,
    current: usize,
    results: Vec<SessionReview>,
    tally: SessionAggregator,
    started_at: Timestamp,
    completed_at: Option<Timestamp>,
    summary_id: Option<i64>,
}

impl SessionService {
    /// Create a session from a plan and the records of its cards.
    ///
    /// Records for cards outside the plan are dropped.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the plan has no cards.
    pub fn new(
        deck_ids: Vec<DeckId>,
        plan: SessionPlan,
        mut progress: HashMap<CardRef, ProgressRecord>,
        started_at: Timestamp,
    ) -> Result<Self, SessionError> {
        if plan.is_empty() {
            return Err(SessionError::Empty);
        }
        progress.retain(|card, _| plan.cards.contains(card));

        Ok(Self {
            deck_ids,
            cards: plan.cards,
            progress,
            current: 0,
            results: Vec::new(),
            tally: SessionAggregator::new(),
            started_at,
            completed_at: None,
            summary_id: None,
        })
    }

    #[must_use]
    pub fn deck_ids(&self) -> &[DeckId] {
        &self.deck_ids
    }

    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    #[must_use]
    pub fn summary_id(&self) -> Option<i64> {
        self.summary_id
    }

    #[must_use]
    pub fn results(&self) -> &[SessionReview] {
        &self.results
    }

    /// Total number of cards in this session.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.cards.len()
    }

    /// Number of cards that have already been answered.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.results.len()
    }

    /// Number of remaining cards that have not been answered yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.current)
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total_cards(),
            answered: self.answered_count(),
            remaining: self.remaining(),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn current_card(&self) -> Option<CardRef> {
        self.cards.get(self.current).copied()
    }

    /// Latest record for a card in this session, `None` if never rated.
    #[must_use]
    pub fn record_for(&self, card: CardRef) -> Option<&ProgressRecord> {
        self.progress.get(&card)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Apply a rating to the current card and advance the session.
    ///
    /// `reviewed_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is already finished.
    pub fn answer_current(
        &mut self,
        review_service: &ReviewService,
        quality: Quality,
        reviewed_at: Timestamp,
    ) -> Result<&SessionReview, SessionError> {
        let Some(card) = self.current_card() else {
            return Err(SessionError::Completed);
        };
        let result = review_service.review_card(card, self.progress.get(&card), quality, reviewed_at);
        self.record_review_result(card, result, reviewed_at)
    }

    /// Commit an already-applied rating for the current card.
    pub(crate) fn record_review_result(
        &mut self,
        card: CardRef,
        result: ReviewResult,
        reviewed_at: Timestamp,
    ) -> Result<&SessionReview, SessionError> {
        if self.is_complete() || self.current_card() != Some(card) {
            return Err(SessionError::Completed);
        }

        self.tally.record(result.log.quality);
        self.progress.insert(card, result.record.clone());
        self.results.push(SessionReview { card, result });

        self.current += 1;
        if self.current >= self.cards.len() {
            self.completed_at = Some(reviewed_at);
        }

        self.results.last().ok_or(SessionError::Completed)
    }

    /// Tally so far; wall time runs from `started_at` to `until`.
    #[must_use]
    pub fn summary(&self, until: Timestamp) -> SessionSummary {
        let elapsed = (until - self.started_at).to_std().unwrap_or(Duration::ZERO);
        self.tally.finalize(elapsed)
    }

    /// Persistable summary of a finished session, dated in `offset`'s local time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` if cards remain.
    pub(crate) fn build_summary(
        &self,
        offset: FixedOffset,
    ) -> Result<SessionSummaryRecord, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::NotComplete)?;
        Ok(SessionSummaryRecord {
            deck_ids: self.deck_ids.clone(),
            studied_on: local_date(completed_at, offset),
            started_at: self.started_at,
            completed_at,
            summary: self.summary(completed_at),
        })
    }

    pub(crate) fn set_summary_id(&mut self, id: i64) {
        self.summary_id = Some(id);
    }
}

/// Calendar date of `at` for a learner at `offset`.
#[must_use]
pub fn local_date(at: Timestamp, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("deck_ids", &self.deck_ids)
            .field("cards_len", &self.cards.len())
            .field("current", &self.current)
            .field("results_len", &self.results.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .field("summary_id", &self.summary_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
