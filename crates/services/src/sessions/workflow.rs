use std::collections::HashMap;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use tracing::{info, warn};

use srs_core::Scheduler;
use srs_core::scheduler::ScheduledStates;
use srs_core::model::{CardRef, DeckId, ProgressRecord, Quality};
use storage::repository::{
    DeckCatalog, ProgressRepository, ReviewPersistence, SessionSummaryRepository, Storage,
};

use super::plan::{SessionBuilder, SessionPlan};
use super::service::{SessionReview, SessionService};
use crate::Clock;
use crate::error::SessionError;
use crate::review_service::ReviewService;

/// New cards per session unless configured otherwise.
pub const DEFAULT_NEW_CARD_CAP: usize = 20;

/// Result of answering a single card in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnswerResult {
    pub review: SessionReview,
    pub is_complete: bool,
    pub summary_id: Option<i64>,
}

/// Orchestrates session start and persisted answering.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    scheduler: Scheduler,
    catalog: Arc<dyn DeckCatalog>,
    progress: Arc<dyn ProgressRepository>,
    reviews: Arc<dyn ReviewPersistence>,
    summaries: Arc<dyn SessionSummaryRepository>,
    new_card_cap: usize,
    review_limit: Option<usize>,
    shuffle_new: bool,
    utc_offset: FixedOffset,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn DeckCatalog>,
        progress: Arc<dyn ProgressRepository>,
        reviews: Arc<dyn ReviewPersistence>,
        summaries: Arc<dyn SessionSummaryRepository>,
    ) -> Self {
        Self {
            clock,
            scheduler: Scheduler::new(),
            catalog,
            progress,
            reviews,
            summaries,
            new_card_cap: DEFAULT_NEW_CARD_CAP,
            review_limit: None,
            shuffle_new: false,
            utc_offset: Utc.fix(),
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.reviews),
            Arc::clone(&storage.summaries),
        )
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    #[must_use]
    pub fn with_new_card_cap(mut self, cap: usize) -> Self {
        self.new_card_cap = cap;
        self
    }

    #[must_use]
    pub fn with_review_limit(mut self, limit: Option<usize>) -> Self {
        self.review_limit = limit;
        self
    }

    #[must_use]
    pub fn with_shuffle_new(mut self, shuffle_new: bool) -> Self {
        self.shuffle_new = shuffle_new;
        self
    }

    /// Offset used to turn completion time into the learner's study date.
    #[must_use]
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    fn review_service(&self) -> ReviewService {
        ReviewService::with_scheduler(self.scheduler.clone()).with_clock(self.clock)
    }

    /// Catalog cards of `deck_ids`, in deck order, and their stored records.
    async fn load_cards(
        &self,
        deck_ids: &[DeckId],
    ) -> Result<(Vec<CardRef>, HashMap<CardRef, ProgressRecord>), SessionError> {
        let mut cards = Vec::new();
        for deck_id in deck_ids {
            cards.extend(self.catalog.card_ids(*deck_id).await?);
        }
        let progress = self.progress.load_many(&cards).await?;
        Ok((cards, progress))
    }

    /// Plan what a session over `deck_ids` would contain right now.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the catalog or progress cannot be read.
    pub async fn plan(&self, deck_ids: &[DeckId]) -> Result<SessionPlan, SessionError> {
        let (cards, progress) = self.load_cards(deck_ids).await?;
        Ok(self.builder().build(cards, &progress))
    }

    fn builder(&self) -> SessionBuilder {
        SessionBuilder::new(self.clock.now(), self.new_card_cap)
            .with_review_limit(self.review_limit)
            .with_shuffle_new(self.shuffle_new)
    }

    /// Start a new session over one or more decks.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if nothing is due, or storage failures.
    pub async fn start_session(&self, deck_ids: &[DeckId]) -> Result<SessionService, SessionError> {
        let now = self.clock.now();
        let (cards, progress) = self.load_cards(deck_ids).await?;
        let plan = self.builder().build(cards, &progress);

        info!(
            decks = deck_ids.len(),
            review = plan.review_selected,
            learning = plan.learning_selected,
            new = plan.new_selected,
            "starting review session"
        );
        SessionService::new(deck_ids.to_vec(), plan, progress, now)
    }

    /// What each rating would do to the current card; `None` once complete.
    #[must_use]
    pub fn preview_current(&self, session: &SessionService) -> Option<ScheduledStates> {
        let card = session.current_card()?;
        Some(self.review_service().preview(card, session.record_for(card)))
    }

    /// Answer the current card and persist review + summary when completed.
    ///
    /// The session only advances once the review is stored, so a failed
    /// write leaves it on the same card.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for review or persistence failures.
    pub async fn answer_current(
        &self,
        session: &mut SessionService,
        quality: Quality,
    ) -> Result<SessionAnswerResult, SessionError> {
        let Some(card) = session.current_card() else {
            return Err(SessionError::Completed);
        };

        let review_service = self.review_service();
        let reviewed_at = review_service.now();
        let persisted = match review_service
            .review_card_persisted(
                card,
                session.record_for(card),
                quality,
                reviewed_at,
                self.reviews.as_ref(),
            )
            .await
        {
            Ok(persisted) => persisted,
            Err(err) => {
                warn!(card = %card, "rolled back rating; session stays on current card");
                return Err(err.into());
            }
        };

        let review = session
            .record_review_result(card, persisted.result, reviewed_at)?
            .clone();

        if session.is_complete() && session.summary_id().is_none() {
            self.finalize_summary(session).await?;
        }

        Ok(SessionAnswerResult {
            review,
            is_complete: session.is_complete(),
            summary_id: session.summary_id(),
        })
    }

    /// Same as `answer_current`, for a raw 0-3 rating.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quality` for ratings outside 0-3.
    pub async fn answer_current_rating(
        &self,
        session: &mut SessionService,
        rating: u8,
    ) -> Result<SessionAnswerResult, SessionError> {
        let quality = Quality::from_u8(rating)?;
        self.answer_current(session, quality).await
    }

    /// Persist the summary of a completed session, or return the id it already has.
    ///
    /// Also the retry path when the final summary append failed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` if cards remain.
    /// Returns `SessionError::Storage` if persistence fails.
    pub async fn finalize_summary(&self, session: &mut SessionService) -> Result<i64, SessionError> {
        if let Some(id) = session.summary_id() {
            return Ok(id);
        }

        let record = session.build_summary(self.utc_offset)?;
        let id = self.summaries.append_summary(&record).await?;
        session.set_summary_id(id);
        info!(
            summary_id = id,
            reviews = record.summary.total_reviews(),
            reward = record.summary.reward(),
            "session summary persisted"
        );
        Ok(id)
    }
}
