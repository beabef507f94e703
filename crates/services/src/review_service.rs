use tracing::{debug, warn};

use srs_core::{
    model::{CardRef, ProgressRecord, Quality, ReviewLog},
    scheduler::{ScheduledStates, Scheduler, SchedulerConfig},
    time::{Clock, Timestamp},
};
use storage::repository::{ProgressRepository, ReviewPersistence};

use crate::error::ReviewServiceError;

//
// ─── REVIEW RESULT ─────────────────────────────────────────────────────────────
//

/// Result of applying one rating: the card's next record and its log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub record: ProgressRecord,
    pub log: ReviewLog,
}

/// Result of a persisted review: applied outcome and log ID.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedReview {
    pub result: ReviewResult,
    pub log_id: i64,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Coordinates applying a learner's rating to a card using the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ReviewService {
    clock: Clock,
    scheduler: Scheduler,
}

impl ReviewService {
    /// Review service with the default scheduler and real-time clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a review service with a custom scheduler (still uses default clock).
    #[must_use]
    pub fn with_scheduler(scheduler: Scheduler) -> Self {
        Self {
            clock: Clock::default(),
            scheduler,
        }
    }

    /// Validate `config` and build a service around it.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Scheduler` if the config is rejected.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, ReviewServiceError> {
        Ok(Self::with_scheduler(Scheduler::with_config(config)?))
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Outcome of each rating for `card` at the current time, for labeling
    /// the rating buttons before the learner answers.
    #[must_use]
    pub fn preview(&self, card: CardRef, progress: Option<&ProgressRecord>) -> ScheduledStates {
        self.scheduler.preview(card, progress, self.now())
    }

    /// Apply a rating to a card without touching storage.
    ///
    /// `progress` is the card's current record, `None` if it has never been rated.
    #[must_use]
    pub fn review_card(
        &self,
        card: CardRef,
        progress: Option<&ProgressRecord>,
        quality: Quality,
        reviewed_at: Timestamp,
    ) -> ReviewResult {
        let (record, log) = self
            .scheduler
            .apply_review(card, progress, quality, reviewed_at);
        debug!(
            card = %card,
            quality = ?quality,
            status = record.status().as_str(),
            interval_minutes = record.interval_minutes(),
            "applied rating"
        );
        ReviewResult { record, log }
    }

    /// Same as `review_card`, for a raw 0-3 rating.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Scheduler` wrapping `InvalidQuality` for
    /// ratings outside 0-3.
    pub fn review_card_rating(
        &self,
        card: CardRef,
        progress: Option<&ProgressRecord>,
        rating: u8,
        reviewed_at: Timestamp,
    ) -> Result<ReviewResult, ReviewServiceError> {
        let quality = Quality::from_u8(rating)?;
        Ok(self.review_card(card, progress, quality, reviewed_at))
    }

    /// Apply a rating and persist the new record + log atomically.
    ///
    /// Nothing is returned on failure; the caller's copy of `progress` is
    /// untouched, so the rating can simply be retried.
    ///
    /// # Errors
    ///
    /// Returns storage errors if persistence fails.
    pub async fn review_card_persisted(
        &self,
        card: CardRef,
        progress: Option<&ProgressRecord>,
        quality: Quality,
        reviewed_at: Timestamp,
        reviews: &dyn ReviewPersistence,
    ) -> Result<PersistedReview, ReviewServiceError> {
        let result = self.review_card(card, progress, quality, reviewed_at);

        match reviews.apply_review(&result.record, &result.log).await {
            Ok(log_id) => Ok(PersistedReview { result, log_id }),
            Err(err) => {
                warn!(card = %card, error = %err, "review not persisted");
                Err(err.into())
            }
        }
    }

    /// Load a card's record, apply a rating, and persist the result.
    ///
    /// Uses the service clock for `reviewed_at` to keep time deterministic.
    ///
    /// # Errors
    ///
    /// Returns storage errors if loading or persistence fails.
    pub async fn review_card_by_ref(
        &self,
        card: CardRef,
        progress: &dyn ProgressRepository,
        reviews: &dyn ReviewPersistence,
        quality: Quality,
    ) -> Result<PersistedReview, ReviewServiceError> {
        let current = progress.load(card).await?;
        let reviewed_at = self.now();
        self.review_card_persisted(card, current.as_ref(), quality, reviewed_at, reviews)
            .await
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use srs_core::model::{CardId, CardStatus, DeckId, ReviewError};
    use srs_core::scheduler::SchedulerError;
    use srs_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, ReviewLogRepository, StorageError};

    fn card() -> CardRef {
        CardRef::new(DeckId::new(1), CardId::new(1))
    }

    struct FailingReviews;

    #[async_trait]
    impl ReviewPersistence for FailingReviews {
        async fn apply_review(
            &self,
            _record: &ProgressRecord,
            _log: &ReviewLog,
        ) -> Result<i64, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    #[test]
    fn review_new_card_updates_state_and_log() {
        let service = ReviewService::new().with_clock(Clock::fixed(fixed_now()));
        let result = service.review_card(card(), None, Quality::Good, service.now());

        assert_eq!(result.log.card, card());
        assert_eq!(result.log.quality, Quality::Good);
        assert_eq!(result.record.status(), CardStatus::Learning);
        assert_eq!(result.record.last_reviewed_at(), Some(fixed_now()));
        assert!(result.record.next_review_at().unwrap() >= fixed_now());
    }

    #[test]
    fn preview_labels_every_rating_for_a_new_card() {
        let service = ReviewService::new().with_clock(Clock::fixed(fixed_now()));
        let states = service.preview(card(), None);

        let minutes: Vec<u32> = Quality::ALL
            .iter()
            .map(|q| states.select(*q).interval_minutes())
            .collect();
        assert_eq!(minutes, vec![1, 1, 10, 1_440]);
        assert_eq!(states.easy.status(), CardStatus::Review);

        let applied = service.review_card(card(), None, Quality::Good, service.now());
        assert_eq!(&applied.record, states.select(Quality::Good));
    }

    #[test]
    fn raw_rating_out_of_range_is_rejected() {
        let service = ReviewService::new();
        let err = service
            .review_card_rating(card(), None, 7, fixed_now())
            .unwrap_err();
        assert!(matches!(
            err,
            ReviewServiceError::Scheduler(SchedulerError::Review(ReviewError::InvalidQuality(7)))
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SchedulerConfig {
            learning_steps: Vec::new(),
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            ReviewService::with_config(config),
            Err(ReviewServiceError::Scheduler(SchedulerError::Config(_)))
        ));
    }

    #[tokio::test]
    async fn review_by_ref_loads_and_persists() {
        let repo = InMemoryRepository::new();
        let service = ReviewService::new().with_clock(Clock::fixed(fixed_now()));

        let first = service
            .review_card_by_ref(card(), &repo, &repo, Quality::Good)
            .await
            .unwrap();
        assert_eq!(first.result.record.interval_minutes(), 10);

        let second = service
            .review_card_by_ref(card(), &repo, &repo, Quality::Good)
            .await
            .unwrap();
        assert_eq!(second.result.record.status(), CardStatus::Review);
        assert_eq!(second.result.record.interval_minutes(), 1_440);

        let stored = repo.load(card()).await.unwrap().unwrap();
        assert_eq!(stored, second.result.record);
        assert_eq!(repo.logs_for_card(card()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_persistence_surfaces_storage_error() {
        let service = ReviewService::new();
        let err = service
            .review_card_persisted(card(), None, Quality::Easy, fixed_now(), &FailingReviews)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewServiceError::Storage(_)));
    }
}
