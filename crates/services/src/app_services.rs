use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};
use tracing::info;

use srs_core::Scheduler;
use storage::repository::{DeckCatalog, ReviewLogRepository, Storage};

use crate::Clock;
use crate::error::{AppServicesError, SettingsError};
use crate::review_service::ReviewService;
use crate::sessions::{SessionLoopService, local_date};
use crate::settings::SrsSettings;
use crate::stats_service::StatsService;

/// Assembles host-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    utc_offset: FixedOffset,
    catalog: Arc<dyn DeckCatalog>,
    review_logs: Arc<dyn ReviewLogRepository>,
    review_service: ReviewService,
    session_loop: Arc<SessionLoopService>,
    stats: Arc<StatsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` at `settings.database_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the scheduler config is invalid or
    /// storage initialization fails.
    pub async fn new_sqlite(settings: &SrsSettings, clock: Clock) -> Result<Self, AppServicesError> {
        let scheduler = scheduler_from(settings)?;
        let storage = Storage::sqlite(&settings.database_url).await?;
        info!(database_url = %settings.database_url, "sqlite storage ready");
        Ok(Self::assemble(settings, scheduler, clock, &storage))
    }

    /// Build services over process-local in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Settings` if the scheduler config is invalid.
    pub fn in_memory(settings: &SrsSettings, clock: Clock) -> Result<Self, AppServicesError> {
        let scheduler = scheduler_from(settings)?;
        Ok(Self::assemble(settings, scheduler, clock, &Storage::in_memory()))
    }

    fn assemble(
        settings: &SrsSettings,
        scheduler: Scheduler,
        clock: Clock,
        storage: &Storage,
    ) -> Self {
        let utc_offset = settings.utc_offset();
        let session_loop = SessionLoopService::from_storage(clock, storage)
            .with_scheduler(scheduler.clone())
            .with_new_card_cap(settings.new_card_cap)
            .with_review_limit(settings.review_limit)
            .with_utc_offset(utc_offset);

        Self {
            clock,
            utc_offset,
            catalog: Arc::clone(&storage.catalog),
            review_logs: Arc::clone(&storage.review_logs),
            review_service: ReviewService::with_scheduler(scheduler).with_clock(clock),
            session_loop: Arc::new(session_loop),
            stats: Arc::new(StatsService::from_storage(storage)),
        }
    }

    /// The learner's current local date.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        local_date(self.clock.now(), self.utc_offset)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<dyn DeckCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn review_logs(&self) -> Arc<dyn ReviewLogRepository> {
        Arc::clone(&self.review_logs)
    }

    #[must_use]
    pub fn review_service(&self) -> &ReviewService {
        &self.review_service
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }
}

fn scheduler_from(settings: &SrsSettings) -> Result<Scheduler, AppServicesError> {
    Scheduler::with_config(settings.scheduler.clone())
        .map_err(|err| AppServicesError::Settings(SettingsError::from(err)))
}
