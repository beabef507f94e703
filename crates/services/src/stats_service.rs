use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::debug;

use srs_core::mastery::MasteryBreakdown;
use srs_core::model::DeckId;
use srs_core::stats::{StatsRollup, WeeklyStats};
use storage::repository::{DeckCatalog, ProgressRepository, SessionSummaryRepository, Storage};

use crate::error::StatsError;

/// Everything the progress dashboard shows in one read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Rolling week; bucket 6 is `today`.
    pub week: WeeklyStats,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Reads persisted summaries and progress into dashboard figures.
#[derive(Clone)]
pub struct StatsService {
    summaries: Arc<dyn SessionSummaryRepository>,
    catalog: Arc<dyn DeckCatalog>,
    progress: Arc<dyn ProgressRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(
        summaries: Arc<dyn SessionSummaryRepository>,
        catalog: Arc<dyn DeckCatalog>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            summaries,
            catalog,
            progress,
        }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(
            Arc::clone(&storage.summaries),
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.progress),
        )
    }

    /// Weekly figures for the seven local days ending on `today`.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::DateOutOfRange` near the calendar limits, or storage errors.
    pub async fn weekly(&self, today: NaiveDate) -> Result<WeeklyStats, StatsError> {
        let first_day = today
            .checked_sub_days(Days::new(6))
            .ok_or(StatsError::DateOutOfRange)?;
        let rows = self.summaries.list_between(first_day, today).await?;
        debug!(%first_day, %today, sessions = rows.len(), "folding weekly stats");

        Ok(StatsRollup::fold_window(
            first_day,
            rows.into_iter()
                .map(|row| (row.record.studied_on, row.record.summary)),
        ))
    }

    /// Weekly figures plus current and longest streak as of `today`.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if summaries cannot be read.
    pub async fn dashboard(&self, today: NaiveDate) -> Result<DashboardStats, StatsError> {
        let week = self.weekly(today).await?;

        let history: Vec<_> = self
            .summaries
            .list_between(NaiveDate::MIN, today)
            .await?
            .into_iter()
            .map(|row| (row.record.studied_on, row.record.summary))
            .collect();
        let study_dates = StatsRollup::study_dates(&history);

        Ok(DashboardStats {
            week,
            current_streak: StatsRollup::current_streak(study_dates.iter().copied(), today),
            longest_streak: StatsRollup::longest_streak(study_dates),
        })
    }

    /// Display-status totals for every card in `deck`.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if the catalog or progress cannot be read.
    pub async fn mastery(&self, deck: DeckId) -> Result<MasteryBreakdown, StatsError> {
        let cards = self.catalog.card_ids(deck).await?;
        let progress = self.progress.load_many(&cards).await?;
        Ok(MasteryBreakdown::from_progress(
            cards.iter().map(|card| progress.get(card)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srs_core::Scheduler;
    use srs_core::model::{CardId, CardRef, Quality, SessionSummary};
    use srs_core::time::fixed_now;
    use std::time::Duration;
    use storage::repository::{InMemoryRepository, SessionSummaryRecord};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn service(repo: &InMemoryRepository) -> StatsService {
        StatsService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    async fn store(repo: &InMemoryRepository, date: NaiveDate, summary: SessionSummary) {
        repo.append_summary(&SessionSummaryRecord {
            deck_ids: vec![DeckId::new(1)],
            studied_on: date,
            started_at: fixed_now(),
            completed_at: fixed_now(),
            summary,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn weekly_folds_only_the_last_seven_days() {
        let repo = InMemoryRepository::new();
        let secs = Duration::from_secs(60);
        store(&repo, day(1), SessionSummary::new(0, 0, 9, 0, secs)).await;
        store(&repo, day(4), SessionSummary::new(0, 1, 5, 2, secs)).await;
        store(&repo, day(8), SessionSummary::new(0, 0, 3, 0, secs)).await;
        store(&repo, day(10), SessionSummary::new(4, 0, 0, 0, secs)).await;

        let week = service(&repo).weekly(day(10)).await.unwrap();
        assert_eq!(week.accuracy_pct, 71);
        assert_eq!(week.total_studied, 15);
        assert_eq!(week.per_day_counts, [8, 0, 0, 0, 3, 0, 4]);
    }

    #[tokio::test]
    async fn dashboard_reports_streaks() {
        let repo = InMemoryRepository::new();
        let one = SessionSummary::new(0, 0, 1, 0, Duration::from_secs(10));
        for d in [1, 2, 3, 4, 7, 8] {
            store(&repo, day(d), one.clone()).await;
        }

        let stats = service(&repo).dashboard(day(9)).await.unwrap();
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 4);
        assert_eq!(stats.week.total_studied, 4);
    }

    #[tokio::test]
    async fn mastery_counts_unrated_cards_as_new() {
        let repo = InMemoryRepository::new();
        let deck = DeckId::new(1);
        for id in 1..=3 {
            repo.add_card(CardRef::new(deck, CardId::new(id))).await.unwrap();
        }
        let rated = Scheduler::new().advance(
            CardRef::new(deck, CardId::new(2)),
            None,
            Quality::Easy,
            fixed_now(),
        );
        repo.save(&rated).await.unwrap();

        let breakdown = service(&repo).mastery(deck).await.unwrap();
        assert_eq!(breakdown.new, 2);
        assert_eq!(breakdown.review, 1);
        assert_eq!(breakdown.total(), 3);
    }
}
