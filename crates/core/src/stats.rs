use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::SessionSummary;

/// Dashboard aggregates for one week of study.
///
/// `per_day_counts[i]` is the number of cards studied on bucket day `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub per_day_counts: [u32; 7],
    pub total_studied: u32,
    pub total_time: Duration,
    pub accuracy_pct: u32,
    pub total_reward: u32,
}

/// Running totals before accuracy is derived.
#[derive(Debug, Default)]
struct Totals {
    per_day: [u32; 7],
    studied: u32,
    time: Duration,
    correct: u64,
    incorrect: u64,
    reward: u32,
}

impl Totals {
    fn add(&mut self, bucket: usize, summary: &SessionSummary) {
        let studied = summary.total_reviews();
        self.per_day[bucket] = self.per_day[bucket].saturating_add(studied);
        self.studied = self.studied.saturating_add(studied);
        self.time = self.time.saturating_add(summary.elapsed());
        self.correct += u64::from(summary.good()) + u64::from(summary.easy());
        self.incorrect += u64::from(summary.again());
        self.reward = self.reward.saturating_add(summary.reward());
    }

    fn finish(self) -> WeeklyStats {
        WeeklyStats {
            per_day_counts: self.per_day,
            total_studied: self.studied,
            total_time: self.time,
            accuracy_pct: accuracy_pct(self.correct, self.incorrect),
            total_reward: self.reward,
        }
    }
}

/// `correct / (correct + incorrect) * 100`, rounded half up; 0 when nothing was answered.
#[must_use]
pub fn accuracy_pct(correct: u64, incorrect: u64) -> u32 {
    let answered = correct + incorrect;
    if answered == 0 {
        return 0;
    }
    let pct = (correct * 200 + answered) / (answered * 2);
    u32::try_from(pct).unwrap_or(100)
}

/// Folds per-day session summaries into weekly and streak figures.
///
/// Dates are the caller's local calendar dates; no timezone conversion happens
/// here. Accuracy counts Good and Easy as correct and Again as incorrect. Hard
/// is a strained recall and counts toward neither side.
pub struct StatsRollup;

impl StatsRollup {
    /// Bucket each summary by weekday (Monday = 0 … Sunday = 6).
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use chrono::NaiveDate;
    /// # use srs_core::model::SessionSummary;
    /// # use srs_core::stats::StatsRollup;
    /// let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    /// let stats = StatsRollup::fold([
    ///     (monday, SessionSummary::new(0, 1, 5, 2, Duration::from_secs(60))),
    ///     (monday, SessionSummary::new(0, 0, 3, 0, Duration::from_secs(30))),
    ///     (monday.succ_opt().unwrap(), SessionSummary::new(4, 0, 0, 0, Duration::from_secs(20))),
    /// ]);
    /// assert_eq!(stats.accuracy_pct, 71);
    /// assert_eq!(stats.per_day_counts[0], 11);
    /// ```
    pub fn fold(daily: impl IntoIterator<Item = (NaiveDate, SessionSummary)>) -> WeeklyStats {
        let mut totals = Totals::default();
        for (date, summary) in daily {
            let bucket = date.weekday().num_days_from_monday() as usize;
            totals.add(bucket, &summary);
        }
        totals.finish()
    }

    /// Bucket relative to `first_day` (bucket 0) and skip anything outside the
    /// seven days starting there.
    pub fn fold_window(
        first_day: NaiveDate,
        daily: impl IntoIterator<Item = (NaiveDate, SessionSummary)>,
    ) -> WeeklyStats {
        let mut totals = Totals::default();
        for (date, summary) in daily {
            let offset = (date - first_day).num_days();
            if let Ok(bucket @ 0..=6) = usize::try_from(offset) {
                totals.add(bucket, &summary);
            }
        }
        totals.finish()
    }

    /// Consecutive study days ending today, or ending yesterday when today has
    /// not been studied yet.
    pub fn current_streak(study_dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
        let days: BTreeSet<NaiveDate> = study_dates.into_iter().collect();
        let start = if days.contains(&today) {
            today
        } else {
            match today.pred_opt() {
                Some(yesterday) if days.contains(&yesterday) => yesterday,
                _ => return 0,
            }
        };

        let mut streak = 0_u32;
        let mut cursor = Some(start);
        while let Some(day) = cursor.filter(|d| days.contains(d)) {
            streak = streak.saturating_add(1);
            cursor = day.pred_opt();
        }
        streak
    }

    /// Longest run of consecutive study days anywhere in `study_dates`.
    pub fn longest_streak(study_dates: impl IntoIterator<Item = NaiveDate>) -> u32 {
        let days: BTreeSet<NaiveDate> = study_dates.into_iter().collect();
        let mut longest = 0_u32;
        let mut run = 0_u32;
        let mut previous: Option<NaiveDate> = None;
        for day in days {
            run = match previous.and_then(|p| p.succ_opt()) {
                Some(next) if next == day => run.saturating_add(1),
                _ => 1,
            };
            longest = longest.max(run);
            previous = Some(day);
        }
        longest
    }

    /// Dates on which at least one card was studied.
    pub fn study_dates<'a>(
        daily: impl IntoIterator<Item = &'a (NaiveDate, SessionSummary)>,
    ) -> BTreeSet<NaiveDate> {
        daily
            .into_iter()
            .filter(|(_, summary)| summary.total_reviews() > 0)
            .map(|(date, _)| *date)
            .collect()
    }
}
