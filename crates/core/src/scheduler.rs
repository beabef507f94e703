use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    CardRef, CardStatus, DEFAULT_EASE, EASE_FLOOR, ProgressRecord, Quality, ReviewError,
    ReviewLog,
};
use crate::time::{Timestamp, add_minutes, days};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SchedulerError {
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Config(#[from] SchedulerConfigError),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SchedulerConfigError {
    #[error("learning steps cannot be empty")]
    EmptyLearningSteps,

    #[error("learning steps must be > 0 minutes and strictly increasing")]
    InvalidLearningSteps,

    #[error("{name} must be > 0 minutes")]
    ZeroInterval { name: &'static str },

    #[error("minimum ease must be finite and >= {EASE_FLOOR}, got {provided}")]
    InvalidMinimumEase { provided: f64 },

    #[error("starting ease must be finite and >= minimum ease, got {provided}")]
    InvalidStartingEase { provided: f64 },

    #[error("{name} must be finite and >= {min}, got {provided}")]
    InvalidFactor {
        name: &'static str,
        min: f64,
        provided: f64,
    },
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Tunable constants of the review state machine.
///
/// The defaults are the product's current policy. All intervals are minutes.
///
/// # Examples
///
/// ```
/// # use srs_core::scheduler::SchedulerConfig;
/// let config = SchedulerConfig::default();
/// assert_eq!(config.learning_steps, vec![1, 10]);
/// assert_eq!(config.mastery_threshold, 21 * 1_440);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub learning_steps: Vec<u32>,
    /// Interval when Good is pressed on the last learning step.
    pub graduating_interval: u32,
    /// Interval when Easy is pressed during Learning.
    pub easy_interval: u32,
    /// Interval when Easy is the very first rating of a card.
    pub new_card_easy_interval: u32,
    pub starting_ease: f64,
    pub minimum_ease: f64,
    pub again_ease_penalty: f64,
    pub hard_ease_penalty: f64,
    pub easy_ease_bonus: f64,
    pub hard_multiplier: f64,
    pub easy_bonus: f64,
    /// Review intervals at or above this promote the card to Mastered.
    pub mastery_threshold: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            learning_steps: vec![1, 10],
            graduating_interval: days(1),
            easy_interval: days(4),
            new_card_easy_interval: days(1),
            starting_ease: DEFAULT_EASE,
            minimum_ease: EASE_FLOOR,
            again_ease_penalty: 0.20,
            hard_ease_penalty: 0.15,
            easy_ease_bonus: 0.15,
            hard_multiplier: 1.2,
            easy_bonus: 1.3,
            mastery_threshold: days(21),
        }
    }
}

impl SchedulerConfig {
    /// Check every constant before the config reaches the state machine.
    ///
    /// # Errors
    ///
    /// Returns the first `SchedulerConfigError` found.
    pub fn validate(&self) -> Result<(), SchedulerConfigError> {
        if self.learning_steps.is_empty() {
            return Err(SchedulerConfigError::EmptyLearningSteps);
        }
        if self.learning_steps[0] == 0
            || self.learning_steps.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(SchedulerConfigError::InvalidLearningSteps);
        }
        for (name, value) in [
            ("graduating interval", self.graduating_interval),
            ("easy interval", self.easy_interval),
            ("new card easy interval", self.new_card_easy_interval),
            ("mastery threshold", self.mastery_threshold),
        ] {
            if value == 0 {
                return Err(SchedulerConfigError::ZeroInterval { name });
            }
        }
        if !self.minimum_ease.is_finite() || self.minimum_ease < EASE_FLOOR {
            return Err(SchedulerConfigError::InvalidMinimumEase {
                provided: self.minimum_ease,
            });
        }
        if !self.starting_ease.is_finite() || self.starting_ease < self.minimum_ease {
            return Err(SchedulerConfigError::InvalidStartingEase {
                provided: self.starting_ease,
            });
        }
        for (name, min, value) in [
            ("again ease penalty", 0.0, self.again_ease_penalty),
            ("hard ease penalty", 0.0, self.hard_ease_penalty),
            ("easy ease bonus", 0.0, self.easy_ease_bonus),
            ("hard multiplier", 1.0, self.hard_multiplier),
            ("easy bonus", 1.0, self.easy_bonus),
        ] {
            if !value.is_finite() || value < min {
                return Err(SchedulerConfigError::InvalidFactor {
                    name,
                    min,
                    provided: value,
                });
            }
        }
        Ok(())
    }

    fn first_step(&self) -> u32 {
        self.learning_steps.first().copied().unwrap_or(1).max(1)
    }

    fn step(&self, index: u32) -> u32 {
        let last = self.learning_steps.len().saturating_sub(1);
        let index = usize::try_from(index).unwrap_or(usize::MAX).min(last);
        self.learning_steps
            .get(index)
            .copied()
            .unwrap_or_else(|| self.first_step())
    }

    fn last_step_index(&self) -> u32 {
        u32::try_from(self.learning_steps.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }
}

//
// ─── SCHEDULED STATES ──────────────────────────────────────────────────────────
//

/// All four possible next records for a card, one per rating.
///
/// Lets a host label the rating buttons ("1m", "10m", "1d", "4d") before the
/// learner answers, then keep the one matching the chosen rating.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledStates {
    pub again: ProgressRecord,
    pub hard: ProgressRecord,
    pub good: ProgressRecord,
    pub easy: ProgressRecord,
}

impl ScheduledStates {
    #[must_use]
    pub fn select(&self, quality: Quality) -> &ProgressRecord {
        match quality {
            Quality::Again => &self.again,
            Quality::Hard => &self.hard,
            Quality::Good => &self.good,
            Quality::Easy => &self.easy,
        }
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Where a single rating moves the scheduling fields.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Step {
    status: CardStatus,
    interval: u32,
    ease: f64,
    learning_step: u32,
    lapsed: bool,
}

/// Spaced-repetition state machine: New → Learning → Review → Mastered.
///
/// `advance` is pure and deterministic; calls for different cards are
/// independent and may run in parallel. Ratings for one card must be applied
/// in the order the learner gave them.
///
/// # Examples
///
/// ```
/// # use srs_core::scheduler::Scheduler;
/// # use srs_core::model::{CardId, CardRef, CardStatus, DeckId, Quality};
/// # use srs_core::time::fixed_now;
/// let scheduler = Scheduler::new();
/// let card = CardRef::new(DeckId::new(1), CardId::new(1));
///
/// let first = scheduler.advance(card, None, Quality::Good, fixed_now());
/// assert_eq!(first.status(), CardStatus::Learning);
/// assert_eq!(first.interval_minutes(), 10);
///
/// let second = scheduler.advance(card, Some(&first), Quality::Good, fixed_now());
/// assert_eq!(second.status(), CardStatus::Review);
/// assert_eq!(second.interval_minutes(), 1_440);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    /// Scheduler using the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler with a custom policy.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerConfigError` if the config fails validation.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, SchedulerConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Apply one rating to a card and return its next record.
    ///
    /// `progress` is `None` for a card that has never been rated. The returned
    /// record always carries `card`'s identifiers, `last_reviewed_at == now`
    /// and `next_review_at == now + interval`.
    #[must_use]
    pub fn advance(
        &self,
        card: CardRef,
        progress: Option<&ProgressRecord>,
        quality: Quality,
        now: Timestamp,
    ) -> ProgressRecord {
        let fresh;
        let previous = match progress {
            Some(record) => record,
            None => {
                fresh = ProgressRecord::new_card(card);
                &fresh
            }
        };

        let step = match previous.status {
            CardStatus::New => self.from_new(quality),
            CardStatus::Learning => {
                self.from_learning(previous.learning_step, previous.ease_factor, quality)
            }
            CardStatus::Review | CardStatus::Mastered => self.from_graduated(previous, quality),
        };

        let interval = step.interval.max(self.config.first_step());
        let (correct, incorrect) = if quality.is_pass() {
            (previous.correct_count.saturating_add(1), previous.incorrect_count)
        } else {
            (previous.correct_count, previous.incorrect_count.saturating_add(1))
        };

        ProgressRecord {
            card,
            status: step.status,
            interval_minutes: interval,
            ease_factor: step.ease.max(self.config.minimum_ease),
            learning_step: step.learning_step,
            lapses: if step.lapsed {
                previous.lapses.saturating_add(1)
            } else {
                previous.lapses
            },
            correct_count: correct,
            incorrect_count: incorrect,
            last_reviewed_at: Some(now),
            next_review_at: Some(add_minutes(now, interval)),
        }
    }

    /// Same as `advance`, for callers holding a raw 0-3 rating.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Review(InvalidQuality)` for ratings outside 0-3.
    pub fn advance_rating(
        &self,
        card: CardRef,
        progress: Option<&ProgressRecord>,
        rating: u8,
        now: Timestamp,
    ) -> Result<ProgressRecord, SchedulerError> {
        let quality = Quality::from_u8(rating)?;
        Ok(self.advance(card, progress, quality, now))
    }

    /// Apply a rating and produce the matching log entry.
    #[must_use]
    pub fn apply_review(
        &self,
        card: CardRef,
        progress: Option<&ProgressRecord>,
        quality: Quality,
        now: Timestamp,
    ) -> (ProgressRecord, ReviewLog) {
        let next = self.advance(card, progress, quality, now);
        let log = ReviewLog::new(card, quality, now, next.status, next.interval_minutes);
        (next, log)
    }

    /// Every possible outcome for the card, without committing to one.
    #[must_use]
    pub fn preview(
        &self,
        card: CardRef,
        progress: Option<&ProgressRecord>,
        now: Timestamp,
    ) -> ScheduledStates {
        ScheduledStates {
            again: self.advance(card, progress, Quality::Again, now),
            hard: self.advance(card, progress, Quality::Hard, now),
            good: self.advance(card, progress, Quality::Good, now),
            easy: self.advance(card, progress, Quality::Easy, now),
        }
    }

    // First rating: Easy graduates straight away, anything else enters the
    // ladder at step 0 and is then treated as a Learning rating.
    fn from_new(&self, quality: Quality) -> Step {
        match quality {
            Quality::Easy => self.graduate(
                self.config.new_card_easy_interval,
                self.config.starting_ease,
            ),
            _ => self.from_learning(0, self.config.starting_ease, quality),
        }
    }

    fn from_learning(&self, step: u32, ease: f64, quality: Quality) -> Step {
        let step = step.min(self.config.last_step_index());
        let stay = |index: u32| Step {
            status: CardStatus::Learning,
            interval: self.config.step(index),
            ease,
            learning_step: index,
            lapsed: false,
        };

        match quality {
            Quality::Again => stay(0),
            Quality::Hard => stay(step),
            Quality::Good if step < self.config.last_step_index() => stay(step + 1),
            Quality::Good => self.graduate(self.config.graduating_interval, ease),
            Quality::Easy => self.graduate(self.config.easy_interval, ease),
        }
    }

    #[allow(clippy::unused_self)]
    fn graduate(&self, interval: u32, ease: f64) -> Step {
        Step {
            status: CardStatus::Review,
            interval,
            ease,
            learning_step: 0,
            lapsed: false,
        }
    }

    fn from_graduated(&self, previous: &ProgressRecord, quality: Quality) -> Step {
        let cfg = &self.config;
        let ease = previous.ease_factor;
        let current = previous.interval_minutes;

        let (interval, ease) = match quality {
            Quality::Again => {
                return Step {
                    status: CardStatus::Learning,
                    interval: cfg.first_step(),
                    ease: (ease - cfg.again_ease_penalty).max(cfg.minimum_ease),
                    learning_step: 0,
                    lapsed: true,
                };
            }
            Quality::Hard => (
                scale(current, cfg.hard_multiplier),
                (ease - cfg.hard_ease_penalty).max(cfg.minimum_ease),
            ),
            Quality::Good => (scale(current, ease), ease),
            Quality::Easy => (
                scale(current, ease * cfg.easy_bonus),
                ease + cfg.easy_ease_bonus,
            ),
        };

        // Growth never shrinks an interval below where it was.
        let interval = interval.max(current);
        let status = if previous.status == CardStatus::Mastered || interval >= cfg.mastery_threshold
        {
            CardStatus::Mastered
        } else {
            CardStatus::Review
        };

        Step {
            status,
            interval,
            ease,
            learning_step: 0,
            lapsed: false,
        }
    }
}

/// `minutes * factor`, rounded to the nearest minute and saturating at `u32::MAX`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(minutes: u32, factor: f64) -> u32 {
    let scaled = (f64::from(minutes) * factor).round();
    if scaled.is_nan() || scaled < 1.0 {
        1
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CardId, DeckId, ProgressSnapshot};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn card() -> CardRef {
        CardRef::new(DeckId::new(1), CardId::new(1))
    }

    fn graduated(status: CardStatus, interval_days: u32, ease: f64) -> ProgressRecord {
        let now = fixed_now();
        ProgressRecord::from_persisted(ProgressSnapshot {
            card_id: CardId::new(1),
            deck_id: DeckId::new(1),
            status,
            interval_minutes: days(interval_days),
            ease_factor: ease,
            learning_step: 0,
            lapses: 0,
            correct_count: 3,
            incorrect_count: 0,
            last_reviewed_at: Some(now - Duration::days(i64::from(interval_days))),
            next_review_at: Some(now),
        })
        .unwrap()
    }

    fn learning_at(step: u32) -> ProgressRecord {
        let s = Scheduler::new();
        let mut record = s.advance(card(), None, Quality::Again, fixed_now());
        for _ in 0..step {
            record = s.advance(card(), Some(&record), Quality::Good, fixed_now());
        }
        assert_eq!(record.status(), CardStatus::Learning);
        assert_eq!(record.learning_step(), step);
        record
    }

    fn every_state() -> Vec<Option<ProgressRecord>> {
        vec![
            None,
            Some(learning_at(0)),
            Some(learning_at(1)),
            Some(graduated(CardStatus::Review, 1, 2.5)),
            Some(graduated(CardStatus::Review, 10, 1.3)),
            Some(graduated(CardStatus::Mastered, 30, 2.8)),
        ]
    }

    #[test]
    fn new_card_good_good_graduates_to_review() {
        let s = Scheduler::new();
        let now = fixed_now();

        let first = s.advance(card(), None, Quality::Good, now);
        assert_eq!(first.status(), CardStatus::Learning);
        assert_eq!(first.interval_minutes(), 10);

        let second = s.advance(card(), Some(&first), Quality::Good, now);
        assert_eq!(second.status(), CardStatus::Review);
        assert_eq!(second.interval_minutes(), 1_440);
        assert!((second.ease_factor() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn new_card_again_or_hard_starts_at_first_step() {
        let s = Scheduler::new();
        for q in [Quality::Again, Quality::Hard] {
            let r = s.advance(card(), None, q, fixed_now());
            assert_eq!(r.status(), CardStatus::Learning);
            assert_eq!(r.interval_minutes(), 1);
            assert_eq!(r.lapses(), 0);
        }
    }

    #[test]
    fn new_card_easy_skips_to_review_for_one_day() {
        let r = Scheduler::new().advance(card(), None, Quality::Easy, fixed_now());
        assert_eq!(r.status(), CardStatus::Review);
        assert_eq!(r.interval_minutes(), days(1));
        assert!((r.ease_factor() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_new_record_behaves_like_absent_record() {
        let s = Scheduler::new();
        let explicit = ProgressRecord::new_card(card());
        for q in Quality::ALL {
            assert_eq!(
                s.advance(card(), Some(&explicit), q, fixed_now()),
                s.advance(card(), None, q, fixed_now())
            );
        }
    }

    #[test]
    fn learning_again_resets_without_counting_a_lapse() {
        let s = Scheduler::new();
        let r = s.advance(card(), Some(&learning_at(1)), Quality::Again, fixed_now());
        assert_eq!(r.status(), CardStatus::Learning);
        assert_eq!(r.interval_minutes(), 1);
        assert_eq!(r.learning_step(), 0);
        assert_eq!(r.lapses(), 0);
        assert_eq!(r.incorrect_count(), 2);
    }

    #[test]
    fn learning_hard_repeats_current_step() {
        let s = Scheduler::new();
        let r = s.advance(card(), Some(&learning_at(1)), Quality::Hard, fixed_now());
        assert_eq!(r.status(), CardStatus::Learning);
        assert_eq!(r.interval_minutes(), 10);
        assert_eq!(r.learning_step(), 1);
    }

    #[test]
    fn learning_easy_graduates_with_four_days() {
        let s = Scheduler::new();
        let r = s.advance(card(), Some(&learning_at(0)), Quality::Easy, fixed_now());
        assert_eq!(r.status(), CardStatus::Review);
        assert_eq!(r.interval_minutes(), days(4));
        assert!((r.ease_factor() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn review_good_crossing_threshold_becomes_mastered() {
        let s = Scheduler::new();
        let r = s.advance(
            card(),
            Some(&graduated(CardStatus::Review, 10, 2.5)),
            Quality::Good,
            fixed_now(),
        );
        assert_eq!(r.interval_minutes(), days(25));
        assert_eq!(r.status(), CardStatus::Mastered);
    }

    #[test]
    fn review_below_threshold_stays_review() {
        let s = Scheduler::new();
        let r = s.advance(
            card(),
            Some(&graduated(CardStatus::Review, 4, 2.5)),
            Quality::Good,
            fixed_now(),
        );
        assert_eq!(r.interval_minutes(), days(10));
        assert_eq!(r.status(), CardStatus::Review);
    }

    #[test]
    fn review_hard_grows_slowly_and_lowers_ease() {
        let s = Scheduler::new();
        let r = s.advance(
            card(),
            Some(&graduated(CardStatus::Review, 10, 2.5)),
            Quality::Hard,
            fixed_now(),
        );
        assert_eq!(r.interval_minutes(), days(12));
        assert!((r.ease_factor() - 2.35).abs() < 1e-9);
        assert_eq!(r.status(), CardStatus::Review);
    }

    #[test]
    fn review_easy_uses_bonus_and_raises_ease() {
        let s = Scheduler::new();
        let r = s.advance(
            card(),
            Some(&graduated(CardStatus::Review, 2, 2.5)),
            Quality::Easy,
            fixed_now(),
        );
        // 2880 * 2.5 * 1.3 = 9360
        assert_eq!(r.interval_minutes(), 9_360);
        assert!((r.ease_factor() - 2.65).abs() < 1e-9);
    }

    #[test]
    fn review_again_lapses_into_learning() {
        let s = Scheduler::new();
        let r = s.advance(
            card(),
            Some(&graduated(CardStatus::Review, 10, 2.5)),
            Quality::Again,
            fixed_now(),
        );
        assert_eq!(r.status(), CardStatus::Learning);
        assert_eq!(r.interval_minutes(), 1);
        assert_eq!(r.lapses(), 1);
        assert!((r.ease_factor() - 2.3).abs() < 1e-9);
    }

    #[test]
    fn mastered_again_demotes_to_learning() {
        let s = Scheduler::new();
        let before = graduated(CardStatus::Mastered, 30, 2.5);
        let r = s.advance(card(), Some(&before), Quality::Again, fixed_now());
        assert_eq!(r.status(), CardStatus::Learning);
        assert_eq!(r.lapses(), before.lapses() + 1);
        assert_eq!(r.interval_minutes(), 1);
    }

    #[test]
    fn mastered_stays_mastered_on_passing_ratings() {
        let s = Scheduler::new();
        let before = graduated(CardStatus::Mastered, 30, 1.3);
        for q in [Quality::Hard, Quality::Good, Quality::Easy] {
            let r = s.advance(card(), Some(&before), q, fixed_now());
            assert_eq!(r.status(), CardStatus::Mastered);
            assert!(r.interval_minutes() >= before.interval_minutes());
        }
    }

    #[test]
    fn relearned_card_keeps_reduced_ease_on_graduation() {
        let s = Scheduler::new();
        let lapsed = s.advance(
            card(),
            Some(&graduated(CardStatus::Review, 10, 2.5)),
            Quality::Again,
            fixed_now(),
        );
        let step = s.advance(card(), Some(&lapsed), Quality::Good, fixed_now());
        let back = s.advance(card(), Some(&step), Quality::Good, fixed_now());
        assert_eq!(back.status(), CardStatus::Review);
        assert_eq!(back.interval_minutes(), days(1));
        assert!((back.ease_factor() - 2.3).abs() < 1e-9);
        assert_eq!(back.lapses(), 1);
    }

    #[test]
    fn ease_never_drops_below_floor() {
        let s = Scheduler::new();
        let mut record = graduated(CardStatus::Review, 5, 1.4);
        let mut now = fixed_now();
        for _ in 0..20 {
            record = s.advance(card(), Some(&record), Quality::Hard, now);
            assert!(record.ease_factor() >= EASE_FLOOR);
            record = s.advance(card(), Some(&record), Quality::Again, now);
            assert!(record.ease_factor() >= EASE_FLOOR);
            record = s.advance(card(), Some(&record), Quality::Easy, now);
            now += Duration::days(5);
        }
    }

    #[test]
    fn next_review_is_never_before_now() {
        let s = Scheduler::new();
        let now = fixed_now() + Duration::days(100);
        for state in every_state() {
            for q in Quality::ALL {
                let r = s.advance(card(), state.as_ref(), q, now);
                assert!(r.next_review_at().unwrap() >= now);
                assert_eq!(r.last_reviewed_at(), Some(now));
                assert!(r.interval_minutes() > 0);
            }
        }
    }

    #[test]
    fn replaying_a_sequence_is_deterministic() {
        let s = Scheduler::new();
        let ratings = [
            Quality::Good,
            Quality::Good,
            Quality::Hard,
            Quality::Again,
            Quality::Good,
            Quality::Easy,
            Quality::Good,
        ];
        let run = || {
            let mut record: Option<ProgressRecord> = None;
            let mut now = fixed_now();
            for q in ratings {
                let next = s.advance(card(), record.as_ref(), q, now);
                now = next.next_review_at().unwrap();
                record = Some(next);
            }
            record
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn easy_twice_never_beats_good_twice_downward() {
        let s = Scheduler::new();
        for start in [
            graduated(CardStatus::Review, 1, 1.3),
            graduated(CardStatus::Review, 3, 2.5),
            graduated(CardStatus::Mastered, 40, 2.0),
        ] {
            let twice = |q: Quality| {
                let a = s.advance(card(), Some(&start), q, fixed_now());
                s.advance(card(), Some(&a), q, a.next_review_at().unwrap())
            };
            assert!(
                twice(Quality::Easy).interval_minutes() >= twice(Quality::Good).interval_minutes()
            );
        }
    }

    #[test]
    fn huge_intervals_saturate() {
        let s = Scheduler::new();
        let mut record = graduated(CardStatus::Mastered, 3_000_000, 5.0);
        for _ in 0..5 {
            record = s.advance(card(), Some(&record), Quality::Easy, fixed_now());
        }
        assert_eq!(record.interval_minutes(), u32::MAX);
        assert!(record.next_review_at().unwrap() >= fixed_now());
    }

    #[test]
    fn advance_rating_rejects_out_of_range() {
        let s = Scheduler::new();
        let err = s.advance_rating(card(), None, 4, fixed_now()).unwrap_err();
        assert_eq!(err, SchedulerError::Review(ReviewError::InvalidQuality(4)));

        let ok = s.advance_rating(card(), None, 2, fixed_now()).unwrap();
        assert_eq!(ok.interval_minutes(), 10);
    }

    #[test]
    fn counters_track_pass_and_fail() {
        let s = Scheduler::new();
        let a = s.advance(card(), None, Quality::Again, fixed_now());
        let b = s.advance(card(), Some(&a), Quality::Hard, fixed_now());
        assert_eq!(b.incorrect_count(), 1);
        assert_eq!(b.correct_count(), 1);
    }

    #[test]
    fn preview_matches_advance_for_each_rating() {
        let s = Scheduler::new();
        let state = graduated(CardStatus::Review, 3, 2.5);
        let states = s.preview(card(), Some(&state), fixed_now());
        for q in Quality::ALL {
            assert_eq!(
                states.select(q),
                &s.advance(card(), Some(&state), q, fixed_now())
            );
        }
    }

    #[test]
    fn apply_review_logs_resulting_state() {
        let (record, log) = Scheduler::new().apply_review(card(), None, Quality::Easy, fixed_now());
        assert_eq!(log.card, card());
        assert_eq!(log.status, record.status());
        assert_eq!(log.interval_minutes, record.interval_minutes());
    }

    #[test]
    fn custom_ladder_is_walked_step_by_step() {
        let config = SchedulerConfig {
            learning_steps: vec![1, 5, 30],
            ..SchedulerConfig::default()
        };
        let s = Scheduler::with_config(config).unwrap();
        let a = s.advance(card(), None, Quality::Good, fixed_now());
        assert_eq!(a.interval_minutes(), 5);
        let b = s.advance(card(), Some(&a), Quality::Good, fixed_now());
        assert_eq!(b.interval_minutes(), 30);
        let c = s.advance(card(), Some(&b), Quality::Good, fixed_now());
        assert_eq!(c.status(), CardStatus::Review);
    }

    #[test]
    fn single_step_ladder_graduates_on_first_good() {
        let config = SchedulerConfig {
            learning_steps: vec![3],
            ..SchedulerConfig::default()
        };
        let s = Scheduler::with_config(config).unwrap();
        let r = s.advance(card(), None, Quality::Good, fixed_now());
        assert_eq!(r.status(), CardStatus::Review);
        assert_eq!(r.interval_minutes(), days(1));
    }

    #[test]
    fn stale_learning_step_is_clamped_to_ladder() {
        let long = Scheduler::with_config(SchedulerConfig {
            learning_steps: vec![1, 5, 30],
            ..SchedulerConfig::default()
        })
        .unwrap();
        let a = long.advance(card(), None, Quality::Good, fixed_now());
        let b = long.advance(card(), Some(&a), Quality::Good, fixed_now());
        assert_eq!(b.learning_step(), 2);

        let r = Scheduler::new().advance(card(), Some(&b), Quality::Hard, fixed_now());
        assert_eq!(r.learning_step(), 1);
        assert_eq!(r.interval_minutes(), 10);
    }

    #[test]
    fn config_validation_rejects_bad_values() {
        let bad_steps = SchedulerConfig {
            learning_steps: vec![10, 1],
            ..SchedulerConfig::default()
        };
        assert_eq!(
            Scheduler::with_config(bad_steps).unwrap_err(),
            SchedulerConfigError::InvalidLearningSteps
        );

        let empty = SchedulerConfig {
            learning_steps: Vec::new(),
            ..SchedulerConfig::default()
        };
        assert_eq!(
            empty.validate(),
            Err(SchedulerConfigError::EmptyLearningSteps)
        );

        let low_ease = SchedulerConfig {
            minimum_ease: 1.0,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            low_ease.validate(),
            Err(SchedulerConfigError::InvalidMinimumEase { .. })
        ));

        let shrinking = SchedulerConfig {
            hard_multiplier: 0.9,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            shrinking.validate(),
            Err(SchedulerConfigError::InvalidFactor { name: "hard multiplier", .. })
        ));
    }

    #[test]
    fn partial_config_json_fills_defaults() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{ "mastery_threshold": 14400 }"#).unwrap();
        assert_eq!(config.mastery_threshold, days(10));
        assert_eq!(config.learning_steps, vec![1, 10]);
        assert!(config.validate().is_ok());
    }
}
