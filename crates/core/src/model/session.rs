use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::model::Quality;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("total reviews ({total}) does not match rating counts ({sum})")]
    CountMismatch { total: u32, sum: u32 },
}

/// Reward points earned per rating: Again 0, Hard 1, Good 2, Easy 3.
#[must_use]
pub fn reward_points(quality: Quality) -> u32 {
    u32::from(quality.as_u8())
}

/// Tally of one review session: ratings per bucket plus time spent.
///
/// Not tied to a deck; the host decides where (and whether) to persist it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    again: u32,
    hard: u32,
    good: u32,
    easy: u32,
    elapsed: Duration,
}

impl SessionSummary {
    #[must_use]
    pub fn new(again: u32, hard: u32, good: u32, easy: u32, elapsed: Duration) -> Self {
        Self {
            again,
            hard,
            good,
            easy,
            elapsed,
        }
    }

    /// Rehydrate a summary from a stored row that also carries a total column.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::CountMismatch` if totals do not align.
    pub fn from_persisted(
        total_reviews: u32,
        again: u32,
        hard: u32,
        good: u32,
        easy: u32,
        elapsed: Duration,
    ) -> Result<Self, SessionSummaryError> {
        let summary = Self::new(again, hard, good, easy, elapsed);
        let sum = summary.total_reviews();
        if sum != total_reviews {
            return Err(SessionSummaryError::CountMismatch {
                total: total_reviews,
                sum,
            });
        }
        Ok(summary)
    }

    #[must_use]
    pub fn again(&self) -> u32 {
        self.again
    }

    #[must_use]
    pub fn hard(&self) -> u32 {
        self.hard
    }

    #[must_use]
    pub fn good(&self) -> u32 {
        self.good
    }

    #[must_use]
    pub fn easy(&self) -> u32 {
        self.easy
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub fn count(&self, quality: Quality) -> u32 {
        match quality {
            Quality::Again => self.again,
            Quality::Hard => self.hard,
            Quality::Good => self.good,
            Quality::Easy => self.easy,
        }
    }

    #[must_use]
    pub fn total_reviews(&self) -> u32 {
        self.again
            .saturating_add(self.hard)
            .saturating_add(self.good)
            .saturating_add(self.easy)
    }

    /// `hard*1 + good*2 + easy*3`; Again earns nothing.
    #[must_use]
    pub fn reward(&self) -> u32 {
        Quality::ALL
            .into_iter()
            .map(|q| reward_points(q).saturating_mul(self.count(q)))
            .fold(0_u32, u32::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_weights_each_bucket() {
        let summary = SessionSummary::new(4, 1, 5, 2, Duration::from_secs(300));
        assert_eq!(summary.reward(), 1 + 10 + 6);
        assert_eq!(summary.total_reviews(), 12);
    }

    #[test]
    fn again_only_session_earns_nothing() {
        let summary = SessionSummary::new(9, 0, 0, 0, Duration::ZERO);
        assert_eq!(summary.reward(), 0);
    }

    #[test]
    fn from_persisted_checks_total() {
        let err =
            SessionSummary::from_persisted(5, 1, 1, 1, 1, Duration::ZERO).unwrap_err();
        assert_eq!(err, SessionSummaryError::CountMismatch { total: 5, sum: 4 });

        let ok = SessionSummary::from_persisted(4, 1, 1, 1, 1, Duration::from_secs(9)).unwrap();
        assert_eq!(ok.elapsed(), Duration::from_secs(9));
    }
}
