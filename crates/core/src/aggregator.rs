use std::time::Duration;

use crate::model::{Quality, SessionSummary};

/// Running tally of ratings given during one session.
///
/// `finalize` only reads the counters, so it can be called repeatedly and
/// returns the same summary until another rating is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionAggregator {
    again: u32,
    hard: u32,
    good: u32,
    easy: u32,
}

impl SessionAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, quality: Quality) {
        let slot = match quality {
            Quality::Again => &mut self.again,
            Quality::Hard => &mut self.hard,
            Quality::Good => &mut self.good,
            Quality::Easy => &mut self.easy,
        };
        *slot = slot.saturating_add(1);
    }

    /// Number of ratings recorded so far.
    #[must_use]
    pub fn recorded(&self) -> u32 {
        self.again
            .saturating_add(self.hard)
            .saturating_add(self.good)
            .saturating_add(self.easy)
    }

    #[must_use]
    pub fn finalize(&self, elapsed: Duration) -> SessionSummary {
        SessionSummary::new(self.again, self.hard, self.good, self.easy, elapsed)
    }
}

impl Extend<Quality> for SessionAggregator {
    fn extend<T: IntoIterator<Item = Quality>>(&mut self, iter: T) {
        for quality in iter {
            self.record(quality);
        }
    }
}

impl FromIterator<Quality> for SessionAggregator {
    fn from_iter<T: IntoIterator<Item = Quality>>(iter: T) -> Self {
        let mut aggregator = Self::new();
        aggregator.extend(iter);
        aggregator
    }
}
