use chrono::{DateTime, Duration, Utc};

/// Instant at which a rating is applied or a queue is built.
pub type Timestamp = DateTime<Utc>;

/// The scheduler works uniformly in minutes.
pub const MINUTES_PER_DAY: u32 = 1_440;

/// Converts whole days into the scheduler's minute unit.
#[must_use]
pub const fn days(n: u32) -> u32 {
    n.saturating_mul(MINUTES_PER_DAY)
}

/// Adds `minutes` to `at`, saturating at the latest representable instant.
#[must_use]
pub fn add_minutes(at: Timestamp, minutes: u32) -> Timestamp {
    at.checked_add_signed(Duration::minutes(i64::from(minutes)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Source of "now" for services. Tests pin it, production reads the wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(Timestamp),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: Timestamp) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, move it forward by `delta`.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `Timestamp` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> Timestamp {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_are_counted_in_minutes() {
        assert_eq!(days(1), 1_440);
        assert_eq!(days(21), 30_240);
        assert_eq!(days(u32::MAX), u32::MAX);
    }

    #[test]
    fn add_minutes_saturates_instead_of_overflowing() {
        let near_end = DateTime::<Utc>::MAX_UTC - Duration::minutes(5);
        assert_eq!(add_minutes(near_end, u32::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(
            add_minutes(fixed_now(), 10),
            fixed_now() + Duration::minutes(10)
        );
    }

    #[test]
    fn fixed_clock_only_moves_when_advanced() {
        let mut clock = fixed_clock();
        assert_eq!(clock.now(), fixed_now());
        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), fixed_now() + Duration::days(2));

        let mut wall = Clock::default();
        wall.advance(Duration::days(2));
        assert!(!wall.is_fixed());
    }
}
