use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CardRef;
use crate::model::progress::CardStatus;
use crate::time::Timestamp;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur while interpreting a learner's rating.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("invalid review quality value: {0} (expected 0-3)")]
    InvalidQuality(u8),
}

//
// ─── QUALITY ──────────────────────────────────────────────────────────────────
//

/// Four-level recall rating supplied by the learner after seeing the answer.
///
/// Ordinals are fixed: `Again = 0`, `Hard = 1`, `Good = 2`, `Easy = 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Failed to recall the answer. Card will be shown again soon.
    Again,
    /// Recalled with significant difficulty.
    Hard,
    /// Recalled correctly with appropriate effort.
    Good,
    /// Recalled instantly.
    Easy,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Again, Quality::Hard, Quality::Good, Quality::Easy];

    /// Converts a numeric rating (0-3) to a `Quality`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidQuality` if the value is not in the range 0-3.
    pub fn from_u8(value: u8) -> Result<Self, ReviewError> {
        match value {
            0 => Ok(Self::Again),
            1 => Ok(Self::Hard),
            2 => Ok(Self::Good),
            3 => Ok(Self::Easy),
            _ => Err(ReviewError::InvalidQuality(value)),
        }
    }

    /// Numeric ordinal of this rating.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Quality::Again => 0,
            Quality::Hard => 1,
            Quality::Good => 2,
            Quality::Easy => 3,
        }
    }

    /// Any rating above `Again` counts as a successful recall for lifetime counters.
    #[must_use]
    pub fn is_pass(self) -> bool {
        !matches!(self, Quality::Again)
    }
}

impl TryFrom<u8> for Quality {
    type Error = ReviewError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value)
    }
}

//
// ─── REVIEW LOG ───────────────────────────────────────────────────────────────
//

/// Record of a single rating event and where it left the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub card: CardRef,
    pub quality: Quality,
    pub reviewed_at: Timestamp,
    pub status: CardStatus,
    pub interval_minutes: u32,
}

impl ReviewLog {
    #[must_use]
    pub fn new(
        card: CardRef,
        quality: Quality,
        reviewed_at: Timestamp,
        status: CardStatus,
        interval_minutes: u32,
    ) -> Self {
        Self {
            card,
            quality,
            reviewed_at,
            status,
            interval_minutes,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
