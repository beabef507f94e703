use serde::{Deserialize, Serialize};

use crate::model::{CardStatus, ProgressRecord};

/// Presentation label for a card's progress badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    New,
    Learning,
    Review,
    Mastered,
}

impl DisplayStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DisplayStatus::New => "New",
            DisplayStatus::Learning => "Learning",
            DisplayStatus::Review => "Review",
            DisplayStatus::Mastered => "Mastered",
        }
    }
}

impl From<CardStatus> for DisplayStatus {
    fn from(status: CardStatus) -> Self {
        match status {
            CardStatus::New => DisplayStatus::New,
            CardStatus::Learning => DisplayStatus::Learning,
            CardStatus::Review => DisplayStatus::Review,
            CardStatus::Mastered => DisplayStatus::Mastered,
        }
    }
}

/// Display status for a card; a card without a record is `New`.
///
/// Purely a projection of the stored status. It never feeds back into scheduling.
#[must_use]
pub fn classify(progress: Option<&ProgressRecord>) -> DisplayStatus {
    progress.map_or(DisplayStatus::New, |record| record.status().into())
}

/// Per-status totals for a deck overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryBreakdown {
    pub new: u32,
    pub learning: u32,
    pub review: u32,
    pub mastered: u32,
}

impl MasteryBreakdown {
    /// Count display statuses across `cards`, where `None` is an unrated card.
    pub fn from_progress<'a>(cards: impl IntoIterator<Item = Option<&'a ProgressRecord>>) -> Self {
        let mut out = Self::default();
        for progress in cards {
            let slot = match classify(progress) {
                DisplayStatus::New => &mut out.new,
                DisplayStatus::Learning => &mut out.learning,
                DisplayStatus::Review => &mut out.review,
                DisplayStatus::Mastered => &mut out.mastered,
            };
            *slot = slot.saturating_add(1);
        }
        out
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.new
            .saturating_add(self.learning)
            .saturating_add(self.review)
            .saturating_add(self.mastered)
    }
}
