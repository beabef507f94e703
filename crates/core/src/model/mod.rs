mod ids;
mod progress;
mod review;
mod session;

pub use ids::{CardId, CardRef, DeckId, ParseIdError};

pub use progress::{
    CardStatus, DEFAULT_EASE, EASE_FLOOR, ProgressError, ProgressRecord, ProgressSnapshot,
};
pub use review::{Quality, ReviewError, ReviewLog};
pub use session::{SessionSummary, SessionSummaryError, reward_points};
