mod plan;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionBuilder, SessionPlan};
pub use progress::SessionProgress;
pub use service::{SessionReview, SessionService, local_date};
pub use workflow::{DEFAULT_NEW_CARD_CAP, SessionAnswerResult, SessionLoopService};
