#![forbid(unsafe_code)]

pub mod aggregator;
pub mod error;
pub mod mastery;
pub mod model;
pub mod queue;
pub mod scheduler;
pub mod stats;
pub mod time;

pub use aggregator::SessionAggregator;
pub use error::Error;
pub use mastery::{DisplayStatus, MasteryBreakdown, classify};
pub use queue::{DueQueue, DueQueueBuilder, build_queue};
pub use scheduler::{ScheduledStates, Scheduler, SchedulerConfig};
pub use stats::{StatsRollup, WeeklyStats};
pub use time::{Clock, Timestamp};
