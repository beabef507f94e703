use thiserror::Error;

use crate::model::{ProgressError, ReviewError, SessionSummaryError};
use crate::scheduler::{SchedulerConfigError, SchedulerError};

/// Umbrella error for callers that do not care which core check failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    SchedulerConfig(#[from] SchedulerConfigError),
    #[error(transparent)]
    SessionSummary(#[from] SessionSummaryError),
}

impl From<SchedulerError> for Error {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Review(e) => Error::Review(e),
            SchedulerError::Config(e) => Error::SchedulerConfig(e),
        }
    }
}
