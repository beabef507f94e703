//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use srs_core::model::ReviewError;
use srs_core::scheduler::{SchedulerConfigError, SchedulerError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<SchedulerConfigError> for ReviewServiceError {
    fn from(err: SchedulerConfigError) -> Self {
        Self::Scheduler(err.into())
    }
}

impl From<ReviewError> for ReviewServiceError {
    fn from(err: ReviewError) -> Self {
        Self::Scheduler(err.into())
    }
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no cards available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("session is not complete yet")]
    NotComplete,
    #[error(transparent)]
    Quality(#[from] ReviewError),
    #[error(transparent)]
    Review(#[from] ReviewServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error("date out of range")]
    DateOutOfRange,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading host settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be a whole number of minutes, got {value:?}")]
    InvalidOffset { key: &'static str, value: String },
    #[error("failed to read scheduler config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse scheduler config: {0}")]
    ParseConfig(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidConfig(#[from] SchedulerConfigError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
