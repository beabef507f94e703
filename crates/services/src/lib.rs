#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod review_service;
pub mod sessions;
pub mod settings;
pub mod stats_service;

pub use srs_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ReviewServiceError, SessionError, SettingsError, StatsError};
pub use review_service::{PersistedReview, ReviewResult, ReviewService};
pub use settings::SrsSettings;
pub use stats_service::{DashboardStats, StatsService};

pub use sessions::{
    DEFAULT_NEW_CARD_CAP, SessionAnswerResult, SessionBuilder, SessionLoopService, SessionPlan,
    SessionProgress, SessionReview, SessionService, local_date,
};
