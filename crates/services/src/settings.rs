use std::env;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use srs_core::scheduler::SchedulerConfig;

use crate::error::SettingsError;
use crate::sessions::DEFAULT_NEW_CARD_CAP;

pub const DEFAULT_DB_URL: &str = "sqlite://srs.sqlite3";

const DB_URL: &str = "SRS_DB_URL";
const NEW_CARD_CAP: &str = "SRS_NEW_CARD_CAP";
const REVIEW_LIMIT: &str = "SRS_REVIEW_LIMIT";
const UTC_OFFSET_MINUTES: &str = "SRS_UTC_OFFSET_MINUTES";
const SCHEDULER_CONFIG: &str = "SRS_SCHEDULER_CONFIG";

/// Host settings for the review services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrsSettings {
    pub database_url: String,
    pub new_card_cap: usize,
    pub review_limit: Option<usize>,
    /// Learner's offset from UTC, used to date sessions.
    pub utc_offset_minutes: i32,
    pub scheduler: SchedulerConfig,
}

impl Default for SrsSettings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DB_URL.into(),
            new_card_cap: DEFAULT_NEW_CARD_CAP,
            review_limit: None,
            utc_offset_minutes: 0,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl SrsSettings {
    /// Load settings from `SRS_*` environment variables, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a variable is malformed or the scheduler
    /// config file cannot be read, parsed or validated.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See `from_env`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(url) = non_empty(lookup(DB_URL)) {
            settings.database_url = normalize_sqlite_url(url);
        }
        if let Some(value) = non_empty(lookup(NEW_CARD_CAP)) {
            settings.new_card_cap = parse_count(NEW_CARD_CAP, &value)?;
        }
        if let Some(value) = non_empty(lookup(REVIEW_LIMIT)) {
            settings.review_limit = Some(parse_count(REVIEW_LIMIT, &value)?);
        }
        if let Some(value) = non_empty(lookup(UTC_OFFSET_MINUTES)) {
            settings.utc_offset_minutes = parse_offset(&value)?;
        }
        if let Some(path) = non_empty(lookup(SCHEDULER_CONFIG)) {
            settings.scheduler = load_scheduler_config(PathBuf::from(path))?;
        }

        Ok(settings)
    }

    /// The configured offset as a `FixedOffset`.
    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        offset_from_minutes(self.utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_count(key: &'static str, value: &str) -> Result<usize, SettingsError> {
    value.parse().map_err(|_| SettingsError::InvalidNumber {
        key,
        value: value.to_owned(),
    })
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

fn parse_offset(value: &str) -> Result<i32, SettingsError> {
    let invalid = || SettingsError::InvalidOffset {
        key: UTC_OFFSET_MINUTES,
        value: value.to_owned(),
    };
    let minutes: i32 = value.parse().map_err(|_| invalid())?;
    offset_from_minutes(minutes).ok_or_else(invalid)?;
    Ok(minutes)
}

/// Accepts bare paths as well as `sqlite:` URLs.
fn normalize_sqlite_url(value: String) -> String {
    if value.starts_with("sqlite:") {
        value
    } else {
        format!("sqlite://{value}")
    }
}

fn load_scheduler_config(path: PathBuf) -> Result<SchedulerConfig, SettingsError> {
    let raw = std::fs::read_to_string(&path)
        .map_err(|source| SettingsError::ReadConfig { path, source })?;
    let config: SchedulerConfig = serde_json::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}
