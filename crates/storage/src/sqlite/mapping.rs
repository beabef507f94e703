use std::time::Duration;

use srs_core::model::{
    CardId, CardRef, CardStatus, DeckId, ProgressRecord, ProgressSnapshot, Quality, ReviewLog,
    SessionSummary,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{SessionSummaryRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn deck_id_from_i64(v: i64) -> Result<DeckId, StorageError> {
    Ok(DeckId::new(i64_to_u64("deck_id", v)?))
}

pub(crate) fn card_id_from_i64(v: i64) -> Result<CardId, StorageError> {
    Ok(CardId::new(i64_to_u64("card_id", v)?))
}

/// `(deck_id, card_id)` bind values for a card.
pub(crate) fn card_key(card: CardRef) -> Result<(i64, i64), StorageError> {
    Ok((
        id_i64("deck_id", card.deck_id.value())?,
        id_i64("card_id", card.card_id.value())?,
    ))
}

fn card_ref_from_row(row: &SqliteRow) -> Result<CardRef, StorageError> {
    Ok(CardRef::new(
        deck_id_from_i64(row.try_get::<i64, _>("deck_id").map_err(ser)?)?,
        card_id_from_i64(row.try_get::<i64, _>("card_id").map_err(ser)?)?,
    ))
}

/// Storage encoding is the rating ordinal: Again=0, Hard=1, Good=2, Easy=3.
pub(crate) fn quality_to_i64(quality: Quality) -> i64 {
    i64::from(quality.as_u8())
}

pub(crate) fn quality_from_i64(value: i64) -> Result<Quality, StorageError> {
    let raw =
        u8::try_from(value).map_err(|_| StorageError::Serialization(format!("invalid quality: {value}")))?;
    Quality::from_u8(raw).map_err(ser)
}

pub(crate) fn duration_to_millis(elapsed: Duration) -> Result<i64, StorageError> {
    i64::try_from(elapsed.as_millis())
        .map_err(|_| StorageError::Serialization("elapsed overflow".into()))
}

fn duration_from_millis(value: i64) -> Result<Duration, StorageError> {
    Ok(Duration::from_millis(i64_to_u64("elapsed_ms", value)?))
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let card = card_ref_from_row(row)?;
    let status: String = row.try_get("status").map_err(ser)?;

    let snapshot = ProgressSnapshot {
        card_id: card.card_id,
        deck_id: card.deck_id,
        status: CardStatus::parse(&status).map_err(ser)?,
        interval_minutes: u32_from_i64(
            "interval_minutes",
            row.try_get::<i64, _>("interval_minutes").map_err(ser)?,
        )?,
        ease_factor: row.try_get("ease_factor").map_err(ser)?,
        learning_step: u32_from_i64(
            "learning_step",
            row.try_get::<i64, _>("learning_step").map_err(ser)?,
        )?,
        lapses: u32_from_i64("lapses", row.try_get::<i64, _>("lapses").map_err(ser)?)?,
        correct_count: u32_from_i64(
            "correct_count",
            row.try_get::<i64, _>("correct_count").map_err(ser)?,
        )?,
        incorrect_count: u32_from_i64(
            "incorrect_count",
            row.try_get::<i64, _>("incorrect_count").map_err(ser)?,
        )?,
        last_reviewed_at: row.try_get("last_reviewed_at").map_err(ser)?,
        next_review_at: row.try_get("next_review_at").map_err(ser)?,
    };

    ProgressRecord::from_persisted(snapshot).map_err(ser)
}

pub(crate) fn map_review_log_row(row: &SqliteRow) -> Result<ReviewLog, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    Ok(ReviewLog::new(
        card_ref_from_row(row)?,
        quality_from_i64(row.try_get::<i64, _>("quality").map_err(ser)?)?,
        row.try_get("reviewed_at").map_err(ser)?,
        CardStatus::parse(&status).map_err(ser)?,
        u32_from_i64(
            "interval_minutes",
            row.try_get::<i64, _>("interval_minutes").map_err(ser)?,
        )?,
    ))
}

/// Summary columns only; deck membership lives in `session_summary_decks`.
pub(crate) fn map_summary_row(
    row: &SqliteRow,
    deck_ids: Vec<DeckId>,
) -> Result<SessionSummaryRecord, StorageError> {
    let total_reviews = u32_from_i64(
        "total_reviews",
        row.try_get::<i64, _>("total_reviews").map_err(ser)?,
    )?;
    let again = u32_from_i64("again", row.try_get::<i64, _>("again").map_err(ser)?)?;
    let hard = u32_from_i64("hard", row.try_get::<i64, _>("hard").map_err(ser)?)?;
    let good = u32_from_i64("good", row.try_get::<i64, _>("good").map_err(ser)?)?;
    let easy = u32_from_i64("easy", row.try_get::<i64, _>("easy").map_err(ser)?)?;
    let elapsed = duration_from_millis(row.try_get::<i64, _>("elapsed_ms").map_err(ser)?)?;

    let summary = SessionSummary::from_persisted(total_reviews, again, hard, good, easy, elapsed)
        .map_err(ser)?;

    Ok(SessionSummaryRecord {
        deck_ids,
        studied_on: row.try_get("studied_on").map_err(ser)?,
        started_at: row.try_get("started_at").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        summary,
    })
}
