use std::collections::HashMap;

use chrono::NaiveDate;
use srs_core::model::DeckId;
use sqlx::Row;
use tracing::debug;

use super::{
    SqliteRepository,
    mapping::{conn, deck_id_from_i64, duration_to_millis, id_i64, map_summary_row, ser},
};
use crate::repository::{
    SessionSummaryRecord, SessionSummaryRepository, SessionSummaryRow, StorageError,
};

#[async_trait::async_trait]
impl SessionSummaryRepository for SqliteRepository {
    async fn append_summary(&self, record: &SessionSummaryRecord) -> Result<i64, StorageError> {
        let summary = &record.summary;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
                INSERT INTO session_summaries (
                    studied_on, started_at, completed_at, elapsed_ms,
                    total_reviews, again, hard, good, easy
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(record.studied_on)
        .bind(record.started_at)
        .bind(record.completed_at)
        .bind(duration_to_millis(summary.elapsed())?)
        .bind(i64::from(summary.total_reviews()))
        .bind(i64::from(summary.again()))
        .bind(i64::from(summary.hard()))
        .bind(i64::from(summary.good()))
        .bind(i64::from(summary.easy()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let id = res.last_insert_rowid();

        for (position, deck_id) in record.deck_ids.iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO session_summary_decks (summary_id, position, deck_id)
                    VALUES (?1, ?2, ?3)
                ",
            )
            .bind(id)
            .bind(id_i64("position", position as u64)?)
            .bind(id_i64("deck_id", deck_id.value())?)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        debug!(summary_id = id, studied_on = %record.studied_on, "stored session summary");
        Ok(id)
    }

    async fn get_summary(&self, id: i64) -> Result<SessionSummaryRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, studied_on, started_at, completed_at, elapsed_ms,
                    total_reviews, again, hard, good, easy
                FROM session_summaries
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let deck_rows = sqlx::query(
            r"
                SELECT deck_id
                FROM session_summary_decks
                WHERE summary_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut deck_ids = Vec::with_capacity(deck_rows.len());
        for deck_row in deck_rows {
            deck_ids.push(deck_id_from_i64(
                deck_row.try_get::<i64, _>("deck_id").map_err(ser)?,
            )?);
        }

        map_summary_row(&row, deck_ids)
    }

    async fn list_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<SessionSummaryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, studied_on, started_at, completed_at, elapsed_ms,
                    total_reviews, again, hard, good, easy
                FROM session_summaries
                WHERE studied_on BETWEEN ?1 AND ?2
                ORDER BY studied_on ASC, id ASC
            ",
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let deck_rows = sqlx::query(
            r"
                SELECT d.summary_id, d.deck_id
                FROM session_summary_decks d
                JOIN session_summaries s ON s.id = d.summary_id
                WHERE s.studied_on BETWEEN ?1 AND ?2
                ORDER BY d.summary_id ASC, d.position ASC
            ",
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut decks_by_summary: HashMap<i64, Vec<DeckId>> = HashMap::new();
        for deck_row in deck_rows {
            let summary_id: i64 = deck_row.try_get("summary_id").map_err(ser)?;
            let deck_id = deck_id_from_i64(deck_row.try_get::<i64, _>("deck_id").map_err(ser)?)?;
            decks_by_summary.entry(summary_id).or_default().push(deck_id);
        }

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            let deck_ids = decks_by_summary.remove(&id).unwrap_or_default();
            out.push(SessionSummaryRow::new(id, map_summary_row(&row, deck_ids)?));
        }

        Ok(out)
    }
}
