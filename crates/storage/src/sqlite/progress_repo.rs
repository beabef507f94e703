use std::collections::HashMap;

use srs_core::model::{CardRef, ProgressRecord};
use sqlx::{Executor, Sqlite};

use super::{
    SqliteRepository,
    mapping::{card_key, conn, map_progress_row},
};
use crate::repository::{ProgressRepository, StorageError};

// Keeps each IN-list well under SQLite's bind parameter limit.
const LOAD_CHUNK: usize = 200;

/// Insert or overwrite one progress row. Last write wins.
pub(crate) async fn upsert_progress<'e, E>(
    executor: E,
    record: &ProgressRecord,
) -> Result<(), StorageError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (deck_id, card_id) = card_key(record.card())?;
    sqlx::query(
        r"
        INSERT INTO progress (
            deck_id, card_id, status, interval_minutes, ease_factor, learning_step,
            lapses, correct_count, incorrect_count, last_reviewed_at, next_review_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(deck_id, card_id) DO UPDATE SET
            status = excluded.status,
            interval_minutes = excluded.interval_minutes,
            ease_factor = excluded.ease_factor,
            learning_step = excluded.learning_step,
            lapses = excluded.lapses,
            correct_count = excluded.correct_count,
            incorrect_count = excluded.incorrect_count,
            last_reviewed_at = excluded.last_reviewed_at,
            next_review_at = excluded.next_review_at
        ",
    )
    .bind(deck_id)
    .bind(card_id)
    .bind(record.status().as_str())
    .bind(i64::from(record.interval_minutes()))
    .bind(record.ease_factor())
    .bind(i64::from(record.learning_step()))
    .bind(i64::from(record.lapses()))
    .bind(i64::from(record.correct_count()))
    .bind(i64::from(record.incorrect_count()))
    .bind(record.last_reviewed_at())
    .bind(record.next_review_at())
    .execute(executor)
    .await
    .map_err(conn)?;

    Ok(())
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load(&self, card: CardRef) -> Result<Option<ProgressRecord>, StorageError> {
        let (deck_id, card_id) = card_key(card)?;
        let row = sqlx::query(
            r"
            SELECT
                deck_id, card_id, status, interval_minutes, ease_factor, learning_step,
                lapses, correct_count, incorrect_count, last_reviewed_at, next_review_at
            FROM progress
            WHERE deck_id = ?1 AND card_id = ?2
            ",
        )
        .bind(deck_id)
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn save(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        upsert_progress(&self.pool, record).await
    }

    async fn load_many(
        &self,
        cards: &[CardRef],
    ) -> Result<HashMap<CardRef, ProgressRecord>, StorageError> {
        let mut out = HashMap::with_capacity(cards.len());

        for chunk in cards.chunks(LOAD_CHUNK) {
            let mut sql = String::from(
                r"
            SELECT
                deck_id, card_id, status, interval_minutes, ease_factor, learning_step,
                lapses, correct_count, incorrect_count, last_reviewed_at, next_review_at
            FROM progress
            WHERE (deck_id, card_id) IN (VALUES
                ",
            );
            for i in 0..chunk.len() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&format!("(?{}, ?{})", i * 2 + 1, i * 2 + 2));
            }
            sql.push(')');

            let mut query = sqlx::query(&sql);
            for card in chunk {
                let (deck_id, card_id) = card_key(*card)?;
                query = query.bind(deck_id).bind(card_id);
            }

            let rows = query.fetch_all(&self.pool).await.map_err(conn)?;
            for row in rows {
                let record = map_progress_row(&row)?;
                out.insert(record.card(), record);
            }
        }

        Ok(out)
    }
}
