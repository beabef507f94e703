use srs_core::model::{CardRef, ProgressRecord, ReviewLog};
use sqlx::{Executor, Sqlite};

use super::{
    SqliteRepository,
    mapping::{card_key, conn, map_review_log_row, quality_to_i64},
    progress_repo::upsert_progress,
};
use crate::repository::{ReviewLogRepository, ReviewPersistence, StorageError};

async fn insert_log<'e, E>(executor: E, log: &ReviewLog) -> Result<i64, StorageError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (deck_id, card_id) = card_key(log.card)?;
    let res = sqlx::query(
        r"
            INSERT INTO review_logs (
                deck_id, card_id, quality, reviewed_at, status, interval_minutes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
    )
    .bind(deck_id)
    .bind(card_id)
    .bind(quality_to_i64(log.quality))
    .bind(log.reviewed_at)
    .bind(log.status.as_str())
    .bind(i64::from(log.interval_minutes))
    .execute(executor)
    .await
    .map_err(conn)?;

    Ok(res.last_insert_rowid())
}

#[async_trait::async_trait]
impl ReviewLogRepository for SqliteRepository {
    async fn append_log(&self, log: &ReviewLog) -> Result<i64, StorageError> {
        insert_log(&self.pool, log).await
    }

    async fn logs_for_card(&self, card: CardRef) -> Result<Vec<ReviewLog>, StorageError> {
        let (deck_id, card_id) = card_key(card)?;

        let rows = sqlx::query(
            r"
                SELECT deck_id, card_id, quality, reviewed_at, status, interval_minutes
                FROM review_logs
                WHERE deck_id = ?1 AND card_id = ?2
                ORDER BY reviewed_at ASC, id ASC
            ",
        )
        .bind(deck_id)
        .bind(card_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_review_log_row(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl ReviewPersistence for SqliteRepository {
    async fn apply_review(
        &self,
        record: &ProgressRecord,
        log: &ReviewLog,
    ) -> Result<i64, StorageError> {
        if log.card != record.card() {
            return Err(StorageError::Conflict);
        }

        let mut tx = self.pool.begin().await.map_err(conn)?;
        upsert_progress(&mut *tx, record).await?;
        let log_id = insert_log(&mut *tx, log).await?;
        tx.commit().await.map_err(conn)?;

        Ok(log_id)
    }
}
