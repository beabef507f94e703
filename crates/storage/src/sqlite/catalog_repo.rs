use srs_core::model::{CardRef, DeckId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{card_id_from_i64, card_key, conn, id_i64, ser},
};
use crate::repository::{DeckCatalog, StorageError};

#[async_trait::async_trait]
impl DeckCatalog for SqliteRepository {
    async fn add_card(&self, card: CardRef) -> Result<(), StorageError> {
        let (deck_id, card_id) = card_key(card)?;
        sqlx::query(
            r"
            INSERT INTO deck_cards (deck_id, card_id)
            VALUES (?1, ?2)
            ON CONFLICT(deck_id, card_id) DO NOTHING
            ",
        )
        .bind(deck_id)
        .bind(card_id)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn card_ids(&self, deck: DeckId) -> Result<Vec<CardRef>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT card_id
            FROM deck_cards
            WHERE deck_id = ?1
            ORDER BY seq ASC
            ",
        )
        .bind(id_i64("deck_id", deck.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let card_id = card_id_from_i64(row.try_get::<i64, _>("card_id").map_err(ser)?)?;
                Ok(CardRef::new(deck, card_id))
            })
            .collect()
    }
}
