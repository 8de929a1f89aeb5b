use quiz_core::model::{GameId, GameRecord, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_game_row};
use crate::repository::{GameRepository, NewGameRecord, StorageError};

#[async_trait::async_trait]
impl GameRepository for SqliteRepository {
    async fn record_game(&self, game: NewGameRecord) -> Result<GameId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO games (user_id, score, gain, played_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(game.user_id.to_string())
        .bind(i64::from(game.score))
        .bind(game.gain)
        .bind(game.played_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
            other => conn(other),
        })?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("game id sign overflow".into()))?;
        Ok(GameId::new(id))
    }

    async fn recent_games(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<GameRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, score, gain, played_at
                FROM games
                WHERE user_id = ?1
                ORDER BY played_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut games = Vec::with_capacity(rows.len());
        for row in rows {
            games.push(map_game_row(&row)?);
        }
        Ok(games)
    }
}
