use quiz_core::model::{Profile, ProfileUpdate, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_profile_row};
use crate::repository::{ProfileRepository, StorageError};

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO profiles (id, pseudo, phone, balance, games_played_today, last_game_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                pseudo = excluded.pseudo,
                phone = excluded.phone,
                balance = excluded.balance,
                games_played_today = excluded.games_played_today,
                last_game_date = excluded.last_game_date
            ",
        )
        .bind(profile.id().to_string())
        .bind(profile.pseudo().to_owned())
        .bind(profile.phone().map(ToOwned::to_owned))
        .bind(profile.balance())
        .bind(i64::from(profile.games_played_today()))
        .bind(profile.last_game_date())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;

        Ok(())
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Profile, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, pseudo, phone, balance, games_played_today, last_game_date
            FROM profiles WHERE id = ?1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_profile_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn update_after_game(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE profiles
            SET balance = ?2, games_played_today = ?3, last_game_date = ?4
            WHERE id = ?1
            ",
        )
        .bind(user_id.to_string())
        .bind(update.balance)
        .bind(i64::from(update.games_played_today))
        .bind(update.last_game_date)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
