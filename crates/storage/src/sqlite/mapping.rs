use chrono::{DateTime, NaiveDate, Utc};
use quiz_core::model::{
    ChoiceIndex, GameId, GameRecord, Profile, Question, QuestionId, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_str(raw: &str) -> Result<UserId, StorageError> {
    raw.parse::<UserId>().map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id = QuestionId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?);
    let correct_raw: i64 = row.try_get("correct_choice").map_err(ser)?;
    let correct = u8::try_from(correct_raw)
        .map_err(ser)
        .and_then(|v| ChoiceIndex::new(v).map_err(ser))?;

    let choices = [
        row.try_get::<String, _>("choice1").map_err(ser)?,
        row.try_get::<String, _>("choice2").map_err(ser)?,
        row.try_get::<String, _>("choice3").map_err(ser)?,
        row.try_get::<String, _>("choice4").map_err(ser)?,
    ];

    Question::new(
        id,
        row.try_get::<String, _>("question").map_err(ser)?,
        choices,
        correct,
    )
    .map_err(ser)
}

pub(crate) fn map_profile_row(row: &SqliteRow) -> Result<Profile, StorageError> {
    let id = user_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?;
    let games: i64 = row.try_get("games_played_today").map_err(ser)?;
    let last_game_date: Option<NaiveDate> = row.try_get("last_game_date").map_err(ser)?;

    Profile::from_persisted(
        id,
        row.try_get::<String, _>("pseudo").map_err(ser)?,
        row.try_get::<Option<String>, _>("phone").map_err(ser)?,
        row.try_get::<i64, _>("balance").map_err(ser)?,
        u32_from_i64("games_played_today", games)?,
        last_game_date,
    )
    .map_err(ser)
}

pub(crate) fn map_game_row(row: &SqliteRow) -> Result<GameRecord, StorageError> {
    let id = GameId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?);
    let user_id = user_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let score = u32_from_i64("score", row.try_get("score").map_err(ser)?)?;
    let played_at: DateTime<Utc> = row.try_get("played_at").map_err(ser)?;

    Ok(GameRecord::from_persisted(
        id,
        user_id,
        score,
        row.try_get::<i64, _>("gain").map_err(ser)?,
        played_at,
    ))
}
