use quiz_core::model::Question;

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_question_row};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let [c1, c2, c3, c4] = question.choices().clone();

        sqlx::query(
            r"
            INSERT INTO questions (id, question, choice1, choice2, choice3, choice4, correct_choice)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                question = excluded.question,
                choice1 = excluded.choice1,
                choice2 = excluded.choice2,
                choice3 = excluded.choice3,
                choice4 = excluded.choice4,
                correct_choice = excluded.correct_choice
            ",
        )
        .bind(id_i64("question_id", question.id().value())?)
        .bind(question.prompt().to_owned())
        .bind(c1)
        .bind(c2)
        .bind(c3)
        .bind(c4)
        .bind(i64::from(question.correct_choice().value()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, question, choice1, choice2, choice3, choice4, correct_choice
            FROM questions
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(map_question_row(&row)?);
        }
        Ok(questions)
    }
}
