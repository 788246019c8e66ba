use lessons_core::model::{
    LessonId, ModuleId, ModuleIntro, PracticeSet, Question, ReadingContent, ReadingSection,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    conn, lesson_id_to_i64, media_from_columns, media_to_columns, module_id_to_i64,
    options_from_json, options_to_json, ser, usize_from_i64, usize_to_i64,
};
use crate::repository::{ContentRepository, StorageError};

fn write_err(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::Conflict,
        other => conn(other),
    }
}

#[async_trait::async_trait]
impl ContentRepository for SqliteRepository {
    async fn save_module_intro(&self, intro: &ModuleIntro) -> Result<(), StorageError> {
        let (media_uri, media_kind) = media_to_columns(intro.media());

        sqlx::query(
            r"
            INSERT INTO module_intros (module_id, title, context, media_uri, media_kind)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(module_id) DO UPDATE SET
                title = excluded.title,
                context = excluded.context,
                media_uri = excluded.media_uri,
                media_kind = excluded.media_kind
            ",
        )
        .bind(module_id_to_i64(intro.module_id())?)
        .bind(intro.title())
        .bind(intro.context())
        .bind(media_uri)
        .bind(media_kind)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        Ok(())
    }

    async fn save_reading(&self, reading: &ReadingContent) -> Result<(), StorageError> {
        let lesson_id = lesson_id_to_i64(reading.lesson_id())?;
        let (media_uri, media_kind) = media_to_columns(reading.media());

        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO readings (lesson_id, title, media_uri, media_kind)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(lesson_id) DO UPDATE SET
                title = excluded.title,
                media_uri = excluded.media_uri,
                media_kind = excluded.media_kind
            ",
        )
        .bind(lesson_id)
        .bind(reading.title())
        .bind(media_uri)
        .bind(media_kind)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        sqlx::query("DELETE FROM reading_sections WHERE lesson_id = ?1")
            .bind(lesson_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, section) in reading.sections().iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO reading_sections (lesson_id, position, heading, body)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(lesson_id)
            .bind(usize_to_i64("position", position)?)
            .bind(section.heading.as_deref())
            .bind(section.body.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn save_practice(&self, practice: &PracticeSet) -> Result<(), StorageError> {
        let lesson_id = lesson_id_to_i64(practice.lesson_id())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO practice_sets (lesson_id) VALUES (?1)
            ON CONFLICT(lesson_id) DO NOTHING
            ",
        )
        .bind(lesson_id)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        sqlx::query("DELETE FROM practice_questions WHERE lesson_id = ?1")
            .bind(lesson_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, question) in practice.questions().iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO practice_questions
                    (lesson_id, position, prompt, options, correct_index, explanation)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(lesson_id)
            .bind(usize_to_i64("position", position)?)
            .bind(question.prompt())
            .bind(options_to_json(question.options())?)
            .bind(usize_to_i64("correct_index", question.correct_index())?)
            .bind(question.explanation())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn module_intro(&self, module: ModuleId) -> Result<ModuleIntro, StorageError> {
        let row = sqlx::query(
            r"
            SELECT title, context, media_uri, media_kind
            FROM module_intros WHERE module_id = ?1
            ",
        )
        .bind(module_id_to_i64(module)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let media = media_from_columns(
            row.try_get("media_uri").map_err(ser)?,
            row.try_get("media_kind").map_err(ser)?,
        )?;
        ModuleIntro::new(
            module,
            row.try_get::<String, _>("title").map_err(ser)?,
            row.try_get::<String, _>("context").map_err(ser)?,
            media,
        )
        .map_err(ser)
    }

    async fn reading(&self, lesson: LessonId) -> Result<ReadingContent, StorageError> {
        let lesson_id = lesson_id_to_i64(lesson)?;

        let row = sqlx::query(
            r"
            SELECT title, media_uri, media_kind
            FROM readings WHERE lesson_id = ?1
            ",
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let section_rows = sqlx::query(
            r"
            SELECT heading, body
            FROM reading_sections
            WHERE lesson_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut sections = Vec::with_capacity(section_rows.len());
        for section in &section_rows {
            sections.push(ReadingSection::new(
                section.try_get("heading").map_err(ser)?,
                section.try_get::<String, _>("body").map_err(ser)?,
            ));
        }

        let media = media_from_columns(
            row.try_get("media_uri").map_err(ser)?,
            row.try_get("media_kind").map_err(ser)?,
        )?;
        ReadingContent::new(
            lesson,
            row.try_get::<String, _>("title").map_err(ser)?,
            sections,
            media,
        )
        .map_err(ser)
    }

    async fn practice(&self, lesson: LessonId) -> Result<PracticeSet, StorageError> {
        let lesson_id = lesson_id_to_i64(lesson)?;

        sqlx::query("SELECT 1 FROM practice_sets WHERE lesson_id = ?1")
            .bind(lesson_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        let rows = sqlx::query(
            r"
            SELECT position, prompt, options, correct_index, explanation
            FROM practice_questions
            WHERE lesson_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in &rows {
            let options: String = row.try_get("options").map_err(ser)?;
            questions.push(
                Question::new(
                    usize_from_i64("position", row.try_get("position").map_err(ser)?)?,
                    row.try_get::<String, _>("prompt").map_err(ser)?,
                    options_from_json(&options)?,
                    usize_from_i64("correct_index", row.try_get("correct_index").map_err(ser)?)?,
                    row.try_get("explanation").map_err(ser)?,
                )
                .map_err(ser)?,
            );
        }

        Ok(PracticeSet::new(lesson, questions))
    }
}
