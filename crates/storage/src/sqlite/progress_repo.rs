use std::collections::HashSet;

use chrono::{DateTime, Utc};
use lessons_core::model::LessonId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, lesson_id_from_i64, lesson_id_to_i64, ser};
use crate::repository::{CompletionRecord, ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn contains(&self, lesson: LessonId) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM completions WHERE lesson_id = ?1")
            .bind(lesson_id_to_i64(lesson)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        Ok(row.is_some())
    }

    async fn add(
        &self,
        lesson: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO completions (lesson_id, completed_at)
            VALUES (?1, ?2)
            ON CONFLICT(lesson_id) DO NOTHING
            ",
        )
        .bind(lesson_id_to_i64(lesson)?)
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.rows_affected() == 1)
    }

    async fn all_ids(&self) -> Result<HashSet<LessonId>, StorageError> {
        let rows = sqlx::query("SELECT lesson_id FROM completions")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            ids.insert(lesson_id_from_i64(row.try_get("lesson_id").map_err(ser)?)?);
        }
        Ok(ids)
    }

    async fn list_completions(&self) -> Result<Vec<CompletionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT lesson_id, completed_at
            FROM completions
            ORDER BY completed_at ASC, lesson_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(CompletionRecord {
                lesson_id: lesson_id_from_i64(row.try_get("lesson_id").map_err(ser)?)?,
                completed_at: row.try_get("completed_at").map_err(ser)?,
            });
        }
        Ok(records)
    }
}
