use std::collections::HashSet;

use lessons_core::model::{Catalog, CatalogDraft, Lesson, LessonDraft, Module, ModuleDraft};
use sqlx::Row;
use sqlx::SqliteConnection;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    conn, lesson_id_from_i64, lesson_id_to_i64, module_id_from_i64, module_id_to_i64,
    parse_lesson_kind, ser, u32_from_i64,
};
use crate::repository::{CatalogRepository, StorageError};

#[async_trait::async_trait]
impl CatalogRepository for SqliteRepository {
    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        write_module(&mut db, module).await
    }

    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        write_lesson(&mut db, lesson).await
    }

    async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StorageError> {
        let keep_modules: HashSet<i64> = catalog
            .modules()
            .iter()
            .map(|m| module_id_to_i64(m.id()))
            .collect::<Result<_, _>>()?;
        let keep_lessons: HashSet<i64> = catalog
            .lessons()
            .map(|l| lesson_id_to_i64(l.id()))
            .collect::<Result<_, _>>()?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        // Content rows of dropped lessons and modules go with them via ON DELETE CASCADE.
        let stale_lessons: Vec<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM lessons")
            .fetch_all(&mut *tx)
            .await
            .map_err(conn)?
            .into_iter()
            .filter(|id| !keep_lessons.contains(id))
            .collect();
        for id in &stale_lessons {
            sqlx::query("DELETE FROM lessons WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        let stale_modules: Vec<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM modules")
            .fetch_all(&mut *tx)
            .await
            .map_err(conn)?
            .into_iter()
            .filter(|id| !keep_modules.contains(id))
            .collect();
        for id in &stale_modules {
            sqlx::query("DELETE FROM modules WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        for module in catalog.modules() {
            write_module(&mut tx, module).await?;
            for lesson in module.lessons() {
                write_lesson(&mut tx, lesson).await?;
            }
        }

        tx.commit().await.map_err(conn)?;

        tracing::debug!(
            modules = keep_modules.len(),
            lessons = keep_lessons.len(),
            removed_modules = stale_modules.len(),
            removed_lessons = stale_lessons.len(),
            "catalog replaced"
        );
        Ok(())
    }

    async fn load_catalog_draft(&self) -> Result<CatalogDraft, StorageError> {
        let module_rows = sqlx::query(
            r"
            SELECT id, title, description, order_index
            FROM modules
            ORDER BY order_index ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut modules = Vec::with_capacity(module_rows.len());
        for row in &module_rows {
            modules.push(module_from_row(row)?);
        }

        let lesson_rows = sqlx::query(
            r"
            SELECT id, module_id, title, order_index, kind, xp_value
            FROM lessons
            ORDER BY module_id ASC, order_index ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        for row in &lesson_rows {
            let module_id = module_id_from_i64(row.try_get::<i64, _>("module_id").map_err(ser)?)?;
            let lesson = lesson_from_row(row)?;
            if let Some(module) = modules.iter_mut().find(|m| m.id == module_id) {
                module.lessons.push(lesson);
            }
        }

        tracing::debug!(
            modules = modules.len(),
            lessons = lesson_rows.len(),
            "loaded catalog rows"
        );
        Ok(CatalogDraft { modules })
    }
}

async fn write_module(db: &mut SqliteConnection, module: &Module) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO modules (id, title, description, order_index)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            order_index = excluded.order_index
        ",
    )
    .bind(module_id_to_i64(module.id())?)
    .bind(module.title())
    .bind(module.description())
    .bind(i64::from(module.order_index()))
    .execute(db)
    .await
    .map_err(conn)?;

    Ok(())
}

async fn write_lesson(db: &mut SqliteConnection, lesson: &Lesson) -> Result<(), StorageError> {
    let res = sqlx::query(
        r"
        INSERT INTO lessons (id, module_id, title, order_index, kind, xp_value)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            module_id = excluded.module_id,
            title = excluded.title,
            order_index = excluded.order_index,
            kind = excluded.kind,
            xp_value = excluded.xp_value
        ",
    )
    .bind(lesson_id_to_i64(lesson.id())?)
    .bind(module_id_to_i64(lesson.module_id())?)
    .bind(lesson.title())
    .bind(i64::from(lesson.order_index()))
    .bind(lesson.kind().as_str())
    .bind(i64::from(lesson.xp_value()))
    .execute(db)
    .await;

    match res {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(err)) if err.is_foreign_key_violation() => {
            Err(StorageError::Conflict)
        }
        Err(e) => Err(conn(e)),
    }
}

fn module_from_row(row: &SqliteRow) -> Result<ModuleDraft, StorageError> {
    Ok(ModuleDraft {
        id: module_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        order_index: u32_from_i64("order_index", row.try_get("order_index").map_err(ser)?)?,
        lessons: Vec::new(),
    })
}

fn lesson_from_row(row: &SqliteRow) -> Result<LessonDraft, StorageError> {
    let kind: String = row.try_get("kind").map_err(ser)?;
    Ok(LessonDraft {
        id: lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        order_index: u32_from_i64("order_index", row.try_get("order_index").map_err(ser)?)?,
        kind: parse_lesson_kind(&kind)?,
        xp_value: u32_from_i64("xp_value", row.try_get("xp_value").map_err(ser)?)?,
    })
}
