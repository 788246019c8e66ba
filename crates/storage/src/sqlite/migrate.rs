use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS modules (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            order_index INTEGER NOT NULL CHECK (order_index >= 0)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS lessons (
            id INTEGER PRIMARY KEY,
            module_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            order_index INTEGER NOT NULL CHECK (order_index >= 0),
            kind TEXT NOT NULL,
            xp_value INTEGER NOT NULL CHECK (xp_value >= 0),
            FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS module_intros (
            module_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            context TEXT NOT NULL,
            media_uri TEXT,
            media_kind TEXT,
            FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS readings (
            lesson_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            media_uri TEXT,
            media_kind TEXT,
            FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS reading_sections (
            lesson_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            heading TEXT,
            body TEXT NOT NULL,
            PRIMARY KEY (lesson_id, position),
            FOREIGN KEY (lesson_id) REFERENCES readings(lesson_id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS practice_sets (
            lesson_id INTEGER PRIMARY KEY,
            FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS practice_questions (
            lesson_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            prompt TEXT NOT NULL,
            options TEXT NOT NULL,
            correct_index INTEGER NOT NULL CHECK (correct_index >= 0),
            explanation TEXT,
            PRIMARY KEY (lesson_id, position),
            FOREIGN KEY (lesson_id) REFERENCES practice_sets(lesson_id) ON DELETE CASCADE
        );
    ",
    // No foreign key: completions survive catalog edits and are intersected
    // with the catalog when progress is computed.
    r"
        CREATE TABLE IF NOT EXISTS completions (
            lesson_id INTEGER PRIMARY KEY,
            completed_at TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_lessons_module_order
            ON lessons(module_id, order_index);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_completions_completed_at
            ON completions(completed_at, lesson_id);
    ",
];

/// Runs versioned migrations, each inside its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: catalog, content and progress tables.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
