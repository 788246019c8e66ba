use std::path::{Path, PathBuf};

use super::SqliteInitError;

pub const MEMORY_URL: &str = "sqlite::memory:";

/// Turns `sqlite:relative.db` or a bare path into an absolute `sqlite://` URL.
///
/// `sqlite::memory:` and URLs already in `sqlite://` form are returned as is.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == MEMORY_URL || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Creates the database file and its parent directories if missing.
///
/// # Errors
///
/// Returns `SqliteInitError::InvalidUrl` for a URL without a file path, or
/// `SqliteInitError::Io` if the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), SqliteInitError> {
    if db_url == MEMORY_URL || db_url.contains("mode=memory") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| SqliteInitError::InvalidUrl(db_url.to_owned()))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(SqliteInitError::InvalidUrl(db_url.to_owned()));
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_memory_and_absolute_urls() {
        assert_eq!(normalize_sqlite_url(MEMORY_URL), MEMORY_URL);
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/lessons.db"),
            "sqlite:///tmp/lessons.db"
        );
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:dev.sqlite3");
        let path = url.strip_prefix("sqlite://").unwrap();
        assert!(Path::new(path).is_absolute());
        assert!(path.ends_with("dev.sqlite3"));
    }

    #[test]
    fn prepare_rejects_urls_without_a_path() {
        assert!(matches!(
            prepare_sqlite_file("postgres://localhost/db"),
            Err(SqliteInitError::InvalidUrl(_))
        ));
        assert!(prepare_sqlite_file(MEMORY_URL).is_ok());
    }
}
