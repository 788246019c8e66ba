//! Shared error types for the services crate.

use thiserror::Error;

use lessons_core::model::{CatalogIntegrityError, LessonId, ModuleId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by content providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentLoadError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("content provider unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Storage(StorageError),
}

/// Errors emitted by `LessonFlow`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error("lesson {0} is not in the catalog")]
    UnknownLesson(LessonId),
    #[error("module {0} is not in the catalog")]
    UnknownModule(ModuleId),
    #[error("module {0} has no lessons")]
    EmptyModule(ModuleId),
    #[error("lesson {0} is locked")]
    LessonLocked(LessonId),
    #[error("no active session")]
    NoActiveSession,
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogIntegrityError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
