use std::sync::Arc;

use async_trait::async_trait;
use lessons_core::model::{LessonId, ModuleId, ModuleIntro, PracticeSet, ReadingContent};
use lessons_core::session::{FetchKind, FetchPayload, FetchRequest, FetchResponse};
use storage::repository::{ContentRepository, StorageError};

use crate::error::ContentLoadError;

/// Source of lesson content for sessions.
///
/// Implementations may be slow or fail; a session shows a loading or failed
/// step in the meantime.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn module_intro(&self, module: ModuleId) -> Result<ModuleIntro, ContentLoadError>;

    async fn reading(&self, lesson: LessonId) -> Result<ReadingContent, ContentLoadError>;

    async fn practice(&self, lesson: LessonId) -> Result<PracticeSet, ContentLoadError>;
}

/// `ContentProvider` backed by a storage repository.
#[derive(Clone)]
pub struct RepositoryContentProvider {
    repo: Arc<dyn ContentRepository>,
}

impl RepositoryContentProvider {
    #[must_use]
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self { repo }
    }
}

fn load_error(err: StorageError, what: impl FnOnce() -> String) -> ContentLoadError {
    match err {
        StorageError::NotFound => ContentLoadError::NotFound(what()),
        other => ContentLoadError::Storage(other),
    }
}

#[async_trait]
impl ContentProvider for RepositoryContentProvider {
    async fn module_intro(&self, module: ModuleId) -> Result<ModuleIntro, ContentLoadError> {
        self.repo
            .module_intro(module)
            .await
            .map_err(|e| load_error(e, || format!("intro for module {module}")))
    }

    async fn reading(&self, lesson: LessonId) -> Result<ReadingContent, ContentLoadError> {
        self.repo
            .reading(lesson)
            .await
            .map_err(|e| load_error(e, || format!("reading for lesson {lesson}")))
    }

    async fn practice(&self, lesson: LessonId) -> Result<PracticeSet, ContentLoadError> {
        self.repo
            .practice(lesson)
            .await
            .map_err(|e| load_error(e, || format!("practice for lesson {lesson}")))
    }
}

/// Turns session fetch requests into tagged responses.
///
/// Never fails: provider errors become `FetchPayload::Failed` so the session
/// can show them and offer a retry.
#[derive(Clone)]
pub struct ContentFetcher {
    provider: Arc<dyn ContentProvider>,
}

impl ContentFetcher {
    #[must_use]
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self { provider }
    }

    pub async fn fetch(&self, request: FetchRequest) -> FetchResponse {
        let result = match request.kind {
            FetchKind::ModuleIntro(module) => self
                .provider
                .module_intro(module)
                .await
                .map(FetchPayload::ModuleIntro),
            FetchKind::Reading(lesson) => self
                .provider
                .reading(lesson)
                .await
                .map(FetchPayload::Reading),
            FetchKind::Practice(lesson) => self
                .provider
                .practice(lesson)
                .await
                .map(FetchPayload::Practice),
        };

        let payload = result.unwrap_or_else(|err| {
            tracing::warn!(kind = ?request.kind, error = %err, "content fetch failed");
            FetchPayload::Failed(err.to_string())
        });
        FetchResponse::new(&request, payload)
    }
}
