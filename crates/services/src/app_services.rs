use std::sync::Arc;

use lessons_core::model::Catalog;
use storage::repository::Storage;

use crate::Clock;
use crate::content::{ContentProvider, RepositoryContentProvider};
use crate::error::AppServicesError;
use crate::progress_store::ProgressStore;
use crate::roadmap::RoadmapService;
use crate::sessions::LessonFlow;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    progress: Arc<ProgressStore>,
    roadmap: RoadmapService,
    content: Arc<dyn ContentProvider>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization, catalog loading,
    /// or progress hydration fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(&storage, clock).await
    }

    /// Build services over an already opened storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Catalog` for a catalog that breaks ordering
    /// or id uniqueness, and storage errors otherwise.
    pub async fn from_storage(storage: &Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let draft = storage.catalog.load_catalog_draft().await?;
        let catalog = Arc::new(Catalog::from_draft(draft)?);
        tracing::info!(
            modules = catalog.modules().len(),
            lessons = catalog.len(),
            "catalog loaded"
        );

        let progress = Arc::new(ProgressStore::load(clock, Arc::clone(&storage.progress)).await?);
        let roadmap = RoadmapService::new(Arc::clone(&catalog), Arc::clone(&progress));
        let content: Arc<dyn ContentProvider> = Arc::new(RepositoryContentProvider::new(
            Arc::clone(&storage.content),
        ));

        Ok(Self {
            catalog,
            progress,
            roadmap,
            content,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn roadmap(&self) -> RoadmapService {
        self.roadmap.clone()
    }

    #[must_use]
    pub fn content(&self) -> Arc<dyn ContentProvider> {
        Arc::clone(&self.content)
    }

    /// A fresh session host sharing this process's progress.
    #[must_use]
    pub fn lesson_flow(&self) -> LessonFlow {
        LessonFlow::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.progress),
            Arc::clone(&self.content),
        )
    }
}
