use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lessons_core::model::{
    Catalog, CatalogDraft, Lesson, LessonDraft, LessonId, Module, ModuleDraft, ModuleId,
    ModuleIntro, PracticeSet, ReadingContent,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted lesson completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRecord {
    pub lesson_id: LessonId,
    pub completed_at: DateTime<Utc>,
}

/// Repository contract for the module/lesson catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Persist or update a module row. Lessons are stored separately.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the module cannot be stored.
    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError>;

    /// Persist or update a lesson. Its module must already exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the module is unknown, or other storage errors.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Load the stored catalog in unvalidated form.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if rows cannot be read or decoded.
    async fn load_catalog_draft(&self) -> Result<CatalogDraft, StorageError>;

    /// Replace the stored catalog with `catalog`.
    ///
    /// Modules and lessons missing from `catalog` are removed along with
    /// their content. Completions are kept. The default upserts only;
    /// backends override it to drop stale rows.
    ///
    /// # Errors
    ///
    /// Returns the first `StorageError` hit.
    async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StorageError> {
        for module in catalog.modules() {
            self.upsert_module(module).await?;
            for lesson in module.lessons() {
                self.upsert_lesson(lesson).await?;
            }
        }
        Ok(())
    }
}

/// Repository contract for module intros, readings and practice sets.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the intro cannot be stored.
    async fn save_module_intro(&self, intro: &ModuleIntro) -> Result<(), StorageError>;

    /// Replaces the reading of a lesson, sections included.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the reading cannot be stored.
    async fn save_reading(&self, reading: &ReadingContent) -> Result<(), StorageError>;

    /// Replaces the practice set of a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be stored.
    async fn save_practice(&self, practice: &PracticeSet) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module has no intro.
    async fn module_intro(&self, module: ModuleId) -> Result<ModuleIntro, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson has no reading.
    async fn reading(&self, lesson: LessonId) -> Result<ReadingContent, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson has no practice set.
    async fn practice(&self, lesson: LessonId) -> Result<PracticeSet, StorageError>;
}

/// Repository contract for the learner's completed lessons.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn contains(&self, lesson: LessonId) -> Result<bool, StorageError>;

    /// Records a completion. Returns `false` if the lesson was already
    /// completed; the first timestamp is kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the completion cannot be stored.
    async fn add(&self, lesson: LessonId, completed_at: DateTime<Utc>)
    -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn all_ids(&self) -> Result<HashSet<LessonId>, StorageError>;

    /// Completions ordered by time, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_completions(&self) -> Result<Vec<CompletionRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    modules: Arc<Mutex<HashMap<ModuleId, ModuleDraft>>>,
    lessons: Arc<Mutex<HashMap<LessonId, (ModuleId, LessonDraft)>>>,
    intros: Arc<Mutex<HashMap<ModuleId, ModuleIntro>>>,
    readings: Arc<Mutex<HashMap<LessonId, ReadingContent>>>,
    practice: Arc<Mutex<HashMap<LessonId, PracticeSet>>>,
    completions: Arc<Mutex<HashMap<LessonId, DateTime<Utc>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError> {
        let mut guard = self.modules.lock().map_err(poisoned)?;
        guard.insert(module.id(), module_draft(module));
        Ok(())
    }

    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let known = self
            .modules
            .lock()
            .map_err(poisoned)?
            .contains_key(&lesson.module_id());
        if !known {
            return Err(StorageError::Conflict);
        }

        let mut guard = self.lessons.lock().map_err(poisoned)?;
        guard.insert(
            lesson.id(),
            (lesson.module_id(), lesson_draft(lesson)),
        );
        Ok(())
    }

    async fn load_catalog_draft(&self) -> Result<CatalogDraft, StorageError> {
        let mut modules: Vec<ModuleDraft> = self
            .modules
            .lock()
            .map_err(poisoned)?
            .values()
            .cloned()
            .collect();
        modules.sort_by_key(|m| (m.order_index, m.id));

        let lessons = self.lessons.lock().map_err(poisoned)?;
        for (module_id, lesson) in lessons.values() {
            if let Some(module) = modules.iter_mut().find(|m| m.id == *module_id) {
                module.lessons.push(lesson.clone());
            }
        }
        for module in &mut modules {
            module.lessons.sort_by_key(|l| (l.order_index, l.id));
        }

        Ok(CatalogDraft { modules })
    }

    async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StorageError> {
        let mut modules = self.modules.lock().map_err(poisoned)?;
        let mut lessons = self.lessons.lock().map_err(poisoned)?;
        modules.clear();
        lessons.clear();
        for module in catalog.modules() {
            modules.insert(module.id(), module_draft(module));
            for lesson in module.lessons() {
                lessons.insert(lesson.id(), (module.id(), lesson_draft(lesson)));
            }
        }
        drop(lessons);
        drop(modules);

        self.intros
            .lock()
            .map_err(poisoned)?
            .retain(|id, _| catalog.module(*id).is_some());
        self.readings
            .lock()
            .map_err(poisoned)?
            .retain(|id, _| catalog.contains(*id));
        self.practice
            .lock()
            .map_err(poisoned)?
            .retain(|id, _| catalog.contains(*id));
        Ok(())
    }
}

// Lessons are kept in their own map and attached on load.
fn module_draft(module: &Module) -> ModuleDraft {
    ModuleDraft {
        id: module.id(),
        title: module.title().to_owned(),
        description: module.description().map(str::to_owned),
        order_index: module.order_index(),
        lessons: Vec::new(),
    }
}

fn lesson_draft(lesson: &Lesson) -> LessonDraft {
    LessonDraft {
        id: lesson.id(),
        title: lesson.title().to_owned(),
        order_index: lesson.order_index(),
        kind: lesson.kind(),
        xp_value: lesson.xp_value(),
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn save_module_intro(&self, intro: &ModuleIntro) -> Result<(), StorageError> {
        let mut guard = self.intros.lock().map_err(poisoned)?;
        guard.insert(intro.module_id(), intro.clone());
        Ok(())
    }

    async fn save_reading(&self, reading: &ReadingContent) -> Result<(), StorageError> {
        let mut guard = self.readings.lock().map_err(poisoned)?;
        guard.insert(reading.lesson_id(), reading.clone());
        Ok(())
    }

    async fn save_practice(&self, practice: &PracticeSet) -> Result<(), StorageError> {
        let mut guard = self.practice.lock().map_err(poisoned)?;
        guard.insert(practice.lesson_id(), practice.clone());
        Ok(())
    }

    async fn module_intro(&self, module: ModuleId) -> Result<ModuleIntro, StorageError> {
        let guard = self.intros.lock().map_err(poisoned)?;
        guard.get(&module).cloned().ok_or(StorageError::NotFound)
    }

    async fn reading(&self, lesson: LessonId) -> Result<ReadingContent, StorageError> {
        let guard = self.readings.lock().map_err(poisoned)?;
        guard.get(&lesson).cloned().ok_or(StorageError::NotFound)
    }

    async fn practice(&self, lesson: LessonId) -> Result<PracticeSet, StorageError> {
        let guard = self.practice.lock().map_err(poisoned)?;
        guard.get(&lesson).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn contains(&self, lesson: LessonId) -> Result<bool, StorageError> {
        let guard = self.completions.lock().map_err(poisoned)?;
        Ok(guard.contains_key(&lesson))
    }

    async fn add(
        &self,
        lesson: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut guard = self.completions.lock().map_err(poisoned)?;
        if guard.contains_key(&lesson) {
            return Ok(false);
        }
        guard.insert(lesson, completed_at);
        Ok(true)
    }

    async fn all_ids(&self) -> Result<HashSet<LessonId>, StorageError> {
        let guard = self.completions.lock().map_err(poisoned)?;
        Ok(guard.keys().copied().collect())
    }

    async fn list_completions(&self) -> Result<Vec<CompletionRecord>, StorageError> {
        let guard = self.completions.lock().map_err(poisoned)?;
        let mut records: Vec<_> = guard
            .iter()
            .map(|(lesson_id, completed_at)| CompletionRecord {
                lesson_id: *lesson_id,
                completed_at: *completed_at,
            })
            .collect();
        records.sort_by_key(|r| (r.completed_at, r.lesson_id));
        Ok(records)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn CatalogRepository>,
    pub content: Arc<dyn ContentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let catalog: Arc<dyn CatalogRepository> = Arc::new(repo.clone());
        let content: Arc<dyn ContentRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            catalog,
            content,
            progress,
        }
    }
}
