use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use lessons_core::model::LessonId;
use storage::repository::{InMemoryRepository, ProgressRepository};

use crate::Clock;
use crate::error::ProgressError;

/// The learner's completed lessons, shared by the whole process.
///
/// Hydrated once from the repository. Writes go to the repository first and
/// then to the in-memory set, so a read after a successful `add` always sees
/// the new completion.
pub struct ProgressStore {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
    completed: RwLock<HashSet<LessonId>>,
}

impl ProgressStore {
    /// Load the completed set from `repo`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the repository cannot be read.
    pub async fn load(
        clock: Clock,
        repo: Arc<dyn ProgressRepository>,
    ) -> Result<Self, ProgressError> {
        let completed = repo.all_ids().await?;
        tracing::info!(completed = completed.len(), "progress loaded");
        Ok(Self {
            clock,
            repo,
            completed: RwLock::new(completed),
        })
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self {
            clock,
            repo: Arc::new(InMemoryRepository::new()),
            completed: RwLock::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn contains(&self, lesson: LessonId) -> bool {
        self.completed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&lesson)
    }

    /// Snapshot of the completed set.
    #[must_use]
    pub fn all_ids(&self) -> HashSet<LessonId> {
        self.completed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.completed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record `lesson` as completed. Returns `true` only the first time.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if persisting fails; the in-memory set
    /// is left unchanged in that case.
    pub async fn add(&self, lesson: LessonId) -> Result<bool, ProgressError> {
        if self.contains(lesson) {
            return Ok(false);
        }

        let inserted = self.repo.add(lesson, self.clock.now()).await?;
        self.completed
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(lesson);

        if inserted {
            tracing::info!(lesson = %lesson, "lesson completed");
        }
        Ok(inserted)
    }
}
