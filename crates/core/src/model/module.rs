use std::collections::HashSet;

use crate::model::catalog::CatalogIntegrityError;
use crate::model::ids::{LessonId, ModuleId};
use crate::model::lesson::Lesson;

/// An ordered group of lessons.
///
/// Lessons are kept sorted by `order_index`; the order is fixed once the
/// module is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    id: ModuleId,
    title: String,
    description: Option<String>,
    order_index: u32,
    lessons: Vec<Lesson>,
}

impl Module {
    /// Builds a module and sorts its lessons.
    ///
    /// # Errors
    ///
    /// - `EmptyModuleTitle` if the title is blank
    /// - `LessonModuleMismatch` if a lesson names another module
    /// - `DuplicateLessonOrder` if two lessons share an `order_index`
    /// - `DuplicateLessonId` if a lesson id repeats within the module
    pub fn new(
        id: ModuleId,
        title: impl Into<String>,
        description: Option<String>,
        order_index: u32,
        mut lessons: Vec<Lesson>,
    ) -> Result<Self, CatalogIntegrityError> {
        let title = title.into();
        let title = title.trim();
        if title.is_empty() {
            return Err(CatalogIntegrityError::EmptyModuleTitle { module: id });
        }

        let mut orders = HashSet::with_capacity(lessons.len());
        let mut ids: HashSet<LessonId> = HashSet::with_capacity(lessons.len());
        for lesson in &lessons {
            if lesson.module_id() != id {
                return Err(CatalogIntegrityError::LessonModuleMismatch {
                    lesson: lesson.id(),
                    expected: id,
                    found: lesson.module_id(),
                });
            }
            if !ids.insert(lesson.id()) {
                return Err(CatalogIntegrityError::DuplicateLessonId {
                    lesson: lesson.id(),
                });
            }
            if !orders.insert(lesson.order_index()) {
                return Err(CatalogIntegrityError::DuplicateLessonOrder {
                    module: id,
                    order_index: lesson.order_index(),
                });
            }
        }
        lessons.sort_by_key(Lesson::order_index);

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title: title.to_owned(),
            description,
            order_index,
            lessons,
        })
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    /// Lessons in module order.
    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn first_lesson(&self) -> Option<&Lesson> {
        self.lessons.first()
    }
}
