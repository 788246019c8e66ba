use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, ModuleId};
use crate::model::lesson::{Lesson, LessonKind};
use crate::model::module::Module;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Structural problems found while loading a catalog.
///
/// These are fatal: a `Catalog` value only exists once every check passed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogIntegrityError {
    #[error("lesson id {lesson} appears more than once")]
    DuplicateLessonId { lesson: LessonId },

    #[error("module id {module} appears more than once")]
    DuplicateModuleId { module: ModuleId },

    #[error("module {module} has two lessons at order index {order_index}")]
    DuplicateLessonOrder { module: ModuleId, order_index: u32 },

    #[error("two modules share order index {order_index}")]
    DuplicateModuleOrder { order_index: u32 },

    #[error("lesson {lesson} belongs to module {found}, not {expected}")]
    LessonModuleMismatch {
        lesson: LessonId,
        expected: ModuleId,
        found: ModuleId,
    },

    #[error("module {module} has an empty title")]
    EmptyModuleTitle { module: ModuleId },

    #[error("lesson {lesson} has an empty title")]
    EmptyLessonTitle { lesson: LessonId },
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated catalog shape, as read from a file or storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDraft {
    pub modules: Vec<ModuleDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDraft {
    pub id: ModuleId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order_index: u32,
    #[serde(default)]
    pub lessons: Vec<LessonDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDraft {
    pub id: LessonId,
    pub title: String,
    pub order_index: u32,
    #[serde(default)]
    pub kind: LessonKind,
    #[serde(default)]
    pub xp_value: u32,
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Ordered modules and their ordered lessons.
///
/// Flattening modules in order, then lessons in order, gives the global order
/// used for gating. Lesson ids are unique across the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    modules: Vec<Module>,
    // (module index, lesson index) per lesson id
    index: HashMap<LessonId, (usize, usize)>,
    // global position per lesson id
    positions: HashMap<LessonId, usize>,
    order: Vec<LessonId>,
}

impl Catalog {
    /// Builds a catalog from validated modules, sorting them by `order_index`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateModuleId`, `DuplicateModuleOrder` or `DuplicateLessonId`
    /// when ids or positions collide across modules.
    pub fn new(mut modules: Vec<Module>) -> Result<Self, CatalogIntegrityError> {
        let mut module_ids = HashSet::with_capacity(modules.len());
        let mut module_orders = HashSet::with_capacity(modules.len());
        for module in &modules {
            if !module_ids.insert(module.id()) {
                return Err(CatalogIntegrityError::DuplicateModuleId {
                    module: module.id(),
                });
            }
            if !module_orders.insert(module.order_index()) {
                return Err(CatalogIntegrityError::DuplicateModuleOrder {
                    order_index: module.order_index(),
                });
            }
        }
        modules.sort_by_key(Module::order_index);

        let mut index = HashMap::new();
        let mut positions = HashMap::new();
        let mut order = Vec::new();
        for (m, module) in modules.iter().enumerate() {
            for (l, lesson) in module.lessons().iter().enumerate() {
                if index.insert(lesson.id(), (m, l)).is_some() {
                    return Err(CatalogIntegrityError::DuplicateLessonId {
                        lesson: lesson.id(),
                    });
                }
                positions.insert(lesson.id(), order.len());
                order.push(lesson.id());
            }
        }

        Ok(Self {
            modules,
            index,
            positions,
            order,
        })
    }

    /// Validates a draft into a catalog.
    ///
    /// # Errors
    ///
    /// Returns the first `CatalogIntegrityError` found.
    pub fn from_draft(draft: CatalogDraft) -> Result<Self, CatalogIntegrityError> {
        let mut modules = Vec::with_capacity(draft.modules.len());
        for module in draft.modules {
            let lessons = module
                .lessons
                .into_iter()
                .map(|lesson| {
                    Lesson::new(
                        lesson.id,
                        module.id,
                        lesson.title,
                        lesson.order_index,
                        lesson.kind,
                        lesson.xp_value,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
            modules.push(Module::new(
                module.id,
                module.title,
                module.description,
                module.order_index,
                lessons,
            )?);
        }
        Self::new(modules)
    }

    /// Converts back into the serializable draft shape.
    #[must_use]
    pub fn to_draft(&self) -> CatalogDraft {
        CatalogDraft {
            modules: self
                .modules
                .iter()
                .map(|module| ModuleDraft {
                    id: module.id(),
                    title: module.title().to_owned(),
                    description: module.description().map(str::to_owned),
                    order_index: module.order_index(),
                    lessons: module
                        .lessons()
                        .iter()
                        .map(|lesson| LessonDraft {
                            id: lesson.id(),
                            title: lesson.title().to_owned(),
                            order_index: lesson.order_index(),
                            kind: lesson.kind(),
                            xp_value: lesson.xp_value(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// All lessons in global order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> + '_ {
        self.modules.iter().flat_map(|m| m.lessons().iter())
    }

    /// Lesson ids in global order.
    #[must_use]
    pub fn order(&self) -> &[LessonId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: LessonId) -> bool {
        self.index.contains_key(&id)
    }

    #[must_use]
    pub fn lesson(&self, id: LessonId) -> Option<&Lesson> {
        let (m, l) = *self.index.get(&id)?;
        self.modules.get(m)?.lessons().get(l)
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == id)
    }

    /// Zero-based position in the global order.
    #[must_use]
    pub fn position(&self, lesson: LessonId) -> Option<usize> {
        self.positions.get(&lesson).copied()
    }

    /// The lesson right after `lesson` in global order, crossing module boundaries.
    #[must_use]
    pub fn next_lesson(&self, lesson: LessonId) -> Option<&Lesson> {
        let next = self.position(lesson)? + 1;
        self.order.get(next).and_then(|id| self.lesson(*id))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson_draft(id: u64, order: u32) -> LessonDraft {
        LessonDraft {
            id: LessonId::new(id),
            title: format!("Lesson {id}"),
            order_index: order,
            kind: LessonKind::Standard,
            xp_value: 50,
        }
    }

    fn two_module_draft() -> CatalogDraft {
        CatalogDraft {
            modules: vec![
                ModuleDraft {
                    id: ModuleId::new(4),
                    title: "Healthy vs. Unhealthy Relationships".into(),
                    description: None,
                    order_index: 1,
                    lessons: vec![lesson_draft(8, 1), lesson_draft(7, 0)],
                },
                ModuleDraft {
                    id: ModuleId::new(3),
                    title: "Communication and Boundaries".into(),
                    description: None,
                    order_index: 0,
                    lessons: vec![lesson_draft(1, 0), lesson_draft(2, 1)],
                },
            ],
        }
    }

    #[test]
    fn global_order_is_module_then_lesson() {
        let catalog = Catalog::from_draft(two_module_draft()).unwrap();
        let order: Vec<_> = catalog.order().iter().map(LessonId::value).collect();
        assert_eq!(order, vec![1, 2, 7, 8]);
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.position(LessonId::new(7)), Some(2));
    }

    #[test]
    fn next_lesson_crosses_module_boundary() {
        let catalog = Catalog::from_draft(two_module_draft()).unwrap();
        let next = catalog.next_lesson(LessonId::new(2)).unwrap();
        assert_eq!(next.id(), LessonId::new(7));
        assert!(catalog.next_lesson(LessonId::new(8)).is_none());
        assert!(catalog.next_lesson(LessonId::new(99)).is_none());
    }

    #[test]
    fn duplicate_lesson_ids_across_modules_are_rejected() {
        let mut draft = two_module_draft();
        draft.modules[0].lessons.push(lesson_draft(1, 5));
        let err = Catalog::from_draft(draft).unwrap_err();
        assert_eq!(
            err,
            CatalogIntegrityError::DuplicateLessonId {
                lesson: LessonId::new(1)
            }
        );
    }

    #[test]
    fn duplicate_module_ids_are_rejected() {
        let mut draft = two_module_draft();
        draft.modules[1].id = ModuleId::new(4);
        let err = Catalog::from_draft(draft).unwrap_err();
        assert_eq!(
            err,
            CatalogIntegrityError::DuplicateModuleId {
                module: ModuleId::new(4)
            }
        );
    }

    #[test]
    fn duplicate_module_order_is_rejected() {
        let mut draft = two_module_draft();
        draft.modules[1].order_index = 1;
        let err = Catalog::from_draft(draft).unwrap_err();
        assert_eq!(
            err,
            CatalogIntegrityError::DuplicateModuleOrder { order_index: 1 }
        );
    }

    #[test]
    fn empty_catalog_is_valid() {
        let catalog = Catalog::from_draft(CatalogDraft::default()).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.lessons().count(), 0);
    }

    #[test]
    fn draft_parses_from_json_with_defaults() {
        let json = r#"{
            "modules": [
                { "id": 1, "title": "Basics", "order_index": 0,
                  "lessons": [ { "id": 10, "title": "Hello", "order_index": 0 },
                               { "id": 11, "title": "Review", "order_index": 1,
                                 "kind": "milestone", "xp_value": 100 } ] }
            ]
        }"#;
        let draft: CatalogDraft = serde_json::from_str(json).unwrap();
        let catalog = Catalog::from_draft(draft.clone()).unwrap();
        let review = catalog.lesson(LessonId::new(11)).unwrap();
        assert_eq!(review.kind(), LessonKind::Milestone);
        assert_eq!(review.xp_value(), 100);
        assert_eq!(catalog.lesson(LessonId::new(10)).unwrap().xp_value(), 0);
        assert_eq!(catalog.to_draft(), draft);
    }
}
