use std::sync::Arc;

use lessons_core::model::{Catalog, LessonId, LessonKind, ModuleId};
use lessons_core::progression::{
    LessonStatus, ModuleProgress, StatusMap, completed_in_catalog, compute_progress_ratio,
    compute_statuses, module_progress, resolve_module_entry,
};
use serde::Serialize;

use crate::progress_store::ProgressStore;

/// Presentation-agnostic roadmap.
///
/// No pre-formatted strings: the front end decides how to show ratios and statuses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadmapView {
    pub modules: Vec<RoadmapModule>,
    pub completed: usize,
    pub total: usize,
    pub ratio: f64,
    pub current: Option<LessonId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadmapModule {
    pub id: ModuleId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub progress: ModuleProgress,
    pub lessons: Vec<RoadmapLesson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoadmapLesson {
    pub id: LessonId,
    pub title: String,
    pub kind: LessonKind,
    pub xp_value: u32,
    pub status: LessonStatus,
}

/// Gating queries over the catalog and the current progress.
///
/// Every call recomputes from the live completed set, so results always
/// reflect the latest `ProgressStore::add`.
#[derive(Clone)]
pub struct RoadmapService {
    catalog: Arc<Catalog>,
    progress: Arc<ProgressStore>,
}

impl RoadmapService {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, progress: Arc<ProgressStore>) -> Self {
        Self { catalog, progress }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn statuses(&self) -> StatusMap {
        compute_statuses(&self.catalog, &self.progress.all_ids())
    }

    #[must_use]
    pub fn progress_ratio(&self) -> f64 {
        compute_progress_ratio(&self.catalog, &self.progress.all_ids())
    }

    #[must_use]
    pub fn status(&self, lesson: LessonId) -> Option<LessonStatus> {
        self.statuses().get(lesson)
    }

    /// False for locked and unknown lessons.
    #[must_use]
    pub fn can_start(&self, lesson: LessonId) -> bool {
        self.status(lesson).is_some_and(|s| s.is_startable())
    }

    /// Lesson a learner lands on when opening `module`, with its status.
    #[must_use]
    pub fn module_entry(&self, module: ModuleId) -> Option<(LessonId, LessonStatus)> {
        resolve_module_entry(&self.catalog, &self.statuses(), module)
    }

    #[must_use]
    pub fn roadmap(&self) -> RoadmapView {
        let completed = self.progress.all_ids();
        let statuses = compute_statuses(&self.catalog, &completed);

        let modules = self
            .catalog
            .modules()
            .iter()
            .map(|module| RoadmapModule {
                id: module.id(),
                title: module.title().to_owned(),
                description: module.description().map(str::to_owned),
                progress: module_progress(&self.catalog, module.id(), &completed).unwrap_or(
                    ModuleProgress {
                        completed: 0,
                        total: 0,
                    },
                ),
                lessons: module
                    .lessons()
                    .iter()
                    .map(|lesson| RoadmapLesson {
                        id: lesson.id(),
                        title: lesson.title().to_owned(),
                        kind: lesson.kind(),
                        xp_value: lesson.xp_value(),
                        status: statuses.get(lesson.id()).unwrap_or(LessonStatus::Locked),
                    })
                    .collect(),
            })
            .collect();

        RoadmapView {
            modules,
            completed: completed_in_catalog(&self.catalog, &completed),
            total: self.catalog.len(),
            ratio: compute_progress_ratio(&self.catalog, &completed),
            current: statuses.current(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessons_core::model::{CatalogDraft, LessonDraft, ModuleDraft};
    use lessons_core::time::fixed_now;

    use crate::Clock;

    fn catalog() -> Arc<Catalog> {
        let lesson = |id: u64, order: u32| LessonDraft {
            id: LessonId::new(id),
            title: format!("Lesson {id}"),
            order_index: order,
            kind: LessonKind::Standard,
            xp_value: 50,
        };
        let draft = CatalogDraft {
            modules: vec![
                ModuleDraft {
                    id: ModuleId::new(3),
                    title: "Communication and Boundaries".into(),
                    description: None,
                    order_index: 0,
                    lessons: vec![lesson(1, 0), lesson(2, 1), lesson(3, 2)],
                },
                ModuleDraft {
                    id: ModuleId::new(4),
                    title: "Healthy vs. Unhealthy Relationships".into(),
                    description: None,
                    order_index: 1,
                    lessons: vec![lesson(7, 0), lesson(8, 1)],
                },
            ],
        };
        Arc::new(Catalog::from_draft(draft).unwrap())
    }

    #[tokio::test]
    async fn roadmap_reflects_completions_immediately() {
        let progress = Arc::new(ProgressStore::in_memory(Clock::fixed(fixed_now())));
        let roadmap = RoadmapService::new(catalog(), Arc::clone(&progress));

        assert_eq!(roadmap.status(LessonId::new(1)), Some(LessonStatus::Current));
        assert!(!roadmap.can_start(LessonId::new(2)));

        progress.add(LessonId::new(1)).await.unwrap();
        assert_eq!(
            roadmap.status(LessonId::new(1)),
            Some(LessonStatus::Completed)
        );
        assert!(roadmap.can_start(LessonId::new(2)));
        assert!((roadmap.progress_ratio() - 0.2).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn view_groups_lessons_by_module() {
        let progress = Arc::new(ProgressStore::in_memory(Clock::fixed(fixed_now())));
        for id in [1, 2, 3] {
            progress.add(LessonId::new(id)).await.unwrap();
        }
        let view = RoadmapService::new(catalog(), progress).roadmap();

        assert_eq!(view.modules.len(), 2);
        assert_eq!(view.modules[0].progress.completed, 3);
        assert_eq!(view.modules[1].lessons[0].status, LessonStatus::Current);
        assert_eq!(view.current, Some(LessonId::new(7)));
        assert_eq!(view.completed, 3);
        assert_eq!(view.total, 5);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["modules"][1]["lessons"][1]["status"], "locked");
    }

    #[tokio::test]
    async fn completions_outside_the_catalog_do_not_count() {
        let progress = Arc::new(ProgressStore::in_memory(Clock::fixed(fixed_now())));
        progress.add(LessonId::new(42)).await.unwrap();
        let roadmap = RoadmapService::new(catalog(), progress);

        assert!(roadmap.progress_ratio().abs() < f64::EPSILON);
        assert_eq!(roadmap.roadmap().completed, 0);
    }

    #[test]
    fn module_entry_skips_completed_lessons() {
        let roadmap = RoadmapService::new(
            catalog(),
            Arc::new(ProgressStore::in_memory(Clock::fixed(fixed_now()))),
        );
        assert_eq!(
            roadmap.module_entry(ModuleId::new(3)),
            Some((LessonId::new(1), LessonStatus::Current))
        );
        assert_eq!(
            roadmap.module_entry(ModuleId::new(4)),
            Some((LessonId::new(7), LessonStatus::Locked))
        );
        assert_eq!(roadmap.module_entry(ModuleId::new(9)), None);
    }
}
