use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{Catalog, LessonId, ModuleId};

//
// ─── LESSON STATUS ─────────────────────────────────────────────────────────────
//

/// Gating state of a lesson, derived from the catalog and the completed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Locked,
    Current,
    Completed,
}

impl LessonStatus {
    /// Locked lessons cannot be started; current and completed ones can.
    #[must_use]
    pub fn is_startable(&self) -> bool {
        !matches!(self, LessonStatus::Locked)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Locked => "locked",
            LessonStatus::Current => "current",
            LessonStatus::Completed => "completed",
        }
    }
}

//
// ─── STATUS MAP ────────────────────────────────────────────────────────────────
//

/// Status per lesson, iterable in global order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMap {
    entries: Vec<(LessonId, LessonStatus)>,
    index: HashMap<LessonId, usize>,
}

impl StatusMap {
    #[must_use]
    pub fn get(&self, id: LessonId) -> Option<LessonStatus> {
        self.index.get(&id).map(|&i| self.entries[i].1)
    }

    /// `(lesson, status)` pairs in global order.
    pub fn iter(&self) -> impl Iterator<Item = (LessonId, LessonStatus)> + '_ {
        self.entries.iter().copied()
    }

    /// The single current lesson, if any.
    #[must_use]
    pub fn current(&self) -> Option<LessonId> {
        self.entries
            .iter()
            .find(|(_, s)| *s == LessonStatus::Current)
            .map(|(id, _)| *id)
    }

    #[must_use]
    pub fn count(&self, status: LessonStatus) -> usize {
        self.entries.iter().filter(|(_, s)| *s == status).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Derives every lesson's status in one pass over the global order.
///
/// A completed lesson is `Completed`. The first lesson that is not completed
/// is `Current`; every later incomplete lesson is `Locked`. Ids in `completed`
/// that the catalog does not know are ignored.
///
/// Always recompute from scratch after the completed set or the catalog changes.
///
/// # Examples
///
/// ```
/// # use std::collections::HashSet;
/// # use lessons_core::model::{Catalog, CatalogDraft, LessonDraft, LessonId, LessonKind, ModuleDraft, ModuleId};
/// # use lessons_core::progression::{compute_statuses, LessonStatus};
/// let lesson = |id: u64, order: u32| LessonDraft {
///     id: LessonId::new(id),
///     title: format!("Lesson {id}"),
///     order_index: order,
///     kind: LessonKind::Standard,
///     xp_value: 50,
/// };
/// let catalog = Catalog::from_draft(CatalogDraft {
///     modules: vec![ModuleDraft {
///         id: ModuleId::new(1),
///         title: "Basics".into(),
///         description: None,
///         order_index: 0,
///         lessons: vec![lesson(1, 0), lesson(2, 1), lesson(3, 2)],
///     }],
/// })?;
///
/// let completed = HashSet::from([LessonId::new(1)]);
/// let statuses = compute_statuses(&catalog, &completed);
/// assert_eq!(statuses.get(LessonId::new(2)), Some(LessonStatus::Current));
/// assert_eq!(statuses.get(LessonId::new(3)), Some(LessonStatus::Locked));
/// # Ok::<(), lessons_core::model::CatalogIntegrityError>(())
/// ```
#[must_use]
pub fn compute_statuses(catalog: &Catalog, completed: &HashSet<LessonId>) -> StatusMap {
    let mut entries = Vec::with_capacity(catalog.len());
    let mut index = HashMap::with_capacity(catalog.len());
    let mut all_prior_completed = true;

    for &id in catalog.order() {
        let status = if completed.contains(&id) {
            LessonStatus::Completed
        } else if all_prior_completed {
            all_prior_completed = false;
            LessonStatus::Current
        } else {
            LessonStatus::Locked
        };
        index.insert(id, entries.len());
        entries.push((id, status));
    }

    StatusMap { entries, index }
}

/// Fraction of catalog lessons that are completed, in `[0, 1]`.
///
/// Ids outside the catalog do not count. An empty catalog yields `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_progress_ratio(catalog: &Catalog, completed: &HashSet<LessonId>) -> f64 {
    if catalog.is_empty() {
        return 0.0;
    }
    let done = completed_in_catalog(catalog, completed);
    done as f64 / catalog.len() as f64
}

/// Number of catalog lessons present in `completed`.
#[must_use]
pub fn completed_in_catalog(catalog: &Catalog, completed: &HashSet<LessonId>) -> usize {
    catalog
        .order()
        .iter()
        .filter(|id| completed.contains(*id))
        .count()
}

/// Completed/total counts for one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleProgress {
    pub completed: usize,
    pub total: usize,
}

impl ModuleProgress {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[must_use]
pub fn module_progress(
    catalog: &Catalog,
    module: ModuleId,
    completed: &HashSet<LessonId>,
) -> Option<ModuleProgress> {
    let module = catalog.module(module)?;
    let total = module.lessons().len();
    let done = module
        .lessons()
        .iter()
        .filter(|l| completed.contains(&l.id()))
        .count();
    Some(ModuleProgress {
        completed: done,
        total,
    })
}

/// Picks the lesson a learner lands on when opening a module.
///
/// That is the module's first lesson that is not completed. When every lesson
/// in the module is completed the first one is returned for a revisit. The
/// caller must refuse to start a `Locked` result.
///
/// Returns `None` for an unknown or empty module.
#[must_use]
pub fn resolve_module_entry(
    catalog: &Catalog,
    statuses: &StatusMap,
    module: ModuleId,
) -> Option<(LessonId, LessonStatus)> {
    let module = catalog.module(module)?;
    let first = module.first_lesson()?.id();

    module
        .lessons()
        .iter()
        .filter_map(|l| statuses.get(l.id()).map(|s| (l.id(), s)))
        .find(|(_, status)| *status != LessonStatus::Completed)
        .or_else(|| statuses.get(first).map(|s| (first, s)))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
