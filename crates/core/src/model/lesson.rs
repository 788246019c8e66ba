use serde::{Deserialize, Serialize};

use crate::model::catalog::CatalogIntegrityError;
use crate::model::ids::{LessonId, ModuleId};

/// Presentation hint for a lesson. Never consulted by gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    #[default]
    Standard,
    Practice,
    Narrative,
    Milestone,
}

impl LessonKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonKind::Standard => "standard",
            LessonKind::Practice => "practice",
            LessonKind::Narrative => "narrative",
            LessonKind::Milestone => "milestone",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "standard" => Some(Self::Standard),
            "practice" => Some(Self::Practice),
            "narrative" => Some(Self::Narrative),
            "milestone" => Some(Self::Milestone),
            _ => None,
        }
    }
}

/// A single lesson inside a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    module_id: ModuleId,
    title: String,
    order_index: u32,
    kind: LessonKind,
    xp_value: u32,
}

impl Lesson {
    /// Creates a lesson with a trimmed title.
    ///
    /// # Errors
    ///
    /// Returns `CatalogIntegrityError::EmptyLessonTitle` if the title is blank.
    pub fn new(
        id: LessonId,
        module_id: ModuleId,
        title: impl Into<String>,
        order_index: u32,
        kind: LessonKind,
        xp_value: u32,
    ) -> Result<Self, CatalogIntegrityError> {
        let title = title.into();
        let title = title.trim();
        if title.is_empty() {
            return Err(CatalogIntegrityError::EmptyLessonTitle { lesson: id });
        }

        Ok(Self {
            id,
            module_id,
            title: title.to_owned(),
            order_index,
            kind,
            xp_value,
        })
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Position within the owning module.
    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    #[must_use]
    pub fn kind(&self) -> LessonKind {
        self.kind
    }

    #[must_use]
    pub fn xp_value(&self) -> u32 {
        self.xp_value
    }
}
