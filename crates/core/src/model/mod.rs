mod catalog;
pub mod content;
mod ids;
mod lesson;
mod module;

pub use catalog::{Catalog, CatalogDraft, CatalogIntegrityError, LessonDraft, ModuleDraft};
pub use content::{
    ContentError, MediaError, MediaKind, MediaRef, MediaUri, ModuleIntro, PracticeSet, Question,
    ReadingContent, ReadingSection,
};
pub use ids::{LessonId, ModuleId, ParseIdError, SessionId};
pub use lesson::{Lesson, LessonKind};
pub use module::Module;
