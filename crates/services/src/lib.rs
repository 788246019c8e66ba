#![forbid(unsafe_code)]

pub mod app_services;
pub mod content;
pub mod error;
pub mod progress_store;
pub mod roadmap;
pub mod sessions;

pub use lessons_core::Clock;

pub use app_services::AppServices;
pub use content::{ContentFetcher, ContentProvider, RepositoryContentProvider};
pub use error::{AppServicesError, ContentLoadError, FlowError, ProgressError};
pub use progress_store::ProgressStore;
pub use roadmap::{RoadmapLesson, RoadmapModule, RoadmapService, RoadmapView};
pub use sessions::{Dispatch, LessonFlow, PracticeView, SessionSnapshot, StepBody};
