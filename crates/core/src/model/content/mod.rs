mod error;
mod intro;
pub mod media;
mod practice;
mod reading;

pub use error::ContentError;
pub use intro::ModuleIntro;
pub use media::{MediaError, MediaKind, MediaRef, MediaUri};
pub use practice::{PracticeSet, Question};
pub use reading::{ReadingContent, ReadingSection};
