mod flow;
mod view;

// Public API of the session subsystem.
pub use flow::{Dispatch, LessonFlow};
pub use view::{PracticeView, SessionSnapshot, StepBody};
