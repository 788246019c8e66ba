//! Lesson session flow: intro, reading, practice, unlock.

mod machine;
mod practice;

pub use machine::{
    FetchKind, FetchPayload, FetchRequest, FetchResponse, FetchTicket, InvalidTransition, Load,
    Rejection, Resolution, SessionIntent, SessionMachine, SessionOutcome, SessionStep,
    SessionTarget, StepKind, UnlockSummary,
};
pub use practice::{Feedback, PracticeError, PracticeState};
