use lessons_core::model::{Catalog, LessonId, MediaRef, ReadingSection, SessionId};
use lessons_core::session::{
    Feedback, Load, PracticeState, SessionIntent, SessionMachine, SessionOutcome, SessionStep,
    StepKind, UnlockSummary,
};

/// Presentation-agnostic snapshot of the active session.
///
/// This is intentionally **not** a UI view-model:
/// - no pre-formatted strings
/// - no localization assumptions
///
/// Front ends render `body` and use `can_advance` to enable their "next" control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: SessionId,
    pub lesson: LessonId,
    pub lesson_title: String,
    pub step: StepKind,
    pub can_advance: bool,
    pub body: StepBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepBody {
    Loading,
    Failed {
        message: String,
    },
    Intro {
        title: String,
        context: String,
        media: Option<MediaRef>,
    },
    Reading {
        title: String,
        sections: Vec<ReadingSection>,
        media: Option<MediaRef>,
    },
    Practice(PracticeView),
    Unlock(UnlockSummary),
    Finished(SessionOutcome),
}

/// The question under the practice cursor.
///
/// An empty practice set yields the default view with `total == 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PracticeView {
    pub cursor: usize,
    pub total: usize,
    pub answered: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub feedback: Option<Feedback>,
    pub explanation: Option<String>,
    pub can_previous: bool,
    pub can_next_question: bool,
}

impl PracticeView {
    /// `None` for an empty practice set.
    #[must_use]
    pub fn from_state(state: &PracticeState) -> Option<Self> {
        let cursor = state.cursor();
        let question = state.current_question()?;
        let feedback = state.feedback(cursor);
        Some(Self {
            cursor,
            total: state.total(),
            answered: state.answered_count(),
            prompt: question.prompt().to_owned(),
            options: question.options().to_vec(),
            selected: state.answer(cursor),
            feedback,
            // Explanations are revealed together with correctness.
            explanation: feedback.and(question.explanation().map(str::to_owned)),
            can_previous: state.check_previous_question().is_ok(),
            can_next_question: state.check_next_question().is_ok(),
        })
    }
}

impl SessionSnapshot {
    #[must_use]
    pub fn from_machine(machine: &SessionMachine, catalog: &Catalog) -> Self {
        let lesson = machine.lesson();
        let lesson_title = catalog
            .lesson(lesson)
            .map(|l| l.title().to_owned())
            .unwrap_or_default();
        let can_advance = match machine.step().kind() {
            StepKind::Intro => machine.accepts(SessionIntent::Start),
            StepKind::Reading | StepKind::Practice => machine.accepts(SessionIntent::Next),
            StepKind::Unlock => machine.accepts(SessionIntent::Unlock),
            StepKind::Finished => false,
        };

        Self {
            session: machine.id(),
            lesson,
            lesson_title,
            step: machine.step().kind(),
            can_advance,
            body: body_of(machine.step()),
        }
    }
}

fn body_of(step: &SessionStep) -> StepBody {
    match step {
        SessionStep::Intro { intro, .. } => load_body(intro, |intro| StepBody::Intro {
            title: intro.title().to_owned(),
            context: intro.context().to_owned(),
            media: intro.media().cloned(),
        }),
        SessionStep::Reading(load) => load_body(load, |reading| StepBody::Reading {
            title: reading.title().to_owned(),
            sections: reading.sections().to_vec(),
            media: reading.media().cloned(),
        }),
        SessionStep::Practice(load) => load_body(load, |state| {
            StepBody::Practice(PracticeView::from_state(state).unwrap_or_default())
        }),
        SessionStep::Unlock(summary) => StepBody::Unlock(*summary),
        SessionStep::Finished(outcome) => StepBody::Finished(*outcome),
    }
}

fn load_body<T>(load: &Load<T>, ready: impl FnOnce(&T) -> StepBody) -> StepBody {
    match load {
        Load::Pending(_) => StepBody::Loading,
        Load::Ready(value) => ready(value),
        Load::Failed(message) => StepBody::Failed {
            message: message.clone(),
        },
    }
}
