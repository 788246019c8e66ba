use thiserror::Error;

use crate::model::{
    Catalog, LessonId, ModuleId, ModuleIntro, PracticeSet, ReadingContent, SessionId,
};
use crate::session::practice::{PracticeError, PracticeState};

//
// ─── INTENTS & ERRORS ──────────────────────────────────────────────────────────
//

/// Learner actions fed into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIntent {
    /// Leave the module intro and begin reading.
    Start,
    /// Reading to practice, or practice to unlock.
    Next,
    SelectAnswer(usize),
    PreviousQuestion,
    NextQuestion,
    /// Re-issue a content fetch that failed.
    Retry,
    Unlock,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Intro,
    Reading,
    Practice,
    Unlock,
    Finished,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("content is still loading")]
    Loading,
    #[error("content failed to load")]
    LoadFailed,
    #[error("there is no failed load to retry")]
    NothingToRetry,
    #[error("{answered} of {total} questions answered")]
    PracticeIncomplete { answered: usize, total: usize },
    #[error(transparent)]
    Practice(#[from] PracticeError),
    #[error("session already finished")]
    Finished,
    #[error("intent does not apply to this step")]
    NotApplicable,
}

/// An intent that the current step does not accept. The machine is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{intent:?} rejected during {step:?}: {reason}")]
pub struct InvalidTransition {
    pub intent: SessionIntent,
    pub step: StepKind,
    pub reason: Rejection,
}

//
// ─── CONTENT FETCHES ───────────────────────────────────────────────────────────
//

/// Tags a content fetch with the session and request that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub session: SessionId,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    ModuleIntro(ModuleId),
    Reading(LessonId),
    Practice(LessonId),
}

/// Content the machine is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub kind: FetchKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPayload {
    ModuleIntro(ModuleIntro),
    Reading(ReadingContent),
    Practice(PracticeSet),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub ticket: FetchTicket,
    pub payload: FetchPayload,
}

impl FetchResponse {
    #[must_use]
    pub fn new(request: &FetchRequest, payload: FetchPayload) -> Self {
        Self {
            ticket: request.ticket,
            payload,
        }
    }
}

/// What happened to a delivered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Failed,
    /// Dropped: other session, superseded request, or session already over.
    Stale,
}

//
// ─── STEPS ─────────────────────────────────────────────────────────────────────
//

/// Content slot of a step that needs a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Load<T> {
    Pending(FetchTicket),
    Ready(T),
    Failed(String),
}

impl<T> Load<T> {
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Load::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Load::Failed(message) => Some(message),
            _ => None,
        }
    }

    fn phase(&self) -> LoadPhase {
        match self {
            Load::Pending(_) => LoadPhase::Pending,
            Load::Ready(_) => LoadPhase::Ready,
            Load::Failed(_) => LoadPhase::Failed,
        }
    }

    fn ticket(&self) -> Option<FetchTicket> {
        match self {
            Load::Pending(ticket) => Some(*ticket),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPhase {
    Pending,
    Ready,
    Failed,
}

/// Result shown on the unlock screen. The score is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockSummary {
    pub lesson: LessonId,
    pub correct: usize,
    pub total: usize,
    pub xp_value: u32,
    pub next_lesson: Option<LessonId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed { lesson: LessonId },
    Exited { lesson: LessonId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStep {
    Intro {
        module: ModuleId,
        intro: Load<ModuleIntro>,
    },
    Reading(Load<ReadingContent>),
    Practice(Load<PracticeState>),
    Unlock(UnlockSummary),
    Finished(SessionOutcome),
}

impl SessionStep {
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            SessionStep::Intro { .. } => StepKind::Intro,
            SessionStep::Reading(_) => StepKind::Reading,
            SessionStep::Practice(_) => StepKind::Practice,
            SessionStep::Unlock(_) => StepKind::Unlock,
            SessionStep::Finished(_) => StepKind::Finished,
        }
    }

    fn load_phase(&self) -> Option<LoadPhase> {
        match self {
            SessionStep::Intro { intro, .. } => Some(intro.phase()),
            SessionStep::Reading(load) => Some(load.phase()),
            SessionStep::Practice(load) => Some(load.phase()),
            SessionStep::Unlock(_) | SessionStep::Finished(_) => None,
        }
    }

    fn pending_ticket(&self) -> Option<FetchTicket> {
        match self {
            SessionStep::Intro { intro, .. } => intro.ticket(),
            SessionStep::Reading(load) => load.ticket(),
            SessionStep::Practice(load) => load.ticket(),
            SessionStep::Unlock(_) | SessionStep::Finished(_) => None,
        }
    }

    fn fail(&mut self, message: String) {
        match self {
            SessionStep::Intro { intro, .. } => *intro = Load::Failed(message),
            SessionStep::Reading(load) => *load = Load::Failed(message),
            SessionStep::Practice(load) => *load = Load::Failed(message),
            SessionStep::Unlock(_) | SessionStep::Finished(_) => {}
        }
    }
}

//
// ─── TARGET ────────────────────────────────────────────────────────────────────
//

/// Catalog facts a session needs about the lesson it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTarget {
    pub lesson: LessonId,
    pub module: ModuleId,
    pub xp_value: u32,
    pub next_lesson: Option<LessonId>,
}

impl SessionTarget {
    #[must_use]
    pub fn from_catalog(catalog: &Catalog, lesson: LessonId) -> Option<Self> {
        let found = catalog.lesson(lesson)?;
        Some(Self {
            lesson,
            module: found.module_id(),
            xp_value: found.xp_value(),
            next_lesson: catalog.next_lesson(lesson).map(|l| l.id()),
        })
    }
}

//
// ─── MACHINE ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy)]
enum Fetchable {
    Intro,
    Reading,
    Practice,
}

enum Plan {
    Finish(SessionOutcome),
    Enter(Fetchable),
    EnterUnlock(UnlockSummary),
    Select(usize),
    NextQuestion,
    PreviousQuestion,
}

/// One learner's attempt at one lesson.
///
/// The step sequence is strictly linear: intro (optional), reading, practice,
/// unlock. `Exit` ends the attempt from any step. Rejected intents leave the
/// machine untouched. The machine has no side effects; recording a completion
/// is the caller's job and must happen before `Unlock` is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMachine {
    id: SessionId,
    target: SessionTarget,
    step: SessionStep,
    seq: u64,
}

impl SessionMachine {
    /// Opens a session on the module intro.
    #[must_use]
    pub fn open_module(id: SessionId, target: SessionTarget) -> (Self, FetchRequest) {
        Self::opened(id, target, Fetchable::Intro)
    }

    /// Opens a session directly on the reading step.
    #[must_use]
    pub fn open_lesson(id: SessionId, target: SessionTarget) -> (Self, FetchRequest) {
        Self::opened(id, target, Fetchable::Reading)
    }

    fn opened(id: SessionId, target: SessionTarget, which: Fetchable) -> (Self, FetchRequest) {
        let ticket = FetchTicket { session: id, seq: 1 };
        let (kind, step) = pending_step(&target, which, ticket);
        let machine = Self {
            id,
            target,
            step,
            seq: 1,
        };
        (machine, FetchRequest { ticket, kind })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn lesson(&self) -> LessonId {
        self.target.lesson
    }

    #[must_use]
    pub fn target(&self) -> &SessionTarget {
        &self.target
    }

    #[must_use]
    pub fn step(&self) -> &SessionStep {
        &self.step
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.step, SessionStep::Finished(_))
    }

    #[must_use]
    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.step {
            SessionStep::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// True while a content fetch is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.step.load_phase() == Some(LoadPhase::Pending)
    }

    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        match &self.step {
            SessionStep::Intro { intro, .. } => intro.failure(),
            SessionStep::Reading(load) => load.failure(),
            SessionStep::Practice(load) => load.failure(),
            SessionStep::Unlock(_) | SessionStep::Finished(_) => None,
        }
    }

    #[must_use]
    pub fn practice(&self) -> Option<&PracticeState> {
        match &self.step {
            SessionStep::Practice(load) => load.ready(),
            _ => None,
        }
    }

    /// Dry run of [`SessionMachine::apply`].
    ///
    /// # Errors
    ///
    /// Returns the `InvalidTransition` that `apply` would return.
    pub fn check(&self, intent: SessionIntent) -> Result<(), InvalidTransition> {
        self.plan(intent).map(|_| ())
    }

    /// Whether `intent` would be accepted right now.
    #[must_use]
    pub fn accepts(&self, intent: SessionIntent) -> bool {
        self.plan(intent).is_ok()
    }

    /// Applies an intent. Returns the content fetch the new step waits for, if any.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when the current step does not accept the
    /// intent; the machine is left as it was.
    pub fn apply(
        &mut self,
        intent: SessionIntent,
    ) -> Result<Option<FetchRequest>, InvalidTransition> {
        let plan = self.plan(intent)?;
        let step = self.step.kind();

        let request = match plan {
            Plan::Finish(outcome) => {
                self.step = SessionStep::Finished(outcome);
                None
            }
            Plan::Enter(which) => Some(self.enter(which)),
            Plan::EnterUnlock(summary) => {
                self.step = SessionStep::Unlock(summary);
                None
            }
            Plan::Select(_) | Plan::NextQuestion | Plan::PreviousQuestion => {
                let SessionStep::Practice(Load::Ready(state)) = &mut self.step else {
                    return Err(InvalidTransition {
                        intent,
                        step,
                        reason: Rejection::NotApplicable,
                    });
                };
                let moved = match plan {
                    Plan::Select(option) => state.select(option).map(|_| ()),
                    Plan::NextQuestion => state.next_question().map(|_| ()),
                    _ => state.previous_question().map(|_| ()),
                };
                moved.map_err(|e| InvalidTransition {
                    intent,
                    step,
                    reason: Rejection::Practice(e),
                })?;
                None
            }
        };
        Ok(request)
    }

    /// Delivers fetched content.
    ///
    /// Responses for another session, for a request that is no longer the
    /// outstanding one, or arriving after the session finished are dropped.
    pub fn resolve(&mut self, response: FetchResponse) -> Resolution {
        if response.ticket.session != self.id {
            return Resolution::Stale;
        }
        if self.step.pending_ticket() != Some(response.ticket) {
            return Resolution::Stale;
        }

        let lesson = self.target.lesson;
        let outcome = match (&mut self.step, response.payload) {
            (SessionStep::Intro { module, intro }, FetchPayload::ModuleIntro(content))
                if content.module_id() == *module =>
            {
                *intro = Load::Ready(content);
                Ok(())
            }
            (SessionStep::Reading(load), FetchPayload::Reading(content))
                if content.lesson_id() == lesson =>
            {
                *load = Load::Ready(content);
                Ok(())
            }
            (SessionStep::Practice(load), FetchPayload::Practice(set))
                if set.lesson_id() == lesson =>
            {
                *load = Load::Ready(PracticeState::new(set));
                Ok(())
            }
            (_, FetchPayload::Failed(message)) => Err(message),
            _ => Err("content does not match the requested step".to_owned()),
        };

        match outcome {
            Ok(()) => Resolution::Applied,
            Err(message) => {
                self.step.fail(message);
                Resolution::Failed
            }
        }
    }

    fn plan(&self, intent: SessionIntent) -> Result<Plan, InvalidTransition> {
        let reject = |reason| InvalidTransition {
            intent,
            step: self.step.kind(),
            reason,
        };
        let lesson = self.target.lesson;

        if let SessionStep::Finished(_) = self.step {
            return Err(reject(Rejection::Finished));
        }
        if intent == SessionIntent::Exit {
            return Ok(Plan::Finish(SessionOutcome::Exited { lesson }));
        }

        match self.step.load_phase() {
            Some(LoadPhase::Pending) => return Err(reject(Rejection::Loading)),
            Some(LoadPhase::Failed) => {
                return if intent == SessionIntent::Retry {
                    Ok(Plan::Enter(self.fetchable()))
                } else {
                    Err(reject(Rejection::LoadFailed))
                };
            }
            Some(LoadPhase::Ready) | None => {}
        }

        match (&self.step, intent) {
            (_, SessionIntent::Retry) => Err(reject(Rejection::NothingToRetry)),
            (SessionStep::Intro { .. }, SessionIntent::Start) => {
                Ok(Plan::Enter(Fetchable::Reading))
            }
            (SessionStep::Reading(_), SessionIntent::Next) => Ok(Plan::Enter(Fetchable::Practice)),
            (SessionStep::Practice(Load::Ready(state)), SessionIntent::Next) => {
                if state.is_complete() {
                    Ok(Plan::EnterUnlock(UnlockSummary {
                        lesson,
                        correct: state.correct_count(),
                        total: state.total(),
                        xp_value: self.target.xp_value,
                        next_lesson: self.target.next_lesson,
                    }))
                } else {
                    Err(reject(Rejection::PracticeIncomplete {
                        answered: state.answered_count(),
                        total: state.total(),
                    }))
                }
            }
            (SessionStep::Practice(Load::Ready(state)), SessionIntent::SelectAnswer(option)) => {
                state
                    .check_select(option)
                    .map(|()| Plan::Select(option))
                    .map_err(|e| reject(e.into()))
            }
            (SessionStep::Practice(Load::Ready(state)), SessionIntent::NextQuestion) => state
                .check_next_question()
                .map(|()| Plan::NextQuestion)
                .map_err(|e| reject(e.into())),
            (SessionStep::Practice(Load::Ready(state)), SessionIntent::PreviousQuestion) => state
                .check_previous_question()
                .map(|()| Plan::PreviousQuestion)
                .map_err(|e| reject(e.into())),
            (SessionStep::Unlock(_), SessionIntent::Unlock) => {
                Ok(Plan::Finish(SessionOutcome::Completed { lesson }))
            }
            _ => Err(reject(Rejection::NotApplicable)),
        }
    }

    fn fetchable(&self) -> Fetchable {
        match self.step {
            SessionStep::Intro { .. } => Fetchable::Intro,
            SessionStep::Practice(_) => Fetchable::Practice,
            _ => Fetchable::Reading,
        }
    }

    fn enter(&mut self, which: Fetchable) -> FetchRequest {
        self.seq += 1;
        let ticket = FetchTicket {
            session: self.id,
            seq: self.seq,
        };
        let (kind, step) = pending_step(&self.target, which, ticket);
        self.step = step;
        FetchRequest { ticket, kind }
    }
}

fn pending_step(
    target: &SessionTarget,
    which: Fetchable,
    ticket: FetchTicket,
) -> (FetchKind, SessionStep) {
    match which {
        Fetchable::Intro => (
            FetchKind::ModuleIntro(target.module),
            SessionStep::Intro {
                module: target.module,
                intro: Load::Pending(ticket),
            },
        ),
        Fetchable::Reading => (
            FetchKind::Reading(target.lesson),
            SessionStep::Reading(Load::Pending(ticket)),
        ),
        Fetchable::Practice => (
            FetchKind::Practice(target.lesson),
            SessionStep::Practice(Load::Pending(ticket)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, ReadingSection};

    fn target() -> SessionTarget {
        SessionTarget {
            lesson: LessonId::new(2),
            module: ModuleId::new(3),
            xp_value: 50,
            next_lesson: Some(LessonId::new(3)),
        }
    }

    fn intro() -> FetchPayload {
        FetchPayload::ModuleIntro(
            ModuleIntro::new(ModuleId::new(3), "Communication", "Why it matters", None).unwrap(),
        )
    }

    fn reading(lesson: u64) -> FetchPayload {
        FetchPayload::Reading(
            ReadingContent::new(
                LessonId::new(lesson),
                "Expressing Needs",
                vec![ReadingSection::new(None, "Use I-statements.")],
                None,
            )
            .unwrap(),
        )
    }

    fn practice(questions: usize) -> FetchPayload {
        let questions = (0..questions)
            .map(|i| {
                Question::new(i, format!("Q{i}"), vec!["yes".into(), "no".into()], 0, None)
                    .unwrap()
            })
            .collect();
        FetchPayload::Practice(PracticeSet::new(LessonId::new(2), questions))
    }

    fn deliver(machine: &mut SessionMachine, request: &FetchRequest, payload: FetchPayload) {
        assert_eq!(
            machine.resolve(FetchResponse::new(request, payload)),
            Resolution::Applied
        );
    }

    fn at_practice(questions: usize) -> SessionMachine {
        let (mut machine, request) = SessionMachine::open_lesson(SessionId::generate(), target());
        deliver(&mut machine, &request, reading(2));
        let request = machine.apply(SessionIntent::Next).unwrap().unwrap();
        deliver(&mut machine, &request, practice(questions));
        machine
    }

    #[test]
    fn module_session_walks_every_step_in_order() {
        let (mut machine, request) = SessionMachine::open_module(SessionId::generate(), target());
        assert_eq!(request.kind, FetchKind::ModuleIntro(ModuleId::new(3)));
        assert!(machine.is_loading());
        deliver(&mut machine, &request, intro());

        let request = machine.apply(SessionIntent::Start).unwrap().unwrap();
        assert_eq!(request.kind, FetchKind::Reading(LessonId::new(2)));
        deliver(&mut machine, &request, reading(2));

        let request = machine.apply(SessionIntent::Next).unwrap().unwrap();
        assert_eq!(request.kind, FetchKind::Practice(LessonId::new(2)));
        deliver(&mut machine, &request, practice(2));

        machine.apply(SessionIntent::SelectAnswer(0)).unwrap();
        machine.apply(SessionIntent::NextQuestion).unwrap();
        machine.apply(SessionIntent::SelectAnswer(1)).unwrap();
        assert_eq!(machine.apply(SessionIntent::Next).unwrap(), None);

        let SessionStep::Unlock(summary) = machine.step() else {
            panic!("expected unlock, got {:?}", machine.step());
        };
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.next_lesson, Some(LessonId::new(3)));

        machine.apply(SessionIntent::Unlock).unwrap();
        assert_eq!(
            machine.outcome(),
            Some(SessionOutcome::Completed {
                lesson: LessonId::new(2)
            })
        );
    }

    #[test]
    fn next_is_refused_until_every_question_is_answered() {
        let mut machine = at_practice(2);
        machine.apply(SessionIntent::SelectAnswer(1)).unwrap();

        let err = machine.apply(SessionIntent::Next).unwrap_err();
        assert_eq!(
            err.reason,
            Rejection::PracticeIncomplete {
                answered: 1,
                total: 2
            }
        );
        assert_eq!(machine.step().kind(), StepKind::Practice);
    }

    #[test]
    fn empty_practice_goes_straight_to_unlock() {
        let mut machine = at_practice(0);
        machine.apply(SessionIntent::Next).unwrap();
        assert_eq!(machine.step().kind(), StepKind::Unlock);
    }

    #[test]
    fn rejected_intents_leave_the_machine_unchanged() {
        let (mut machine, request) = SessionMachine::open_lesson(SessionId::generate(), target());
        let before = machine.clone();

        // still loading
        let err = machine.apply(SessionIntent::Next).unwrap_err();
        assert_eq!(err.reason, Rejection::Loading);
        assert_eq!(machine, before);

        deliver(&mut machine, &request, reading(2));
        let before = machine.clone();
        for intent in [
            SessionIntent::Start,
            SessionIntent::Unlock,
            SessionIntent::SelectAnswer(0),
            SessionIntent::Retry,
        ] {
            assert!(!machine.accepts(intent));
            assert!(machine.apply(intent).is_err());
        }
        assert_eq!(machine, before);
    }

    #[test]
    fn stale_responses_are_dropped() {
        let (mut machine, first) = SessionMachine::open_lesson(SessionId::generate(), target());
        machine.resolve(FetchResponse::new(&first, FetchPayload::Failed("offline".into())));
        let retry = machine.apply(SessionIntent::Retry).unwrap().unwrap();
        assert_ne!(first.ticket, retry.ticket);

        assert_eq!(
            machine.resolve(FetchResponse::new(&first, reading(2))),
            Resolution::Stale
        );
        assert!(machine.is_loading());

        let (_, foreign) = SessionMachine::open_lesson(SessionId::generate(), target());
        assert_eq!(
            machine.resolve(FetchResponse::new(&foreign, reading(2))),
            Resolution::Stale
        );

        deliver(&mut machine, &retry, reading(2));
        assert_eq!(machine.step().kind(), StepKind::Reading);
    }

    #[test]
    fn responses_after_exit_are_ignored() {
        let (mut machine, request) = SessionMachine::open_lesson(SessionId::generate(), target());
        machine.apply(SessionIntent::Exit).unwrap();
        assert_eq!(
            machine.resolve(FetchResponse::new(&request, reading(2))),
            Resolution::Stale
        );
        assert_eq!(
            machine.outcome(),
            Some(SessionOutcome::Exited {
                lesson: LessonId::new(2)
            })
        );
        assert_eq!(
            machine.apply(SessionIntent::Exit).unwrap_err().reason,
            Rejection::Finished
        );
    }

    #[test]
    fn failed_load_allows_retry_or_exit_only() {
        let (mut machine, request) = SessionMachine::open_lesson(SessionId::generate(), target());
        assert_eq!(
            machine.resolve(FetchResponse::new(
                &request,
                FetchPayload::Failed("disk error".into())
            )),
            Resolution::Failed
        );
        assert_eq!(machine.load_error(), Some("disk error"));
        assert_eq!(
            machine.apply(SessionIntent::Next).unwrap_err().reason,
            Rejection::LoadFailed
        );
        assert!(machine.accepts(SessionIntent::Retry));
        assert!(machine.accepts(SessionIntent::Exit));
    }

    #[test]
    fn content_for_another_lesson_is_treated_as_a_failure() {
        let (mut machine, request) = SessionMachine::open_lesson(SessionId::generate(), target());
        assert_eq!(
            machine.resolve(FetchResponse::new(&request, reading(9))),
            Resolution::Failed
        );
        assert!(machine.load_error().is_some());
    }

    #[test]
    fn target_reads_lesson_facts_from_catalog() {
        use crate::model::{CatalogDraft, LessonDraft, LessonKind, ModuleDraft};

        let catalog = Catalog::from_draft(CatalogDraft {
            modules: vec![ModuleDraft {
                id: ModuleId::new(3),
                title: "Communication and Boundaries".into(),
                description: None,
                order_index: 0,
                lessons: vec![
                    LessonDraft {
                        id: LessonId::new(1),
                        title: "Active Listening".into(),
                        order_index: 0,
                        kind: LessonKind::Standard,
                        xp_value: 50,
                    },
                    LessonDraft {
                        id: LessonId::new(2),
                        title: "Expressing Needs".into(),
                        order_index: 1,
                        kind: LessonKind::Standard,
                        xp_value: 50,
                    },
                ],
            }],
        })
        .unwrap();

        let first = SessionTarget::from_catalog(&catalog, LessonId::new(1)).unwrap();
        assert_eq!(first.module, ModuleId::new(3));
        assert_eq!(first.next_lesson, Some(LessonId::new(2)));
        let last = SessionTarget::from_catalog(&catalog, LessonId::new(2)).unwrap();
        assert_eq!(last.next_lesson, None);
        assert!(SessionTarget::from_catalog(&catalog, LessonId::new(5)).is_none());
    }
}
