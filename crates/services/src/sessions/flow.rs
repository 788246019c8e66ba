use std::collections::HashSet;
use std::sync::Arc;

use lessons_core::model::{Catalog, LessonId, ModuleId, SessionId};
use lessons_core::session::{
    FetchRequest, FetchResponse, InvalidTransition, Resolution, SessionIntent, SessionMachine,
    SessionOutcome, SessionTarget, StepKind,
};

use crate::content::{ContentFetcher, ContentProvider};
use crate::error::FlowError;
use crate::progress_store::ProgressStore;
use crate::roadmap::RoadmapService;

use super::view::SessionSnapshot;

/// What happened to a dispatched intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The session moved; nothing to load.
    Applied,
    /// The current step does not accept the intent. The session is unchanged.
    Ignored(InvalidTransition),
    /// The session moved and now waits for this content.
    Fetch(FetchRequest),
    Finished(SessionOutcome),
}

/// Hosts the learner's single active session.
///
/// Gating is checked against the live roadmap when a session starts, and the
/// completion is written to the `ProgressStore` before the session leaves its
/// unlock step. Module intros are shown once per module per `LessonFlow`.
pub struct LessonFlow {
    roadmap: RoadmapService,
    progress: Arc<ProgressStore>,
    fetcher: ContentFetcher,
    active: Option<SessionMachine>,
    seen_intros: HashSet<ModuleId>,
}

impl LessonFlow {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        progress: Arc<ProgressStore>,
        content: Arc<dyn ContentProvider>,
    ) -> Self {
        Self {
            roadmap: RoadmapService::new(catalog, Arc::clone(&progress)),
            progress,
            fetcher: ContentFetcher::new(content),
            active: None,
            seen_intros: HashSet::new(),
        }
    }

    #[must_use]
    pub fn roadmap(&self) -> &RoadmapService {
        &self.roadmap
    }

    #[must_use]
    pub fn active(&self) -> Option<&SessionMachine> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.active
            .as_ref()
            .map(|machine| SessionSnapshot::from_machine(machine, self.roadmap.catalog()))
    }

    #[must_use]
    pub fn has_seen_intro(&self, module: ModuleId) -> bool {
        self.seen_intros.contains(&module)
    }

    /// Handle for running fetches without borrowing the flow.
    #[must_use]
    pub fn fetcher(&self) -> ContentFetcher {
        self.fetcher.clone()
    }

    /// Starts a session on `lesson`, skipping the module intro.
    ///
    /// # Errors
    ///
    /// - `UnknownLesson` if the lesson is not in the catalog
    /// - `LessonLocked` if an earlier lesson is still incomplete
    pub fn start_lesson(&mut self, lesson: LessonId) -> Result<FetchRequest, FlowError> {
        let target = SessionTarget::from_catalog(self.roadmap.catalog(), lesson)
            .ok_or(FlowError::UnknownLesson(lesson))?;
        if !self.roadmap.can_start(lesson) {
            return Err(FlowError::LessonLocked(lesson));
        }

        let (machine, request) = SessionMachine::open_lesson(SessionId::generate(), target);
        Ok(self.begin(machine, request))
    }

    /// Starts a session on the module's first incomplete lesson.
    ///
    /// The module intro comes first unless it was already passed in this flow.
    /// A fully completed module reopens its first lesson.
    ///
    /// # Errors
    ///
    /// - `UnknownModule` / `EmptyModule` for a module with nothing to start
    /// - `LessonLocked` if the resolved lesson is not reachable yet
    pub fn start_module(&mut self, module: ModuleId) -> Result<FetchRequest, FlowError> {
        if self.roadmap.catalog().module(module).is_none() {
            return Err(FlowError::UnknownModule(module));
        }
        let (lesson, status) = self
            .roadmap
            .module_entry(module)
            .ok_or(FlowError::EmptyModule(module))?;
        if !status.is_startable() {
            return Err(FlowError::LessonLocked(lesson));
        }
        let target = SessionTarget::from_catalog(self.roadmap.catalog(), lesson)
            .ok_or(FlowError::UnknownLesson(lesson))?;

        let id = SessionId::generate();
        let (machine, request) = if self.seen_intros.contains(&module) {
            SessionMachine::open_lesson(id, target)
        } else {
            SessionMachine::open_module(id, target)
        };
        Ok(self.begin(machine, request))
    }

    /// Feeds a learner intent into the active session.
    ///
    /// Intents the current step does not accept come back as
    /// `Dispatch::Ignored`. `Unlock` goes through [`LessonFlow::unlock`].
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` if no session was started
    /// - `Progress` if recording the completion fails
    pub async fn dispatch(&mut self, intent: SessionIntent) -> Result<Dispatch, FlowError> {
        if intent == SessionIntent::Unlock {
            return self.unlock().await;
        }

        let machine = self.active.as_mut().ok_or(FlowError::NoActiveSession)?;
        let from = machine.step().kind();
        let request = match machine.apply(intent) {
            Ok(request) => request,
            Err(rejected) => return Ok(ignored(rejected)),
        };

        if from == StepKind::Intro && intent == SessionIntent::Start {
            self.seen_intros.insert(machine.target().module);
        }
        Ok(settled(machine, request))
    }

    /// Records the completion, then closes the session.
    ///
    /// If the completion cannot be persisted the session stays on its unlock
    /// step so the learner can try again or exit.
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` if no session was started
    /// - `Progress` if recording the completion fails
    pub async fn unlock(&mut self) -> Result<Dispatch, FlowError> {
        let machine = self.active.as_ref().ok_or(FlowError::NoActiveSession)?;
        if let Err(rejected) = machine.check(SessionIntent::Unlock) {
            return Ok(ignored(rejected));
        }
        let lesson = machine.lesson();

        self.progress.add(lesson).await?;

        let machine = self.active.as_mut().ok_or(FlowError::NoActiveSession)?;
        match machine.apply(SessionIntent::Unlock) {
            Ok(request) => Ok(settled(machine, request)),
            Err(rejected) => Ok(ignored(rejected)),
        }
    }

    /// Hands fetched content to the active session.
    pub fn deliver(&mut self, response: FetchResponse) -> Resolution {
        let ticket = response.ticket;
        let Some(machine) = self.active.as_mut() else {
            tracing::debug!(session = %ticket.session, "content for a closed session dropped");
            return Resolution::Stale;
        };

        let resolution = machine.resolve(response);
        match resolution {
            Resolution::Stale => tracing::debug!(
                session = %ticket.session,
                seq = ticket.seq,
                "stale content response dropped"
            ),
            Resolution::Failed => tracing::debug!(
                session = %ticket.session,
                step = ?machine.step().kind(),
                "step failed to load"
            ),
            Resolution::Applied => {}
        }
        resolution
    }

    /// [`LessonFlow::start_lesson`] followed by loading its content.
    ///
    /// # Errors
    ///
    /// Same as [`LessonFlow::start_lesson`].
    pub async fn start_lesson_and_load(
        &mut self,
        lesson: LessonId,
    ) -> Result<Resolution, FlowError> {
        let request = self.start_lesson(lesson)?;
        Ok(self.load(request).await)
    }

    /// [`LessonFlow::start_module`] followed by loading its content.
    ///
    /// # Errors
    ///
    /// Same as [`LessonFlow::start_module`].
    pub async fn start_module_and_load(
        &mut self,
        module: ModuleId,
    ) -> Result<Resolution, FlowError> {
        let request = self.start_module(module)?;
        Ok(self.load(request).await)
    }

    /// [`LessonFlow::dispatch`], loading whatever the new step waits for.
    ///
    /// # Errors
    ///
    /// Same as [`LessonFlow::dispatch`].
    pub async fn dispatch_and_load(
        &mut self,
        intent: SessionIntent,
    ) -> Result<Dispatch, FlowError> {
        let dispatch = self.dispatch(intent).await?;
        if let Dispatch::Fetch(request) = dispatch {
            self.load(request).await;
        }
        Ok(dispatch)
    }

    async fn load(&mut self, request: FetchRequest) -> Resolution {
        let response = self.fetcher.fetch(request).await;
        self.deliver(response)
    }

    fn begin(&mut self, machine: SessionMachine, request: FetchRequest) -> FetchRequest {
        let abandoned = self.active.take().filter(|previous| !previous.is_finished());
        if let Some(previous) = abandoned {
            tracing::debug!(
                session = %previous.id(),
                lesson = %previous.lesson(),
                "active session abandoned"
            );
        }
        tracing::info!(
            session = %machine.id(),
            lesson = %machine.lesson(),
            step = ?machine.step().kind(),
            "session started"
        );
        self.active = Some(machine);
        request
    }
}

fn ignored(rejected: InvalidTransition) -> Dispatch {
    tracing::debug!(
        intent = ?rejected.intent,
        step = ?rejected.step,
        reason = %rejected.reason,
        "intent ignored"
    );
    Dispatch::Ignored(rejected)
}

fn settled(machine: &SessionMachine, request: Option<FetchRequest>) -> Dispatch {
    if let Some(request) = request {
        return Dispatch::Fetch(request);
    }
    match machine.outcome() {
        Some(outcome) => {
            tracing::info!(session = %machine.id(), outcome = ?outcome, "session finished");
            Dispatch::Finished(outcome)
        }
        None => Dispatch::Applied,
    }
}
