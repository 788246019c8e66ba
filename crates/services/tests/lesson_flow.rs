use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lessons_core::model::{
    Catalog, Lesson, LessonId, LessonKind, MediaKind, MediaRef, MediaUri, Module, ModuleId,
    ModuleIntro, PracticeSet, Question, ReadingContent, ReadingSection,
};
use lessons_core::progression::LessonStatus;
use lessons_core::session::{
    Rejection, Resolution, SessionIntent, SessionOutcome, StepKind,
};
use lessons_core::time::fixed_now;
use services::{
    AppServices, Clock, ContentLoadError, ContentProvider, Dispatch, FlowError, LessonFlow,
    ProgressStore, RepositoryContentProvider, StepBody,
};
use storage::repository::{
    CatalogRepository, CompletionRecord, ContentRepository, InMemoryRepository,
    ProgressRepository, Storage, StorageError,
};

fn build_catalog() -> Catalog {
    let lesson = |id: u64, module: u64, order: u32, kind: LessonKind| {
        Lesson::new(
            LessonId::new(id),
            ModuleId::new(module),
            format!("Lesson {id}"),
            order,
            kind,
            50,
        )
        .unwrap()
    };
    let communication = Module::new(
        ModuleId::new(3),
        "Communication and Boundaries",
        None,
        0,
        vec![
            lesson(1, 3, 0, LessonKind::Standard),
            lesson(2, 3, 1, LessonKind::Practice),
            lesson(3, 3, 2, LessonKind::Narrative),
        ],
    )
    .unwrap();
    let relationships = Module::new(
        ModuleId::new(4),
        "Healthy vs. Unhealthy Relationships",
        None,
        1,
        vec![lesson(7, 4, 0, LessonKind::Milestone)],
    )
    .unwrap();
    Catalog::new(vec![communication, relationships]).unwrap()
}

fn question(position: usize, prompt: &str, correct: usize) -> Question {
    Question::new(
        position,
        prompt,
        vec!["First".into(), "Second".into(), "Third".into()],
        correct,
        Some("Because.".into()),
    )
    .unwrap()
}

async fn seed(repo: &InMemoryRepository) {
    let catalog = build_catalog();
    repo.save_catalog(&catalog).await.unwrap();

    for module in [3, 4] {
        let intro = ModuleIntro::new(ModuleId::new(module), "Welcome", "Why this matters.", None)
            .unwrap();
        repo.save_module_intro(&intro).await.unwrap();
    }
    for lesson in [1, 2, 3, 7] {
        let reading = ReadingContent::new(
            LessonId::new(lesson),
            format!("Lesson {lesson}"),
            vec![ReadingSection::new(Some("What it is".into()), "Body.")],
            None,
        )
        .unwrap();
        repo.save_reading(&reading).await.unwrap();
    }
    repo.save_practice(&PracticeSet::new(
        LessonId::new(1),
        vec![question(0, "What is active listening?", 1)],
    ))
    .await
    .unwrap();
    repo.save_practice(&PracticeSet::new(
        LessonId::new(2),
        vec![
            question(0, "Which is an I-statement?", 0),
            question(1, "What is a boundary?", 2),
        ],
    ))
    .await
    .unwrap();
    repo.save_practice(&PracticeSet::new(
        LessonId::new(3),
        vec![question(0, "Where does conflict start?", 0)],
    ))
    .await
    .unwrap();
    repo.save_practice(&PracticeSet::new(LessonId::new(7), Vec::new()))
        .await
        .unwrap();
}

async fn services_with(progress: Arc<dyn ProgressRepository>) -> (AppServices, InMemoryRepository) {
    let repo = InMemoryRepository::new();
    seed(&repo).await;
    let storage = Storage {
        catalog: Arc::new(repo.clone()),
        content: Arc::new(repo.clone()),
        progress,
    };
    let services = AppServices::from_storage(&storage, Clock::fixed(fixed_now()))
        .await
        .expect("services");
    (services, repo)
}

async fn services() -> AppServices {
    services_with(Arc::new(InMemoryRepository::new())).await.0
}

fn step(flow: &LessonFlow) -> StepKind {
    flow.snapshot().expect("active session").step
}

/// Walks an open lesson from reading to its unlock step, answering with option 0.
async fn advance_to_unlock(flow: &mut LessonFlow) {
    assert!(matches!(
        flow.dispatch_and_load(SessionIntent::Next).await.unwrap(),
        Dispatch::Fetch(_)
    ));
    let total = match flow.snapshot().unwrap().body {
        StepBody::Practice(view) => view.total,
        other => panic!("expected practice, got {other:?}"),
    };
    for index in 0..total {
        if index > 0 {
            flow.dispatch(SessionIntent::NextQuestion).await.unwrap();
        }
        flow.dispatch(SessionIntent::SelectAnswer(0)).await.unwrap();
    }
    assert_eq!(
        flow.dispatch(SessionIntent::Next).await.unwrap(),
        Dispatch::Applied
    );
    assert_eq!(step(flow), StepKind::Unlock);
}

#[tokio::test]
async fn completing_lesson_two_unlocks_lesson_three() {
    let services = services().await;
    services.progress().add(LessonId::new(1)).await.unwrap();
    let mut flow = services.lesson_flow();

    assert_eq!(
        flow.start_lesson_and_load(LessonId::new(2)).await.unwrap(),
        Resolution::Applied
    );
    assert_eq!(step(&flow), StepKind::Reading);

    flow.dispatch_and_load(SessionIntent::Next).await.unwrap();
    let snapshot = flow.snapshot().unwrap();
    assert_eq!(snapshot.step, StepKind::Practice);
    assert!(!snapshot.can_advance);

    flow.dispatch(SessionIntent::SelectAnswer(2)).await.unwrap();
    let snapshot = flow.snapshot().unwrap();
    assert!(!snapshot.can_advance);
    let StepBody::Practice(view) = snapshot.body else {
        panic!("expected practice body");
    };
    assert_eq!(view.answered, 1);
    assert!(view.feedback.is_some_and(|f| !f.is_correct()));
    assert_eq!(view.explanation.as_deref(), Some("Because."));

    flow.dispatch(SessionIntent::NextQuestion).await.unwrap();
    flow.dispatch(SessionIntent::SelectAnswer(0)).await.unwrap();
    assert!(flow.snapshot().unwrap().can_advance);

    flow.dispatch(SessionIntent::Next).await.unwrap();
    let StepBody::Unlock(summary) = flow.snapshot().unwrap().body else {
        panic!("expected unlock body");
    };
    assert_eq!(summary.total, 2);
    assert_eq!(summary.correct, 0);
    assert_eq!(summary.next_lesson, Some(LessonId::new(3)));

    let outcome = flow.dispatch(SessionIntent::Unlock).await.unwrap();
    assert_eq!(
        outcome,
        Dispatch::Finished(SessionOutcome::Completed {
            lesson: LessonId::new(2)
        })
    );

    let progress = services.progress();
    assert_eq!(
        progress.all_ids(),
        HashSet::from([LessonId::new(1), LessonId::new(2)])
    );
    let roadmap = services.roadmap();
    assert_eq!(
        roadmap.status(LessonId::new(2)),
        Some(LessonStatus::Completed)
    );
    assert_eq!(roadmap.status(LessonId::new(3)), Some(LessonStatus::Current));
}

#[tokio::test]
async fn locked_lesson_is_refused_without_touching_progress() {
    let services = services().await;
    let mut flow = services.lesson_flow();

    assert!(matches!(
        flow.start_lesson(LessonId::new(3)),
        Err(FlowError::LessonLocked(id)) if id == LessonId::new(3)
    ));
    assert!(flow.active().is_none());
    assert!(services.progress().is_empty());

    assert!(matches!(
        flow.start_lesson(LessonId::new(99)),
        Err(FlowError::UnknownLesson(_))
    ));
}

#[tokio::test]
async fn exit_from_any_step_leaves_progress_unchanged() {
    let services = services().await;
    let mut flow = services.lesson_flow();

    flow.start_module_and_load(ModuleId::new(3)).await.unwrap();
    assert_eq!(step(&flow), StepKind::Intro);
    assert!(matches!(
        flow.dispatch(SessionIntent::Exit).await.unwrap(),
        Dispatch::Finished(SessionOutcome::Exited { .. })
    ));

    flow.start_lesson_and_load(LessonId::new(1)).await.unwrap();
    advance_to_unlock(&mut flow).await;
    assert_eq!(
        flow.dispatch(SessionIntent::Exit).await.unwrap(),
        Dispatch::Finished(SessionOutcome::Exited {
            lesson: LessonId::new(1)
        })
    );
    assert!(services.progress().is_empty());

    // Finished sessions accept nothing further.
    let late = flow.dispatch(SessionIntent::Unlock).await.unwrap();
    assert!(matches!(late, Dispatch::Ignored(ref t) if t.reason == Rejection::Finished));
    assert!(services.progress().is_empty());
}

#[tokio::test]
async fn unlock_before_unlock_step_is_ignored() {
    let services = services().await;
    let mut flow = services.lesson_flow();
    flow.start_lesson_and_load(LessonId::new(1)).await.unwrap();

    let result = flow.dispatch(SessionIntent::Unlock).await.unwrap();
    assert!(matches!(result, Dispatch::Ignored(ref t) if t.step == StepKind::Reading));
    assert_eq!(step(&flow), StepKind::Reading);
    assert!(services.progress().is_empty());
}

#[tokio::test]
async fn responses_for_abandoned_sessions_are_dropped() {
    let services = services().await;
    let mut flow = services.lesson_flow();
    let fetcher = flow.fetcher();

    let first = flow.start_lesson(LessonId::new(1)).unwrap();
    let second = flow.start_lesson(LessonId::new(1)).unwrap();
    assert_ne!(first.ticket, second.ticket);

    let stale = fetcher.fetch(first).await;
    assert_eq!(flow.deliver(stale), Resolution::Stale);
    assert_eq!(flow.snapshot().unwrap().body, StepBody::Loading);

    let fresh = fetcher.fetch(second).await;
    assert_eq!(flow.deliver(fresh), Resolution::Applied);
    assert_eq!(step(&flow), StepKind::Reading);

    let request = match flow.dispatch(SessionIntent::Next).await.unwrap() {
        Dispatch::Fetch(request) => request,
        other => panic!("expected fetch, got {other:?}"),
    };
    flow.dispatch(SessionIntent::Exit).await.unwrap();
    let late = fetcher.fetch(request).await;
    assert_eq!(flow.deliver(late), Resolution::Stale);
}

#[tokio::test]
async fn loading_step_only_accepts_exit() {
    let services = services().await;
    let mut flow = services.lesson_flow();
    flow.start_lesson(LessonId::new(1)).unwrap();

    let result = flow.dispatch(SessionIntent::Next).await.unwrap();
    assert!(matches!(result, Dispatch::Ignored(ref t) if t.reason == Rejection::Loading));
    assert!(matches!(
        flow.dispatch(SessionIntent::Exit).await.unwrap(),
        Dispatch::Finished(_)
    ));
}

#[tokio::test]
async fn module_intro_is_shown_once_per_module() {
    let services = services().await;
    let mut flow = services.lesson_flow();

    flow.start_module_and_load(ModuleId::new(3)).await.unwrap();
    let snapshot = flow.snapshot().unwrap();
    assert_eq!(snapshot.lesson, LessonId::new(1));
    assert!(matches!(snapshot.body, StepBody::Intro { ref title, .. } if title == "Welcome"));
    assert!(!flow.has_seen_intro(ModuleId::new(3)));

    flow.dispatch_and_load(SessionIntent::Start).await.unwrap();
    assert_eq!(step(&flow), StepKind::Reading);
    assert!(flow.has_seen_intro(ModuleId::new(3)));
    flow.dispatch(SessionIntent::Exit).await.unwrap();

    flow.start_module_and_load(ModuleId::new(3)).await.unwrap();
    assert_eq!(step(&flow), StepKind::Reading);
}

#[tokio::test]
async fn reading_snapshot_keeps_the_media_kind() {
    let (services, repo) = services_with(Arc::new(InMemoryRepository::new())).await;
    let video = MediaRef::new(
        MediaUri::parse("https://videos.example.com/listening.mp4").unwrap(),
        MediaKind::Video,
    );
    let reading = ReadingContent::new(
        LessonId::new(1),
        "Lesson 1",
        vec![ReadingSection::new(None, "Watch first.")],
        Some(video.clone()),
    )
    .unwrap();
    repo.save_reading(&reading).await.unwrap();

    let mut flow = services.lesson_flow();
    flow.start_lesson_and_load(LessonId::new(1)).await.unwrap();
    let snapshot = flow.snapshot().unwrap();
    match snapshot.body {
        StepBody::Reading { media, .. } => {
            let media = media.expect("reading media");
            assert_eq!(media.kind(), MediaKind::Video);
            assert_eq!(media, video);
        }
        other => panic!("expected reading, got {other:?}"),
    }
}

#[tokio::test]
async fn module_entry_resolves_first_incomplete_lesson() {
    let services = services().await;
    let progress = services.progress();
    let mut flow = services.lesson_flow();

    assert!(matches!(
        flow.start_module(ModuleId::new(4)),
        Err(FlowError::LessonLocked(id)) if id == LessonId::new(7)
    ));
    assert!(matches!(
        flow.start_module(ModuleId::new(9)),
        Err(FlowError::UnknownModule(_))
    ));

    progress.add(LessonId::new(1)).await.unwrap();
    flow.start_module(ModuleId::new(3)).unwrap();
    assert_eq!(flow.active().unwrap().lesson(), LessonId::new(2));

    progress.add(LessonId::new(2)).await.unwrap();
    progress.add(LessonId::new(3)).await.unwrap();
    flow.start_module(ModuleId::new(3)).unwrap();
    assert_eq!(flow.active().unwrap().lesson(), LessonId::new(1));
}

#[tokio::test]
async fn empty_practice_set_is_immediately_complete() {
    let services = services().await;
    let progress = services.progress();
    for id in [1, 2, 3] {
        progress.add(LessonId::new(id)).await.unwrap();
    }
    let mut flow = services.lesson_flow();

    flow.start_lesson_and_load(LessonId::new(7)).await.unwrap();
    flow.dispatch_and_load(SessionIntent::Next).await.unwrap();
    let snapshot = flow.snapshot().unwrap();
    assert_eq!(snapshot.step, StepKind::Practice);
    assert!(snapshot.can_advance);

    flow.dispatch(SessionIntent::Next).await.unwrap();
    let StepBody::Unlock(summary) = flow.snapshot().unwrap().body else {
        panic!("expected unlock body");
    };
    assert_eq!(summary.total, 0);
    assert_eq!(summary.next_lesson, None);

    flow.dispatch(SessionIntent::Unlock).await.unwrap();
    assert!((services.roadmap().progress_ratio() - 1.0).abs() < f64::EPSILON);
    assert_eq!(services.roadmap().roadmap().current, None);
}

#[tokio::test]
async fn dispatch_without_session_is_an_error() {
    let services = services().await;
    let mut flow = services.lesson_flow();
    assert!(matches!(
        flow.dispatch(SessionIntent::Next).await,
        Err(FlowError::NoActiveSession)
    ));
    assert_eq!(flow.snapshot(), None);
}

struct FailingProgress;

#[async_trait]
impl ProgressRepository for FailingProgress {
    async fn contains(&self, _lesson: LessonId) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn add(
        &self,
        _lesson: LessonId,
        _completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }

    async fn all_ids(&self) -> Result<HashSet<LessonId>, StorageError> {
        Ok(HashSet::new())
    }

    async fn list_completions(&self) -> Result<Vec<CompletionRecord>, StorageError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn failed_completion_write_keeps_unlock_step() {
    let (services, _repo) = services_with(Arc::new(FailingProgress)).await;
    let mut flow = services.lesson_flow();

    flow.start_lesson_and_load(LessonId::new(1)).await.unwrap();
    advance_to_unlock(&mut flow).await;

    assert!(matches!(
        flow.dispatch(SessionIntent::Unlock).await,
        Err(FlowError::Progress(_))
    ));
    assert_eq!(step(&flow), StepKind::Unlock);
    assert!(services.progress().is_empty());

    assert!(matches!(
        flow.dispatch(SessionIntent::Exit).await.unwrap(),
        Dispatch::Finished(SessionOutcome::Exited { .. })
    ));
}

/// Fails the first reading request, then defers to the repository.
struct FlakyReading {
    inner: RepositoryContentProvider,
    fail_next: AtomicBool,
}

#[async_trait]
impl ContentProvider for FlakyReading {
    async fn module_intro(&self, module: ModuleId) -> Result<ModuleIntro, ContentLoadError> {
        self.inner.module_intro(module).await
    }

    async fn reading(&self, lesson: LessonId) -> Result<ReadingContent, ContentLoadError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ContentLoadError::Unavailable("offline".into()));
        }
        self.inner.reading(lesson).await
    }

    async fn practice(&self, lesson: LessonId) -> Result<PracticeSet, ContentLoadError> {
        self.inner.practice(lesson).await
    }
}

#[tokio::test]
async fn failed_load_stays_on_step_until_retry() {
    let (services, repo) = services_with(Arc::new(InMemoryRepository::new())).await;
    let provider = FlakyReading {
        inner: RepositoryContentProvider::new(Arc::new(repo)),
        fail_next: AtomicBool::new(true),
    };
    let mut flow = LessonFlow::new(
        services.catalog(),
        Arc::new(ProgressStore::in_memory(Clock::fixed(fixed_now()))),
        Arc::new(provider),
    );

    assert_eq!(
        flow.start_lesson_and_load(LessonId::new(1)).await.unwrap(),
        Resolution::Failed
    );
    let snapshot = flow.snapshot().unwrap();
    assert_eq!(snapshot.step, StepKind::Reading);
    assert_eq!(
        snapshot.body,
        StepBody::Failed {
            message: "content provider unavailable: offline".into()
        }
    );

    let next = flow.dispatch(SessionIntent::Next).await.unwrap();
    assert!(matches!(next, Dispatch::Ignored(ref t) if t.reason == Rejection::LoadFailed));

    assert!(matches!(
        flow.dispatch_and_load(SessionIntent::Retry).await.unwrap(),
        Dispatch::Fetch(_)
    ));
    assert!(matches!(
        flow.snapshot().unwrap().body,
        StepBody::Reading { ref title, .. } if title == "Lesson 1"
    ));
}
