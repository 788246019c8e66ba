use std::fmt;
use std::io::{self, BufRead, Write};

use lessons_core::model::{LessonId, MediaRef, ModuleId};
use lessons_core::progression::LessonStatus;
use lessons_core::session::{SessionIntent, SessionOutcome, StepKind};
use services::{
    AppServices, Clock, Dispatch, FlowError, LessonFlow, PracticeView, RoadmapView,
    SessionSnapshot, StepBody,
};
use storage::sqlite::{normalize_sqlite_url, prepare_sqlite_file};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidId { flag: &'static str, raw: String },
    MissingTarget,
    ConflictingTargets,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing subcommand"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::MissingTarget => write!(f, "play needs --lesson <id> or --module <id>"),
            ArgsError::ConflictingTargets => {
                write!(f, "--lesson and --module cannot be used together")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id(args: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<u64, ArgsError> {
    let value = require_value(args, flag)?;
    value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidId { flag, raw: value })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- roadmap [--db <sqlite_url>] [--json]");
    eprintln!("  cargo run -p app -- play    [--db <sqlite_url>] (--lesson <id> | --module <id>)");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://dev.sqlite3");
    eprintln!();
    eprintln!("Session keys:");
    eprintln!("  n / enter  continue      1-9  pick an answer");
    eprintln!("  < / >      move between questions");
    eprintln!("  r          retry loading  u    unlock      q  exit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LESSONS_DB_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Lesson(LessonId),
    Module(ModuleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Roadmap { json: bool },
    Play(Target),
}

struct Args {
    db_url: String,
    command: Command,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let name = match args.next() {
            None => return Err(ArgsError::MissingCommand),
            Some(arg) if arg == "--help" || arg == "-h" => {
                print_usage();
                std::process::exit(0);
            }
            Some(arg) => arg,
        };
        if name != "roadmap" && name != "play" {
            return Err(ArgsError::UnknownCommand(name));
        }

        let mut db_url =
            std::env::var("LESSONS_DB_URL").unwrap_or_else(|_| "sqlite://dev.sqlite3".into());
        let mut json = false;
        let mut target = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--json" if name == "roadmap" => json = true,
                "--lesson" if name == "play" => {
                    let id = parse_id(&mut args, "--lesson")?;
                    if target.replace(Target::Lesson(LessonId::new(id))).is_some() {
                        return Err(ArgsError::ConflictingTargets);
                    }
                }
                "--module" if name == "play" => {
                    let id = parse_id(&mut args, "--module")?;
                    if target.replace(Target::Module(ModuleId::new(id))).is_some() {
                        return Err(ArgsError::ConflictingTargets);
                    }
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = if name == "roadmap" {
            Command::Roadmap { json }
        } else {
            Command::Play(target.ok_or(ArgsError::MissingTarget)?)
        };

        Ok(Self {
            db_url: normalize_sqlite_url(&db_url),
            command,
        })
    }
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn status_marker(status: LessonStatus) -> &'static str {
    match status {
        LessonStatus::Completed => "[x]",
        LessonStatus::Current => "[>]",
        LessonStatus::Locked => "[ ]",
    }
}

fn print_roadmap(view: &RoadmapView) {
    for module in &view.modules {
        println!(
            "{} (module {}) {}/{}",
            module.title, module.id, module.progress.completed, module.progress.total
        );
        for lesson in &module.lessons {
            println!(
                "  {} {:>3}  {}  ({}, {} xp)",
                status_marker(lesson.status),
                lesson.id.value(),
                lesson.title,
                lesson.kind.as_str(),
                lesson.xp_value
            );
        }
    }
    println!(
        "progress: {}/{} ({:.0}%)",
        view.completed,
        view.total,
        view.ratio * 100.0
    );
}

fn print_practice(view: &PracticeView) {
    if view.total == 0 {
        println!("No questions for this lesson. Press n to continue.");
        return;
    }
    println!("Question {}/{}: {}", view.cursor + 1, view.total, view.prompt);
    for (index, option) in view.options.iter().enumerate() {
        let marker = if view.selected == Some(index) { '*' } else { ' ' };
        println!("  {marker} {}. {option}", index + 1);
    }
    if let Some(feedback) = view.feedback {
        if feedback.is_correct() {
            println!("Correct!");
        } else {
            println!("Not quite.");
        }
        if let Some(explanation) = &view.explanation {
            println!("{explanation}");
        }
    }
    println!("answered {}/{}", view.answered, view.total);
}

fn media_label(media: &MediaRef) -> String {
    format!("[{}: {}]", media.kind().as_str(), media.uri())
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    println!();
    println!("── {} ({:?}) ──", snapshot.lesson_title, snapshot.step);
    match &snapshot.body {
        StepBody::Loading => println!("Loading..."),
        StepBody::Failed { message } => {
            println!("Could not load this step: {message}");
            println!("Press r to retry or q to leave.");
        }
        StepBody::Intro {
            title,
            context,
            media,
        } => {
            println!("{title}");
            println!();
            println!("{context}");
            if let Some(media) = media {
                println!("{}", media_label(media));
            }
        }
        StepBody::Reading {
            title,
            sections,
            media,
        } => {
            println!("{title}");
            if let Some(media) = media {
                println!("{}", media_label(media));
            }
            for section in sections {
                println!();
                if let Some(heading) = &section.heading {
                    println!("## {heading}");
                }
                println!("{}", section.body);
            }
        }
        StepBody::Practice(view) => print_practice(view),
        StepBody::Unlock(summary) => {
            println!(
                "Lesson complete: {}/{} correct, {} xp.",
                summary.correct, summary.total, summary.xp_value
            );
            match summary.next_lesson {
                Some(next) => println!("Press u to unlock lesson {next}."),
                None => println!("Press u to finish the course."),
            }
        }
        StepBody::Finished(_) => {}
    }
}

//
// ─── SESSION LOOP ──────────────────────────────────────────────────────────────
//

fn parse_intent(line: &str, step: StepKind) -> Option<SessionIntent> {
    match line.trim() {
        "" | "n" => Some(match step {
            StepKind::Intro => SessionIntent::Start,
            StepKind::Unlock => SessionIntent::Unlock,
            _ => SessionIntent::Next,
        }),
        "<" => Some(SessionIntent::PreviousQuestion),
        ">" => Some(SessionIntent::NextQuestion),
        "r" => Some(SessionIntent::Retry),
        "u" => Some(SessionIntent::Unlock),
        "q" => Some(SessionIntent::Exit),
        other => other
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=9).contains(n))
            .map(|n| SessionIntent::SelectAnswer(n - 1)),
    }
}

async fn play(flow: &mut LessonFlow, target: Target) -> Result<(), Box<dyn std::error::Error>> {
    match target {
        Target::Lesson(lesson) => flow.start_lesson_and_load(lesson).await?,
        Target::Module(module) => flow.start_module_and_load(module).await?,
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let Some(snapshot) = flow.snapshot() else {
            return Ok(());
        };
        print_snapshot(&snapshot);
        print!("> ");
        io::stdout().flush()?;

        let intent = match lines.next() {
            Some(line) => match parse_intent(&line?, snapshot.step) {
                Some(intent) => intent,
                None => {
                    println!("Unknown key. Use n, 1-9, <, >, r, u or q.");
                    continue;
                }
            },
            None => SessionIntent::Exit,
        };

        match flow.dispatch_and_load(intent).await {
            Ok(Dispatch::Finished(outcome)) => {
                match outcome {
                    SessionOutcome::Completed { lesson } => {
                        println!("Lesson {lesson} unlocked the next step.");
                    }
                    SessionOutcome::Exited { lesson } => {
                        println!("Left lesson {lesson}. Progress unchanged.");
                    }
                }
                println!();
                print_roadmap(&flow.roadmap().roadmap());
                return Ok(());
            }
            Ok(Dispatch::Ignored(rejected)) => println!("Not now: {}.", rejected.reason),
            Ok(Dispatch::Applied | Dispatch::Fetch(_)) => {}
            Err(FlowError::Progress(err)) => {
                println!("Could not save your progress: {err}. Press u to try again.");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::system()).await?;

    match args.command {
        Command::Roadmap { json: true } => {
            println!("{}", serde_json::to_string_pretty(&services.roadmap().roadmap())?);
        }
        Command::Roadmap { json: false } => print_roadmap(&services.roadmap().roadmap()),
        Command::Play(target) => {
            let mut flow = services.lesson_flow();
            play(&mut flow, target).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
