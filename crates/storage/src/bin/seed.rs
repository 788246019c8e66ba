use std::fmt;
use std::path::PathBuf;

use lessons_core::model::{
    Catalog, CatalogDraft, Lesson, LessonId, LessonKind, MediaRef, MediaUri, Module, ModuleId,
    ModuleIntro, PracticeSet, Question, ReadingContent, ReadingSection,
};
use storage::repository::Storage;
use storage::sqlite::{normalize_sqlite_url, prepare_sqlite_file};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    catalog: Option<PathBuf>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LESSONS_DB_URL").unwrap_or_else(|_| "sqlite://dev.sqlite3".into());
        let mut catalog = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--catalog" => {
                    catalog = Some(PathBuf::from(require_value(&mut args, "--catalog")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url: normalize_sqlite_url(&db_url),
            catalog,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://dev.sqlite3)");
    eprintln!("  --catalog <file.json>     Catalog to load instead of the built-in demo");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LESSONS_DB_URL, RUST_LOG");
}

//
// ─── DEMO CONTENT ──────────────────────────────────────────────────────────────
//

struct DemoModule {
    id: u64,
    title: &'static str,
    description: &'static str,
    context: &'static str,
    media_url: Option<&'static str>,
}

struct DemoLesson {
    id: u64,
    module: u64,
    title: &'static str,
    kind: LessonKind,
    xp: u32,
    definition: &'static str,
    why_it_works: &'static str,
    remember: &'static str,
}

const MODULES: &[DemoModule] = &[
    DemoModule {
        id: 3,
        title: "Communication and Boundaries",
        description: "Express yourself clearly and protect what matters to you.",
        context: "In this module, you'll explore the essential skills for effective \
                  communication and setting healthy boundaries in relationships.\n\n\
                  Communication is more than just words. It's about understanding, empathy, \
                  and connection.\n\n\
                  Setting boundaries is an act of self-respect and care.",
        media_url: Some("https://images.unsplash.com/photo-1573497019940-1c28c88b4f3e?w=1200&q=80"),
    },
    DemoModule {
        id: 4,
        title: "Healthy vs. Unhealthy Relationships",
        description: "Recognize the patterns that build trust and the ones that erode it.",
        context: "Every relationship sends signals. In this module you'll learn to read them: \
                  the warning signs worth taking seriously and the everyday habits that \
                  keep a connection healthy.",
        media_url: None,
    },
];

const LESSONS: &[DemoLesson] = &[
    DemoLesson {
        id: 1,
        module: 3,
        title: "Active Listening",
        kind: LessonKind::Standard,
        xp: 50,
        definition: "Giving the speaker your full attention and trying to understand them \
                     before you respond.",
        why_it_works: "People who feel heard relax and share more honestly.",
        remember: "Listen to understand, not to reply.",
    },
    DemoLesson {
        id: 2,
        module: 3,
        title: "Expressing Needs",
        kind: LessonKind::Standard,
        xp: 50,
        definition: "Stating what you need using 'I' statements instead of blame.",
        why_it_works: "'I' statements describe your experience without putting the other \
                       person on the defensive.",
        remember: "Say what you feel and what you need.",
    },
    DemoLesson {
        id: 3,
        module: 3,
        title: "Setting Boundaries",
        kind: LessonKind::Standard,
        xp: 50,
        definition: "Clearly communicating your limits and needs.",
        why_it_works: "Clear limits protect your time and energy while keeping the \
                       relationship honest.",
        remember: "A boundary is information, not an attack.",
    },
    DemoLesson {
        id: 4,
        module: 3,
        title: "Conflict Resolution",
        kind: LessonKind::Standard,
        xp: 50,
        definition: "Working through a disagreement toward an outcome both people can accept.",
        why_it_works: "Focusing on the problem instead of the person keeps the conversation \
                       productive.",
        remember: "Attack the problem, not each other.",
    },
    DemoLesson {
        id: 5,
        module: 3,
        title: "Nonverbal Cues",
        kind: LessonKind::Narrative,
        xp: 50,
        definition: "The messages carried by posture, tone, and facial expression.",
        why_it_works: "Most emotional meaning travels outside the words themselves.",
        remember: "Check that your body says what your words say.",
    },
    DemoLesson {
        id: 6,
        module: 3,
        title: "Communication Practice",
        kind: LessonKind::Practice,
        xp: 40,
        definition: "Putting listening, 'I' statements, and boundaries together.",
        why_it_works: "Skills stick when they are practiced in combination.",
        remember: "Small, consistent practice beats a perfect script.",
    },
    DemoLesson {
        id: 7,
        module: 4,
        title: "Red Flags",
        kind: LessonKind::Standard,
        xp: 50,
        definition: "Behaviors that signal control, disrespect, or a lack of safety.",
        why_it_works: "Naming warning signs early makes them easier to act on.",
        remember: "Patterns matter more than single moments.",
    },
    DemoLesson {
        id: 8,
        module: 4,
        title: "Green Flags",
        kind: LessonKind::Standard,
        xp: 50,
        definition: "Behaviors that show respect, consistency, and care.",
        why_it_works: "Knowing what healthy looks like makes it easier to recognize.",
        remember: "Healthy feels safe, not just exciting.",
    },
    DemoLesson {
        id: 9,
        module: 4,
        title: "Trust & Respect",
        kind: LessonKind::Standard,
        xp: 50,
        definition: "Believing in each other's reliability and honoring each other's limits.",
        why_it_works: "Trust grows from many small kept promises.",
        remember: "Respect is shown, not claimed.",
    },
    DemoLesson {
        id: 10,
        module: 4,
        title: "Module 4 Review",
        kind: LessonKind::Milestone,
        xp: 100,
        definition: "A review of red flags, green flags, trust, and respect.",
        why_it_works: "Revisiting ideas together shows how they connect.",
        remember: "You now have a vocabulary for what healthy looks like.",
    },
];

fn demo_catalog() -> Result<Catalog, lessons_core::Error> {
    let mut modules = Vec::with_capacity(MODULES.len());
    for (module_order, module) in (0_u32..).zip(MODULES) {
        let module_id = ModuleId::new(module.id);
        let mut lessons = Vec::new();
        for (order, lesson) in (0_u32..).zip(LESSONS.iter().filter(|l| l.module == module.id)) {
            lessons.push(Lesson::new(
                LessonId::new(lesson.id),
                module_id,
                lesson.title,
                order,
                lesson.kind,
                lesson.xp,
            )?);
        }
        modules.push(Module::new(
            module_id,
            module.title,
            Some(module.description.to_owned()),
            module_order,
            lessons,
        )?);
    }
    Ok(Catalog::new(modules)?)
}

fn module_intro(module: &Module) -> Result<ModuleIntro, lessons_core::Error> {
    let demo = MODULES.iter().find(|m| m.id == module.id().value());
    let context = demo.map_or_else(
        || format!("This module covers {} lessons.", module.lessons().len()),
        |m| m.context.to_owned(),
    );
    let media = demo
        .and_then(|m| m.media_url)
        .map(MediaUri::from_url)
        .transpose()?
        .map(MediaRef::image);
    Ok(ModuleIntro::new(
        module.id(),
        format!("Welcome to {}!", module.title()),
        context,
        media,
    )?)
}

fn reading(lesson: &Lesson) -> Result<ReadingContent, lessons_core::Error> {
    let sections = match LESSONS.iter().find(|l| l.id == lesson.id().value()) {
        Some(demo) => vec![
            ReadingSection::new(Some("What it is".into()), demo.definition),
            ReadingSection::new(Some("Why it works".into()), demo.why_it_works),
            ReadingSection::new(Some("Remember".into()), demo.remember),
        ],
        None => vec![ReadingSection::new(
            None,
            format!("Read through {} before moving on to practice.", lesson.title()),
        )],
    };
    Ok(ReadingContent::new(
        lesson.id(),
        lesson.title(),
        sections,
        None,
    )?)
}

fn opts(options: &[&str]) -> Vec<String> {
    options.iter().map(|o| (*o).to_owned()).collect()
}

fn practice(lesson: &Lesson) -> Result<PracticeSet, lessons_core::Error> {
    let mut questions = Vec::new();
    if lesson.kind() == LessonKind::Practice {
        questions.push(Question::new(
            0,
            "What is active listening?",
            opts(&[
                "Waiting for your turn to speak",
                "Giving full attention and trying to understand the speaker",
                "Thinking about your response while someone talks",
                "Interrupting to show you understand",
            ]),
            1,
            None,
        )?);
        questions.push(Question::new(
            1,
            "Which of these is a good communication practice?",
            opts(&[
                "Using 'I' statements to express feelings",
                "Blaming others for problems",
                "Avoiding difficult conversations",
                "Making assumptions without asking",
            ]),
            0,
            None,
        )?);
        questions.push(Question::new(
            2,
            "What does setting boundaries mean?",
            opts(&[
                "Pushing people away",
                "Being selfish",
                "Clearly communicating your limits and needs",
                "Never helping others",
            ]),
            2,
            Some("Boundaries tell others how to treat you well.".into()),
        )?);
    } else if let Some(demo) = LESSONS.iter().find(|l| l.id == lesson.id().value()) {
        questions.push(Question::new(
            0,
            format!("Which statement best describes {}?", demo.title),
            opts(&[
                "Keeping score of who is right",
                demo.definition,
                "Avoiding the topic until it goes away",
            ]),
            1,
            Some(demo.remember.to_owned()),
        )?);
    }
    Ok(PracticeSet::new(lesson.id(), questions))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let catalog = match &args.catalog {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let draft: CatalogDraft = serde_json::from_str(&raw)?;
            Catalog::from_draft(draft)?
        }
        None => demo_catalog()?,
    };

    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    storage.catalog.save_catalog(&catalog).await?;
    for module in catalog.modules() {
        storage.content.save_module_intro(&module_intro(module)?).await?;
        for lesson in module.lessons() {
            storage.content.save_reading(&reading(lesson)?).await?;
            storage.content.save_practice(&practice(lesson)?).await?;
        }
    }

    tracing::info!(
        modules = catalog.modules().len(),
        lessons = catalog.len(),
        "seeded catalog"
    );
    println!(
        "Seeded {} modules and {} lessons into {}",
        catalog.modules().len(),
        catalog.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
