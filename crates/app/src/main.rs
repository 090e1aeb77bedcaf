use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hub_core::model::{DisciplineId, IdError, RegionName, Resource, StageId, UserId};
use services::{Clock, HubServices, HubView, JsonCurriculumDir, ProgressSynchronizer, TaskState};
use storage::StoreConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { command: &'static str, name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    Invalid(hub_core::Error),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<IdError> for ArgsError {
    fn from(err: IdError) -> Self {
        ArgsError::Invalid(err.into())
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app show     [region] [--json]");
    eprintln!("  app toggle   <region> <stage> <task>");
    eprintln!("  app note     <region> <stage> <text>");
    eprintln!("  app score    <stage> <0-100>");
    eprintln!("  app quiz     <stage> <answer>...");
    eprintln!("  app bookmark <link> [--title T] [--type T] [--platform P] [--hours H]");
    eprintln!("  app region   <name>");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>        (default: sqlite://progress.sqlite3)");
    eprintln!("  --user <id>");
    eprintln!("  --discipline <id>");
    eprintln!("  --curriculum-dir <dir>   (default: curricula)");
    eprintln!("  --timeout-ms <ms>        (default: 5000)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  HUB_DB_URL, HUB_USER_ID, HUB_DISCIPLINE, HUB_CURRICULUM_DIR,");
    eprintln!("  HUB_STORE_TIMEOUT_MS");
    eprintln!("  RUST_LOG (default: info)");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

/// Connection and identity settings, from the environment then flags.
struct Config {
    db_url: String,
    user: Option<UserId>,
    discipline: Option<DisciplineId>,
    curriculum_dir: PathBuf,
    store: StoreConfig,
}

impl Config {
    fn from_env() -> Self {
        let timeout = std::env::var("HUB_STORE_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or(StoreConfig::DEFAULT_TIMEOUT, Duration::from_millis);
        Self {
            db_url: std::env::var("HUB_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://progress.sqlite3".into(), normalize_sqlite_url),
            user: std::env::var("HUB_USER_ID")
                .ok()
                .and_then(|value| UserId::new(value).ok()),
            discipline: std::env::var("HUB_DISCIPLINE")
                .ok()
                .and_then(|value| DisciplineId::new(value).ok()),
            curriculum_dir: std::env::var("HUB_CURRICULUM_DIR")
                .map_or_else(|_| PathBuf::from("curricula"), PathBuf::from),
            store: StoreConfig::with_timeout(timeout),
        }
    }
}

/// Bookmark metadata supplied through flags.
#[derive(Default)]
struct BookmarkFlags {
    title: Option<String>,
    kind: Option<String>,
    platform: Option<String>,
    hours: Option<f32>,
}

enum Command {
    Show { region: Option<RegionName>, json: bool },
    Toggle { region: RegionName, stage: StageId, task: String },
    Note { region: RegionName, stage: StageId, text: String },
    Score { stage: StageId, score: u32 },
    Quiz { stage: StageId, answers: Vec<usize> },
    Bookmark(Resource),
    Region(RegionName),
}

struct Args {
    config: Config,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut config = Config::from_env();
        let mut bookmark = BookmarkFlags::default();
        let mut json = false;
        let mut positional = Vec::new();

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    config.db_url = normalize_sqlite_url(value);
                }
                "--user" => config.user = Some(UserId::new(require_value(&mut args, "--user")?)?),
                "--discipline" => {
                    config.discipline = Some(DisciplineId::new(require_value(
                        &mut args,
                        "--discipline",
                    )?)?);
                }
                "--curriculum-dir" => {
                    config.curriculum_dir =
                        PathBuf::from(require_value(&mut args, "--curriculum-dir")?);
                }
                "--timeout-ms" => {
                    let raw = require_value(&mut args, "--timeout-ms")?;
                    let millis = parse_number("--timeout-ms", raw)?;
                    config.store = StoreConfig::with_timeout(Duration::from_millis(millis));
                }
                "--title" => bookmark.title = Some(require_value(&mut args, "--title")?),
                "--type" => bookmark.kind = Some(require_value(&mut args, "--type")?),
                "--platform" => bookmark.platform = Some(require_value(&mut args, "--platform")?),
                "--hours" => {
                    let raw = require_value(&mut args, "--hours")?;
                    bookmark.hours = Some(parse_number("--hours", raw)?);
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg.clone())),
                _ => positional.push(arg),
            }
        }

        let command = Self::command(positional, bookmark, json)?;
        Ok(Self { config, command })
    }

    fn command(
        positional: Vec<String>,
        bookmark: BookmarkFlags,
        json: bool,
    ) -> Result<Command, ArgsError> {
        let mut rest = positional.into_iter();
        let name = rest.next().unwrap_or_else(|| "show".to_owned());
        let mut take = |command: &'static str, field: &'static str| {
            rest.next()
                .ok_or(ArgsError::MissingArgument { command, name: field })
        };

        let command = match name.as_str() {
            "show" => Command::Show {
                region: take("show", "region").ok().map(RegionName::new),
                json,
            },
            "toggle" => Command::Toggle {
                region: RegionName::new(take("toggle", "region")?),
                stage: StageId::new(take("toggle", "stage")?),
                task: take("toggle", "task")?,
            },
            "note" => Command::Note {
                region: RegionName::new(take("note", "region")?),
                stage: StageId::new(take("note", "stage")?),
                text: take("note", "text")?,
            },
            "score" => Command::Score {
                stage: StageId::new(take("score", "stage")?),
                score: parse_number("score", take("score", "0-100")?)?,
            },
            "quiz" => {
                let stage = StageId::new(take("quiz", "stage")?);
                let mut answers = Vec::new();
                while let Ok(raw) = take("quiz", "answer") {
                    answers.push(parse_number("answer", raw)?);
                }
                Command::Quiz { stage, answers }
            }
            "bookmark" => {
                let link = take("bookmark", "link")?;
                let mut resource = Resource::new(
                    bookmark.title.unwrap_or_else(|| link.clone()),
                    bookmark.kind.unwrap_or_else(|| "link".to_owned()),
                    link,
                    bookmark.platform.unwrap_or_default(),
                );
                resource.estimated_hours = bookmark.hours;
                Command::Bookmark(resource)
            }
            "region" => Command::Region(RegionName::new(take("region", "name")?)),
            _ => return Err(ArgsError::UnknownCommand(name.clone())),
        };
        Ok(command)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path = std::path::Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

fn print_hub(sync: &ProgressSynchronizer, region: Option<RegionName>) {
    let record = sync.snapshot();
    let region = region.unwrap_or_else(|| record.preferred_region.clone());
    let view = HubView::build(sync.curriculum(), &record, &region);

    println!("{} / {}: {}% complete", sync.discipline(), view.region, view.percent);
    for stage in &view.stages {
        println!();
        println!("[{}] {} ({}%)", stage.id, stage.title, stage.percent);
        for task in &stage.tasks {
            let mark = match task.state {
                TaskState::Done => "x",
                TaskState::NotDone => " ",
                TaskState::Unrecorded => "·",
            };
            println!("  [{mark}] {}", task.label);
        }
        if let Some(score) = stage.quiz_score {
            println!("  quiz: {}%", score.percent());
        } else if stage.has_quiz {
            println!("  quiz: not taken");
        }
        if !stage.notes.is_empty() {
            println!("  notes: {}", stage.notes);
        }
    }
    if !view.bookmarks.is_empty() {
        println!();
        println!("bookmarks:");
        for resource in &view.bookmarks {
            println!("  {} <{}>", resource.title, resource.link);
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let Args { config, command } = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let discipline = config.discipline.ok_or(ArgsError::MissingValue {
        flag: "--discipline",
    })?;

    // The store migrates on connect; the file itself has to exist first.
    prepare_sqlite_file(&config.db_url)?;
    let curricula = Arc::new(JsonCurriculumDir::new(&config.curriculum_dir));
    let hub = HubServices::new_sqlite(&config.db_url, Clock::system(), config.store, curricula)
        .await?;
    info!(db = %config.db_url, %discipline, "progress store ready");

    let sync = hub.open_hub(config.user, discipline).await?;
    match command {
        Command::Show { region, json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&sync.snapshot())?);
            } else {
                print_hub(&sync, region);
            }
            return Ok(());
        }
        Command::Toggle {
            region,
            stage,
            task,
        } => {
            sync.toggle_checklist_item(&region, &stage, &task).await?;
        }
        Command::Note {
            region,
            stage,
            text,
        } => {
            sync.set_reflection(&region, &stage, &text).await?;
        }
        Command::Score { stage, score } => {
            sync.record_quiz_score(&stage, score).await?;
        }
        Command::Quiz { stage, answers } => {
            sync.submit_quiz(&stage, &answers).await?;
        }
        Command::Bookmark(resource) => {
            sync.toggle_bookmark(resource).await?;
        }
        Command::Region(region) => {
            sync.set_preferred_region(&region).await?;
        }
    }

    print_hub(&sync, None);
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
