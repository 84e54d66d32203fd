mod calendar;
mod domain;
mod engine;
mod error;
mod persistence;
mod report;

use anyhow::{bail, Context, Result};
use calendar::Month;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use domain::{PreferencesPatch, TaskId, Theme, TimeFormat, TrackingType};
use engine::TrackerEngine;
use persistence::{data_file, init_local_dir, JsonFileRepository};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "timegrid")]
#[command(about = "A hierarchical time tracker with a monthly grid view", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .timegrid directory and seed starter tasks
    Init,
    /// Add a task
    Add {
        name: String,
        /// Parent task (id prefix or exact name)
        #[arg(short, long)]
        parent: Option<String>,
        /// Tracking type: manual, automatic, unique, or habit
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// List the task tree
    List {
        /// Include completed tasks even when preferences hide them
        #[arg(long)]
        all: bool,
    },
    /// Rename a task
    Rename { task: String, name: String },
    /// Remove a task and its whole subtree
    Remove { task: String },
    /// Record minutes for a task on a date; 0 clears the cell
    Log {
        task: String,
        /// Date in YYYY-MM-DD format
        date: String,
        minutes: f64,
    },
    /// Start a timer for a task
    Start {
        task: String,
        /// Date to credit (YYYY-MM-DD); defaults to today
        date: Option<String>,
    },
    /// Stop a running timer and credit the elapsed time
    Stop {
        task: String,
        /// Date to credit (YYYY-MM-DD); defaults to today
        date: Option<String>,
    },
    /// Pause a running timer
    Pause { task: String },
    /// Resume a paused timer
    Resume { task: String },
    /// Mark a day checked for a unique or habit task
    Check {
        task: String,
        /// Date in YYYY-MM-DD format
        date: String,
        /// Uncheck instead
        #[arg(long)]
        off: bool,
    },
    /// Toggle a task's completion flag
    Done { task: String },
    /// Toggle whether a task's children are shown
    Expand { task: String },
    /// Render the monthly grid
    Month {
        /// Month in YYYY-MM format; defaults to the current month
        month: Option<String>,
    },
    /// Export all data as a JSON snapshot
    Export {
        /// Output file; defaults to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a JSON snapshot, replacing all data
    Import { file: PathBuf },
    /// Show or update preferences
    Prefs {
        /// light, dark, or system
        #[arg(long)]
        theme: Option<String>,
        /// Default tracking type for new tasks
        #[arg(long)]
        default_kind: Option<String>,
        /// 12h or 24h
        #[arg(long)]
        time_format: Option<String>,
        #[arg(long)]
        hide_completed: Option<bool>,
    },
}

fn open_engine() -> Result<TrackerEngine> {
    let repo = JsonFileRepository::open(data_file()?)?;
    TrackerEngine::load(Box::new(repo)).context("failed to load tracker state")
}

/// Resolve a task reference: id prefix first, then exact name. Ambiguous
/// prefixes are an error rather than a guess.
fn resolve_task(engine: &TrackerEngine, reference: &str) -> Result<TaskId> {
    let prefix_matches: Vec<TaskId> = engine
        .tasks()
        .filter(|task| task.id.to_string().starts_with(reference))
        .map(|task| task.id)
        .collect();
    match prefix_matches.as_slice() {
        [single] => return Ok(*single),
        [] => {}
        _ => bail!("task id prefix '{}' is ambiguous", reference),
    }

    let name_matches: Vec<TaskId> = engine
        .tasks()
        .filter(|task| task.name == reference)
        .map(|task| task.id)
        .collect();
    match name_matches.as_slice() {
        [single] => Ok(*single),
        [] => bail!("no task matches '{}'", reference),
        _ => bail!("task name '{}' is ambiguous, use an id prefix", reference),
    }
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", input))
}

fn parse_kind(input: &str) -> Result<TrackingType> {
    TrackingType::from_tag(input)
        .with_context(|| format!("invalid tracking type '{}'", input))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let dir = init_local_dir()?;
            let mut engine = open_engine()?;
            engine.seed_sample_tasks()?;
            println!("Initialized timegrid directory: {}", dir.display());
            println!("Run 'timegrid list' to see the starter tasks.");
        }
        Commands::Add { name, parent, kind } => {
            let mut engine = open_engine()?;
            let parent_id = parent
                .map(|reference| resolve_task(&engine, &reference))
                .transpose()?;
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let task = engine.create_task(&name, parent_id, kind)?;
            println!("Added {} ({})", task.name, task.id);
        }
        Commands::List { all } => {
            let engine = open_engine()?;
            let hide_completed = !all && engine.preferences().hide_completed;
            print!("{}", report::render_task_list(&engine, hide_completed));
        }
        Commands::Rename { task, name } => {
            let mut engine = open_engine()?;
            let id = resolve_task(&engine, &task)?;
            let updated = engine.update_task(id, domain::TaskPatch::renamed(name))?;
            println!("Renamed to {}", updated.name);
        }
        Commands::Remove { task } => {
            let mut engine = open_engine()?;
            let id = resolve_task(&engine, &task)?;
            let removed = engine.delete_task(id)?;
            println!("Removed {} task(s)", removed.len());
        }
        Commands::Log { task, date, minutes } => {
            let mut engine = open_engine()?;
            let id = resolve_task(&engine, &task)?;
            let date = parse_date(&date)?;
            match engine.set_time(id, date, minutes)? {
                Some(entry) => println!("Logged {} min on {}", entry.minutes, entry.date),
                None => println!("Cleared {}", date),
            }
        }
        Commands::Start { task, date } => {
            let mut engine = open_engine()?;
            let id = resolve_task(&engine, &task)?;
            let date = date.as_deref().map(parse_date).transpose()?.unwrap_or_else(today);
            let timer = engine.start_timer(id, date)?;
            println!("Started timer at {}", timer.start_time.with_timezone(&Local));
        }
        Commands::Stop { task, date } => {
            let mut engine = open_engine()?;
            let id = resolve_task(&engine, &task)?;
            let date = date.as_deref().map(parse_date).transpose()?.unwrap_or_else(today);
            match engine.stop_timer(id, date)? {
                Some(entry) => println!(
                    "Stopped; {} now has {} min on {}",
                    engine.task(id).map(|t| t.name.as_str()).unwrap_or("task"),
                    entry.minutes,
                    entry.date
                ),
                None => println!("No timer running"),
            }
        }
        Commands::Pause { task } => {
            let mut engine = open_engine()?;
            let id = resolve_task(&engine, &task)?;
            match engine.pause_timer(id)? {
                Some(_) => println!("Paused"),
                None => println!("No running timer to pause"),
            }
        }
        Commands::Resume { task } => {
            let mut engine = open_engine()?;
            let id = resolve_task(&engine, &task)?;
            match engine.resume_timer(id)? {
                Some(_) => println!("Resumed"),
                None => println!("No paused timer to resume"),
            }
        }
        Commands::Check { task, date, off } => {
            let mut engine = open_engine()?;
            let id = resolve_task(&engine, &task)?;
            let date = parse_date(&date)?;
            let entry = engine.toggle_check(id, date, !off)?;
            println!(
                "{} {}",
                if entry.is_checked { "Checked" } else { "Unchecked" },
                entry.date
            );
        }
        Commands::Done { task } => {
            let mut engine = open_engine()?;
            let id = resolve_task(&engine, &task)?;
            let updated = engine.toggle_completion(id)?;
            println!(
                "{} is now {}",
                updated.name,
                if updated.is_completed { "completed" } else { "active" }
            );
        }
        Commands::Expand { task } => {
            let mut engine = open_engine()?;
            let id = resolve_task(&engine, &task)?;
            let updated = engine.toggle_expand(id)?;
            println!(
                "{} is now {}",
                updated.name,
                if updated.is_expanded { "expanded" } else { "collapsed" }
            );
        }
        Commands::Month { month } => {
            let engine = open_engine()?;
            let month = match month {
                Some(text) => Month::parse(&text)
                    .with_context(|| format!("invalid month '{}', expected YYYY-MM", text))?,
                None => Month::current(),
            };
            print!("{}", report::render_month_grid(&engine, month));
        }
        Commands::Export { output } => {
            let engine = open_engine()?;
            let json = engine.export_snapshot().to_json()?;
            match output {
                Some(path) => {
                    fs::write(&path, &json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Import { file } => {
            let mut engine = open_engine()?;
            let json = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let snapshot = persistence::Snapshot::from_json(&json)?;
            engine.import_snapshot(snapshot)?;
            println!("Imported {} task(s)", engine.task_count());
        }
        Commands::Prefs {
            theme,
            default_kind,
            time_format,
            hide_completed,
        } => {
            let mut engine = open_engine()?;
            let patch = PreferencesPatch {
                theme: theme
                    .as_deref()
                    .map(|tag| Theme::from_tag(tag).with_context(|| format!("invalid theme '{}'", tag)))
                    .transpose()?,
                default_tracking_type: default_kind.as_deref().map(parse_kind).transpose()?,
                time_format: time_format
                    .as_deref()
                    .map(|tag| {
                        TimeFormat::from_tag(tag)
                            .with_context(|| format!("invalid time format '{}'", tag))
                    })
                    .transpose()?,
                hide_completed,
            };
            let has_changes = patch.theme.is_some()
                || patch.default_tracking_type.is_some()
                || patch.time_format.is_some()
                || patch.hide_completed.is_some();
            let preferences = if has_changes {
                engine.update_preferences(patch)?
            } else {
                engine.preferences().clone()
            };
            println!("theme: {}", preferences.theme.to_tag());
            println!("default tracking type: {}", preferences.default_tracking_type.to_tag());
            println!("time format: {}", preferences.time_format.to_tag());
            println!("hide completed: {}", preferences.hide_completed);
        }
    }

    Ok(())
}
