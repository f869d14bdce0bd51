use chrono::{Datelike, Local, Months, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use gymtrack::{
    app_dirs::AppDirs,
    backup,
    catalog::{mark_video_completed, ExerciseCatalog, VideoCatalog, CATEGORIES},
    config::{Config, ConfigStore, FileConfigStore},
    elapsed::ElapsedClock,
    model::{Exercise, FieldValue, Param, RoutineExercise, WorkoutSession, DEFAULT_SETS_COUNT},
    rest_timer::{preset_secs, RestTimer, TerminalSignal, REST_PRESETS_SECS},
    routine::RoutineStore,
    runtime::{
        run_rest_timer, spawn_stdin_commands, ChannelEventSource, Command, FixedTicker,
        RunOutcome, Runner, TickLoop, TimerEvent,
    },
    session::SessionStore,
    stats::{finished_dates_desc, sessions_per_day, summarize},
    storage::{Repository, SqliteKvStore},
    util::{backup_file_name, format_clock},
};
use std::{
    error::Error,
    io::{self, Write},
    path::PathBuf,
    sync::mpsc,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

/// log workouts, time rests between sets and keep your streak going
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "A local-first workout log: record sessions set by set, run rest countdowns between sets, reuse routines and follow-along videos, and see your weekly count and streak."
)]
pub struct Cli {
    /// database file to use instead of the configured one
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    #[clap(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// start a new workout for today
    Start {
        /// routine (id or name) to expand into the workout
        #[clap(short, long)]
        routine: Option<String>,
    },
    /// show the open workout
    Status,
    /// make an existing unfinished workout the one being edited
    Resume { session: String },
    /// add an exercise by catalog name or as a free-form one
    AddExercise {
        name: String,
        /// fields to track, e.g. weight,reps
        #[clap(long, value_delimiter = ',')]
        params: Vec<Param>,
        /// rest between sets in seconds
        #[clap(long)]
        rest: Option<u32>,
    },
    /// remove the exercise at the given position
    RemoveExercise { exercise: usize },
    /// append a blank set to an exercise
    AddSet { exercise: usize },
    RemoveSet { exercise: usize, set: usize },
    /// record a field value on a set, e.g. `set 1 2 weight 80`
    Set {
        exercise: usize,
        set: usize,
        field: Param,
        value: String,
    },
    /// toggle a set done
    Done {
        exercise: usize,
        set: usize,
        /// run the exercise's rest countdown once the set is marked done
        #[clap(long)]
        rest: bool,
    },
    /// set workout notes
    Notes {
        text: String,
        /// workout id, defaults to the open one
        #[clap(long)]
        session: Option<String>,
    },
    ExerciseNotes { exercise: usize, text: String },
    /// change an exercise's rest between sets
    RestTarget { exercise: usize, secs: u32 },
    /// change the workout's display color
    Color {
        color: String,
        #[clap(long)]
        session: Option<String>,
    },
    /// finish the open workout
    Finish,
    Delete { session: String },
    /// start a new workout with the same exercises as an earlier one
    Duplicate { session: String },
    /// list recent workouts
    History {
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,
        /// only workouts on this day, YYYY-MM-DD
        #[clap(long)]
        date: Option<NaiveDate>,
        #[clap(long)]
        json: bool,
    },
    /// workouts per day for a month
    Calendar {
        /// YYYY-MM, defaults to the current month
        #[clap(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
    /// weekly count, streak and totals
    Stats {
        #[clap(long)]
        json: bool,
    },
    /// run a rest countdown; reads p/r/+N/-N/s/x/q from stdin
    Rest {
        /// seconds; defaults to the exercise's rest or the configured default
        secs: Option<u32>,
        /// built-in rest: 1=0:30 2=1:00 3=1:30 4=2:00 5=3:00 6=5:00
        #[clap(
            long,
            conflicts_with = "secs",
            value_parser = clap::value_parser!(u8).range(1..=REST_PRESETS_SECS.len() as i64)
        )]
        preset: Option<u8>,
        /// use this exercise's rest target and name
        #[clap(long)]
        exercise: Option<usize>,
        #[clap(long)]
        label: Option<String>,
    },
    /// time spent in the open workout
    Elapsed {
        /// keep updating; reads p/r/q from stdin
        #[clap(long)]
        watch: bool,
    },
    Routine {
        #[clap(subcommand)]
        action: RoutineAction,
    },
    Video {
        #[clap(subcommand)]
        action: VideoAction,
    },
    /// browse the exercise catalog and manage custom exercises
    Exercises {
        #[clap(long)]
        category: Option<String>,
        #[clap(long)]
        search: Option<String>,
        /// save a custom exercise with this name
        #[clap(long)]
        custom_add: Option<String>,
        #[clap(long, value_delimiter = ',')]
        params: Vec<Param>,
        /// delete a custom exercise by id
        #[clap(long)]
        custom_delete: Option<String>,
    },
    /// write a backup of workouts, routines and custom exercises
    Export { file: Option<PathBuf> },
    /// replace data with the contents of a backup
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum RoutineAction {
    /// save a routine; exercises as `Name` or `Name:sets`
    Create {
        name: String,
        #[clap(short, long = "exercise")]
        exercises: Vec<String>,
        #[clap(long)]
        color: Option<String>,
    },
    List,
    Delete { routine: String },
    /// start today's workout from a routine
    Start { routine: String },
}

#[derive(Subcommand, Debug)]
enum VideoAction {
    List {
        #[clap(long)]
        catalog: PathBuf,
        #[clap(long)]
        search: Option<String>,
    },
    /// log a followed video as a finished workout
    Log {
        id: String,
        #[clap(long)]
        catalog: PathBuf,
    },
}

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

struct App {
    config: Config,
    repo: Repository<SqliteKvStore>,
    sessions: SessionStore,
}

impl App {
    fn open(db: Option<PathBuf>) -> CliResult<Self> {
        let config = FileConfigStore::new().load();
        let path = AppDirs::resolve_db_path(db, config.db_path.clone())
            .ok_or("could not determine where to keep the database")?;
        tracing::debug!(path = %path.display(), "opening database");
        let repo = Repository::new(SqliteKvStore::open(&path)?);
        let sessions = SessionStore::new(repo.load_sessions());
        Ok(Self {
            config,
            repo,
            sessions,
        })
    }

    fn persist_sessions(&mut self) {
        if let Err(e) = self.repo.save_sessions(self.sessions.sessions()) {
            tracing::error!(error = %e, "could not save workouts");
        }
    }

    fn point_at(&mut self, session_id: &str) {
        if let Err(e) = self.repo.set_active_session_id(session_id) {
            tracing::error!(error = %e, "could not save the open workout");
        }
    }

    fn clear_pointer(&mut self) {
        if let Err(e) = self.repo.clear_active_session_id() {
            tracing::error!(error = %e, "could not clear the open workout");
        }
    }

    /// The pointed-at workout while it is still open, else today's open one.
    fn current(&self) -> Option<&WorkoutSession> {
        self.repo
            .active_session_id()
            .and_then(|id| self.sessions.get(&id))
            .filter(|s| !s.is_complete())
            .or_else(|| self.sessions.active_session_for_today())
    }

    fn current_id(&self) -> CliResult<String> {
        self.current()
            .map(|s| s.id.clone())
            .ok_or_else(|| "no open workout; run `gymtrack start` first".into())
    }

    fn exercise_id(&self, session_id: &str, position: usize) -> CliResult<String> {
        self.sessions
            .get(session_id)
            .and_then(|s| s.exercises.get(position.wrapping_sub(1)))
            .map(|e| e.id.clone())
            .ok_or_else(|| format!("no exercise #{position} in this workout").into())
    }

    fn set_id(&self, session_id: &str, exercise_id: &str, position: usize) -> CliResult<String> {
        self.sessions
            .get(session_id)
            .and_then(|s| s.exercise(exercise_id))
            .and_then(|e| e.sets.get(position.wrapping_sub(1)))
            .map(|s| s.id.clone())
            .ok_or_else(|| format!("no set #{position} on that exercise").into())
    }

    fn require(applied: bool, what: &str) -> CliResult {
        if applied {
            Ok(())
        } else {
            Err(format!("{what}: the workout is finished or the target is gone").into())
        }
    }

    fn start(&mut self, routine: Option<&str>) -> CliResult {
        if self.sessions.open_sessions_today() > 0 {
            return Err("a workout is already open today; finish it first".into());
        }
        let session = match routine {
            Some(query) => {
                let routines = RoutineStore::new(self.repo.load_routines());
                let routine = routines
                    .find(query)
                    .ok_or_else(|| format!("no routine named '{query}'"))?;
                self.sessions.create_session_from_routine(routine)
            }
            None => self.sessions.create_session(),
        };
        let (id, start) = (session.id.clone(), session.start_time.clone());
        println!("Started workout {id} at {start}");
        self.point_at(&id);
        self.persist_sessions();
        Ok(())
    }

    fn run(&mut self, action: Action) -> CliResult {
        match action {
            Action::Start { routine } => self.start(routine.as_deref())?,
            Action::Status => match self.current() {
                Some(session) => print_session(session),
                None => println!("No open workout today."),
            },
            Action::Resume { session } => {
                match self.sessions.get(&session) {
                    Some(s) if !s.is_complete() => {}
                    Some(_) => return Err("that workout is already finished".into()),
                    None => return Err(format!("no workout {session}").into()),
                }
                self.point_at(&session);
                println!("Resumed workout {session}");
            }
            Action::AddExercise { name, params, rest } => {
                let sid = self.current_id()?;
                let catalog = ExerciseCatalog::new(self.repo.load_custom_exercises());
                let mut exercise = catalog
                    .find(&name)
                    .cloned()
                    .unwrap_or_else(|| Exercise::named(name));
                if !params.is_empty() {
                    exercise.params = params;
                }
                if rest.is_some() {
                    exercise.target_rest = rest;
                }
                self.sessions
                    .add_exercise(&sid, &exercise)
                    .ok_or("the workout is finished")?;
                let position = self.sessions.get(&sid).map_or(0, |s| s.exercises.len());
                println!("Added {} as exercise #{position}", exercise.name);
                self.persist_sessions();
            }
            Action::RemoveExercise { exercise } => {
                let sid = self.current_id()?;
                let eid = self.exercise_id(&sid, exercise)?;
                Self::require(self.sessions.remove_exercise(&sid, &eid), "remove exercise")?;
                self.persist_sessions();
            }
            Action::AddSet { exercise } => {
                let sid = self.current_id()?;
                let eid = self.exercise_id(&sid, exercise)?;
                self.sessions
                    .add_set(&sid, &eid)
                    .ok_or("the workout is finished")?;
                self.persist_sessions();
            }
            Action::RemoveSet { exercise, set } => {
                let sid = self.current_id()?;
                let eid = self.exercise_id(&sid, exercise)?;
                let set_id = self.set_id(&sid, &eid, set)?;
                Self::require(self.sessions.remove_set(&sid, &eid, &set_id), "remove set")?;
                self.persist_sessions();
            }
            Action::Set {
                exercise,
                set,
                field,
                value,
            } => {
                let sid = self.current_id()?;
                let eid = self.exercise_id(&sid, exercise)?;
                let set_id = self.set_id(&sid, &eid, set)?;
                let value = FieldValue::parse(&value);
                if !self.sessions.update_set(&sid, &eid, &set_id, field, value) {
                    return Err(format!("{field} is not tracked for that exercise").into());
                }
                self.persist_sessions();
            }
            Action::Done {
                exercise,
                set,
                rest,
            } => {
                let sid = self.current_id()?;
                let eid = self.exercise_id(&sid, exercise)?;
                let set_id = self.set_id(&sid, &eid, set)?;
                Self::require(
                    self.sessions.toggle_set_complete(&sid, &eid, &set_id),
                    "toggle set",
                )?;
                self.persist_sessions();

                let entry = self.sessions.get(&sid).and_then(|s| s.exercise(&eid));
                let completed = entry
                    .and_then(|e| e.sets.iter().find(|s| s.id == set_id))
                    .is_some_and(|s| s.completed);
                if rest && completed {
                    if let Some(entry) = entry {
                        let (secs, label) = (entry.target_rest, entry.name.clone());
                        run_rest(&self.config, secs, label)?;
                    }
                }
            }
            Action::Notes { text, session } => {
                let sid = match session {
                    Some(id) => id,
                    None => self.current_id()?,
                };
                Self::require(self.sessions.update_notes(&sid, text), "notes")?;
                self.persist_sessions();
            }
            Action::ExerciseNotes { exercise, text } => {
                let sid = self.current_id()?;
                let eid = self.exercise_id(&sid, exercise)?;
                Self::require(
                    self.sessions.update_exercise_notes(&sid, &eid, text),
                    "exercise notes",
                )?;
                self.persist_sessions();
            }
            Action::RestTarget { exercise, secs } => {
                let sid = self.current_id()?;
                let eid = self.exercise_id(&sid, exercise)?;
                Self::require(
                    self.sessions.update_exercise_rest(&sid, &eid, secs),
                    "rest target",
                )?;
                self.persist_sessions();
            }
            Action::Color { color, session } => {
                let sid = match session {
                    Some(id) => id,
                    None => self.current_id()?,
                };
                Self::require(self.sessions.update_session_color(&sid, color), "color")?;
                self.persist_sessions();
            }
            Action::Finish => {
                let sid = self.current_id()?;
                self.sessions.finish_session(&sid);
                self.clear_pointer();
                self.persist_sessions();
                if let Some(session) = self.sessions.get(&sid) {
                    let summary = summarize(session);
                    println!(
                        "Finished: {}/{} sets, {} kg moved{}",
                        summary.completed_sets,
                        summary.total_sets,
                        FieldValue::from(summary.volume_kg),
                        summary
                            .duration_label
                            .map(|d| format!(" in {d}"))
                            .unwrap_or_default()
                    );
                }
            }
            Action::Delete { session } => {
                if !self.sessions.delete_session(&session) {
                    return Err(format!("no workout {session}").into());
                }
                if self.repo.active_session_id().as_deref() == Some(session.as_str()) {
                    self.clear_pointer();
                }
                self.persist_sessions();
            }
            Action::Duplicate { session } => {
                let copy = self
                    .sessions
                    .duplicate_session(&session)
                    .ok_or_else(|| format!("no workout {session}"))?;
                let id = copy.id.clone();
                println!("Started workout {id} from {session}");
                self.point_at(&id);
                self.persist_sessions();
            }
            Action::History { limit, date, json } => {
                let recent = self
                    .sessions
                    .sessions()
                    .iter()
                    .filter(|s| date.map_or(true, |d| s.date == d))
                    .take(limit);
                if json {
                    let rows: Vec<_> = recent
                        .map(|s| serde_json::json!({ "session": s, "summary": summarize(s) }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                } else {
                    for session in recent {
                        print_history_line(session);
                    }
                }
            }
            Action::Calendar { month } => {
                let first = month.unwrap_or_else(|| month_start(Local::now().date_naive()));
                print_calendar(self.sessions.sessions(), first);
            }
            Action::Stats { json } => {
                let stats = self.sessions.stats();
                if json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    println!("This week:    {}", stats.this_week_count);
                    println!("Streak:       {} days", stats.streak);
                    println!("Workouts:     {}", stats.total_completed_sessions);
                    println!("Sets done:    {}", stats.total_completed_sets);
                }
            }
            Action::Rest {
                secs,
                preset,
                exercise,
                label,
            } => {
                let entry = match exercise {
                    Some(position) => {
                        let sid = self.current_id()?;
                        let eid = self.exercise_id(&sid, position)?;
                        self.sessions.get(&sid).and_then(|s| s.exercise(&eid)).cloned()
                    }
                    None => None,
                };
                let secs = secs
                    .or(preset.and_then(|n| preset_secs(n as usize)))
                    .or(entry.as_ref().map(|e| e.target_rest))
                    .unwrap_or(self.config.default_rest_secs);
                let label = label
                    .or(entry.map(|e| e.name))
                    .unwrap_or_else(|| "Rest".to_string());
                run_rest(&self.config, secs, label)?;
            }
            Action::Elapsed { watch } => {
                let session = self.current().ok_or("no open workout")?;
                let mut clock = ElapsedClock::for_session(session);
                if watch {
                    watch_elapsed(&self.config, &mut clock);
                } else {
                    let secs = clock.elapsed_secs(Utc::now().timestamp_millis());
                    println!("{}", format_clock(secs));
                }
            }
            Action::Routine { action } => self.run_routine(action)?,
            Action::Video { action } => self.run_video(action)?,
            Action::Exercises {
                category,
                search,
                custom_add,
                params,
                custom_delete,
            } => {
                let mut catalog = ExerciseCatalog::new(self.repo.load_custom_exercises());
                let mut changed = false;
                if let Some(name) = custom_add {
                    let id = catalog.add_custom(Exercise::named(name).with_params(&params));
                    println!("Saved custom exercise {id}");
                    changed = true;
                }
                if let Some(id) = custom_delete {
                    if !catalog.delete_custom(&id) {
                        return Err(format!("no custom exercise {id}").into());
                    }
                    changed = true;
                }
                if changed {
                    self.repo.save_custom_exercises(catalog.custom())?;
                    return Ok(());
                }
                let listed: Vec<&Exercise> = match (&search, &category) {
                    (Some(query), _) => catalog.search(query),
                    (None, Some(category)) => catalog.by_category(category).collect(),
                    (None, None) => catalog.all().collect(),
                };
                for category in CATEGORIES {
                    let in_category: Vec<_> =
                        listed.iter().filter(|e| e.category == category).collect();
                    if in_category.is_empty() {
                        continue;
                    }
                    println!("{category}");
                    for e in in_category {
                        let params: Vec<String> = e.params.iter().map(Param::to_string).collect();
                        println!("  {} {:<24} {}", e.emoji, e.name, params.join(","));
                    }
                }
            }
            Action::Export { file } => {
                let doc = backup::export_document(&self.repo, Utc::now());
                let path =
                    file.unwrap_or_else(|| PathBuf::from(backup_file_name(Local::now().date_naive())));
                std::fs::write(&path, backup::to_json(&doc)?)?;
                println!("Exported to {}", path.display());
            }
            Action::Import { file } => {
                let raw = std::fs::read_to_string(&file)?;
                let doc = backup::import_document(&mut self.repo, &raw)?;
                println!(
                    "Imported {} workouts, {} routines",
                    doc.workouts.map_or(0, |w| w.len()),
                    doc.routines.map_or(0, |r| r.len())
                );
            }
        }
        Ok(())
    }

    fn run_routine(&mut self, action: RoutineAction) -> CliResult {
        let mut routines = RoutineStore::new(self.repo.load_routines());
        match action {
            RoutineAction::Create {
                name,
                exercises,
                color,
            } => {
                let catalog = ExerciseCatalog::new(self.repo.load_custom_exercises());
                let exercises = exercises
                    .iter()
                    .map(|spec| {
                        let (name, sets) = split_sets(spec);
                        let exercise = catalog
                            .find(name)
                            .cloned()
                            .unwrap_or_else(|| Exercise::named(name));
                        RoutineExercise::from_exercise(&exercise, sets)
                    })
                    .collect();
                let id = routines
                    .create_routine(name, exercises, color.as_deref())
                    .id
                    .clone();
                self.repo.save_routines(routines.routines())?;
                println!("Saved routine {id}");
            }
            RoutineAction::List => {
                for routine in routines.routines() {
                    let names: Vec<String> = routine
                        .exercises
                        .iter()
                        .map(|e| format!("{}×{}", e.name, e.sets_count))
                        .collect();
                    println!("{} {} [{}] {}", routine.id, routine.name, routine.color, names.join(", "));
                }
            }
            RoutineAction::Delete { routine } => {
                let id = routines
                    .find(&routine)
                    .map(|r| r.id.clone())
                    .ok_or_else(|| format!("no routine named '{routine}'"))?;
                routines.delete_routine(&id);
                self.repo.save_routines(routines.routines())?;
            }
            RoutineAction::Start { routine } => self.start(Some(&routine))?,
        }
        Ok(())
    }

    fn run_video(&mut self, action: VideoAction) -> CliResult {
        match action {
            VideoAction::List { catalog, search } => {
                let catalog = VideoCatalog::load_file(&catalog)?;
                let completed = self.repo.load_completed_videos();
                let videos: Vec<_> = match &search {
                    Some(query) => catalog.search(query),
                    None => catalog.videos().iter().collect(),
                };
                for v in videos {
                    let done = if completed.iter().any(|c| c.id == v.id) { "✓" } else { " " };
                    println!(
                        "{done} {} {:<40} {:<12} {:>6} {:>4} kcal",
                        v.id, v.title, v.category, v.duration_label, v.kcal
                    );
                }
            }
            VideoAction::Log { id, catalog } => {
                let catalog = VideoCatalog::load_file(&catalog)?;
                let video = catalog
                    .find(&id)
                    .ok_or_else(|| format!("no video {id} in the catalog"))?;
                let sid = self.sessions.log_video_session(video).id.clone();
                self.persist_sessions();
                let mut completed = self.repo.load_completed_videos();
                if mark_video_completed(&mut completed, video) {
                    if let Err(e) = self.repo.save_completed_videos(&completed) {
                        tracing::error!(error = %e, "could not save completed videos");
                    }
                }
                println!("Logged {} as workout {sid}", video.title);
            }
        }
        Ok(())
    }
}

/// `Name:4` asks for four sets; a bare name gets the default count.
fn split_sets(spec: &str) -> (&str, u32) {
    match spec.rsplit_once(':') {
        Some((name, sets)) => match sets.trim().parse() {
            Ok(n) => (name.trim(), n),
            Err(_) => (spec.trim(), DEFAULT_SETS_COUNT),
        },
        None => (spec.trim(), DEFAULT_SETS_COUNT),
    }
}

fn print_session(session: &WorkoutSession) {
    let title = session.routine_name.as_deref().unwrap_or("Workout");
    println!(
        "{title} {} · {} · started {}",
        session.id, session.date, session.start_time
    );
    if let Some(notes) = session.notes.as_deref().filter(|n| !n.is_empty()) {
        println!("  {notes}");
    }
    for (i, exercise) in session.exercises.iter().enumerate() {
        println!(
            "{}. {} {} (rest {})",
            i + 1,
            exercise.emoji,
            exercise.name,
            format_clock(exercise.target_rest as u64)
        );
        for (j, set) in exercise.sets.iter().enumerate() {
            let mark = if set.completed { "x" } else { " " };
            let fields: Vec<String> = exercise
                .params
                .iter()
                .map(|p| {
                    let value = set.value(*p).cloned().unwrap_or_default();
                    format!("{value} {}", p.unit()).trim_end().to_string()
                })
                .collect();
            println!("   {}. [{mark}] {}", j + 1, fields.join(" · "));
        }
    }
}

fn print_history_line(session: &WorkoutSession) {
    let summary = summarize(session);
    let state = match &session.end_time {
        Some(end) => format!("{}-{end}", session.start_time),
        None => format!("{} (open)", session.start_time),
    };
    println!(
        "{} {} {:<14} {:<20} {}/{} sets",
        session.date,
        session.id,
        state,
        session.routine_name.as_deref().unwrap_or("Workout"),
        summary.completed_sets,
        summary.total_sets
    );
}

fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day0(0).unwrap_or(day)
}

fn parse_month(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM, got {s:?}"))
}

/// One line per day of `first`'s month that has workouts. Days with a
/// finished workout are starred.
fn print_calendar(sessions: &[WorkoutSession], first: NaiveDate) {
    let end = first.checked_add_months(Months::new(1)).unwrap_or(first);
    let finished = finished_dates_desc(sessions);
    println!("{}", first.format("%B %Y"));
    let per_day = sessions_per_day(sessions);
    let mut days = per_day.range(first..end).peekable();
    if days.peek().is_none() {
        println!("  no workouts");
    }
    for (day, count) in days {
        let mark = if finished.contains(day) { "*" } else { " " };
        let noun = if *count == 1 { "workout" } else { "workouts" };
        println!("{mark} {} {} {count} {noun}", day, day.format("%a"));
    }
    if let Some(last) = finished.first() {
        println!("Last finished: {last}");
    }
}

fn render_timer<S: gymtrack::rest_timer::CompletionSignal>(timer: &RestTimer<S>) {
    let mut out = io::stdout();
    let _ = write!(
        out,
        "\r{} {} / {} [{}]    ",
        timer.label(),
        format_clock(timer.remaining_secs() as u64),
        format_clock(timer.duration_secs() as u64),
        timer.phase()
    );
    let _ = out.flush();
}

fn run_rest(config: &Config, secs: u32, label: String) -> CliResult<RunOutcome> {
    let (tx, rx) = mpsc::channel();
    spawn_stdin_commands(tx.clone());
    let interval = Duration::from_millis(config.tick_interval_ms.max(10));
    let runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::new(interval));

    let mut timer = RestTimer::new(TerminalSignal { bell: config.sound });
    timer.start(secs, label, Instant::now());
    eprintln!("p pause · r resume · +N/-N adjust · s restart · x dismiss · q quit");
    let outcome = run_rest_timer(&mut timer, &runner, render_timer);
    // stdin can close early; the runner keeps ticking until here
    drop(tx);
    println!();
    if outcome == RunOutcome::Finished {
        println!("Rest over");
    }
    Ok(outcome)
}

fn watch_elapsed(config: &Config, clock: &mut ElapsedClock) {
    let (tx, rx) = mpsc::channel();
    spawn_stdin_commands(tx.clone());
    let interval = Duration::from_millis(config.tick_interval_ms.max(10));
    let mut ticks = TickLoop::spawn(FixedTicker::new(interval), tx);
    eprintln!("p pause · r resume · q quit");

    for event in rx.iter() {
        let now_ms = Utc::now().timestamp_millis();
        match event {
            TimerEvent::Tick => {}
            TimerEvent::Command(Command::Pause) => clock.pause(now_ms),
            TimerEvent::Command(Command::Resume) => clock.resume(now_ms),
            TimerEvent::Command(Command::Quit | Command::Dismiss) => break,
            TimerEvent::Command(_) => {}
        }
        let paused = if clock.is_paused() { " (paused)" } else { "" };
        print!("\r{}{paused}        ", format_clock(clock.elapsed_secs(now_ms)));
        let _ = io::stdout().flush();
    }
    ticks.cancel();
    println!();
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut app = App::open(cli.db)?;
    app.run(cli.action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_set_command() {
        let cli = Cli::try_parse_from(["gymtrack", "set", "1", "2", "weight", "80"]).unwrap();
        match cli.action {
            Action::Set {
                exercise,
                set,
                field,
                value,
            } => {
                assert_eq!((exercise, set), (1, 2));
                assert_eq!(field, Param::Weight);
                assert_eq!(value, "80");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn parse_params_list() {
        let cli = Cli::try_parse_from([
            "gymtrack",
            "add-exercise",
            "Farmer Carry",
            "--params",
            "weight,time",
        ])
        .unwrap();
        match cli.action {
            Action::AddExercise { params, .. } => {
                assert_eq!(params, vec![Param::Weight, Param::Time]);
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert!(Cli::try_parse_from(["gymtrack", "set", "1", "1", "speed", "3"]).is_err());
    }

    #[test]
    fn parse_rest_preset() {
        let cli = Cli::try_parse_from(["gymtrack", "rest", "--preset", "3"]).unwrap();
        match cli.action {
            Action::Rest { secs, preset, .. } => {
                assert_eq!(secs, None);
                assert_eq!(preset.and_then(|n| preset_secs(n as usize)), Some(90));
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert!(Cli::try_parse_from(["gymtrack", "rest", "--preset", "0"]).is_err());
        assert!(Cli::try_parse_from(["gymtrack", "rest", "--preset", "7"]).is_err());
        assert!(Cli::try_parse_from(["gymtrack", "rest", "45", "--preset", "1"]).is_err());
    }

    #[test]
    fn parse_history_date_and_month() {
        let cli = Cli::try_parse_from(["gymtrack", "history", "--date", "2026-10-16"]).unwrap();
        match cli.action {
            Action::History { date, .. } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 16));
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert_eq!(parse_month("2026-09"), Ok(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()));
        assert!(parse_month("2026-13").is_err());
        assert!(parse_month("September").is_err());
        assert_eq!(
            month_start(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
        );
    }

    #[test]
    fn split_sets_suffix() {
        assert_eq!(split_sets("Bench Press:5"), ("Bench Press", 5));
        assert_eq!(split_sets("Squat"), ("Squat", DEFAULT_SETS_COUNT));
        assert_eq!(split_sets("Ratio 3:x"), ("Ratio 3:x", DEFAULT_SETS_COUNT));
    }
}
