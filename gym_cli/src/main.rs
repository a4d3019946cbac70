use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use gym_core::catalog::Catalog;
use gym_core::csv_export::{
    export_exercise_logs, write_exercise_logs_csv, write_weight_entries_csv,
};
use gym_core::*;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gymlog")]
#[command(about = "Personal strength training log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Record and review body weight
    Weight {
        #[command(subcommand)]
        action: WeightAction,
    },

    /// Set height in centimetres
    Height {
        #[arg(value_parser = positive_f64, required_unless_present = "clear")]
        cm: Option<f64>,

        /// Forget the stored height
        #[arg(long, conflicts_with = "cm")]
        clear: bool,
    },

    /// Log sets of a catalog or custom exercise
    Log {
        /// Exercise id (see `gymlog exercises`)
        exercise_id: String,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        sets: u32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        reps: u32,
        /// Load in kg (0 for bodyweight)
        #[arg(value_parser = non_negative_f64)]
        weight: f64,

        /// Training day (YYYY-MM-DD), defaults to now
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List logged exercises, newest first
    Logs {
        #[arg(long)]
        muscle: Option<MuscleGroup>,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// List available exercises
    Exercises {
        #[arg(long)]
        muscle: Option<MuscleGroup>,
    },

    /// List workout programs
    Programs {
        /// Only programs targeting a muscle (substring match)
        #[arg(long)]
        muscle: Option<String>,
    },

    /// Start, fill and end workout sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Statistics for one muscle group
    Stats { muscle: MuscleGroup },

    /// Level and weekly volume for every muscle group
    Overview,

    /// Adjust muscle group ratings by hand
    Rating {
        #[command(subcommand)]
        action: RatingAction,
    },

    /// Show personal records
    Prs,

    /// Manage goals
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// Export all data as JSON, or logs and weigh-ins as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long)]
        csv: bool,

        /// With --csv, export weigh-ins instead of exercise logs
        #[arg(long, requires = "csv")]
        weights: bool,
    },

    /// Import a JSON export
    Import {
        file: PathBuf,

        /// Append to existing data instead of replacing it
        #[arg(long)]
        merge: bool,
    },
}

#[derive(Subcommand)]
enum WeightAction {
    /// Record a weigh-in in kg
    Add {
        #[arg(value_parser = positive_f64)]
        kg: f64,

        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show weigh-ins, oldest first
    List,
    Remove { id: String },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Open a new session
    Start { name: String },
    /// Log an exercise into an open session
    Add {
        session_id: String,
        exercise_id: String,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        sets: u32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        reps: u32,
        #[arg(value_parser = non_negative_f64)]
        weight: f64,
    },
    End { session_id: String },
    List {
        /// Only sessions that have not ended
        #[arg(long)]
        active: bool,
    },
}

#[derive(Subcommand)]
enum RatingAction {
    /// Set a level from 1 to 10
    Set {
        muscle: MuscleGroup,
        #[arg(value_parser = clap::value_parser!(i32).range(1..=10))]
        level: i32,
    },
    Up { muscle: MuscleGroup },
    Down { muscle: MuscleGroup },
}

#[derive(Subcommand)]
enum GoalAction {
    Add {
        title: String,

        /// weight, exercise, muscle or custom
        #[arg(long, value_parser = parse_goal_kind, default_value = "custom")]
        kind: GoalKind,

        #[arg(long)]
        target: String,

        #[arg(long, default_value = "")]
        current: String,

        #[arg(long)]
        deadline: Option<String>,

        #[arg(long)]
        muscle: Option<MuscleGroup>,
    },
    /// Mark a goal completed
    Done { id: String },
    List,
    Remove { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    gym_core::logging::init_with_level(gym_core::logging::level_for_verbosity(cli.verbose));

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let tracker = Tracker::open(
        Arc::new(Catalog::clone(catalog)),
        FileBlobStore::new(&data_dir),
        config.storage.blob_name.clone(),
    )
    .await;

    match cli.command {
        Commands::Weight { action } => cmd_weight(&tracker, action).await,
        Commands::Height { cm, clear } => {
            let height = if clear { None } else { cm };
            tracker.mutate(|s| s.set_height(height)).await;
            ensure_saved(&tracker).await?;
            match height {
                Some(cm) => println!("✓ Height set to {} cm", cm),
                None => println!("✓ Height cleared"),
            }
            Ok(())
        }
        Commands::Log {
            exercise_id,
            sets,
            reps,
            weight,
            date,
            notes,
        } => cmd_log(&tracker, &exercise_id, sets, reps, weight, date, notes).await,
        Commands::Logs { muscle, limit } => cmd_logs(&tracker, muscle, limit).await,
        Commands::Exercises { muscle } => cmd_exercises(&tracker, muscle).await,
        Commands::Programs { muscle } => cmd_programs(&tracker, muscle.as_deref()).await,
        Commands::Session { action } => cmd_session(&tracker, action).await,
        Commands::Stats { muscle } => {
            let stats = tracker.read(|s| s.calculate_muscle_stats(muscle)).await;
            display_stats(&stats);
            Ok(())
        }
        Commands::Overview => cmd_overview(&tracker).await,
        Commands::Rating { action } => cmd_rating(&tracker, action).await,
        Commands::Prs => cmd_prs(&tracker).await,
        Commands::Goal { action } => cmd_goal(&tracker, action).await,
        Commands::Export { out, csv, weights } => {
            cmd_export(&tracker, out, csv, weights, config.export.pretty).await
        }
        Commands::Import { file, merge } => cmd_import(&tracker, file, merge).await,
    }
}

type GymTracker = Tracker<FileBlobStore>;

/// Surface a failed write instead of exiting with unsaved changes
async fn ensure_saved(tracker: &GymTracker) -> Result<()> {
    if tracker.is_dirty() {
        tracker.flush().await?;
    }
    Ok(())
}

async fn cmd_weight(tracker: &GymTracker, action: WeightAction) -> Result<()> {
    match action {
        WeightAction::Add { kg, date } => {
            let date = date.map(local_noon).transpose()?;
            let id = tracker
                .mutate(|s| s.add_weight(kg, date))
                .await
                .ok_or_else(|| Error::Other(format!("Invalid weight: {}", kg)))?;
            ensure_saved(tracker).await?;
            println!("✓ Recorded {} kg ({})", kg, id);
        }
        WeightAction::List => {
            let entries = tracker.read(|s| s.weight_entries_sorted()).await;
            if entries.is_empty() {
                println!("No weigh-ins yet.");
            }
            for entry in entries {
                println!(
                    "{}  {:>6.1} kg  {}",
                    entry.date.with_timezone(&Local).format("%Y-%m-%d"),
                    entry.weight,
                    entry.id
                );
            }
        }
        WeightAction::Remove { id } => {
            if !tracker.mutate(|s| s.remove_weight(&id)).await {
                return Err(Error::Other(format!("No weigh-in with id {}", id)));
            }
            ensure_saved(tracker).await?;
            println!("✓ Removed weigh-in {}", id);
        }
    }
    Ok(())
}

async fn cmd_log(
    tracker: &GymTracker,
    exercise_id: &str,
    sets: u32,
    reps: u32,
    weight: f64,
    date: Option<NaiveDate>,
    notes: Option<String>,
) -> Result<()> {
    let date = date.map(local_noon).transpose()?;

    let (name, id, new_record) = tracker
        .mutate(|s| {
            let def = s
                .find_exercise(exercise_id)
                .cloned()
                .ok_or_else(|| Error::Other(format!("Unknown exercise: {}", exercise_id)))?;
            let mut log = NewExerciseLog::for_definition(&def, sets, reps, weight);
            if let Some(date) = date {
                log = log.on(date);
            }
            if let Some(notes) = notes {
                log = log.with_notes(notes);
            }
            let record_before = s.personal_record_for(exercise_id).map(|r| r.volume);
            let id = s.add_exercise(log).ok_or_else(|| {
                Error::Other(format!(
                    "Rejected log: {}x{} @ {} kg is too large to store",
                    sets, reps, weight
                ))
            })?;
            let new_record = s
                .personal_record_for(exercise_id)
                .filter(|r| Some(r.volume) != record_before)
                .map(|r| r.volume);
            Ok::<_, Error>((def.name, id, new_record))
        })
        .await?;
    ensure_saved(tracker).await?;

    println!("✓ Logged {} {}x{} @ {} kg ({})", name, sets, reps, weight, id);
    if let Some(volume) = new_record {
        println!("  New personal record! ({} kg·reps)", volume);
    }
    Ok(())
}

async fn cmd_logs(tracker: &GymTracker, muscle: Option<MuscleGroup>, limit: usize) -> Result<()> {
    let mut logs: Vec<ExerciseLog> = tracker
        .read(|s| {
            s.exercise_logs()
                .iter()
                .filter(|l| muscle.map_or(true, |m| l.primary_muscle == m))
                .cloned()
                .collect()
        })
        .await;
    logs.sort_by(|a, b| b.date.cmp(&a.date));

    if logs.is_empty() {
        println!("No exercises logged yet.");
    }
    for log in logs.iter().take(limit) {
        println!(
            "{}  {:<24} {:>2}x{:<3} {:>6.1} kg  vol {:>7.1}  {}",
            log.date.with_timezone(&Local).format("%Y-%m-%d"),
            log.exercise_name,
            log.sets,
            log.reps,
            log.weight,
            log.volume(),
            log.id
        );
    }
    Ok(())
}

async fn cmd_exercises(tracker: &GymTracker, muscle: Option<MuscleGroup>) -> Result<()> {
    let exercises = tracker.read(|s| s.all_exercises()).await;
    for def in exercises
        .iter()
        .filter(|d| muscle.map_or(true, |m| d.primary_muscle == m))
    {
        let custom = if def.is_custom { " (custom)" } else { "" };
        println!(
            "{:<20} {:<24} {:<10} {:?}{}",
            def.id, def.name, def.primary_muscle, def.equipment, custom
        );
    }
    Ok(())
}

async fn cmd_programs(tracker: &GymTracker, muscle: Option<&str>) -> Result<()> {
    let programs = match muscle {
        Some(query) => {
            let lowered = query.to_lowercase();
            tracker
                .read(|s| {
                    let custom = s.workout_templates().iter().filter(|t| {
                        t.target_muscles
                            .iter()
                            .any(|m| m.as_str().to_lowercase().contains(&lowered))
                    });
                    s.catalog()
                        .programs_by_target_muscle(query)
                        .into_iter()
                        .chain(custom)
                        .cloned()
                        .collect::<Vec<WorkoutTemplate>>()
                })
                .await
        }
        None => tracker.read(|s| s.all_programs()).await,
    };

    if programs.is_empty() {
        println!("No matching programs.");
    }
    for program in programs {
        let targets: Vec<&str> = program.target_muscles.iter().map(|m| m.as_str()).collect();
        println!("{}  [{}]", program.name, targets.join(", "));
        for planned in &program.exercises {
            println!(
                "  → {} {}x{} (rest {}s)",
                planned.exercise_name, planned.sets, planned.reps, planned.rest_time
            );
        }
    }
    Ok(())
}

async fn cmd_session(tracker: &GymTracker, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::Start { name } => {
            let id = tracker.mutate(|s| s.start_workout_session(name)).await;
            ensure_saved(tracker).await?;
            println!("✓ Session started: {}", id);
        }
        SessionAction::Add {
            session_id,
            exercise_id,
            sets,
            reps,
            weight,
        } => {
            let added = tracker
                .mutate(|s| {
                    let def = s.find_exercise(&exercise_id)?.clone();
                    let log = NewExerciseLog::for_definition(&def, sets, reps, weight);
                    s.add_exercise_to_session(&session_id, log)
                })
                .await;
            let Some(id) = added else {
                return Err(Error::Other(format!(
                    "Cannot add {} to session {} (unknown exercise, or session missing or ended)",
                    exercise_id, session_id
                )));
            };
            ensure_saved(tracker).await?;
            println!("✓ Added to session ({})", id);
        }
        SessionAction::End { session_id } => {
            let ended = tracker
                .mutate(|s| {
                    if s.end_workout_session(&session_id) {
                        s.workout_session(&session_id).cloned()
                    } else {
                        None
                    }
                })
                .await;
            let Some(session) = ended else {
                return Err(Error::Other(format!(
                    "No open session with id {}",
                    session_id
                )));
            };
            ensure_saved(tracker).await?;
            println!(
                "✓ Session '{}' ended: {} min, volume {:.1}",
                session.name,
                session.duration.unwrap_or(0),
                session.total_volume
            );
        }
        SessionAction::List { active } => {
            let sessions: Vec<WorkoutSession> = tracker
                .read(|s| {
                    if active {
                        s.active_sessions().into_iter().cloned().collect()
                    } else {
                        s.workout_sessions().to_vec()
                    }
                })
                .await;
            if sessions.is_empty() {
                println!("No sessions.");
            }
            for session in sessions {
                let status = match session.duration {
                    _ if session.is_active() => "open".to_string(),
                    Some(minutes) => format!("{} min", minutes),
                    None => "ended".to_string(),
                };
                println!(
                    "{}  {:<20} {:>2} exercises  vol {:>8.1}  {}  {}",
                    session.start_time.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    session.name,
                    session.exercises.len(),
                    session.total_volume,
                    status,
                    session.id
                );
            }
        }
    }
    Ok(())
}

fn display_stats(stats: &MuscleGroupStats) {
    println!("{}", stats.muscle_group);
    println!("  Weekly volume:  {:.1}", stats.weekly_volume);
    println!("  Monthly volume: {:.1}", stats.monthly_volume);
    println!("  Total sets:     {}", stats.total_sets);
    println!("  Total reps:     {}", stats.total_reps);
    println!("  Average weight: {:.1} kg", stats.average_weight);
    println!("  Frequency:      {:.1} days/week", stats.workout_frequency);
    match stats.last_trained {
        Some(date) => println!(
            "  Last trained:   {}",
            date.with_timezone(&Local).format("%Y-%m-%d")
        ),
        None => println!("  Last trained:   never"),
    }
}

async fn cmd_overview(tracker: &GymTracker) -> Result<()> {
    let rows = tracker.read(|s| s.muscle_overview()).await;
    println!("{:<12} {:>5} {:>10} {:>10}", "Muscle", "Level", "Week", "Month");
    for row in rows {
        println!(
            "{:<12} {:>5} {:>10.1} {:>10.1}",
            row.muscle_group, row.level, row.stats.weekly_volume, row.stats.monthly_volume
        );
    }
    Ok(())
}

async fn cmd_rating(tracker: &GymTracker, action: RatingAction) -> Result<()> {
    let (muscle, level) = match action {
        RatingAction::Set { muscle, level } => {
            (muscle, tracker.mutate(|s| s.update_muscle_rating(muscle, level)).await)
        }
        RatingAction::Up { muscle } => {
            (muscle, tracker.mutate(|s| s.adjust_muscle_rating(muscle, 1)).await)
        }
        RatingAction::Down { muscle } => {
            (muscle, tracker.mutate(|s| s.adjust_muscle_rating(muscle, -1)).await)
        }
    };
    ensure_saved(tracker).await?;
    println!("✓ {} is now level {}", muscle, level);
    Ok(())
}

async fn cmd_prs(tracker: &GymTracker) -> Result<()> {
    let records = tracker.read(|s| s.personal_records().to_vec()).await;
    if records.is_empty() {
        println!("No personal records yet.");
    }
    for record in records {
        println!(
            "{:<24} {:>6.1} kg x {:<3} (vol {:.1})  {}",
            record.exercise_name,
            record.weight,
            record.reps,
            record.volume,
            record.date.with_timezone(&Local).format("%Y-%m-%d")
        );
    }
    Ok(())
}

async fn cmd_goal(tracker: &GymTracker, action: GoalAction) -> Result<()> {
    match action {
        GoalAction::Add {
            title,
            kind,
            target,
            current,
            deadline,
            muscle,
        } => {
            let goal = NewGoal {
                kind,
                title,
                target,
                current,
                deadline,
                completed: false,
                muscle_group: muscle,
            };
            let id = tracker.mutate(|s| s.add_goal(goal)).await;
            ensure_saved(tracker).await?;
            println!("✓ Goal added ({})", id);
        }
        GoalAction::Done { id } => {
            let update = GoalUpdate {
                completed: Some(true),
                ..GoalUpdate::default()
            };
            let found = tracker
                .mutate(|s| s.update_goal(&id, update).is_some())
                .await;
            if !found {
                return Err(Error::Other(format!("No goal with id {}", id)));
            }
            ensure_saved(tracker).await?;
            println!("✓ Goal completed");
        }
        GoalAction::List => {
            let goals = tracker.read(|s| s.goals().to_vec()).await;
            if goals.is_empty() {
                println!("No goals yet.");
            }
            for goal in goals {
                let mark = if goal.completed { "✓" } else { " " };
                println!(
                    "[{}] {}  {} / {}  {}",
                    mark, goal.title, goal.current, goal.target, goal.id
                );
            }
        }
        GoalAction::Remove { id } => {
            if !tracker.mutate(|s| s.remove_goal(&id)).await {
                return Err(Error::Other(format!("No goal with id {}", id)));
            }
            ensure_saved(tracker).await?;
            println!("✓ Goal removed");
        }
    }
    Ok(())
}

async fn cmd_export(
    tracker: &GymTracker,
    out: Option<PathBuf>,
    csv: bool,
    weights: bool,
    pretty: bool,
) -> Result<()> {
    if csv && !weights {
        if let Some(path) = &out {
            let logs = tracker.read(|s| s.exercise_logs().to_vec()).await;
            let count = export_exercise_logs(&logs, path)?;
            eprintln!("✓ Exported {} logs to {}", count, path.display());
            return Ok(());
        }
    }

    let mut writer: Box<dyn Write> = match &out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(File::create(path)?)
        }
        None => Box::new(io::stdout().lock()),
    };

    if csv {
        let count = if weights {
            let entries = tracker.read(|s| s.weight_entries_sorted()).await;
            write_weight_entries_csv(&entries, &mut writer)?
        } else {
            let logs = tracker.read(|s| s.exercise_logs().to_vec()).await;
            write_exercise_logs_csv(&logs, &mut writer)?
        };
        tracing::info!("Exported {} CSV rows", count);
    } else {
        let json = tracker.export_data(pretty).await?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;

    if let Some(path) = out {
        eprintln!("✓ Exported to {}", path.display());
    }
    Ok(())
}

async fn cmd_import(tracker: &GymTracker, file: PathBuf, merge: bool) -> Result<()> {
    let text = std::fs::read_to_string(&file)?;
    let mode = if merge {
        ImportMode::Merge
    } else {
        ImportMode::Replace
    };

    tracker.import_data(&text, mode).await?;
    ensure_saved(tracker).await?;

    let (logs, weights) = tracker
        .read(|s| (s.exercise_logs().len(), s.weight_entries().len()))
        .await;
    println!(
        "✓ Imported {} ({} logs, {} weigh-ins now stored)",
        file.display(),
        logs,
        weights
    );
    Ok(())
}

/// Midday local time on `date`, so the calendar day survives time zone shifts
fn local_noon(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(12, 0, 0)
        .and_then(|naive| naive.and_local_timezone(Local).single())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| Error::Other(format!("Invalid date: {}", date)))
}

fn positive_f64(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("'{}' must be greater than zero", s))
    }
}

fn non_negative_f64(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("'{}' must be zero or more", s))
    }
}

fn parse_goal_kind(s: &str) -> std::result::Result<GoalKind, String> {
    match s.to_lowercase().as_str() {
        "weight" => Ok(GoalKind::Weight),
        "exercise" => Ok(GoalKind::Exercise),
        "muscle" => Ok(GoalKind::Muscle),
        "custom" => Ok(GoalKind::Custom),
        other => Err(format!("unknown goal kind '{}'", other)),
    }
}
