//! The domain store: owns all mutable state and keeps derived aggregates current.
//!
//! Logging an exercise is an append plus two aggregate updates computed from
//! that same log: the personal record check and the muscle rating running
//! totals. Removing a log does not roll either aggregate back.

use crate::catalog::Catalog;
use crate::stats::calculate_muscle_stats;
use crate::transfer::{parse_import, ExportDocument, ImportMode, PersistedState};
use crate::types::*;
use crate::{IdSupplier, Result, UuidSupplier};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Lowest and highest muscle rating level
pub const MIN_RATING_LEVEL: u8 = 1;
pub const MAX_RATING_LEVEL: u8 = 10;

/// Single owner of the tracker's mutable state
pub struct GymStore {
    catalog: Arc<Catalog>,
    ids: Box<dyn IdSupplier>,
    state: PersistedState,
}

impl std::fmt::Debug for GymStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GymStore")
            .field("catalog_exercises", &self.catalog.exercises.len())
            .field("state", &self.state)
            .finish()
    }
}

impl GymStore {
    /// Empty store over `catalog` using random UUIDs
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::from_state(catalog, Box::new(UuidSupplier), PersistedState::default())
    }

    pub fn with_ids(catalog: Arc<Catalog>, ids: Box<dyn IdSupplier>) -> Self {
        Self::from_state(catalog, ids, PersistedState::default())
    }

    /// Store resuming from previously persisted state
    pub fn from_state(
        catalog: Arc<Catalog>,
        ids: Box<dyn IdSupplier>,
        state: PersistedState,
    ) -> Self {
        Self { catalog, ids, state }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn into_state(self) -> PersistedState {
        self.state
    }

    /// Drop all state back to an empty store
    pub fn reset(&mut self) {
        self.state = PersistedState::default();
        tracing::info!("Store reset to empty state");
    }

    // ========================================================================
    // Profile
    // ========================================================================

    pub fn profile(&self) -> &Profile {
        &self.state.profile
    }

    pub fn set_height(&mut self, height_cm: Option<f64>) {
        self.state.profile.height_cm = height_cm;
        tracing::debug!("Set height to {:?}", height_cm);
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> &Profile {
        self.state.profile.apply(update);
        &self.state.profile
    }

    // ========================================================================
    // Body weight
    // ========================================================================

    pub fn weight_entries(&self) -> &[WeightEntry] {
        &self.state.weight_entries
    }

    /// Record a body weight, dated now unless `date` is given
    ///
    /// Returns `None` (and records nothing) unless `weight` is finite and positive.
    pub fn add_weight(&mut self, weight: f64, date: Option<DateTime<Utc>>) -> Option<String> {
        if !weight.is_finite() || weight <= 0.0 {
            tracing::warn!("Ignoring invalid body weight {}", weight);
            return None;
        }

        let id = self.ids.next_id();
        self.state.weight_entries.push(WeightEntry {
            id: id.clone(),
            date: date.unwrap_or_else(Utc::now),
            weight,
        });
        tracing::debug!("Added weight entry {} ({} kg)", id, weight);
        Some(id)
    }

    pub fn remove_weight(&mut self, id: &str) -> bool {
        remove_by(&mut self.state.weight_entries, |w| w.id == id)
    }

    /// Weight entries in ascending date order
    pub fn weight_entries_sorted(&self) -> Vec<WeightEntry> {
        let mut entries = self.state.weight_entries.clone();
        entries.sort_by(|a, b| a.date.cmp(&b.date));
        entries
    }

    /// Most recent weigh-in by date
    pub fn latest_weight(&self) -> Option<&WeightEntry> {
        self.state.weight_entries.iter().max_by_key(|w| w.date)
    }

    // ========================================================================
    // Exercise logs
    // ========================================================================

    pub fn exercise_logs(&self) -> &[ExerciseLog] {
        &self.state.exercise_logs
    }

    /// Append a log and update the personal record and muscle rating from it
    ///
    /// Returns the new log id, or `None` when the log is rejected (zero sets
    /// or reps, negative or non-finite weight, or a volume that would push
    /// the muscle rating total past what can be stored).
    pub fn add_exercise(&mut self, log: NewExerciseLog) -> Option<String> {
        if !log.is_valid() || !self.rating_total_stays_finite(&log) {
            tracing::warn!(
                "Ignoring invalid log for {}: {} x {} @ {}",
                log.exercise_id,
                log.sets,
                log.reps,
                log.weight
            );
            return None;
        }

        let log = log.into_log(self.ids.next_id(), None);
        let id = log.id.clone();
        self.record_log(log);
        Some(id)
    }

    /// Log an exercise from the effective catalog by id
    ///
    /// Name and primary muscle are copied from the definition. Returns `None`
    /// if the exercise is unknown or the log is rejected.
    pub fn log_exercise(
        &mut self,
        exercise_id: &str,
        sets: u32,
        reps: u32,
        weight: f64,
        date: Option<DateTime<Utc>>,
    ) -> Option<String> {
        let Some(def) = self.find_exercise(exercise_id) else {
            tracing::warn!("Cannot log unknown exercise {}", exercise_id);
            return None;
        };

        let mut log = NewExerciseLog::for_definition(def, sets, reps, weight);
        if let Some(date) = date {
            log.date = date;
        }
        self.add_exercise(log)
    }

    /// Remove a log by id
    ///
    /// Muscle rating totals and personal records keep whatever this log
    /// contributed.
    pub fn remove_exercise(&mut self, id: &str) -> bool {
        remove_by(&mut self.state.exercise_logs, |l| l.id == id)
    }

    fn record_log(&mut self, log: ExerciseLog) {
        self.check_personal_record(&log);
        self.accumulate_rating(&log);
        tracing::debug!(
            "Logged {} ({} x {} @ {} kg)",
            log.exercise_name,
            log.sets,
            log.reps,
            log.weight
        );
        self.state.exercise_logs.push(log);
    }

    fn rating_total_stays_finite(&self, log: &NewExerciseLog) -> bool {
        let total = self
            .muscle_rating(log.primary_muscle)
            .map_or(0.0, |r| r.total_volume);
        (total + log.volume()).is_finite()
    }

    fn check_personal_record(&mut self, log: &ExerciseLog) {
        let volume = record_volume(log.weight, log.reps);
        let records = &mut self.state.personal_records;

        if let Some(existing) = records.iter().find(|pr| pr.exercise_id == log.exercise_id) {
            if volume <= existing.volume {
                return;
            }
        }

        records.retain(|pr| pr.exercise_id != log.exercise_id);
        records.push(PersonalRecord {
            id: self.ids.next_id(),
            exercise_id: log.exercise_id.clone(),
            exercise_name: log.exercise_name.clone(),
            weight: log.weight,
            reps: log.reps,
            date: log.date,
            volume,
        });
        tracing::info!(
            "New personal record for {}: {} kg x {}",
            log.exercise_name,
            log.weight,
            log.reps
        );
    }

    fn accumulate_rating(&mut self, log: &ExerciseLog) {
        let volume = log.volume();
        let now = Utc::now();

        match self
            .state
            .muscle_group_ratings
            .iter_mut()
            .find(|r| r.muscle_group == log.primary_muscle)
        {
            Some(rating) => {
                rating.total_volume += volume;
                rating.workout_count += 1;
                rating.last_updated = now;
            }
            None => self.state.muscle_group_ratings.push(MuscleGroupRating {
                muscle_group: log.primary_muscle,
                level: MIN_RATING_LEVEL,
                last_updated: now,
                total_volume: volume,
                workout_count: 1,
            }),
        }
    }

    // ========================================================================
    // Exercise catalog
    // ========================================================================

    pub fn custom_exercises(&self) -> &[ExerciseDefinition] {
        &self.state.custom_exercises
    }

    pub fn add_custom_exercise(&mut self, exercise: NewExerciseDefinition) -> String {
        let id = self.ids.next_id();
        self.state.custom_exercises.push(ExerciseDefinition {
            id: id.clone(),
            name: exercise.name,
            primary_muscle: exercise.primary_muscle,
            secondary_muscles: exercise.secondary_muscles,
            equipment: exercise.equipment,
            difficulty: exercise.difficulty,
            instructions: exercise.instructions,
            is_custom: true,
        });
        tracing::debug!("Added custom exercise {}", id);
        id
    }

    pub fn remove_custom_exercise(&mut self, id: &str) -> bool {
        remove_by(&mut self.state.custom_exercises, |e| e.id == id)
    }

    /// Predefined exercises followed by the user's own
    pub fn all_exercises(&self) -> Vec<ExerciseDefinition> {
        self.catalog
            .exercises
            .iter()
            .chain(self.state.custom_exercises.iter())
            .cloned()
            .collect()
    }

    /// Look up an exercise in the catalog first, then the custom exercises
    pub fn find_exercise(&self, id: &str) -> Option<&ExerciseDefinition> {
        self.catalog
            .exercise_by_id(id)
            .or_else(|| self.state.custom_exercises.iter().find(|e| e.id == id))
    }

    // ========================================================================
    // Workout sessions
    // ========================================================================

    pub fn workout_sessions(&self) -> &[WorkoutSession] {
        &self.state.workout_sessions
    }

    pub fn workout_session(&self, id: &str) -> Option<&WorkoutSession> {
        self.state.workout_sessions.iter().find(|s| s.id == id)
    }

    /// Sessions that have not been ended yet
    pub fn active_sessions(&self) -> Vec<&WorkoutSession> {
        self.state
            .workout_sessions
            .iter()
            .filter(|s| s.is_active())
            .collect()
    }

    pub fn start_workout_session(&mut self, name: impl Into<String>) -> String {
        let id = self.ids.next_id();
        let now = Utc::now();
        let name = name.into();
        tracing::info!("Started workout session '{}' ({})", name, id);
        self.state.workout_sessions.push(WorkoutSession {
            id: id.clone(),
            name,
            date: now,
            start_time: now,
            end_time: None,
            exercises: Vec::new(),
            total_volume: 0.0,
            duration: None,
            notes: None,
        });
        id
    }

    /// Log an exercise as part of an open session
    ///
    /// The log is appended to the session and to the flat log list once, and
    /// updates personal records and muscle ratings like `add_exercise`.
    /// Unknown or already ended sessions are left alone and return `None`.
    pub fn add_exercise_to_session(
        &mut self,
        session_id: &str,
        log: NewExerciseLog,
    ) -> Option<String> {
        if !log.is_valid() || !self.rating_total_stays_finite(&log) {
            tracing::warn!("Ignoring invalid log for session {}", session_id);
            return None;
        }

        let log_id = self.ids.next_id();
        let log = log.into_log(log_id.clone(), Some(session_id.to_string()));

        let session = self
            .state
            .workout_sessions
            .iter_mut()
            .find(|s| s.id == session_id)?;
        if !session.is_active() {
            tracing::warn!("Session {} has ended, not adding exercise", session_id);
            return None;
        }

        if !(session.total_volume + log.volume()).is_finite() {
            tracing::warn!("Session {} volume would overflow, not adding exercise", session_id);
            return None;
        }
        session.total_volume += log.volume();
        session.exercises.push(log.clone());

        self.record_log(log);
        Some(log_id)
    }

    /// Stamp the end time and whole-minute duration of an open session
    ///
    /// Returns false for unknown ids and sessions that already ended.
    pub fn end_workout_session(&mut self, session_id: &str) -> bool {
        self.end_workout_session_at(session_id, Utc::now())
    }

    pub fn end_workout_session_at(&mut self, session_id: &str, end: DateTime<Utc>) -> bool {
        let Some(session) = self
            .state
            .workout_sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.is_active())
        else {
            return false;
        };

        session.end_time = Some(end);
        session.duration = Some((end - session.start_time).num_seconds().div_euclid(60));
        tracing::info!(
            "Ended workout session '{}' after {:?} minutes",
            session.name,
            session.duration
        );
        true
    }

    // ========================================================================
    // Programs
    // ========================================================================

    pub fn workout_templates(&self) -> &[WorkoutTemplate] {
        &self.state.workout_templates
    }

    pub fn add_workout_template(&mut self, template: NewWorkoutTemplate) -> String {
        let id = self.ids.next_id();
        self.state.workout_templates.push(WorkoutTemplate {
            id: id.clone(),
            name: template.name,
            description: template.description,
            target_muscles: template.target_muscles,
            exercises: template.exercises,
            is_pre_defined: false,
        });
        id
    }

    pub fn remove_workout_template(&mut self, id: &str) -> bool {
        remove_by(&mut self.state.workout_templates, |t| t.id == id)
    }

    /// Predefined programs followed by the user's templates
    pub fn all_programs(&self) -> Vec<WorkoutTemplate> {
        self.catalog
            .programs
            .iter()
            .chain(self.state.workout_templates.iter())
            .cloned()
            .collect()
    }

    // ========================================================================
    // Muscle ratings and statistics
    // ========================================================================

    pub fn muscle_group_ratings(&self) -> &[MuscleGroupRating] {
        &self.state.muscle_group_ratings
    }

    pub fn muscle_rating(&self, muscle: MuscleGroup) -> Option<&MuscleGroupRating> {
        self.state
            .muscle_group_ratings
            .iter()
            .find(|r| r.muscle_group == muscle)
    }

    /// Set a rating level by hand, clamped to 1..=10
    ///
    /// Creates the rating with zero totals if the muscle was never trained.
    pub fn update_muscle_rating(&mut self, muscle: MuscleGroup, level: i32) -> u8 {
        let level = clamp_level(level);
        let now = Utc::now();

        match self
            .state
            .muscle_group_ratings
            .iter_mut()
            .find(|r| r.muscle_group == muscle)
        {
            Some(rating) => {
                rating.level = level;
                rating.last_updated = now;
            }
            None => self.state.muscle_group_ratings.push(MuscleGroupRating {
                muscle_group: muscle,
                level,
                last_updated: now,
                total_volume: 0.0,
                workout_count: 0,
            }),
        }
        tracing::debug!("Rated {} at level {}", muscle, level);
        level
    }

    /// Move a rating up or down by `delta` levels (unrated counts as level 1)
    pub fn adjust_muscle_rating(&mut self, muscle: MuscleGroup, delta: i32) -> u8 {
        let current = self
            .muscle_rating(muscle)
            .map_or(MIN_RATING_LEVEL, |r| r.level);
        self.update_muscle_rating(muscle, i32::from(current) + delta)
    }

    /// Fresh statistics for `muscle` from the full log history
    pub fn calculate_muscle_stats(&self, muscle: MuscleGroup) -> MuscleGroupStats {
        calculate_muscle_stats(&self.state.exercise_logs, muscle, Utc::now())
    }

    /// Every tracked muscle with its level and stats, busiest week first
    pub fn muscle_overview(&self) -> Vec<MuscleOverview> {
        let now = Utc::now();
        let mut rows: Vec<MuscleOverview> = MuscleGroup::TRACKED
            .iter()
            .map(|&muscle| MuscleOverview {
                muscle_group: muscle,
                level: self
                    .muscle_rating(muscle)
                    .map_or(MIN_RATING_LEVEL, |r| r.level),
                stats: calculate_muscle_stats(&self.state.exercise_logs, muscle, now),
            })
            .collect();

        rows.sort_by(|a, b| b.stats.weekly_volume.total_cmp(&a.stats.weekly_volume));
        rows
    }

    // ========================================================================
    // Goals
    // ========================================================================

    pub fn goals(&self) -> &[Goal] {
        &self.state.goals
    }

    pub fn add_goal(&mut self, goal: NewGoal) -> String {
        let id = self.ids.next_id();
        self.state.goals.push(Goal {
            id: id.clone(),
            kind: goal.kind,
            title: goal.title,
            target: goal.target,
            current: goal.current,
            deadline: goal.deadline,
            completed: goal.completed,
            muscle_group: goal.muscle_group,
        });
        id
    }

    pub fn update_goal(&mut self, id: &str, update: GoalUpdate) -> Option<&Goal> {
        let goal = self.state.goals.iter_mut().find(|g| g.id == id)?;
        goal.apply(update);
        Some(&*goal)
    }

    pub fn remove_goal(&mut self, id: &str) -> bool {
        remove_by(&mut self.state.goals, |g| g.id == id)
    }

    // ========================================================================
    // Personal records
    // ========================================================================

    pub fn personal_records(&self) -> &[PersonalRecord] {
        &self.state.personal_records
    }

    pub fn personal_record_for(&self, exercise_id: &str) -> Option<&PersonalRecord> {
        self.state
            .personal_records
            .iter()
            .find(|pr| pr.exercise_id == exercise_id)
    }

    /// Enter a record by hand, replacing any record for the same exercise
    ///
    /// Returns `None` (and changes nothing) for a negative or non-finite
    /// weight, or one whose volume is not finite.
    pub fn add_personal_record(&mut self, record: NewPersonalRecord) -> Option<String> {
        if !is_valid_record(record.weight, record.reps) {
            tracing::warn!(
                "Ignoring invalid record for {}: {} kg x {}",
                record.exercise_id,
                record.weight,
                record.reps
            );
            return None;
        }

        let id = self.ids.next_id();
        self.state
            .personal_records
            .retain(|pr| pr.exercise_id != record.exercise_id);
        self.state.personal_records.push(PersonalRecord {
            id: id.clone(),
            volume: record_volume(record.weight, record.reps),
            exercise_id: record.exercise_id,
            exercise_name: record.exercise_name,
            weight: record.weight,
            reps: record.reps,
            date: record.date,
        });
        Some(id)
    }

    /// Edit a record in place; volume follows the new weight and reps
    ///
    /// Unknown ids and updates that would leave an invalid weight return
    /// `None` without changing anything.
    pub fn update_personal_record(
        &mut self,
        id: &str,
        update: PersonalRecordUpdate,
    ) -> Option<&PersonalRecord> {
        let record = self.state.personal_records.iter_mut().find(|pr| pr.id == id)?;
        let weight = update.weight.unwrap_or(record.weight);
        let reps = update.reps.unwrap_or(record.reps);
        if !is_valid_record(weight, reps) {
            tracing::warn!("Ignoring invalid update for record {}: {} kg x {}", id, weight, reps);
            return None;
        }

        if let Some(name) = update.exercise_name {
            record.exercise_name = name;
        }
        if let Some(weight) = update.weight {
            record.weight = weight;
        }
        if let Some(reps) = update.reps {
            record.reps = reps;
        }
        if let Some(date) = update.date {
            record.date = date;
        }
        record.volume = record_volume(record.weight, record.reps);
        Some(&*record)
    }

    pub fn remove_personal_record(&mut self, id: &str) -> bool {
        remove_by(&mut self.state.personal_records, |pr| pr.id == id)
    }

    // ========================================================================
    // Export / import
    // ========================================================================

    /// Serialize the persisted state as a pretty-printed export document
    pub fn export_data(&self) -> Result<String> {
        self.export_data_with(true)
    }

    pub fn export_data_with(&self, pretty: bool) -> Result<String> {
        ExportDocument::new(self.state.clone(), Utc::now()).to_json(pretty)
    }

    /// Import an export document
    ///
    /// Nothing changes if the text does not parse.
    pub fn import_data(&mut self, text: &str, mode: ImportMode) -> Result<()> {
        let incoming = match parse_import(text) {
            Ok(incoming) => incoming,
            Err(e) => {
                tracing::error!("Failed to import data: {}", e);
                return Err(e);
            }
        };

        self.state.apply_import(incoming, mode);
        tracing::info!(
            "Imported data ({:?}): {} logs, {} weigh-ins",
            mode,
            self.state.exercise_logs.len(),
            self.state.weight_entries.len()
        );
        Ok(())
    }
}

fn is_valid_record(weight: f64, reps: u32) -> bool {
    is_valid_load(weight) && record_volume(weight, reps).is_finite()
}

fn clamp_level(level: i32) -> u8 {
    // Clamped into 1..=10, so the cast cannot truncate
    level.clamp(i32::from(MIN_RATING_LEVEL), i32::from(MAX_RATING_LEVEL)) as u8
}

/// Remove every element matching `pred`; true if anything was removed
fn remove_by<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|item| !pred(item));
    before != items.len()
}
