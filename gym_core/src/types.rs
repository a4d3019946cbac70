//! Core domain types for the gym tracker.
//!
//! Records never hold references to each other; relations are string ids
//! resolved at read time. Every persisted record serializes with camelCase
//! field names so exports stay readable by other clients of the same format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Enumerations
// ============================================================================

/// Muscle groups an exercise can target
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Quads,
    Hamstrings,
    Calves,
    Glutes,
    Abs,
    Obliques,
    Traps,
    Lats,
    #[serde(rename = "Full Body")]
    FullBody,
}

impl MuscleGroup {
    pub const ALL: [MuscleGroup; 15] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Shoulders,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Forearms,
        MuscleGroup::Quads,
        MuscleGroup::Hamstrings,
        MuscleGroup::Calves,
        MuscleGroup::Glutes,
        MuscleGroup::Abs,
        MuscleGroup::Obliques,
        MuscleGroup::Traps,
        MuscleGroup::Lats,
        MuscleGroup::FullBody,
    ];

    /// Groups shown on the muscle overview (everything except Full Body)
    pub const TRACKED: [MuscleGroup; 14] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Shoulders,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Forearms,
        MuscleGroup::Quads,
        MuscleGroup::Hamstrings,
        MuscleGroup::Calves,
        MuscleGroup::Glutes,
        MuscleGroup::Abs,
        MuscleGroup::Obliques,
        MuscleGroup::Traps,
        MuscleGroup::Lats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Biceps => "Biceps",
            MuscleGroup::Triceps => "Triceps",
            MuscleGroup::Forearms => "Forearms",
            MuscleGroup::Quads => "Quads",
            MuscleGroup::Hamstrings => "Hamstrings",
            MuscleGroup::Calves => "Calves",
            MuscleGroup::Glutes => "Glutes",
            MuscleGroup::Abs => "Abs",
            MuscleGroup::Obliques => "Obliques",
            MuscleGroup::Traps => "Traps",
            MuscleGroup::Lats => "Lats",
            MuscleGroup::FullBody => "Full Body",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MuscleGroup {
    type Err = crate::Error;

    /// Case-insensitive; spaces, dashes and underscores are ignored so
    /// "full body", "full_body" and "FullBody" all parse.
    fn from_str(s: &str) -> crate::Result<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        MuscleGroup::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().replace(' ', "").to_lowercase() == wanted)
            .ok_or_else(|| crate::Error::Other(format!("Unknown muscle group: {}", s)))
    }
}

/// Equipment an exercise needs
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EquipmentType {
    Barbell,
    Dumbbell,
    Machine,
    Cable,
    Bodyweight,
    Kettlebell,
    #[serde(rename = "Resistance Band")]
    ResistanceBand,
    Other,
}

/// Difficulty tier of an exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// What a goal is measured against
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    Weight,
    Exercise,
    Muscle,
    Custom,
}

// ============================================================================
// Profile and Body Weight
// ============================================================================

/// The single user profile of a store
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<ExperienceLevel>,
}

/// Partial profile update; `None` leaves a field untouched.
///
/// `height_cm: Some(None)` clears the height.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub height_cm: Option<Option<f64>>,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub experience_level: Option<ExperienceLevel>,
}

impl Profile {
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(height) = update.height_cm {
            self.height_cm = height;
        }
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(age) = update.age {
            self.age = Some(age);
        }
        if let Some(gender) = update.gender {
            self.gender = Some(gender);
        }
        if let Some(level) = update.experience_level {
            self.experience_level = Some(level);
        }
    }
}

/// A body-weight measurement in kilograms
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeightEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub weight: f64,
}

// ============================================================================
// Exercises
// ============================================================================

/// An exercise from the catalog or created by the user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    pub primary_muscle: MuscleGroup,
    #[serde(default)]
    pub secondary_muscles: Vec<MuscleGroup>,
    pub equipment: EquipmentType,
    pub difficulty: DifficultyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

/// A user-defined exercise before it has been given an id
#[derive(Clone, Debug)]
pub struct NewExerciseDefinition {
    pub name: String,
    pub primary_muscle: MuscleGroup,
    pub secondary_muscles: Vec<MuscleGroup>,
    pub equipment: EquipmentType,
    pub difficulty: DifficultyLevel,
    pub instructions: Option<String>,
}

/// One logged exercise.
///
/// `exercise_name` and `primary_muscle` are copied from the definition when
/// the log is created and never refreshed afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    pub id: String,
    pub date: DateTime<Utc>,
    pub exercise_id: String,
    pub exercise_name: String,
    pub primary_muscle: MuscleGroup,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_session_id: Option<String>,
}

impl ExerciseLog {
    /// Training volume: sets × reps × weight
    pub fn volume(&self) -> f64 {
        f64::from(self.sets) * f64::from(self.reps) * self.weight
    }
}

/// An exercise log before the store assigns it an id
#[derive(Clone, Debug)]
pub struct NewExerciseLog {
    pub date: DateTime<Utc>,
    pub exercise_id: String,
    pub exercise_name: String,
    pub primary_muscle: MuscleGroup,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    pub duration: Option<u32>,
    pub notes: Option<String>,
}

impl NewExerciseLog {
    /// Build a log dated now
    pub fn new(
        exercise_id: impl Into<String>,
        exercise_name: impl Into<String>,
        primary_muscle: MuscleGroup,
        sets: u32,
        reps: u32,
        weight: f64,
    ) -> Self {
        Self {
            date: Utc::now(),
            exercise_id: exercise_id.into(),
            exercise_name: exercise_name.into(),
            primary_muscle,
            sets,
            reps,
            weight,
            duration: None,
            notes: None,
        }
    }

    /// Build a log from a definition, copying its name and primary muscle
    pub fn for_definition(def: &ExerciseDefinition, sets: u32, reps: u32, weight: f64) -> Self {
        Self::new(&def.id, &def.name, def.primary_muscle, sets, reps, weight)
    }

    pub fn on(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn volume(&self) -> f64 {
        f64::from(self.sets) * f64::from(self.reps) * self.weight
    }

    /// Sets and reps must be positive, the weight non-negative and the
    /// resulting volume finite
    pub fn is_valid(&self) -> bool {
        self.sets > 0 && self.reps > 0 && is_valid_load(self.weight) && self.volume().is_finite()
    }

    pub(crate) fn into_log(self, id: String, workout_session_id: Option<String>) -> ExerciseLog {
        ExerciseLog {
            id,
            date: self.date,
            exercise_id: self.exercise_id,
            exercise_name: self.exercise_name,
            primary_muscle: self.primary_muscle,
            sets: self.sets,
            reps: self.reps,
            weight: self.weight,
            duration: self.duration,
            notes: self.notes,
            workout_session_id,
        }
    }
}

// ============================================================================
// Sessions and Programs
// ============================================================================

/// A workout session: a named group of logs with a start and end time
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exercises: Vec<ExerciseLog>,
    #[serde(default)]
    pub total_volume: f64,
    /// Whole minutes between start and end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WorkoutSession {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}

/// One planned exercise inside a program
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlannedExercise {
    pub exercise_id: String,
    pub exercise_name: String,
    pub sets: u32,
    pub reps: u32,
    /// Rest between sets, in seconds
    pub rest_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A workout program, either predefined or created by the user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub target_muscles: Vec<MuscleGroup>,
    #[serde(default)]
    pub exercises: Vec<PlannedExercise>,
    #[serde(default)]
    pub is_pre_defined: bool,
}

#[derive(Clone, Debug)]
pub struct NewWorkoutTemplate {
    pub name: String,
    pub description: Option<String>,
    pub target_muscles: Vec<MuscleGroup>,
    pub exercises: Vec<PlannedExercise>,
}

// ============================================================================
// Aggregates, Goals and Records
// ============================================================================

/// Coarse 1–10 development level of a muscle group with running totals
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MuscleGroupRating {
    pub muscle_group: MuscleGroup,
    pub level: u8,
    pub last_updated: DateTime<Utc>,
    pub total_volume: f64,
    pub workout_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: GoalKind,
    pub title: String,
    pub target: String,
    pub current: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muscle_group: Option<MuscleGroup>,
}

#[derive(Clone, Debug)]
pub struct NewGoal {
    pub kind: GoalKind,
    pub title: String,
    pub target: String,
    pub current: String,
    pub deadline: Option<String>,
    pub completed: bool,
    pub muscle_group: Option<MuscleGroup>,
}

/// Partial goal update; `None` leaves a field untouched
#[derive(Clone, Debug, Default)]
pub struct GoalUpdate {
    pub kind: Option<GoalKind>,
    pub title: Option<String>,
    pub target: Option<String>,
    pub current: Option<String>,
    pub deadline: Option<Option<String>>,
    pub completed: Option<bool>,
    pub muscle_group: Option<Option<MuscleGroup>>,
}

impl Goal {
    pub fn apply(&mut self, update: GoalUpdate) {
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(target) = update.target {
            self.target = target;
        }
        if let Some(current) = update.current {
            self.current = current;
        }
        if let Some(deadline) = update.deadline {
            self.deadline = deadline;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        if let Some(muscle_group) = update.muscle_group {
            self.muscle_group = muscle_group;
        }
    }
}

/// Best single set ever logged for an exercise (volume = weight × reps)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    pub id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub weight: f64,
    pub reps: u32,
    pub date: DateTime<Utc>,
    pub volume: f64,
}

#[derive(Clone, Debug)]
pub struct NewPersonalRecord {
    pub exercise_id: String,
    pub exercise_name: String,
    pub weight: f64,
    pub reps: u32,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct PersonalRecordUpdate {
    pub exercise_name: Option<String>,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub date: Option<DateTime<Utc>>,
}

/// Record volume used for PR comparison
pub fn record_volume(weight: f64, reps: u32) -> f64 {
    weight * f64::from(reps)
}

/// A lifted weight that can be stored: finite and not negative
pub fn is_valid_load(weight: f64) -> bool {
    weight.is_finite() && weight >= 0.0
}

// ============================================================================
// Read models
// ============================================================================

/// On-demand statistics for one muscle group
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MuscleGroupStats {
    pub muscle_group: MuscleGroup,
    pub weekly_volume: f64,
    pub monthly_volume: f64,
    pub total_sets: u64,
    pub total_reps: u64,
    pub average_weight: f64,
    /// Training days per week
    pub workout_frequency: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_trained: Option<DateTime<Utc>>,
}

/// One row of the muscle overview: rating level next to live stats
#[derive(Clone, Debug, PartialEq)]
pub struct MuscleOverview {
    pub muscle_group: MuscleGroup,
    pub level: u8,
    pub stats: MuscleGroupStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muscle_group_parse() {
        assert_eq!("chest".parse::<MuscleGroup>().unwrap(), MuscleGroup::Chest);
        assert_eq!("Full Body".parse::<MuscleGroup>().unwrap(), MuscleGroup::FullBody);
        assert_eq!("full_body".parse::<MuscleGroup>().unwrap(), MuscleGroup::FullBody);
        assert!("wings".parse::<MuscleGroup>().is_err());
    }

    #[test]
    fn test_muscle_group_serializes_display_name() {
        let json = serde_json::to_string(&MuscleGroup::FullBody).unwrap();
        assert_eq!(json, "\"Full Body\"");
        let back: MuscleGroup = serde_json::from_str("\"Lats\"").unwrap();
        assert_eq!(back, MuscleGroup::Lats);
    }

    #[test]
    fn test_log_volume() {
        let log = NewExerciseLog::new("ex_squat", "Barbell Squat", MuscleGroup::Quads, 3, 10, 20.0);
        assert_eq!(log.volume(), 600.0);
        assert!(log.is_valid());
    }

    #[test]
    fn test_invalid_logs() {
        let base = NewExerciseLog::new("ex", "Ex", MuscleGroup::Abs, 3, 10, 0.0);
        assert!(base.is_valid(), "bodyweight logs with zero weight are allowed");

        let mut no_sets = base.clone();
        no_sets.sets = 0;
        assert!(!no_sets.is_valid());

        let mut negative = base.clone();
        negative.weight = -5.0;
        assert!(!negative.is_valid());

        let mut nan = base.clone();
        nan.weight = f64::NAN;
        assert!(!nan.is_valid());

        let mut overflowing = base;
        overflowing.weight = 1e308;
        assert!(!overflowing.is_valid(), "3 x 10 x 1e308 is not a finite volume");
    }

    #[test]
    fn test_exercise_log_json_field_names() {
        let log = NewExerciseLog::new(
            "ex_bench_press",
            "Barbell Bench Press",
            MuscleGroup::Chest,
            3,
            8,
            60.0,
        )
        .into_log("log-1".into(), Some("session-1".into()));
        let value = serde_json::to_value(&log).unwrap();

        assert_eq!(value["exerciseId"], "ex_bench_press");
        assert_eq!(value["primaryMuscle"], "Chest");
        assert_eq!(value["workoutSessionId"], "session-1");
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn test_goal_kind_serializes_as_type() {
        let goal = Goal {
            id: "g1".into(),
            kind: GoalKind::Weight,
            title: "Cut".into(),
            target: "75".into(),
            current: "80".into(),
            deadline: None,
            completed: false,
            muscle_group: None,
        };
        let value = serde_json::to_value(&goal).unwrap();
        assert_eq!(value["type"], "weight");
    }

    #[test]
    fn test_profile_partial_update() {
        let mut profile = Profile {
            height_cm: Some(180.0),
            ..Default::default()
        };

        profile.apply(ProfileUpdate {
            name: Some("Sam".into()),
            ..Default::default()
        });
        assert_eq!(profile.height_cm, Some(180.0));
        assert_eq!(profile.name.as_deref(), Some("Sam"));

        profile.apply(ProfileUpdate {
            height_cm: Some(None),
            ..Default::default()
        });
        assert_eq!(profile.height_cm, None);
        assert_eq!(profile.name.as_deref(), Some("Sam"));
    }

    #[test]
    fn test_profile_accepts_legacy_shape() {
        let profile: Profile = serde_json::from_str(r#"{"heightCm":null}"#).unwrap();
        assert_eq!(profile, Profile::default());
    }
}
