//! Persisted state shape and the JSON export/import format.
//!
//! The same `PersistedState` is written to the blob store after every
//! mutation and embedded (flattened) in export documents.

use crate::{
    Error, ExerciseDefinition, ExerciseLog, Goal, MuscleGroupRating, PersonalRecord, Profile,
    Result, WeightEntry, WorkoutSession, WorkoutTemplate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Format version written into every export
pub const EXPORT_VERSION: &str = "2.0";

/// The part of the store that survives restarts
///
/// Missing fields deserialize to empty collections and a default profile.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub profile: Profile,
    pub weight_entries: Vec<WeightEntry>,
    pub exercise_logs: Vec<ExerciseLog>,
    pub workout_sessions: Vec<WorkoutSession>,
    pub workout_templates: Vec<WorkoutTemplate>,
    pub custom_exercises: Vec<ExerciseDefinition>,
    pub muscle_group_ratings: Vec<MuscleGroupRating>,
    pub goals: Vec<Goal>,
    pub personal_records: Vec<PersonalRecord>,
}

/// Export wrapper: version and timestamp around the persisted state
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub export_date: DateTime<Utc>,
    #[serde(flatten)]
    pub data: PersistedState,
}

/// Import wrapper; version and date are informational only
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    export_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    data: PersistedState,
}

/// How imported data combines with the current state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Discard the current state and take the imported one wholesale
    #[default]
    Replace,
    /// Append imported list records after the existing ones
    Merge,
}

impl FromStr for ImportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(ImportMode::Replace),
            "merge" => Ok(ImportMode::Merge),
            other => Err(Error::Other(format!("Unknown import mode: {}", other))),
        }
    }
}

impl ExportDocument {
    pub fn new(data: PersistedState, export_date: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date,
            data,
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }
}

/// Parse export text into a persisted state
///
/// Any failure (malformed JSON, a non-object document, wrongly typed fields)
/// becomes `Error::InvalidDataFormat`.
pub fn parse_import(text: &str) -> Result<PersistedState> {
    let doc: ImportDocument =
        serde_json::from_str(text).map_err(|e| Error::InvalidDataFormat(e.to_string()))?;

    tracing::debug!(
        "Parsed import document version {:?} exported at {:?}",
        doc.version,
        doc.export_date
    );
    Ok(doc.data)
}

impl PersistedState {
    /// Replace every persisted field with the imported one
    ///
    /// Duplicate aggregates in the incoming data are collapsed first.
    pub fn replace_with(&mut self, mut incoming: PersistedState) {
        incoming.dedup_aggregates();
        *self = incoming;
    }

    /// Keep one rating per muscle group (the first) and one personal record
    /// per exercise (the highest volume)
    pub fn dedup_aggregates(&mut self) {
        let ratings_before = self.muscle_group_ratings.len();
        let mut seen = HashSet::new();
        self.muscle_group_ratings.retain(|rating| seen.insert(rating.muscle_group));

        let records_before = self.personal_records.len();
        let mut best: Vec<PersonalRecord> = Vec::with_capacity(records_before);
        for record in self.personal_records.drain(..) {
            match best.iter_mut().find(|b| b.exercise_id == record.exercise_id) {
                Some(existing) if record.volume > existing.volume => *existing = record,
                Some(_) => {}
                None => best.push(record),
            }
        }
        self.personal_records = best;

        let dropped_ratings = ratings_before - self.muscle_group_ratings.len();
        let dropped_records = records_before - self.personal_records.len();
        if dropped_ratings + dropped_records > 0 {
            tracing::warn!(
                "Dropped {} duplicate muscle ratings and {} duplicate personal records",
                dropped_ratings,
                dropped_records
            );
        }
    }

    /// Append imported list records after the existing ones
    ///
    /// No de-duplication by id is done, so merging the same export twice
    /// doubles every list. Profile, muscle ratings and personal records are
    /// left untouched.
    pub fn merge_from(&mut self, incoming: PersistedState) {
        self.weight_entries.extend(incoming.weight_entries);
        self.exercise_logs.extend(incoming.exercise_logs);
        self.workout_sessions.extend(incoming.workout_sessions);
        self.workout_templates.extend(incoming.workout_templates);
        self.custom_exercises.extend(incoming.custom_exercises);
        self.goals.extend(incoming.goals);
    }

    pub fn apply_import(&mut self, incoming: PersistedState, mode: ImportMode) {
        match mode {
            ImportMode::Replace => self.replace_with(incoming),
            ImportMode::Merge => self.merge_from(incoming),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weigh_in(id: &str, kg: f64) -> WeightEntry {
        WeightEntry {
            id: id.into(),
            date: Utc::now(),
            weight: kg,
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_import("{ not json").unwrap_err();
        assert!(matches!(err, Error::InvalidDataFormat(_)));

        let err = parse_import("42").unwrap_err();
        assert!(matches!(err, Error::InvalidDataFormat(_)));

        let err = parse_import(r#"{"weightEntries": "lots"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidDataFormat(_)));
    }

    #[test]
    fn test_parse_defaults_missing_fields() {
        let state = parse_import(r#"{"version": "2.0"}"#).unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn test_parse_reads_foreign_timestamps() {
        let text = r#"{
            "weightEntries": [
                {"id": "w1", "date": "2024-01-15T10:30:00.000Z", "weight": 81.5}
            ]
        }"#;
        let state = parse_import(text).unwrap();
        assert_eq!(state.weight_entries.len(), 1);
        assert_eq!(state.weight_entries[0].weight, 81.5);
    }

    #[test]
    fn test_export_document_layout() {
        let mut data = PersistedState::default();
        data.weight_entries.push(weigh_in("w1", 80.0));

        let json = ExportDocument::new(data, Utc::now()).to_json(false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], EXPORT_VERSION);
        assert!(value["exportDate"].is_string());
        assert_eq!(value["weightEntries"][0]["id"], "w1");
        assert!(value["personalRecords"].as_array().unwrap().is_empty());
        assert!(value["profile"]["heightCm"].is_null());
    }

    #[test]
    fn test_replace_discards_prior_state() {
        let mut state = PersistedState::default();
        state.weight_entries.push(weigh_in("old", 90.0));
        state.profile.height_cm = Some(175.0);

        state.apply_import(PersistedState::default(), ImportMode::Replace);
        assert!(state.weight_entries.is_empty());
        assert_eq!(state.profile.height_cm, None);
    }

    #[test]
    fn test_merge_appends_without_dedup() {
        let mut state = PersistedState::default();
        state.weight_entries.push(weigh_in("w1", 80.0));

        let incoming = state.clone();
        state.apply_import(incoming, ImportMode::Merge);

        assert_eq!(state.weight_entries.len(), 2);
        assert_eq!(state.weight_entries[0].id, state.weight_entries[1].id);
    }

    #[test]
    fn test_replace_collapses_duplicate_aggregates() {
        let text = r#"{
            "muscleGroupRatings": [
                {"muscleGroup": "Chest", "level": 4, "lastUpdated": "2024-01-15T10:30:00Z",
                 "totalVolume": 900.0, "workoutCount": 2},
                {"muscleGroup": "Chest", "level": 9, "lastUpdated": "2024-01-16T10:30:00Z",
                 "totalVolume": 50.0, "workoutCount": 1}
            ],
            "personalRecords": [
                {"id": "pr1", "exerciseId": "ex_squat", "exerciseName": "Barbell Squat",
                 "weight": 100.0, "reps": 5, "date": "2024-01-15T10:30:00Z", "volume": 500.0},
                {"id": "pr2", "exerciseId": "ex_squat", "exerciseName": "Barbell Squat",
                 "weight": 120.0, "reps": 5, "date": "2024-01-20T10:30:00Z", "volume": 600.0},
                {"id": "pr3", "exerciseId": "ex_squat", "exerciseName": "Barbell Squat",
                 "weight": 80.0, "reps": 5, "date": "2024-01-25T10:30:00Z", "volume": 400.0}
            ]
        }"#;
        let mut state = PersistedState::default();
        state.apply_import(parse_import(text).unwrap(), ImportMode::Replace);

        assert_eq!(state.muscle_group_ratings.len(), 1);
        assert_eq!(state.muscle_group_ratings[0].level, 4);
        assert_eq!(state.personal_records.len(), 1);
        assert_eq!(state.personal_records[0].id, "pr2");
    }

    #[test]
    fn test_import_mode_parse() {
        assert_eq!("merge".parse::<ImportMode>().unwrap(), ImportMode::Merge);
        assert_eq!("Replace".parse::<ImportMode>().unwrap(), ImportMode::Replace);
        assert!("append".parse::<ImportMode>().is_err());
        assert_eq!(ImportMode::default(), ImportMode::Replace);
    }
}
