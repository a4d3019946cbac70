//! CSV export of training history.
//!
//! Logs and weigh-ins are written one row per record, headers first, in the
//! order given. Callers choose the writer (file, stdout, buffer).

use crate::{ExerciseLog, Result, WeightEntry};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A row in the exercise log CSV
#[derive(Debug, serde::Serialize)]
struct LogRow<'a> {
    id: &'a str,
    date: String,
    exercise_id: &'a str,
    exercise_name: &'a str,
    primary_muscle: &'static str,
    sets: u32,
    reps: u32,
    weight: f64,
    volume: f64,
    duration: Option<u32>,
    workout_session_id: Option<&'a str>,
    notes: Option<&'a str>,
}

impl<'a> From<&'a ExerciseLog> for LogRow<'a> {
    fn from(log: &'a ExerciseLog) -> Self {
        LogRow {
            id: &log.id,
            date: log.date.to_rfc3339(),
            exercise_id: &log.exercise_id,
            exercise_name: &log.exercise_name,
            primary_muscle: log.primary_muscle.as_str(),
            sets: log.sets,
            reps: log.reps,
            weight: log.weight,
            volume: log.volume(),
            duration: log.duration,
            workout_session_id: log.workout_session_id.as_deref(),
            notes: log.notes.as_deref(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct WeightRow<'a> {
    id: &'a str,
    date: String,
    weight: f64,
}

impl<'a> From<&'a WeightEntry> for WeightRow<'a> {
    fn from(entry: &'a WeightEntry) -> Self {
        WeightRow {
            id: &entry.id,
            date: entry.date.to_rfc3339(),
            weight: entry.weight,
        }
    }
}

/// Write exercise logs as CSV; returns the number of rows written
pub fn write_exercise_logs_csv<W: Write>(logs: &[ExerciseLog], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for log in logs {
        csv_writer.serialize(LogRow::from(log))?;
    }
    csv_writer.flush()?;
    tracing::debug!("Wrote {} exercise logs as CSV", logs.len());
    Ok(logs.len())
}

/// Write weigh-ins as CSV; returns the number of rows written
pub fn write_weight_entries_csv<W: Write>(entries: &[WeightEntry], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for entry in entries {
        csv_writer.serialize(WeightRow::from(entry))?;
    }
    csv_writer.flush()?;
    tracing::debug!("Wrote {} weight entries as CSV", entries.len());
    Ok(entries.len())
}

/// Write exercise logs to a CSV file, replacing it, and sync to disk
pub fn export_exercise_logs(logs: &[ExerciseLog], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(csv_path)?;
    let count = write_exercise_logs_csv(logs, &file)?;
    file.sync_all()?;

    tracing::info!("Exported {} exercise logs to {:?}", count, csv_path);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MuscleGroup;
    use chrono::{TimeZone, Utc};

    fn create_test_log(id: &str, notes: Option<&str>) -> ExerciseLog {
        ExerciseLog {
            id: id.into(),
            date: Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap(),
            exercise_id: "ex_bench_press".into(),
            exercise_name: "Bench Press".into(),
            primary_muscle: MuscleGroup::Chest,
            sets: 3,
            reps: 8,
            weight: 60.0,
            duration: None,
            notes: notes.map(String::from),
            workout_session_id: None,
        }
    }

    #[test]
    fn test_logs_csv_has_header_and_volume() {
        let logs = vec![create_test_log("l1", None), create_test_log("l2", Some("felt easy"))];
        let mut buffer = Vec::new();

        let count = write_exercise_logs_csv(&logs, &mut buffer).unwrap();
        assert_eq!(count, 2);

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "id");
        assert_eq!(&headers[8], "volume");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][4], "Chest");
        assert_eq!(rows[0][8].parse::<f64>().unwrap(), 1440.0);
        assert_eq!(&rows[1][11], "felt easy");
    }

    #[test]
    fn test_notes_with_commas_are_quoted() {
        let logs = vec![create_test_log("l1", Some("slow, paused reps"))];
        let mut buffer = Vec::new();
        write_exercise_logs_csv(&logs, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("\"slow, paused reps\""));
    }

    #[test]
    fn test_weight_csv() {
        let entries = vec![WeightEntry {
            id: "w1".into(),
            date: Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap(),
            weight: 81.5,
        }];
        let mut buffer = Vec::new();
        assert_eq!(write_weight_entries_csv(&entries, &mut buffer).unwrap(), 1);

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,date,weight"));
        assert!(lines.next().unwrap().starts_with("w1,2024-01-15T07:30:00"));
    }

    #[test]
    fn test_export_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("out").join("logs.csv");

        let count = export_exercise_logs(&[create_test_log("l1", None)], &csv_path).unwrap();
        assert_eq!(count, 1);

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 1);
    }

    #[test]
    fn test_empty_logs_write_nothing() {
        let mut buffer = Vec::new();
        assert_eq!(write_exercise_logs_csv(&[], &mut buffer).unwrap(), 0);
        assert!(buffer.is_empty());
    }
}
