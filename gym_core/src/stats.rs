//! On-demand muscle group statistics.
//!
//! Everything here is recomputed from the full exercise log on each call. The
//! running totals kept on `MuscleGroupRating` are maintained separately by the
//! store and are never derived from these numbers.

use crate::{ExerciseLog, MuscleGroup, MuscleGroupStats};
use chrono::{DateTime, Duration, Local, Utc};
use std::collections::HashSet;

/// Trailing window for weekly volume, in days
pub const WEEK_WINDOW_DAYS: i64 = 7;

/// Trailing window for monthly volume, in days
pub const MONTH_WINDOW_DAYS: i64 = 30;

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute statistics for `muscle` from every log whose primary muscle matches
///
/// Window boundaries are inclusive: a log dated exactly `now - 7d` still
/// counts toward the weekly volume.
pub fn calculate_muscle_stats(
    logs: &[ExerciseLog],
    muscle: MuscleGroup,
    now: DateTime<Utc>,
) -> MuscleGroupStats {
    let matching: Vec<&ExerciseLog> = logs
        .iter()
        .filter(|log| log.primary_muscle == muscle)
        .collect();

    let week_start = now - Duration::days(WEEK_WINDOW_DAYS);
    let month_start = now - Duration::days(MONTH_WINDOW_DAYS);

    let weekly_volume = volume_since(&matching, week_start);
    let monthly_volume = volume_since(&matching, month_start);

    let total_sets: u64 = matching.iter().map(|log| u64::from(log.sets)).sum();
    let total_reps: u64 = matching
        .iter()
        .map(|log| u64::from(log.sets) * u64::from(log.reps))
        .sum();

    let average_weight = if matching.is_empty() {
        0.0
    } else {
        matching.iter().map(|log| log.weight).sum::<f64>() / matching.len() as f64
    };

    let training_days: HashSet<_> = matching
        .iter()
        .map(|log| log.date.with_timezone(&Local).date_naive())
        .collect();
    let days = training_days.len();
    let weeks_tracked = days.div_ceil(7).max(1);
    let workout_frequency = days as f64 / weeks_tracked as f64;

    let last_trained = matching.iter().map(|log| log.date).max();

    MuscleGroupStats {
        muscle_group: muscle,
        weekly_volume,
        monthly_volume,
        total_sets,
        total_reps,
        average_weight: round1(average_weight),
        workout_frequency: round1(workout_frequency),
        last_trained,
    }
}

fn volume_since(logs: &[&ExerciseLog], start: DateTime<Utc>) -> f64 {
    logs.iter()
        .filter(|log| log.date >= start)
        .map(|log| log.volume())
        .sum()
}
