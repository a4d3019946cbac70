//! Built-in exercise library and predefined workout programs.
//!
//! The catalog is read-only reference data. The store queries it by id and
//! appends the user's own exercises and programs after it.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Read-only exercise and program reference data
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: Vec<ExerciseDefinition>,
    pub programs: Vec<WorkoutTemplate>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds a fresh copy of the default catalog
///
/// Prefer `get_default_catalog()` outside of tests.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn exercise(
    id: &str,
    name: &str,
    primary_muscle: MuscleGroup,
    secondary_muscles: &[MuscleGroup],
    equipment: EquipmentType,
    difficulty: DifficultyLevel,
    instructions: &str,
) -> ExerciseDefinition {
    ExerciseDefinition {
        id: id.into(),
        name: name.into(),
        primary_muscle,
        secondary_muscles: secondary_muscles.to_vec(),
        equipment,
        difficulty,
        instructions: Some(instructions.into()),
        is_custom: false,
    }
}

fn planned(
    exercise_id: &str,
    exercise_name: &str,
    sets: u32,
    reps: u32,
    rest_time: u32,
    notes: Option<&str>,
) -> PlannedExercise {
    PlannedExercise {
        exercise_id: exercise_id.into(),
        exercise_name: exercise_name.into(),
        sets,
        reps,
        rest_time,
        notes: notes.map(Into::into),
    }
}

fn program(
    id: &str,
    name: &str,
    description: &str,
    target_muscles: &[MuscleGroup],
    exercises: Vec<PlannedExercise>,
) -> WorkoutTemplate {
    WorkoutTemplate {
        id: id.into(),
        name: name.into(),
        description: Some(description.into()),
        target_muscles: target_muscles.to_vec(),
        exercises,
        is_pre_defined: true,
    }
}

fn build_default_catalog_internal() -> Catalog {
    use DifficultyLevel::*;
    use EquipmentType::*;
    use MuscleGroup::*;

    // ========================================================================
    // Exercises
    // ========================================================================

    let exercises = vec![
        exercise(
            "ex_bench_press",
            "Barbell Bench Press",
            Chest,
            &[Triceps, Shoulders],
            Barbell,
            Intermediate,
            "Lower the bar to mid-chest, press back up to lockout.",
        ),
        exercise(
            "ex_incline_bench",
            "Incline Dumbbell Press",
            Chest,
            &[Shoulders, Triceps],
            Dumbbell,
            Intermediate,
            "Press dumbbells from upper chest on a 30-45 degree bench.",
        ),
        exercise(
            "ex_ohp",
            "Overhead Press",
            Shoulders,
            &[Triceps, Traps],
            Barbell,
            Intermediate,
            "Press the bar from the front rack to overhead, squeezing the glutes.",
        ),
        exercise(
            "ex_lateral_raise",
            "Lateral Raises",
            Shoulders,
            &[Traps],
            Dumbbell,
            Beginner,
            "Raise dumbbells out to the side until arms are parallel to the floor.",
        ),
        exercise(
            "ex_tricep_pushdown",
            "Tricep Pushdown",
            Triceps,
            &[],
            Cable,
            Beginner,
            "Keep elbows pinned and extend the rope or bar down to full lockout.",
        ),
        exercise(
            "ex_skull_crusher",
            "Skull Crushers",
            Triceps,
            &[],
            Barbell,
            Intermediate,
            "Lower an EZ bar toward the forehead and extend back up.",
        ),
        exercise(
            "ex_tricep_dips",
            "Tricep Dips",
            Triceps,
            &[Chest, Shoulders],
            Bodyweight,
            Intermediate,
            "Stay upright and lower until elbows reach 90 degrees.",
        ),
        exercise(
            "ex_deadlift",
            "Barbell Deadlift",
            Back,
            &[Hamstrings, Glutes, Traps, Forearms],
            Barbell,
            Advanced,
            "Brace, push the floor away and lock out hips and knees together.",
        ),
        exercise(
            "ex_pullups",
            "Pull-ups",
            Lats,
            &[Biceps, Back],
            Bodyweight,
            Intermediate,
            "Pull from a dead hang until the chin clears the bar.",
        ),
        exercise(
            "ex_bent_row",
            "Barbell Bent-Over Row",
            Back,
            &[Lats, Biceps],
            Barbell,
            Intermediate,
            "Hinge to roughly 45 degrees and row the bar to the lower ribs.",
        ),
        exercise(
            "ex_db_row",
            "Dumbbell Row",
            Back,
            &[Lats, Biceps],
            Dumbbell,
            Beginner,
            "Support on a bench and row the dumbbell toward the hip.",
        ),
        exercise(
            "ex_lat_pulldown",
            "Lat Pulldown",
            Lats,
            &[Biceps],
            Cable,
            Beginner,
            "Pull the bar to the upper chest while keeping the torso still.",
        ),
        exercise(
            "ex_face_pull",
            "Face Pulls",
            Shoulders,
            &[Traps, Back],
            Cable,
            Beginner,
            "Pull the rope toward the face with elbows high, rotating outward.",
        ),
        exercise(
            "ex_barbell_curl",
            "Barbell Curl",
            Biceps,
            &[Forearms],
            Barbell,
            Beginner,
            "Curl the bar without swinging, lower under control.",
        ),
        exercise(
            "ex_hammer_curl",
            "Hammer Curls",
            Biceps,
            &[Forearms],
            Dumbbell,
            Beginner,
            "Curl with a neutral grip, thumbs pointing up.",
        ),
        exercise(
            "ex_squat",
            "Barbell Squat",
            Quads,
            &[Glutes, Hamstrings],
            Barbell,
            Intermediate,
            "Sit down between the heels to at least parallel and drive up.",
        ),
        exercise(
            "ex_leg_press",
            "Leg Press",
            Quads,
            &[Glutes],
            Machine,
            Beginner,
            "Lower the sled until knees reach 90 degrees, press without locking out.",
        ),
        exercise(
            "ex_lunges",
            "Lunges",
            Quads,
            &[Glutes, Hamstrings],
            Dumbbell,
            Beginner,
            "Step forward and lower the back knee toward the floor.",
        ),
        exercise(
            "ex_rdl",
            "Romanian Deadlift",
            Hamstrings,
            &[Glutes, Back],
            Barbell,
            Intermediate,
            "Push the hips back with soft knees until a hamstring stretch, then stand.",
        ),
        exercise(
            "ex_leg_curl",
            "Leg Curl",
            Hamstrings,
            &[Calves],
            Machine,
            Beginner,
            "Curl the pad toward the glutes and lower slowly.",
        ),
        exercise(
            "ex_calf_raise",
            "Calf Raises",
            Calves,
            &[],
            Machine,
            Beginner,
            "Rise onto the toes, pause at the top and stretch at the bottom.",
        ),
        exercise(
            "ex_plank",
            "Plank",
            Abs,
            &[Obliques, Shoulders],
            Bodyweight,
            Beginner,
            "Hold a straight line from head to heels on the forearms.",
        ),
    ];

    // ========================================================================
    // Programs
    // ========================================================================

    let programs = vec![
        // Push/Pull/Legs
        program(
            "program_ppl_push",
            "Push Day (PPL)",
            "Chest, Shoulders, and Triceps",
            &[Chest, Shoulders, Triceps],
            vec![
                planned("ex_bench_press", "Barbell Bench Press", 4, 8, 180, Some("Main compound")),
                planned("ex_incline_bench", "Incline Dumbbell Press", 4, 10, 120, None),
                planned("ex_ohp", "Overhead Press", 3, 8, 120, None),
                planned("ex_lateral_raise", "Lateral Raises", 3, 15, 60, None),
                planned("ex_tricep_pushdown", "Tricep Pushdown", 3, 12, 60, None),
                planned("ex_skull_crusher", "Skull Crushers", 3, 12, 60, None),
            ],
        ),
        program(
            "program_ppl_pull",
            "Pull Day (PPL)",
            "Back and Biceps",
            &[Back, Lats, Biceps, Traps],
            vec![
                planned("ex_deadlift", "Barbell Deadlift", 4, 6, 240, Some("Main compound")),
                planned("ex_pullups", "Pull-ups", 4, 10, 120, None),
                planned("ex_bent_row", "Barbell Bent-Over Row", 4, 8, 120, None),
                planned("ex_db_row", "Dumbbell Row", 3, 10, 90, None),
                planned("ex_face_pull", "Face Pulls", 3, 15, 60, None),
                planned("ex_barbell_curl", "Barbell Curl", 3, 12, 60, None),
                planned("ex_hammer_curl", "Hammer Curls", 3, 12, 60, None),
            ],
        ),
        program(
            "program_ppl_legs",
            "Leg Day (PPL)",
            "Quads, Hamstrings, Glutes, and Calves",
            &[Quads, Hamstrings, Glutes, Calves],
            vec![
                planned("ex_squat", "Barbell Squat", 4, 8, 180, Some("Main compound")),
                planned("ex_leg_press", "Leg Press", 4, 12, 120, None),
                planned("ex_lunges", "Lunges", 3, 12, 90, None),
                planned("ex_rdl", "Romanian Deadlift", 4, 10, 120, None),
                planned("ex_leg_curl", "Leg Curl", 3, 12, 60, None),
                planned("ex_calf_raise", "Calf Raises", 4, 15, 60, None),
            ],
        ),
        // Upper/Lower
        program(
            "program_ul_upper",
            "Upper Body (UL)",
            "Complete upper body workout",
            &[Chest, Back, Shoulders, Biceps, Triceps],
            vec![
                planned("ex_bench_press", "Barbell Bench Press", 4, 8, 180, None),
                planned("ex_bent_row", "Barbell Bent-Over Row", 4, 8, 180, None),
                planned("ex_ohp", "Overhead Press", 3, 10, 120, None),
                planned("ex_lat_pulldown", "Lat Pulldown", 3, 12, 90, None),
                planned("ex_barbell_curl", "Barbell Curl", 3, 12, 60, None),
                planned("ex_tricep_dips", "Tricep Dips", 3, 12, 60, None),
            ],
        ),
        program(
            "program_ul_lower",
            "Lower Body (UL)",
            "Complete lower body workout",
            &[Quads, Hamstrings, Glutes, Calves],
            vec![
                planned("ex_squat", "Barbell Squat", 5, 5, 240, None),
                planned("ex_rdl", "Romanian Deadlift", 4, 8, 180, None),
                planned("ex_leg_press", "Leg Press", 3, 12, 120, None),
                planned("ex_leg_curl", "Leg Curl", 3, 12, 90, None),
                planned("ex_lunges", "Lunges", 3, 10, 90, None),
                planned("ex_calf_raise", "Calf Raises", 4, 15, 60, None),
            ],
        ),
        // Full body
        program(
            "program_fullbody_a",
            "Full Body A",
            "Complete full body workout focusing on compounds",
            &[Chest, Back, Quads, Shoulders],
            vec![
                planned("ex_squat", "Barbell Squat", 4, 8, 180, None),
                planned("ex_bench_press", "Barbell Bench Press", 4, 8, 180, None),
                planned("ex_bent_row", "Barbell Bent-Over Row", 4, 8, 120, None),
                planned("ex_ohp", "Overhead Press", 3, 10, 120, None),
                planned("ex_plank", "Plank", 3, 60, 60, Some("Hold for 60 seconds")),
            ],
        ),
        program(
            "program_fullbody_b",
            "Full Body B",
            "Alternative full body workout",
            &[Back, Chest, Hamstrings, Shoulders],
            vec![
                planned("ex_deadlift", "Barbell Deadlift", 4, 6, 240, None),
                planned("ex_incline_bench", "Incline Dumbbell Press", 4, 10, 120, None),
                planned("ex_pullups", "Pull-ups", 4, 10, 120, None),
                planned("ex_lunges", "Lunges", 3, 12, 90, None),
                planned("ex_face_pull", "Face Pulls", 3, 15, 60, None),
            ],
        ),
        // Beginner
        program(
            "program_beginner",
            "Beginner Full Body",
            "Perfect for those new to lifting",
            &[FullBody],
            vec![
                planned("ex_squat", "Barbell Squat", 3, 10, 120, None),
                planned("ex_bench_press", "Barbell Bench Press", 3, 10, 120, None),
                planned("ex_lat_pulldown", "Lat Pulldown", 3, 10, 90, None),
                planned("ex_ohp", "Overhead Press", 3, 10, 90, None),
                planned("ex_plank", "Plank", 3, 30, 60, Some("Hold for 30 seconds")),
            ],
        ),
        // Arms
        program(
            "program_arms",
            "Arm Blaster",
            "Intense biceps and triceps workout",
            &[Biceps, Triceps, Forearms],
            vec![
                planned("ex_barbell_curl", "Barbell Curl", 4, 10, 90, None),
                planned("ex_tricep_dips", "Tricep Dips", 4, 12, 90, None),
                planned("ex_hammer_curl", "Hammer Curls", 3, 12, 60, None),
                planned("ex_skull_crusher", "Skull Crushers", 3, 12, 60, None),
                planned("ex_tricep_pushdown", "Tricep Pushdown", 3, 15, 45, None),
            ],
        ),
    ];

    Catalog {
        exercises,
        programs,
    }
}

impl Catalog {
    pub fn exercise_by_id(&self, id: &str) -> Option<&ExerciseDefinition> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn program_by_id(&self, id: &str) -> Option<&WorkoutTemplate> {
        self.programs.iter().find(|p| p.id == id)
    }

    /// Programs with any target muscle whose name contains `query`,
    /// compared case-insensitively
    pub fn programs_by_target_muscle(&self, query: &str) -> Vec<&WorkoutTemplate> {
        let query = query.to_lowercase();
        self.programs
            .iter()
            .filter(|p| {
                p.target_muscles
                    .iter()
                    .any(|m| m.as_str().to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for exercise in &self.exercises {
            if exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if !seen.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise ID '{}'", exercise.id));
            }
            if exercise.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", exercise.id));
            }
            if exercise.is_custom {
                errors.push(format!("Catalog exercise '{}' is flagged custom", exercise.id));
            }
        }

        let mut seen = HashSet::new();
        for program in &self.programs {
            if program.id.is_empty() {
                errors.push("Program has empty ID".to_string());
            }
            if !seen.insert(program.id.as_str()) {
                errors.push(format!("Duplicate program ID '{}'", program.id));
            }
            if program.name.is_empty() {
                errors.push(format!("Program '{}' has empty name", program.id));
            }
            if !program.is_pre_defined {
                errors.push(format!("Catalog program '{}' is not flagged predefined", program.id));
            }
            if program.exercises.is_empty() {
                errors.push(format!("Program '{}' has no exercises", program.id));
            }

            for planned in &program.exercises {
                match self.exercise_by_id(&planned.exercise_id) {
                    None => errors.push(format!(
                        "Program '{}' references non-existent exercise '{}'",
                        program.id, planned.exercise_id
                    )),
                    Some(def) if def.name != planned.exercise_name => errors.push(format!(
                        "Program '{}' names exercise '{}' as '{}', catalog says '{}'",
                        program.id, planned.exercise_id, planned.exercise_name, def.name
                    )),
                    Some(_) => {}
                }
                if planned.sets == 0 || planned.reps == 0 {
                    errors.push(format!(
                        "Program '{}': exercise '{}' has zero sets or reps",
                        program.id, planned.exercise_id
                    ));
                }
            }
        }

        errors
    }
}
