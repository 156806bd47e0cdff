//! Program definitions - the 5-day training split and its 8-week progression

pub mod progression;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use progression::{
    adjust_workout, calculate_adjusted_rest, calculate_adjusted_sets, format_rest_time,
    get_week_progression, parse_rest_secs, AdjustedExercise, AdjustedWorkout, TrainingPhase,
    WeeklyProgression, PROGRAM_WEEKS, WEEKLY_PROGRESSIONS,
};

#[derive(Debug, Error, PartialEq)]
pub enum ProgramError {
    #[error("No progression data found for week {0}")]
    UnknownWeek(u32),
    #[error("No workout day with id {0}")]
    UnknownWorkout(u32),
    #[error("Workout day {day} has no exercise '{exercise}'")]
    UnknownExercise { day: u32, exercise: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Calisthenics,
    Bodybuilding,
}

impl ExerciseType {
    pub fn label(&self) -> &'static str {
        match self {
            ExerciseType::Calisthenics => "Calisthenics",
            ExerciseType::Bodybuilding => "Bodybuilding",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ExerciseType::Calisthenics => "🤸",
            ExerciseType::Bodybuilding => "🏋️",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone)]
pub struct Exercise {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: ExerciseType,
    pub sets: u32,
    /// Target reps, either a single value ("8") or one per set ("8, 10, 12, 14")
    pub reps: &'static str,
    pub rest: &'static str,
    pub notes: Option<&'static str>,
    pub video_id: Option<&'static str>,
}

impl Exercise {
    /// Target reps for a given set, when the scheme can be read as numbers
    pub fn target_reps_for_set(&self, set_number: u32) -> Option<u32> {
        target_reps_for_set(self.reps, set_number)
    }

    pub fn video_url(&self) -> Option<String> {
        self.video_id
            .map(|id| format!("https://www.youtube.com/watch?v={}", id))
    }
}

#[derive(Debug, Clone)]
pub struct WorkoutDay {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub focus: &'static str,
    pub difficulty: Difficulty,
    pub duration: &'static str,
    pub exercises: &'static [Exercise],
    pub color: &'static str,
    pub icon: &'static str,
}

/// Reads "8" or "8, 10, 12, 14"; sets past the end of a list reuse its last target
pub fn target_reps_for_set(reps: &str, set_number: u32) -> Option<u32> {
    let targets: Vec<u32> = reps
        .split(',')
        .filter_map(|r| r.trim().parse().ok())
        .collect();
    let last = targets.len().checked_sub(1)?;
    let idx = (set_number.max(1) as usize - 1).min(last);
    targets.get(idx).copied()
}

impl WorkoutDay {
    pub fn find_exercise(&self, id: &str) -> Result<&'static Exercise, ProgramError> {
        self.exercises
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| ProgramError::UnknownExercise {
                day: self.id,
                exercise: id.to_string(),
            })
    }
}

const fn ex(
    id: &'static str,
    name: &'static str,
    kind: ExerciseType,
    sets: u32,
    reps: &'static str,
    rest: &'static str,
    notes: &'static str,
    video_id: &'static str,
) -> Exercise {
    Exercise {
        id,
        name,
        kind,
        sets,
        reps,
        rest,
        notes: Some(notes),
        video_id: Some(video_id),
    }
}

use ExerciseType::{Bodybuilding as B, Calisthenics as C};

const UPPER_BODY_1: &[Exercise] = &[
    ex("incline-barbell-bench-smith", "Incline Barbell Bench Press (Smith Machine)", B, 3, "8", "3 min",
        "Compound movement - focus on controlled tempo and full range of motion", "RwrLrp8dFcc"),
    ex("dips", "Dips", C, 3, "6", "3 min",
        "Lean forward for chest emphasis, keep elbows at 45 degrees", "Oi7npYL8vPE"),
    ex("standing-db-lateral-raises", "Standing Dumbbell Lateral Raises", B, 3, "12", "2 min",
        "Isolation - keep slight bend in elbows, raise to shoulder height", "0pdGWALsOMs"),
    ex("pike-push-ups", "Pike Push Ups", C, 3, "14", "2 min",
        "Shoulder focus - keep hips high, head between arms", "XckEEwa1BPI"),
    ex("wide-grip-lat-pulldowns", "Wide Grip Lat Pulldowns", B, 3, "10", "3 min",
        "Pull to upper chest, squeeze shoulder blades together", "JqeZH7zC-Co"),
    ex("barbell-bent-over-rows", "Barbell Bent Over Rows", B, 3, "10", "3 min",
        "Compound - maintain flat back, pull to lower chest", "6c5hogTEDGk"),
    ex("straight-bar-bicep-curls", "Straight Bar Bicep Curls", B, 3, "10", "2 min",
        "Keep elbows stationary, full range of motion", "YVVGdQCM9Ss"),
    ex("barbell-skull-crushers", "Barbell Skull Crushers", B, 4, "14", "2 min",
        "Isolation - lower to forehead, keep elbows tucked", "k0kV5dmMuFw"),
];

const LOWER_BODY_1: &[Exercise] = &[
    ex("high-bar-back-squats", "High Bar Back Squats", B, 3, "5", "3 min",
        "Heavy compound - go to parallel or below, keep chest up", "NqK95Xz1XLo"),
    ex("front-squats-smith", "Front Squats (Smith Machine)", B, 3, "10", "3 min",
        "Quad emphasis - keep torso upright, elbows high", "MXm6PuRB3mk"),
    ex("leg-press", "Leg Press", B, 3, "12", "3 min",
        "Full range of motion, feet shoulder-width apart", "L_bJce83XBQ"),
    ex("dumbbell-lunges", "Dumbbell Lunges", B, 3, "12", "2 min",
        "Per leg - step forward, knee at 90 degrees", "wq1blpqrEFY"),
    ex("prone-leg-curls", "Prone Leg Curls", B, 3, "14", "2 min",
        "Isolation - squeeze at top, control the negative", "fF3iCzliY1E"),
    ex("dumbbell-rdl", "Dumbbell Romanian Deadlifts", B, 3, "10", "3 min",
        "Hamstring focus - slight knee bend, push hips back", "7bWERGtRquU"),
    ex("calf-raises-in", "Machine Standing Calf Raises (Toes In)", B, 4, "8, 10, 12, 14", "2 min",
        "Progressive reps - full stretch and contraction", "BCoTk_ZHsCA"),
    ex("calf-raises-out", "Machine Standing Calf Raises (Toes Out)", B, 4, "8, 10, 12, 14", "2 min",
        "Progressive reps - targets different calf muscles", "uyP4VIxrYKY"),
];

const UPPER_BODY_2: &[Exercise] = &[
    ex("flat-barbell-bench", "Flat Barbell Bench Press", B, 3, "8", "3 min",
        "Compound - retract shoulder blades, bar to mid-chest", "F85dAlCEra0"),
    ex("pull-ups", "Pull Ups", C, 3, "6", "3 min",
        "Full range - dead hang to chin over bar", "sWuxGz5O-QE"),
    ex("reverse-grip-bent-rows", "Reverse Grip Bent Over Rows", B, 3, "10", "3 min",
        "Underhand grip - targets lower lats and biceps", "heIL-Gq0L1Y"),
    ex("seated-lateral-raises", "Seated Lateral Raises", B, 3, "14", "2 min",
        "Isolation - prevents momentum, strict form", "qNJP_MefuHc"),
    ex("db-rear-delt-kickbacks", "Dumbbell Rear Delt Kickbacks", B, 3, "14", "2 min",
        "Bend forward, raise arms back and out", "Tg6OkUP2VoM"),
    ex("chin-ups", "Chin Ups", C, 3, "10", "3 min",
        "Underhand grip - bicep and back emphasis", "uxG_NTtiR1E"),
    ex("overhead-cable-triceps", "Overhead Cable Triceps Extensions", B, 4, "12", "2 min",
        "Keep elbows close to head, full extension", "BYKk7QvAXXE"),
    ex("diamond-push-ups", "Diamond Push Ups", C, 4, "14", "2 min",
        "Hands form diamond shape - tricep emphasis", "Scvl5pKtY_4"),
];

const LOWER_BODY_2: &[Exercise] = &[
    ex("front-squats-smith-day4", "Front Squats (Smith Machine)", B, 3, "6", "3 min",
        "Heavy - maintain upright torso, core tight", "MXm6PuRB3mk"),
    ex("machine-leg-extensions", "Machine Leg Extensions", B, 3, "10", "2 min",
        "Quad isolation - squeeze at top, control descent", "O5NyZqgUwm8"),
    ex("jump-squats", "Jump Squats", C, 3, "12", "3 min",
        "Explosive power - land softly, full squat depth", "WL6IYVxUoT0"),
    ex("deadlifts", "Deadlifts", B, 3, "14", "3 min",
        "King of compounds - neutral spine, drive through heels", "3P8iTOXwqXU"),
    ex("prone-leg-curls-day4", "Prone Leg Curls", B, 3, "14", "2 min",
        "Hamstring isolation - full contraction", "fF3iCzliY1E"),
    ex("calf-raises-in-day4", "Machine Standing Calf Raises (Toes In)", B, 4, "8, 10, 12, 14", "2 min",
        "Progressive reps - pause at top", "BCoTk_ZHsCA"),
    ex("calf-raises-out-day4", "Machine Standing Calf Raises (Toes Out)", B, 4, "8, 10, 12, 14", "2 min",
        "Progressive reps - full range of motion", "uyP4VIxrYKY"),
    ex("adductor-machine", "Adductor Machine", B, 3, "12", "2 min",
        "Inner thigh - controlled movement, squeeze", "e9AqTFMmP18"),
];

const UPPER_BODY_3: &[Exercise] = &[
    ex("incline-db-bench", "Incline Dumbbell Bench Press", B, 3, "6", "3 min",
        "Upper chest focus - 30-45 degree incline", "d23M3gmkVPc"),
    ex("push-ups", "Push Ups", C, 3, "10", "2 min",
        "Bodyweight - chest to ground, full extension", "KbB4foryo0k"),
    ex("pull-ups-day5", "Pull Ups", C, 3, "6", "3 min",
        "Overhand grip - full range of motion", "sWuxGz5O-QE"),
    ex("neutral-grip-pull-ups", "Neutral Grip Pull Ups", C, 3, "14", "3 min",
        "Palms facing - targets brachialis and forearms", "cd_38C6LuvY"),
    ex("standing-db-lateral-raises-day5", "Standing Dumbbell Lateral Raises", B, 3, "14", "2 min",
        "Shoulder isolation - controlled tempo", "0pdGWALsOMs"),
    ex("wide-grip-ez-curls", "Wide Grip EZ Bar Curls", B, 3, "10", "2 min",
        "Bicep focus - no swinging, strict form", "CUZUV8rDP90"),
    ex("db-hammer-curls", "Dumbbell Hammer Curls", B, 3, "10", "2 min",
        "Neutral grip - targets brachialis", "6ZT1S3K9Bsg"),
    ex("overhead-cable-triceps-day5", "Overhead Cable Triceps Extensions", B, 3, "14", "2 min",
        "Long head emphasis - full stretch and contraction", "BYKk7QvAXXE"),
];

/// The 5-day training split
pub const WORKOUT_SPLIT: &[WorkoutDay] = &[
    WorkoutDay {
        id: 1,
        name: "Upper Body 1",
        description: "Upper body push focus with chest and triceps emphasis",
        focus: "Push",
        difficulty: Difficulty::Intermediate,
        duration: "75-90 min",
        exercises: UPPER_BODY_1,
        color: "blue",
        icon: "Dumbbell",
    },
    WorkoutDay {
        id: 2,
        name: "Lower Body 1",
        description: "Complete lower body development with quad, hamstring, and calf focus",
        focus: "Legs",
        difficulty: Difficulty::Advanced,
        duration: "80-95 min",
        exercises: LOWER_BODY_1,
        color: "orange",
        icon: "Activity",
    },
    WorkoutDay {
        id: 3,
        name: "Upper Body 2",
        description: "Shoulder development with core work",
        focus: "Shoulders",
        difficulty: Difficulty::Intermediate,
        duration: "70-85 min",
        exercises: UPPER_BODY_2,
        color: "purple",
        icon: "Zap",
    },
    WorkoutDay {
        id: 4,
        name: "Lower Body 2",
        description: "Lower body power and strength development",
        focus: "Legs",
        difficulty: Difficulty::Advanced,
        duration: "80-95 min",
        exercises: LOWER_BODY_2,
        color: "green",
        icon: "Flame",
    },
    WorkoutDay {
        id: 5,
        name: "Upper Body 3",
        description: "Intense arm training with superset protocol",
        focus: "Arms",
        difficulty: Difficulty::Intermediate,
        duration: "65-80 min",
        exercises: UPPER_BODY_3,
        color: "yellow",
        icon: "Target",
    },
];

pub fn get_workout_split() -> &'static [WorkoutDay] {
    WORKOUT_SPLIT
}

pub fn find_workout(id: u32) -> Result<&'static WorkoutDay, ProgramError> {
    WORKOUT_SPLIT
        .iter()
        .find(|w| w.id == id)
        .ok_or(ProgramError::UnknownWorkout(id))
}

/// Find exercise by id anywhere in the split
pub fn find_exercise(id: &str) -> Option<&'static Exercise> {
    WORKOUT_SPLIT
        .iter()
        .flat_map(|w| w.exercises.iter())
        .find(|e| e.id == id)
}
