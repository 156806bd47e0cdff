//! Weekly progression rules for the 8-week program

use serde::{Deserialize, Serialize};

use super::{Exercise, ExerciseType, ProgramError, WorkoutDay};

pub const PROGRAM_WEEKS: u32 = 8;

/// Percentage load increase per week
pub const WEEKLY_LOAD_INCREASE: f64 = 2.5;
/// Max volume increase per week, percent
pub const VOLUME_LANDMARK: f64 = 15.0;
pub const DELOAD_VOLUME_REDUCTION: f64 = 50.0;
pub const DELOAD_INTENSITY_REDUCTION: f64 = 30.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrainingPhase {
    AnatomicalAdaptation,
    HypertrophyFocus,
    StrengthAndPower,
    Deload,
    PeakPerformance,
}

impl TrainingPhase {
    pub fn name(&self) -> &'static str {
        match self {
            TrainingPhase::AnatomicalAdaptation => "Anatomical Adaptation",
            TrainingPhase::HypertrophyFocus => "Hypertrophy Focus",
            TrainingPhase::StrengthAndPower => "Strength & Power",
            TrainingPhase::Deload => "Deload",
            TrainingPhase::PeakPerformance => "Peak Performance",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeeklyProgression {
    pub week_number: u32,
    pub phase: TrainingPhase,
    /// Multiplier for sets (1.0 = baseline)
    pub volume_multiplier: f64,
    /// Target percentage of 1RM
    pub intensity_target: u32,
    pub rpe_range: (u8, u8),
    pub rest_multiplier: f64,
    pub description: &'static str,
    pub goals: &'static [&'static str],
}

impl WeeklyProgression {
    pub fn primary_goal(&self) -> &'static str {
        self.goals.first().copied().unwrap_or_default()
    }
}

pub const WEEKLY_PROGRESSIONS: &[WeeklyProgression] = &[
    WeeklyProgression {
        week_number: 1,
        phase: TrainingPhase::AnatomicalAdaptation,
        volume_multiplier: 1.0,
        intensity_target: 65,
        rpe_range: (6, 7),
        rest_multiplier: 1.2,
        description: "Build work capacity and perfect form",
        goals: &[
            "Master movement patterns",
            "Prepare connective tissue",
            "Build training base",
            "Focus on technique over weight",
        ],
    },
    WeeklyProgression {
        week_number: 2,
        phase: TrainingPhase::AnatomicalAdaptation,
        volume_multiplier: 1.1,
        intensity_target: 70,
        rpe_range: (6, 7),
        rest_multiplier: 1.15,
        description: "Continue building capacity with slight volume increase",
        goals: &[
            "Refine technique",
            "Increase work capacity",
            "Prepare for hypertrophy phase",
            "Build movement confidence",
        ],
    },
    WeeklyProgression {
        week_number: 3,
        phase: TrainingPhase::HypertrophyFocus,
        volume_multiplier: 1.25,
        intensity_target: 75,
        rpe_range: (7, 8),
        rest_multiplier: 0.9,
        description: "Maximum volume for muscle growth",
        goals: &[
            "Maximize time under tension",
            "Create muscle damage for growth",
            "Increase training volume",
            "Build muscle mass",
        ],
    },
    WeeklyProgression {
        week_number: 4,
        phase: TrainingPhase::HypertrophyFocus,
        volume_multiplier: 1.3,
        intensity_target: 78,
        rpe_range: (7, 8),
        rest_multiplier: 0.85,
        description: "Peak hypertrophy volume",
        goals: &[
            "Push volume to maximum recoverable",
            "Maintain intensity",
            "Maximize metabolic stress",
            "Peak muscle building stimulus",
        ],
    },
    WeeklyProgression {
        week_number: 5,
        phase: TrainingPhase::StrengthAndPower,
        volume_multiplier: 1.0,
        intensity_target: 85,
        rpe_range: (8, 9),
        rest_multiplier: 1.3,
        description: "Build maximum strength with heavy loads",
        goals: &[
            "Increase maximum strength",
            "Develop explosive power",
            "Lift heavier weights",
            "Improve neural adaptations",
        ],
    },
    WeeklyProgression {
        week_number: 6,
        phase: TrainingPhase::StrengthAndPower,
        volume_multiplier: 0.95,
        intensity_target: 88,
        rpe_range: (8, 9),
        rest_multiplier: 1.4,
        description: "Peak strength development",
        goals: &[
            "Maximize strength gains",
            "Perfect explosive technique",
            "Prepare for deload",
            "Test new strength levels",
        ],
    },
    WeeklyProgression {
        week_number: 7,
        phase: TrainingPhase::Deload,
        volume_multiplier: 0.5,
        intensity_target: 65,
        rpe_range: (6, 7),
        rest_multiplier: 1.2,
        description: "Active recovery and supercompensation",
        goals: &[
            "Allow full recovery",
            "Prevent overtraining",
            "Refine technique",
            "Prepare for peak week",
        ],
    },
    WeeklyProgression {
        week_number: 8,
        phase: TrainingPhase::PeakPerformance,
        volume_multiplier: 0.85,
        intensity_target: 92,
        rpe_range: (9, 10),
        rest_multiplier: 1.5,
        description: "Demonstrate maximum capabilities",
        goals: &[
            "Set personal records",
            "Test maximum strength",
            "Showcase all improvements",
            "Peak performance output",
        ],
    },
];

pub fn get_week_progression(week_number: u32) -> Result<&'static WeeklyProgression, ProgramError> {
    WEEKLY_PROGRESSIONS
        .iter()
        .find(|p| p.week_number == week_number)
        .ok_or(ProgramError::UnknownWeek(week_number))
}

/// Base sets scaled by the week's volume multiplier, never below one set
pub fn calculate_adjusted_sets(base_sets: u32, week_number: u32) -> Result<u32, ProgramError> {
    let progression = get_week_progression(week_number)?;
    let scaled = (base_sets as f64 * progression.volume_multiplier).round() as u32;
    Ok(scaled.max(1))
}

pub fn calculate_adjusted_rest(base_rest_secs: u32, week_number: u32) -> Result<u32, ProgramError> {
    let progression = get_week_progression(week_number)?;
    Ok((base_rest_secs as f64 * progression.rest_multiplier).round() as u32)
}

pub fn format_rest_time(seconds: u32) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    let minutes = seconds / 60;
    let remaining = seconds % 60;
    if remaining > 0 {
        format!("{}min {}s", minutes, remaining)
    } else {
        format!("{}min", minutes)
    }
}

/// Parse rest strings like "3 min", "90s", "1min 30s"
pub fn parse_rest_secs(rest: &str) -> Option<u32> {
    let mut total = 0u32;
    let mut number = String::new();
    let mut seen_any = false;
    let mut chars = rest.trim().chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        if c.is_whitespace() {
            continue;
        }
        let mut unit = String::from(c);
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphabetic() {
                unit.push(next);
                chars.next();
            } else {
                break;
            }
        }
        let value: u32 = number.parse().ok()?;
        number.clear();
        let secs = match unit.to_lowercase().as_str() {
            "m" | "min" | "mins" | "minute" | "minutes" => value.checked_mul(60)?,
            "s" | "sec" | "secs" | "second" | "seconds" => value,
            _ => return None,
        };
        total = total.checked_add(secs)?;
        seen_any = true;
    }

    if !number.is_empty() {
        // Bare number means seconds
        total = total.checked_add(number.parse::<u32>().ok()?)?;
        seen_any = true;
    }

    seen_any.then_some(total)
}

/// Exercise with the week's progression applied
#[derive(Debug, Clone, Serialize)]
pub struct AdjustedExercise {
    pub id: String,
    pub name: String,
    pub kind: ExerciseType,
    pub sets: u32,
    pub base_sets: u32,
    pub reps: String,
    pub rest: String,
    /// Rest scaled by the week's rest multiplier, when the rest string parses
    pub adjusted_rest: Option<String>,
    pub notes: Option<String>,
    pub video_id: Option<String>,
}

impl AdjustedExercise {
    pub fn target_reps_for_set(&self, set_number: u32) -> Option<u32> {
        super::target_reps_for_set(&self.reps, set_number)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustedWorkout {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub focus: String,
    pub duration: String,
    pub week_number: u32,
    pub phase: TrainingPhase,
    pub exercises: Vec<AdjustedExercise>,
}

impl AdjustedWorkout {
    pub fn exercise(&self, id: &str) -> Option<&AdjustedExercise> {
        self.exercises.iter().find(|e| e.id == id)
    }
}

fn adjust_exercise(
    exercise: &Exercise,
    progression: &WeeklyProgression,
) -> AdjustedExercise {
    let sets = ((exercise.sets as f64 * progression.volume_multiplier).round() as u32).max(1);
    let focus = format!("Phase Focus: {}", progression.primary_goal());
    let notes = match exercise.notes {
        Some(notes) => format!("{} • {}", notes, focus),
        None => focus,
    };
    let adjusted_rest = parse_rest_secs(exercise.rest).map(|secs| {
        format_rest_time((secs as f64 * progression.rest_multiplier).round() as u32)
    });

    AdjustedExercise {
        id: exercise.id.to_string(),
        name: exercise.name.to_string(),
        kind: exercise.kind,
        sets,
        base_sets: exercise.sets,
        reps: exercise.reps.to_string(),
        rest: exercise.rest.to_string(),
        adjusted_rest,
        notes: Some(notes),
        video_id: exercise.video_id.map(str::to_string),
    }
}

/// Derive the workout for a given week: scaled sets, annotated notes and description
pub fn adjust_workout(workout: &WorkoutDay, week_number: u32) -> Result<AdjustedWorkout, ProgramError> {
    let progression = get_week_progression(week_number)?;

    Ok(AdjustedWorkout {
        id: workout.id,
        name: workout.name.to_string(),
        description: format!(
            "{} | {} Phase (Week {})",
            workout.description,
            progression.phase.name(),
            week_number
        ),
        focus: workout.focus.to_string(),
        duration: workout.duration.to_string(),
        week_number,
        phase: progression.phase,
        exercises: workout
            .exercises
            .iter()
            .map(|e| adjust_exercise(e, progression))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::find_workout;

    #[test]
    fn test_every_week_resolves() {
        for week in 1..=PROGRAM_WEEKS {
            assert_eq!(get_week_progression(week).unwrap().week_number, week);
        }
    }

    #[test]
    fn test_week_out_of_range_fails() {
        assert_eq!(get_week_progression(0).unwrap_err(), ProgramError::UnknownWeek(0));
        assert_eq!(get_week_progression(9).unwrap_err(), ProgramError::UnknownWeek(9));
    }

    #[test]
    fn test_adjusted_sets_hypertrophy_peak() {
        // 3 * 1.3 = 3.9 -> 4
        assert_eq!(calculate_adjusted_sets(3, 4).unwrap(), 4);
    }

    #[test]
    fn test_adjusted_sets_deload_floor() {
        // 1 * 0.5 = 0.5 rounds to 1 anyway, 0 base would give 0 -> floored to 1
        assert_eq!(calculate_adjusted_sets(1, 7).unwrap(), 1);
        assert_eq!(calculate_adjusted_sets(0, 7).unwrap(), 1);
        assert_eq!(calculate_adjusted_sets(4, 7).unwrap(), 2);
    }

    #[test]
    fn test_adjusted_sets_invalid_week() {
        assert!(calculate_adjusted_sets(3, 12).is_err());
    }

    #[test]
    fn test_adjusted_rest() {
        // 180s * 1.5 = 270s
        assert_eq!(calculate_adjusted_rest(180, 8).unwrap(), 270);
        assert_eq!(calculate_adjusted_rest(120, 4).unwrap(), 102);
    }

    #[test]
    fn test_format_rest_time() {
        assert_eq!(format_rest_time(45), "45s");
        assert_eq!(format_rest_time(180), "3min");
        assert_eq!(format_rest_time(270), "4min 30s");
    }

    #[test]
    fn test_parse_rest_secs() {
        assert_eq!(parse_rest_secs("3 min"), Some(180));
        assert_eq!(parse_rest_secs("90s"), Some(90));
        assert_eq!(parse_rest_secs("1min 30s"), Some(90));
        assert_eq!(parse_rest_secs("45"), Some(45));
        assert_eq!(parse_rest_secs("a while"), None);
        assert_eq!(parse_rest_secs(""), None);
    }

    #[test]
    fn test_parse_rest_secs_overflow() {
        assert_eq!(parse_rest_secs("99999999 min"), None);
        assert_eq!(parse_rest_secs("4294967295s 1s"), None);
        assert_eq!(parse_rest_secs("99999999999"), None);
        assert_eq!(parse_rest_secs("71582788 min"), Some(71_582_788 * 60));
    }

    #[test]
    fn test_adjust_workout_week_4() {
        let day = find_workout(1).unwrap();
        let adjusted = adjust_workout(day, 4).unwrap();

        assert_eq!(adjusted.exercises.len(), day.exercises.len());
        // 3 sets -> 4, 4 sets -> round(5.2) = 5
        assert_eq!(adjusted.exercise("dips").unwrap().sets, 4);
        assert_eq!(adjusted.exercise("barbell-skull-crushers").unwrap().sets, 5);
        assert!(adjusted
            .description
            .ends_with("| Hypertrophy Focus Phase (Week 4)"));
    }

    #[test]
    fn test_adjust_workout_annotates_notes() {
        let day = find_workout(2).unwrap();
        let adjusted = adjust_workout(day, 1).unwrap();
        let squat = adjusted.exercise("high-bar-back-squats").unwrap();
        assert_eq!(
            squat.notes.as_deref(),
            Some("Heavy compound - go to parallel or below, keep chest up • Phase Focus: Master movement patterns")
        );
        assert_eq!(squat.adjusted_rest.as_deref(), Some("3min 36s"));
    }

    #[test]
    fn test_adjust_workout_does_not_touch_base() {
        let day = find_workout(5).unwrap();
        let _ = adjust_workout(day, 3).unwrap();
        assert_eq!(day.exercises[0].sets, 3);
    }

    #[test]
    fn test_adjust_workout_invalid_week() {
        let day = find_workout(1).unwrap();
        assert_eq!(adjust_workout(day, 0).unwrap_err(), ProgramError::UnknownWeek(0));
    }
}
