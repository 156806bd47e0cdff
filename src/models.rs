//! Persisted entities shared by the backends and the workout log store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One logged set - the unit of user input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub set_number: u32,
    pub reps: u32,
    pub weight: f64,
    pub rpe: Option<u8>,
    pub completed: bool,
}

impl ExerciseSet {
    pub fn new(set_number: u32, weight: f64, reps: u32, rpe: Option<u8>) -> Self {
        Self {
            set_number,
            reps,
            weight,
            rpe,
            completed: true,
        }
    }

    /// Volume load (weight x reps)
    pub fn volume(&self) -> f64 {
        self.weight * self.reps as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub current_week: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(id: &str, full_name: Option<String>, email: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            full_name,
            email,
            current_week: 1,
            created_at: Some(Utc::now()),
        }
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("athlete")
    }
}

/// `workout_logs` row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLog {
    pub id: String,
    pub user_id: String,
    pub workout_day_id: u32,
    pub week_number: u32,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Insert payload; `completed_at` starts as the first-save time and is
/// overwritten when the workout is finished
#[derive(Debug, Clone, Serialize)]
pub struct NewWorkoutLog {
    pub user_id: String,
    pub workout_day_id: u32,
    pub week_number: u32,
    pub completed_at: DateTime<Utc>,
}

/// `exercise_logs` row - one per set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLogRow {
    pub id: String,
    pub workout_log_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub set_number: u32,
    pub reps: u32,
    #[serde(deserialize_with = "flexible_f64")]
    pub weight: f64,
    pub rpe: Option<u8>,
    pub completed: bool,
}

impl ExerciseLogRow {
    pub fn to_set(&self) -> ExerciseSet {
        ExerciseSet {
            set_number: self.set_number,
            reps: self.reps,
            weight: self.weight,
            rpe: self.rpe,
            completed: self.completed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewExerciseLog {
    pub workout_log_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub set_number: u32,
    pub reps: u32,
    pub weight: f64,
    pub rpe: Option<u8>,
    pub completed: bool,
}

/// Columns rewritten when an existing set is saved again
#[derive(Debug, Clone, Serialize)]
pub struct SetUpdate {
    pub reps: u32,
    pub weight: f64,
    pub rpe: Option<u8>,
    pub completed: bool,
}

impl From<&ExerciseSet> for SetUpdate {
    fn from(set: &ExerciseSet) -> Self {
        Self {
            reps: set.reps,
            weight: set.weight,
            rpe: set.rpe,
            completed: set.completed,
        }
    }
}

/// `personal_records` row, unique per (user_id, exercise_id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    #[serde(deserialize_with = "flexible_f64")]
    pub weight: f64,
    pub reps: u32,
    pub achieved_at: DateTime<Utc>,
}

/// Numeric columns come back either as JSON numbers or as strings
fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(f64),
        Str(String),
    }

    match NumOrString::deserialize(deserializer)? {
        NumOrString::Num(n) => Ok(n),
        NumOrString::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_log_weight_as_string() {
        let json = r#"{
            "id": "a", "workout_log_id": "w", "exercise_id": "dips",
            "exercise_name": "Dips", "set_number": 1, "reps": 8,
            "weight": "22.5", "rpe": 7, "completed": true
        }"#;
        let row: ExerciseLogRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.weight, 22.5);
        assert_eq!(row.to_set().reps, 8);
    }

    #[test]
    fn test_personal_record_weight_as_number() {
        let json = r#"{
            "id": "pr", "user_id": "u", "exercise_id": "deadlifts",
            "exercise_name": "Deadlifts", "weight": 180, "reps": 5,
            "achieved_at": "2026-01-05T10:00:00Z"
        }"#;
        let pr: PersonalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(pr.weight, 180.0);
    }

    #[test]
    fn test_record_without_id_skips_field() {
        let pr = PersonalRecord {
            id: None,
            user_id: "u".into(),
            exercise_id: "dips".into(),
            exercise_name: "Dips".into(),
            weight: 10.0,
            reps: 8,
            achieved_at: Utc::now(),
        };
        let value = serde_json::to_value(&pr).unwrap();
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_profile_display_name() {
        let mut profile = Profile::new("u", None, Some("a@b.co".into()));
        assert_eq!(profile.display_name(), "a@b.co");
        profile.full_name = Some("Jane Doe".into());
        assert_eq!(profile.display_name(), "Jane Doe");
    }
}
