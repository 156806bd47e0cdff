//! Backend module - auth and table storage behind one trait
//!
//! Two implementations:
//! - [`SupabaseBackend`] talks to a hosted backend-as-a-service over REST
//! - [`SqliteBackend`] keeps the same tables in a local SQLite file

pub mod query;
pub mod sqlite;
pub mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    AuthSession, AuthUser, ExerciseLogRow, NewExerciseLog, NewWorkoutLog, PersonalRecord, Profile,
    SetUpdate, WorkoutLog,
};

pub use query::{Order, Query};
pub use sqlite::SqliteBackend;
pub use supabase::SupabaseBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid payload: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("database connection lock poisoned")]
    Poisoned,
}

/// Auth plus the table operations the app issues against
/// `profiles`, `workout_logs`, `exercise_logs` and `personal_records`
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short label for logs and the UI header
    fn name(&self) -> &'static str;

    // ---- auth ----

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthUser, BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    // ---- profiles ----

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, BackendError>;

    async fn update_current_week(&self, user_id: &str, week: u32) -> Result<(), BackendError>;

    // ---- workout_logs ----

    /// Log for exactly this (user, day, week), if one was started
    async fn find_workout_log(
        &self,
        user_id: &str,
        workout_day_id: u32,
        week_number: u32,
    ) -> Result<Option<WorkoutLog>, BackendError>;

    /// Most recent log of the same day from an earlier week
    async fn previous_workout_log(
        &self,
        user_id: &str,
        workout_day_id: u32,
        before_week: u32,
    ) -> Result<Option<WorkoutLog>, BackendError>;

    async fn insert_workout_log(&self, log: &NewWorkoutLog) -> Result<WorkoutLog, BackendError>;

    async fn complete_workout_log(
        &self,
        id: &str,
        notes: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Result<(), BackendError>;

    /// All logs of a user ordered by completion time, oldest first
    async fn list_workout_logs(&self, user_id: &str) -> Result<Vec<WorkoutLog>, BackendError>;

    // ---- exercise_logs ----

    /// Rows of one workout log ordered by exercise id, then set number
    async fn exercise_logs(&self, workout_log_id: &str) -> Result<Vec<ExerciseLogRow>, BackendError>;

    /// Row id for the natural key (workout log, exercise, set number)
    async fn find_exercise_set(
        &self,
        workout_log_id: &str,
        exercise_id: &str,
        set_number: u32,
    ) -> Result<Option<String>, BackendError>;

    async fn insert_exercise_set(&self, row: &NewExerciseLog) -> Result<(), BackendError>;

    async fn update_exercise_set(&self, id: &str, update: &SetUpdate) -> Result<(), BackendError>;

    // ---- personal_records ----

    async fn personal_records(&self, user_id: &str) -> Result<Vec<PersonalRecord>, BackendError>;

    /// Insert or overwrite on the (user_id, exercise_id) key
    async fn upsert_personal_record(
        &self,
        record: &PersonalRecord,
    ) -> Result<PersonalRecord, BackendError>;
}
