use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hybrid_athlete::backend::{Backend, BackendError, SqliteBackend};
use hybrid_athlete::models::{
    AuthSession, AuthUser, ExerciseLogRow, ExerciseSet, NewExerciseLog, NewWorkoutLog,
    PersonalRecord, Profile, SetUpdate, WorkoutLog,
};
use hybrid_athlete::progress::volume_by_date;
use hybrid_athlete::workout_log::{LogError, SetProgress, WorkoutSession};

async fn setup() -> (Arc<SqliteBackend>, String) {
    let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
    let user = backend
        .sign_up("athlete@example.com", "s3cret-pass", "Test Athlete")
        .await
        .unwrap();
    (backend, user.id)
}

fn set(n: u32, weight: f64, reps: u32) -> ExerciseSet {
    ExerciseSet::new(n, weight, reps, None)
}

#[tokio::test]
async fn test_log_created_on_first_save() {
    let (backend, user_id) = setup().await;
    let mut session = WorkoutSession::load(backend.clone(), &user_id, 1, 1)
        .await
        .unwrap();
    assert!(session.log().is_none());
    assert!(backend.find_workout_log(&user_id, 1, 1).await.unwrap().is_none());

    session
        .save_exercise_batch("dips", "Weighted Dips", vec![set(1, 25.0, 8)])
        .await
        .unwrap();

    let stored = backend.find_workout_log(&user_id, 1, 1).await.unwrap().unwrap();
    assert_eq!(session.log().map(|l| l.id.clone()), Some(stored.id.clone()));
    assert!(stored.completed_at.is_some());

    // A second session for the same workout reuses the log
    let mut again = WorkoutSession::load(backend.clone(), &user_id, 1, 1)
        .await
        .unwrap();
    assert_eq!(again.sets("dips").len(), 1);
    again
        .save_exercise_batch("dips", "Weighted Dips", vec![set(2, 25.0, 7)])
        .await
        .unwrap();
    assert_eq!(backend.list_workout_logs(&user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_resaving_a_set_updates_one_row() {
    let (backend, user_id) = setup().await;
    let mut session = WorkoutSession::load(backend.clone(), &user_id, 1, 1)
        .await
        .unwrap();

    session
        .save_exercise_set("dips", "Weighted Dips", set(1, 20.0, 8))
        .await
        .unwrap();
    session
        .save_exercise_set("dips", "Weighted Dips", set(1, 25.0, 8))
        .await
        .unwrap();

    let log_id = session.log().unwrap().id.clone();
    let rows = backend.exercise_logs(&log_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].weight, 25.0);
    assert_eq!(session.saved_set("dips", 1).map(|s| s.weight), Some(25.0));
}

#[tokio::test]
async fn test_personal_record_sequence() {
    let (backend, user_id) = setup().await;
    let mut session = WorkoutSession::load(backend.clone(), &user_id, 1, 1)
        .await
        .unwrap();

    let first = session
        .save_exercise_batch("dips", "Weighted Dips", vec![set(1, 100.0, 5)])
        .await
        .unwrap();
    assert!(first.new_record.is_some());

    let second = session
        .save_exercise_batch("dips", "Weighted Dips", vec![set(2, 100.0, 6)])
        .await
        .unwrap();
    let pr = second.new_record.expect("more reps at the same weight is a record");
    assert_eq!((pr.weight, pr.reps), (100.0, 6));

    let third = session
        .save_exercise_batch("dips", "Weighted Dips", vec![set(3, 90.0, 10)])
        .await
        .unwrap();
    assert!(third.new_record.is_none());

    let records = backend.personal_records(&user_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!((records[0].weight, records[0].reps), (100.0, 6));
    assert_eq!(session.record("dips").map(|r| r.reps), Some(6));
}

#[tokio::test]
async fn test_previous_week_comparison() {
    let (backend, user_id) = setup().await;
    let mut week1 = WorkoutSession::load(backend.clone(), &user_id, 1, 1)
        .await
        .unwrap();
    week1
        .save_exercise_batch("dips", "Weighted Dips", vec![set(1, 100.0, 5), set(2, 100.0, 5)])
        .await
        .unwrap();

    let mut week2 = WorkoutSession::load(backend.clone(), &user_id, 1, 2)
        .await
        .unwrap();
    assert_eq!(week2.previous_sets("dips").len(), 2);
    assert!(week2.sets("dips").is_empty());

    week2
        .save_exercise_batch("dips", "Weighted Dips", vec![set(1, 102.5, 5), set(2, 100.0, 4)])
        .await
        .unwrap();
    let first = week2.saved_set("dips", 1).unwrap().clone();
    let second = week2.saved_set("dips", 2).unwrap().clone();
    assert_eq!(week2.progress("dips", &first), Some(SetProgress::Weight(2.5)));
    assert_eq!(week2.progress("dips", &second), Some(SetProgress::Reps(-1)));

    // Another day has no history
    let other = WorkoutSession::load(backend.clone(), &user_id, 2, 2)
        .await
        .unwrap();
    assert!(other.previous_sets("dips").is_empty());
}

#[tokio::test]
async fn test_complete_workout() {
    let (backend, user_id) = setup().await;
    let mut session = WorkoutSession::load(backend.clone(), &user_id, 3, 1)
        .await
        .unwrap();
    assert!(matches!(session.complete(None).await, Err(LogError::NoActiveLog)));

    session
        .save_exercise_batch("deadlifts", "Deadlifts", vec![set(1, 225.0, 5)])
        .await
        .unwrap();
    session.complete(Some("Felt strong")).await.unwrap();

    let log = backend.find_workout_log(&user_id, 3, 1).await.unwrap().unwrap();
    assert_eq!(log.notes.as_deref(), Some("Felt strong"));
    assert!(log.completed_at.is_some());
}

#[tokio::test]
async fn test_invalid_set_writes_nothing() {
    let (backend, user_id) = setup().await;
    let mut session = WorkoutSession::load(backend.clone(), &user_id, 1, 1)
        .await
        .unwrap();

    let err = session
        .save_exercise_batch("dips", "Weighted Dips", vec![set(1, 50.0, 5), set(2, 50.0, 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, LogError::InvalidSet { set_number: 2, .. }));
    assert!(session.log().is_none());
    assert!(backend.list_workout_logs(&user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_load_rejects_unknown_day_and_week() {
    let (backend, user_id) = setup().await;
    assert!(matches!(
        WorkoutSession::load(backend.clone(), &user_id, 9, 1).await,
        Err(LogError::Program(_))
    ));
    assert!(matches!(
        WorkoutSession::load(backend.clone(), &user_id, 1, 0).await,
        Err(LogError::Program(_))
    ));
}

/// Sqlite backend with injectable write failures
struct FlakyBackend {
    inner: SqliteBackend,
    /// Set number whose insert fails
    fail_set: Option<u32>,
    fail_records: bool,
}

impl FlakyBackend {
    fn new(fail_set: Option<u32>, fail_records: bool) -> Self {
        Self {
            inner: SqliteBackend::open_in_memory().unwrap(),
            fail_set,
            fail_records,
        }
    }
}

fn unavailable() -> BackendError {
    BackendError::Api {
        status: 503,
        message: "Service unavailable".to_string(),
    }
}

#[async_trait]
impl Backend for FlakyBackend {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<AuthUser, BackendError> {
        self.inner.sign_up(email, password, full_name).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        self.inner.sign_in(email, password).await
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.inner.sign_out().await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        self.inner.get_profile(user_id).await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, BackendError> {
        self.inner.upsert_profile(profile).await
    }

    async fn update_current_week(&self, user_id: &str, week: u32) -> Result<(), BackendError> {
        self.inner.update_current_week(user_id, week).await
    }

    async fn find_workout_log(
        &self,
        user_id: &str,
        workout_day_id: u32,
        week_number: u32,
    ) -> Result<Option<WorkoutLog>, BackendError> {
        self.inner.find_workout_log(user_id, workout_day_id, week_number).await
    }

    async fn previous_workout_log(
        &self,
        user_id: &str,
        workout_day_id: u32,
        before_week: u32,
    ) -> Result<Option<WorkoutLog>, BackendError> {
        self.inner.previous_workout_log(user_id, workout_day_id, before_week).await
    }

    async fn insert_workout_log(&self, log: &NewWorkoutLog) -> Result<WorkoutLog, BackendError> {
        self.inner.insert_workout_log(log).await
    }

    async fn complete_workout_log(
        &self,
        id: &str,
        notes: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Result<(), BackendError> {
        self.inner.complete_workout_log(id, notes, completed_at).await
    }

    async fn list_workout_logs(&self, user_id: &str) -> Result<Vec<WorkoutLog>, BackendError> {
        self.inner.list_workout_logs(user_id).await
    }

    async fn exercise_logs(&self, workout_log_id: &str) -> Result<Vec<ExerciseLogRow>, BackendError> {
        self.inner.exercise_logs(workout_log_id).await
    }

    async fn find_exercise_set(
        &self,
        workout_log_id: &str,
        exercise_id: &str,
        set_number: u32,
    ) -> Result<Option<String>, BackendError> {
        self.inner.find_exercise_set(workout_log_id, exercise_id, set_number).await
    }

    async fn insert_exercise_set(&self, row: &NewExerciseLog) -> Result<(), BackendError> {
        if self.fail_set == Some(row.set_number) {
            return Err(unavailable());
        }
        self.inner.insert_exercise_set(row).await
    }

    async fn update_exercise_set(&self, id: &str, update: &SetUpdate) -> Result<(), BackendError> {
        self.inner.update_exercise_set(id, update).await
    }

    async fn personal_records(&self, user_id: &str) -> Result<Vec<PersonalRecord>, BackendError> {
        self.inner.personal_records(user_id).await
    }

    async fn upsert_personal_record(&self, record: &PersonalRecord) -> Result<PersonalRecord, BackendError> {
        if self.fail_records {
            return Err(unavailable());
        }
        self.inner.upsert_personal_record(record).await
    }
}

#[tokio::test]
async fn test_partial_batch_keeps_earlier_sets() {
    let backend = Arc::new(FlakyBackend::new(Some(2), false));
    let user = backend
        .sign_up("partial@example.com", "s3cret-pass", "Partial")
        .await
        .unwrap();
    let mut session = WorkoutSession::load(backend.clone(), &user.id, 1, 1)
        .await
        .unwrap();

    let err = session
        .save_exercise_batch(
            "dips",
            "Weighted Dips",
            vec![set(3, 110.0, 5), set(1, 100.0, 5), set(2, 105.0, 5)],
        )
        .await
        .unwrap_err();

    match err {
        LogError::PartialBatch {
            saved,
            failed_set,
            source,
        } => {
            assert_eq!(saved, vec![1]);
            assert_eq!(failed_set, 2);
            assert!(matches!(source, BackendError::Api { status: 503, .. }));
        }
        other => panic!("expected a partial batch, got {other:?}"),
    }

    // Only set 1 reached storage and no record was written
    let log_id = session.log().unwrap().id.clone();
    let rows = backend.exercise_logs(&log_id).await.unwrap();
    assert_eq!(rows.iter().map(|r| r.set_number).collect::<Vec<_>>(), vec![1]);
    assert_eq!(session.sets("dips").len(), 1);
    assert!(backend.personal_records(&user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_record_failure_keeps_saved_sets() {
    let backend = Arc::new(FlakyBackend::new(None, true));
    let user = backend
        .sign_up("records@example.com", "s3cret-pass", "Records")
        .await
        .unwrap();
    let mut session = WorkoutSession::load(backend.clone(), &user.id, 1, 1)
        .await
        .unwrap();

    let outcome = session
        .save_exercise_batch("dips", "Weighted Dips", vec![set(1, 100.0, 5), set(2, 105.0, 5)])
        .await
        .unwrap();
    assert_eq!(outcome.saved, vec![1, 2]);
    assert!(outcome.new_record.is_none());
    assert!(session.record("dips").is_none());

    let log_id = session.log().unwrap().id.clone();
    assert_eq!(backend.exercise_logs(&log_id).await.unwrap().len(), 2);
    assert!(backend.personal_records(&user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_volume_by_date_sums_same_day() {
    let (backend, user_id) = setup().await;
    assert!(volume_by_date(backend.as_ref(), &user_id).await.unwrap().is_empty());

    let mut day1 = WorkoutSession::load(backend.clone(), &user_id, 1, 1)
        .await
        .unwrap();
    day1.save_exercise_batch("dips", "Weighted Dips", vec![set(1, 100.0, 5), set(2, 50.0, 10)])
        .await
        .unwrap();
    let mut day3 = WorkoutSession::load(backend.clone(), &user_id, 3, 1)
        .await
        .unwrap();
    day3.save_exercise_batch("deadlifts", "Deadlifts", vec![set(1, 200.0, 5)])
        .await
        .unwrap();

    let points = volume_by_date(backend.as_ref(), &user_id).await.unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].volume, 2000.0);
}
