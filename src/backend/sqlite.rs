//! SQLite backend - the same tables as the hosted service, kept in one file

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Backend, BackendError};
use crate::models::{
    AuthSession, AuthUser, ExerciseLogRow, NewExerciseLog, NewWorkoutLog, PersonalRecord, Profile,
    SetUpdate, WorkoutLog,
};

/// Local database wrapper
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self, BackendError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        info!(path, "Opened SQLite backend");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, BackendError> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, BackendError> {
        self.conn.lock().map_err(|_| BackendError::Poisoned)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), BackendError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                full_name TEXT
            );
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                full_name TEXT,
                email TEXT,
                current_week INTEGER NOT NULL DEFAULT 1,
                created_at TEXT
            );
            CREATE TABLE IF NOT EXISTS workout_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                workout_day_id INTEGER NOT NULL,
                week_number INTEGER NOT NULL,
                completed_at TEXT,
                notes TEXT
            );
            CREATE TABLE IF NOT EXISTS exercise_logs (
                id TEXT PRIMARY KEY,
                workout_log_id TEXT NOT NULL,
                exercise_id TEXT NOT NULL,
                exercise_name TEXT NOT NULL,
                set_number INTEGER NOT NULL,
                reps INTEGER NOT NULL,
                weight REAL NOT NULL,
                rpe INTEGER,
                completed INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE IF NOT EXISTS personal_records (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                exercise_id TEXT NOT NULL,
                exercise_name TEXT NOT NULL,
                weight REAL NOT NULL,
                reps INTEGER NOT NULL,
                achieved_at TEXT NOT NULL,
                UNIQUE(user_id, exercise_id)
            );",
        )?;
        Ok(())
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn profile_from_row(row: &Row) -> rusqlite::Result<Profile> {
    let created: Option<String> = row.get(4)?;
    Ok(Profile {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        current_week: row.get(3)?,
        created_at: created.as_deref().map(parse_ts),
    })
}

const WORKOUT_LOG_COLUMNS: &str = "id, user_id, workout_day_id, week_number, completed_at, notes";

fn workout_log_from_row(row: &Row) -> rusqlite::Result<WorkoutLog> {
    let completed: Option<String> = row.get(4)?;
    Ok(WorkoutLog {
        id: row.get(0)?,
        user_id: row.get(1)?,
        workout_day_id: row.get(2)?,
        week_number: row.get(3)?,
        completed_at: completed.as_deref().map(parse_ts),
        notes: row.get(5)?,
    })
}

fn record_from_row(row: &Row) -> rusqlite::Result<PersonalRecord> {
    let achieved: String = row.get(6)?;
    Ok(PersonalRecord {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        exercise_id: row.get(2)?,
        exercise_name: row.get(3)?,
        weight: row.get(4)?,
        reps: row.get(5)?,
        achieved_at: parse_ts(&achieved),
    })
}

#[async_trait]
impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthUser, BackendError> {
        let conn = self.conn()?;
        let taken: Option<String> = conn
            .query_row("SELECT id FROM users WHERE email = ?1", [email], |r| r.get(0))
            .optional()?;
        if taken.is_some() {
            return Err(BackendError::Auth("User already registered".to_string()));
        }

        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| BackendError::Auth(e.to_string()))?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO users (id, email, password_hash, full_name) VALUES (?1, ?2, ?3, ?4)",
            params![id, email, hash, full_name],
        )?;
        info!(user_id = %id, "Registered local user");
        Ok(AuthUser {
            id,
            email: Some(email.to_string()),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let conn = self.conn()?;
        let found: Option<(String, String)> = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE email = ?1",
                [email],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        let invalid = || BackendError::Auth("Invalid login credentials".to_string());
        let (id, hash) = found.ok_or_else(invalid)?;
        if !bcrypt::verify(password, &hash).map_err(|e| BackendError::Auth(e.to_string()))? {
            return Err(invalid());
        }

        Ok(AuthSession {
            access_token: Uuid::new_v4().to_string(),
            user: AuthUser {
                id,
                email: Some(email.to_string()),
            },
        })
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        // Tokens are not tracked locally, the client drops its copy
        debug!("sqlite sign_out");
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let profile = self
            .conn()?
            .query_row(
                "SELECT id, full_name, email, current_week, created_at FROM profiles WHERE id = ?1",
                [user_id],
                profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, BackendError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO profiles (id, full_name, email, current_week, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                full_name = excluded.full_name,
                email = excluded.email,
                current_week = excluded.current_week,
                created_at = COALESCE(profiles.created_at, excluded.created_at)",
            params![
                profile.id,
                profile.full_name,
                profile.email,
                profile.current_week,
                profile.created_at.map(|d| d.to_rfc3339()),
            ],
        )?;
        let stored = conn.query_row(
            "SELECT id, full_name, email, current_week, created_at FROM profiles WHERE id = ?1",
            [&profile.id],
            profile_from_row,
        )?;
        Ok(stored)
    }

    async fn update_current_week(&self, user_id: &str, week: u32) -> Result<(), BackendError> {
        let changed = self.conn()?.execute(
            "UPDATE profiles SET current_week = ?1 WHERE id = ?2",
            params![week, user_id],
        )?;
        if changed == 0 {
            return Err(BackendError::NotFound(format!("profile {}", user_id)));
        }
        Ok(())
    }

    async fn find_workout_log(
        &self,
        user_id: &str,
        workout_day_id: u32,
        week_number: u32,
    ) -> Result<Option<WorkoutLog>, BackendError> {
        let sql = format!(
            "SELECT {} FROM workout_logs
             WHERE user_id = ?1 AND workout_day_id = ?2 AND week_number = ?3
             ORDER BY completed_at DESC LIMIT 1",
            WORKOUT_LOG_COLUMNS
        );
        let log = self
            .conn()?
            .query_row(
                &sql,
                params![user_id, workout_day_id, week_number],
                workout_log_from_row,
            )
            .optional()?;
        Ok(log)
    }

    async fn previous_workout_log(
        &self,
        user_id: &str,
        workout_day_id: u32,
        before_week: u32,
    ) -> Result<Option<WorkoutLog>, BackendError> {
        let sql = format!(
            "SELECT {} FROM workout_logs
             WHERE user_id = ?1 AND workout_day_id = ?2 AND week_number < ?3
             ORDER BY week_number DESC LIMIT 1",
            WORKOUT_LOG_COLUMNS
        );
        let log = self
            .conn()?
            .query_row(
                &sql,
                params![user_id, workout_day_id, before_week],
                workout_log_from_row,
            )
            .optional()?;
        Ok(log)
    }

    async fn insert_workout_log(&self, log: &NewWorkoutLog) -> Result<WorkoutLog, BackendError> {
        let id = Uuid::new_v4().to_string();
        self.conn()?.execute(
            "INSERT INTO workout_logs (id, user_id, workout_day_id, week_number, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                log.user_id,
                log.workout_day_id,
                log.week_number,
                log.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(WorkoutLog {
            id,
            user_id: log.user_id.clone(),
            workout_day_id: log.workout_day_id,
            week_number: log.week_number,
            completed_at: Some(log.completed_at),
            notes: None,
        })
    }

    async fn complete_workout_log(
        &self,
        id: &str,
        notes: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Result<(), BackendError> {
        let changed = self.conn()?.execute(
            "UPDATE workout_logs SET notes = ?1, completed_at = ?2 WHERE id = ?3",
            params![notes, completed_at.to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(BackendError::NotFound(format!("workout log {}", id)));
        }
        Ok(())
    }

    async fn list_workout_logs(&self, user_id: &str) -> Result<Vec<WorkoutLog>, BackendError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM workout_logs WHERE user_id = ?1 ORDER BY completed_at ASC",
            WORKOUT_LOG_COLUMNS
        ))?;
        let logs = stmt
            .query_map([user_id], workout_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    async fn exercise_logs(&self, workout_log_id: &str) -> Result<Vec<ExerciseLogRow>, BackendError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, workout_log_id, exercise_id, exercise_name, set_number, reps, weight, rpe, completed
             FROM exercise_logs WHERE workout_log_id = ?1
             ORDER BY exercise_id ASC, set_number ASC",
        )?;
        let rows = stmt
            .query_map([workout_log_id], |row| {
                Ok(ExerciseLogRow {
                    id: row.get(0)?,
                    workout_log_id: row.get(1)?,
                    exercise_id: row.get(2)?,
                    exercise_name: row.get(3)?,
                    set_number: row.get(4)?,
                    reps: row.get(5)?,
                    weight: row.get(6)?,
                    rpe: row.get(7)?,
                    completed: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn find_exercise_set(
        &self,
        workout_log_id: &str,
        exercise_id: &str,
        set_number: u32,
    ) -> Result<Option<String>, BackendError> {
        let id = self
            .conn()?
            .query_row(
                "SELECT id FROM exercise_logs
                 WHERE workout_log_id = ?1 AND exercise_id = ?2 AND set_number = ?3
                 LIMIT 1",
                params![workout_log_id, exercise_id, set_number],
                |r| r.get(0),
            )
            .optional()?;
        Ok(id)
    }

    async fn insert_exercise_set(&self, row: &NewExerciseLog) -> Result<(), BackendError> {
        self.conn()?.execute(
            "INSERT INTO exercise_logs
                (id, workout_log_id, exercise_id, exercise_name, set_number, reps, weight, rpe, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                Uuid::new_v4().to_string(),
                row.workout_log_id,
                row.exercise_id,
                row.exercise_name,
                row.set_number,
                row.reps,
                row.weight,
                row.rpe,
                row.completed,
            ],
        )?;
        Ok(())
    }

    async fn update_exercise_set(&self, id: &str, update: &SetUpdate) -> Result<(), BackendError> {
        let changed = self.conn()?.execute(
            "UPDATE exercise_logs SET reps = ?1, weight = ?2, rpe = ?3, completed = ?4 WHERE id = ?5",
            params![update.reps, update.weight, update.rpe, update.completed, id],
        )?;
        if changed == 0 {
            return Err(BackendError::NotFound(format!("exercise log {}", id)));
        }
        Ok(())
    }

    async fn personal_records(&self, user_id: &str) -> Result<Vec<PersonalRecord>, BackendError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, exercise_id, exercise_name, weight, reps, achieved_at
             FROM personal_records WHERE user_id = ?1",
        )?;
        let records = stmt
            .query_map([user_id], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn upsert_personal_record(
        &self,
        record: &PersonalRecord,
    ) -> Result<PersonalRecord, BackendError> {
        let conn = self.conn()?;
        let id = record
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        conn.execute(
            "INSERT INTO personal_records (id, user_id, exercise_id, exercise_name, weight, reps, achieved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id, exercise_id) DO UPDATE SET
                exercise_name = excluded.exercise_name,
                weight = excluded.weight,
                reps = excluded.reps,
                achieved_at = excluded.achieved_at",
            params![
                id,
                record.user_id,
                record.exercise_id,
                record.exercise_name,
                record.weight,
                record.reps,
                record.achieved_at.to_rfc3339(),
            ],
        )?;
        let stored = conn.query_row(
            "SELECT id, user_id, exercise_id, exercise_name, weight, reps, achieved_at
             FROM personal_records WHERE user_id = ?1 AND exercise_id = ?2",
            params![record.user_id, record.exercise_id],
            record_from_row,
        )?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_log(user: &str, day: u32, week: u32) -> NewWorkoutLog {
        NewWorkoutLog {
            user_id: user.to_string(),
            workout_day_id: day,
            week_number: week,
            completed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let db = SqliteBackend::open_in_memory().unwrap();
        let user = db.sign_up("jane@example.com", "s3cret!Pass", "Jane").await.unwrap();

        let session = db.sign_in("jane@example.com", "s3cret!Pass").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert!(!session.access_token.is_empty());

        let wrong = db.sign_in("jane@example.com", "nope").await;
        assert!(matches!(wrong, Err(BackendError::Auth(_))));

        let dup = db.sign_up("jane@example.com", "other", "Jane").await;
        assert!(matches!(dup, Err(BackendError::Auth(_))), "Duplicate email must fail");
    }

    #[tokio::test]
    async fn test_profile_upsert_keeps_created_at() {
        let db = SqliteBackend::open_in_memory().unwrap();
        let profile = Profile::new("u1", Some("Jane".into()), Some("jane@example.com".into()));
        let stored = db.upsert_profile(&profile).await.unwrap();
        assert_eq!(stored.current_week, 1);

        db.update_current_week("u1", 5).await.unwrap();
        let fetched = db.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(fetched.current_week, 5);
        assert!(fetched.created_at.is_some());

        assert!(db.update_current_week("missing", 2).await.is_err());
    }

    #[tokio::test]
    async fn test_previous_log_picks_latest_earlier_week() {
        let db = SqliteBackend::open_in_memory().unwrap();
        db.insert_workout_log(&new_log("u", 1, 1)).await.unwrap();
        let week2 = db.insert_workout_log(&new_log("u", 1, 2)).await.unwrap();
        db.insert_workout_log(&new_log("u", 2, 2)).await.unwrap();

        let prev = db.previous_workout_log("u", 1, 3).await.unwrap().unwrap();
        assert_eq!(prev.id, week2.id);
        assert!(db.previous_workout_log("u", 1, 1).await.unwrap().is_none());
        assert!(db.find_workout_log("u", 2, 2).await.unwrap().is_some());
        assert!(db.find_workout_log("u", 3, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exercise_rows_by_natural_key() {
        let db = SqliteBackend::open_in_memory().unwrap();
        let log = db.insert_workout_log(&new_log("u", 1, 1)).await.unwrap();
        let row = NewExerciseLog {
            workout_log_id: log.id.clone(),
            exercise_id: "dips".into(),
            exercise_name: "Dips".into(),
            set_number: 1,
            reps: 8,
            weight: 10.0,
            rpe: Some(7),
            completed: true,
        };
        db.insert_exercise_set(&row).await.unwrap();

        let id = db.find_exercise_set(&log.id, "dips", 1).await.unwrap().unwrap();
        db.update_exercise_set(
            &id,
            &SetUpdate {
                reps: 9,
                weight: 12.5,
                rpe: None,
                completed: true,
            },
        )
        .await
        .unwrap();

        let rows = db.exercise_logs(&log.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reps, 9);
        assert_eq!(rows[0].weight, 12.5);
        assert_eq!(rows[0].rpe, None);
        assert!(db.find_exercise_set(&log.id, "dips", 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_personal_record_upsert_on_user_exercise() {
        let db = SqliteBackend::open_in_memory().unwrap();
        let mut pr = PersonalRecord {
            id: None,
            user_id: "u".into(),
            exercise_id: "deadlifts".into(),
            exercise_name: "Deadlifts".into(),
            weight: 140.0,
            reps: 5,
            achieved_at: Utc::now(),
        };
        let first = db.upsert_personal_record(&pr).await.unwrap();
        pr.weight = 150.0;
        let second = db.upsert_personal_record(&pr).await.unwrap();

        assert_eq!(first.id, second.id, "Upsert must keep one row per exercise");
        let all = db.personal_records("u").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].weight, 150.0);
    }
}
