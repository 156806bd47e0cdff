//! Client-side store - stored auth session and the scratch pad of set
//! entries that were typed in but not yet saved to the backend

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use tracing::debug;

use crate::models::{AuthSession, ExerciseSet};

const SESSION_KEY: &str = "auth_session";

#[derive(Debug, Error)]
pub enum LocalError {
    #[error("local store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt stored value: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Unsaved entry for one set of one exercise
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSet {
    pub exercise_id: String,
    pub set: ExerciseSet,
}

pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    pub fn open(path: &str) -> Result<Self, LocalError> {
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, LocalError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), LocalError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS pending_sets (
                workout_day_id INTEGER NOT NULL,
                week_number INTEGER NOT NULL,
                exercise_id TEXT NOT NULL,
                set_number INTEGER NOT NULL,
                weight REAL NOT NULL,
                reps INTEGER NOT NULL,
                rpe INTEGER,
                PRIMARY KEY (workout_day_id, week_number, exercise_id, set_number)
            );",
        )?;
        Ok(())
    }

    // ---- session ----

    pub fn save_session(&self, session: &AuthSession) -> Result<(), LocalError> {
        let value = serde_json::to_string(session)?;
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![SESSION_KEY, value],
        )?;
        Ok(())
    }

    pub fn load_session(&self) -> Result<Option<AuthSession>, LocalError> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [SESSION_KEY], |r| {
                r.get(0)
            })
            .optional()?;
        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn clear_session(&self) -> Result<(), LocalError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [SESSION_KEY])?;
        Ok(())
    }

    // ---- scratch pad ----

    /// Insert or replace the entry for this set
    pub fn put_pending(
        &self,
        workout_day_id: u32,
        week_number: u32,
        exercise_id: &str,
        set: &ExerciseSet,
    ) -> Result<(), LocalError> {
        self.conn.execute(
            "INSERT INTO pending_sets
                (workout_day_id, week_number, exercise_id, set_number, weight, reps, rpe)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(workout_day_id, week_number, exercise_id, set_number)
             DO UPDATE SET weight = excluded.weight, reps = excluded.reps, rpe = excluded.rpe",
            params![
                workout_day_id,
                week_number,
                exercise_id,
                set.set_number,
                set.weight,
                set.reps,
                set.rpe,
            ],
        )?;
        debug!(exercise_id, set_number = set.set_number, "Stored pending set");
        Ok(())
    }

    /// All entries of a workout ordered by exercise, then set number
    pub fn pending(&self, workout_day_id: u32, week_number: u32) -> Result<Vec<PendingSet>, LocalError> {
        let mut stmt = self.conn.prepare(
            "SELECT exercise_id, set_number, weight, reps, rpe FROM pending_sets
             WHERE workout_day_id = ?1 AND week_number = ?2
             ORDER BY exercise_id, set_number",
        )?;
        let rows = stmt
            .query_map(params![workout_day_id, week_number], |row| {
                Ok(PendingSet {
                    exercise_id: row.get(0)?,
                    set: ExerciseSet::new(row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn pending_for(
        &self,
        workout_day_id: u32,
        week_number: u32,
        exercise_id: &str,
    ) -> Result<Vec<ExerciseSet>, LocalError> {
        Ok(self
            .pending(workout_day_id, week_number)?
            .into_iter()
            .filter(|p| p.exercise_id == exercise_id)
            .map(|p| p.set)
            .collect())
    }

    /// Drop the entries that reached the backend
    pub fn remove_pending(
        &self,
        workout_day_id: u32,
        week_number: u32,
        exercise_id: &str,
        set_numbers: &[u32],
    ) -> Result<(), LocalError> {
        for set_number in set_numbers {
            self.conn.execute(
                "DELETE FROM pending_sets
                 WHERE workout_day_id = ?1 AND week_number = ?2 AND exercise_id = ?3 AND set_number = ?4",
                params![workout_day_id, week_number, exercise_id, set_number],
            )?;
        }
        Ok(())
    }

    /// Throw away unsaved entries of a workout, or of one exercise in it
    pub fn discard_pending(
        &self,
        workout_day_id: u32,
        week_number: u32,
        exercise_id: Option<&str>,
    ) -> Result<usize, LocalError> {
        let removed = match exercise_id {
            Some(ex) => self.conn.execute(
                "DELETE FROM pending_sets
                 WHERE workout_day_id = ?1 AND week_number = ?2 AND exercise_id = ?3",
                params![workout_day_id, week_number, ex],
            )?,
            None => self.conn.execute(
                "DELETE FROM pending_sets WHERE workout_day_id = ?1 AND week_number = ?2",
                params![workout_day_id, week_number],
            )?,
        };
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthUser;

    #[test]
    fn test_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");
        let path = path.to_str().unwrap();

        let session = AuthSession {
            access_token: "token".into(),
            user: AuthUser {
                id: "u1".into(),
                email: Some("jane@example.com".into()),
            },
        };
        LocalStore::open(path).unwrap().save_session(&session).unwrap();

        let store = LocalStore::open(path).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session));
        store.clear_session().unwrap();
        assert_eq!(store.load_session().unwrap(), None);
    }

    #[test]
    fn test_pending_sets_keyed_by_set() {
        let store = LocalStore::open_in_memory().unwrap();
        store
            .put_pending(1, 2, "dips", &ExerciseSet::new(2, 10.0, 8, None))
            .unwrap();
        store
            .put_pending(1, 2, "dips", &ExerciseSet::new(1, 10.0, 10, Some(7)))
            .unwrap();
        store
            .put_pending(1, 2, "dips", &ExerciseSet::new(1, 12.5, 9, Some(8)))
            .unwrap();
        store
            .put_pending(1, 3, "dips", &ExerciseSet::new(1, 15.0, 6, None))
            .unwrap();

        let sets = store.pending_for(1, 2, "dips").unwrap();
        assert_eq!(sets.len(), 2, "Same set number must overwrite");
        assert_eq!(sets[0].set_number, 1);
        assert_eq!(sets[0].weight, 12.5);

        store.remove_pending(1, 2, "dips", &[1]).unwrap();
        let left = store.pending(1, 2).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].set.set_number, 2);

        assert_eq!(store.discard_pending(1, 2, None).unwrap(), 1);
        assert_eq!(store.pending(1, 3).unwrap().len(), 1);
    }
}
