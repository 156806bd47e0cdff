//! Workout log store - per-set persistence, previous-week comparison and
//! personal record detection for one (user, workout day, week)

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError};
use crate::models::{
    ExerciseSet, NewExerciseLog, NewWorkoutLog, PersonalRecord, SetUpdate, WorkoutLog,
};
use crate::program::{ProgramError, find_workout, get_week_progression};

#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error("set {set_number}: {reason}")]
    InvalidSet { set_number: u32, reason: String },
    #[error("saved {} set(s) before set {failed_set} failed: {source}", .saved.len())]
    PartialBatch {
        saved: Vec<u32>,
        failed_set: u32,
        source: BackendError,
    },
    #[error("nothing has been logged for this workout yet")]
    NoActiveLog,
}

/// Check one set before anything is written
pub fn validate_set(set: &ExerciseSet) -> Result<(), LogError> {
    let invalid = |reason: &str| LogError::InvalidSet {
        set_number: set.set_number,
        reason: reason.to_string(),
    };

    if set.set_number == 0 {
        return Err(invalid("set number must start at 1"));
    }
    if set.reps == 0 {
        return Err(invalid("reps must be greater than zero"));
    }
    if !set.weight.is_finite() || set.weight < 0.0 {
        return Err(invalid("weight must be a non-negative number"));
    }
    if let Some(rpe) = set.rpe
        && !(1..=10).contains(&rpe)
    {
        return Err(invalid("RPE must be between 1 and 10"));
    }
    Ok(())
}

/// Highest weight wins, more reps breaks a tie
pub fn best_set(sets: &[ExerciseSet]) -> Option<&ExerciseSet> {
    sets.iter()
        .max_by(|a, b| a.weight.total_cmp(&b.weight).then(a.reps.cmp(&b.reps)))
}

/// A set is a new record when there is none yet, when it is heavier, or when
/// it matches the weight for more reps
pub fn beats_record(set: &ExerciseSet, record: Option<&PersonalRecord>) -> bool {
    match record {
        None => true,
        Some(pr) => set.weight > pr.weight || (set.weight == pr.weight && set.reps > pr.reps),
    }
}

/// Change of one set against the same set number last time this day was trained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetProgress {
    Weight(f64),
    Reps(i64),
    Same,
}

impl SetProgress {
    pub fn is_improved(&self) -> bool {
        match self {
            SetProgress::Weight(d) => *d > 0.0,
            SetProgress::Reps(d) => *d > 0,
            SetProgress::Same => false,
        }
    }

    pub fn is_regressed(&self) -> bool {
        match self {
            SetProgress::Weight(d) => *d < 0.0,
            SetProgress::Reps(d) => *d < 0,
            SetProgress::Same => false,
        }
    }
}

impl fmt::Display for SetProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetProgress::Weight(d) => write!(f, "{:+.1} lbs", d),
            SetProgress::Reps(d) => write!(f, "{:+} reps", d),
            SetProgress::Same => write!(f, "Same"),
        }
    }
}

pub fn compare_to_previous(current: &ExerciseSet, previous: &ExerciseSet) -> SetProgress {
    let delta = current.weight - previous.weight;
    if delta.abs() > f64::EPSILON {
        SetProgress::Weight(delta)
    } else if current.reps != previous.reps {
        SetProgress::Reps(current.reps as i64 - previous.reps as i64)
    } else {
        SetProgress::Same
    }
}

/// Result of a fully saved batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Set numbers written, ascending
    pub saved: Vec<u32>,
    pub new_record: Option<PersonalRecord>,
}

/// Cached state of one workout: current log, saved sets, last time's sets and
/// the user's records
pub struct WorkoutSession {
    backend: Arc<dyn Backend>,
    user_id: String,
    workout_day_id: u32,
    week_number: u32,
    log: Option<WorkoutLog>,
    sets: BTreeMap<String, Vec<ExerciseSet>>,
    previous: BTreeMap<String, Vec<ExerciseSet>>,
    records: HashMap<String, PersonalRecord>,
}

impl WorkoutSession {
    /// Fetch the current log, the previous week's log of the same day and all records
    pub async fn load(
        backend: Arc<dyn Backend>,
        user_id: &str,
        workout_day_id: u32,
        week_number: u32,
    ) -> Result<Self, LogError> {
        find_workout(workout_day_id)?;
        get_week_progression(week_number)?;

        let log = backend
            .find_workout_log(user_id, workout_day_id, week_number)
            .await?;
        let sets = match &log {
            Some(log) => group_rows(backend.as_ref(), &log.id).await?,
            None => BTreeMap::new(),
        };

        let previous = match backend
            .previous_workout_log(user_id, workout_day_id, week_number)
            .await?
        {
            Some(prev) => {
                debug!(week = prev.week_number, "Loaded previous workout");
                group_rows(backend.as_ref(), &prev.id).await?
            }
            None => BTreeMap::new(),
        };

        let mut records: HashMap<String, PersonalRecord> = HashMap::new();
        for pr in backend.personal_records(user_id).await? {
            let replace = records
                .get(&pr.exercise_id)
                .is_none_or(|cur| pr.weight > cur.weight || (pr.weight == cur.weight && pr.reps > cur.reps));
            if replace {
                records.insert(pr.exercise_id.clone(), pr);
            }
        }

        Ok(Self {
            backend,
            user_id: user_id.to_string(),
            workout_day_id,
            week_number,
            log,
            sets,
            previous,
            records,
        })
    }

    pub fn workout_day_id(&self) -> u32 {
        self.workout_day_id
    }

    pub fn week_number(&self) -> u32 {
        self.week_number
    }

    pub fn log(&self) -> Option<&WorkoutLog> {
        self.log.as_ref()
    }

    /// Saved sets of an exercise, ordered by set number
    pub fn sets(&self, exercise_id: &str) -> &[ExerciseSet] {
        self.sets.get(exercise_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn saved_set(&self, exercise_id: &str, set_number: u32) -> Option<&ExerciseSet> {
        self.sets(exercise_id)
            .iter()
            .find(|s| s.set_number == set_number)
    }

    pub fn previous_sets(&self, exercise_id: &str) -> &[ExerciseSet] {
        self.previous
            .get(exercise_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn record(&self, exercise_id: &str) -> Option<&PersonalRecord> {
        self.records.get(exercise_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &PersonalRecord> {
        self.records.values()
    }

    /// Progress of a set against the same set number in the previous log
    pub fn progress(&self, exercise_id: &str, set: &ExerciseSet) -> Option<SetProgress> {
        self.previous_sets(exercise_id)
            .iter()
            .find(|p| p.set_number == set.set_number)
            .map(|prev| compare_to_previous(set, prev))
    }

    pub async fn save_exercise_set(
        &mut self,
        exercise_id: &str,
        exercise_name: &str,
        set: ExerciseSet,
    ) -> Result<BatchOutcome, LogError> {
        self.save_exercise_batch(exercise_id, exercise_name, vec![set])
            .await
    }

    /// Upsert sets in ascending set order, then check the batch's best set for a record.
    ///
    /// Stops at the first failing write; sets before it stay saved and no
    /// record check runs. A failed record write is logged and leaves
    /// `new_record` empty.
    pub async fn save_exercise_batch(
        &mut self,
        exercise_id: &str,
        exercise_name: &str,
        mut sets: Vec<ExerciseSet>,
    ) -> Result<BatchOutcome, LogError> {
        if sets.is_empty() {
            return Ok(BatchOutcome {
                saved: Vec::new(),
                new_record: None,
            });
        }
        for set in &sets {
            validate_set(set)?;
        }
        sets.sort_by_key(|s| s.set_number);

        let log_id = self.ensure_log().await?;

        let mut saved = Vec::with_capacity(sets.len());
        for set in &sets {
            if let Err(source) = self.upsert_set(&log_id, exercise_id, exercise_name, set).await {
                warn!(
                    exercise_id,
                    set_number = set.set_number,
                    saved = saved.len(),
                    error = %source,
                    "Set save failed"
                );
                return Err(LogError::PartialBatch {
                    saved,
                    failed_set: set.set_number,
                    source,
                });
            }
            self.merge_set(exercise_id, set.clone());
            saved.push(set.set_number);
        }
        info!(exercise_id, sets = saved.len(), "Saved exercise sets");

        let mut new_record = None;
        if let Some(best) = best_set(&sets)
            && beats_record(best, self.records.get(exercise_id))
        {
            let record = PersonalRecord {
                id: self.records.get(exercise_id).and_then(|r| r.id.clone()),
                user_id: self.user_id.clone(),
                exercise_id: exercise_id.to_string(),
                exercise_name: exercise_name.to_string(),
                weight: best.weight,
                reps: best.reps,
                achieved_at: Utc::now(),
            };
            // The sets are stored at this point; a failed record write does not undo that
            match self.backend.upsert_personal_record(&record).await {
                Ok(stored) => {
                    info!(exercise_id, weight = stored.weight, reps = stored.reps, "New personal record");
                    self.records.insert(exercise_id.to_string(), stored.clone());
                    new_record = Some(stored);
                }
                Err(e) => warn!(exercise_id, error = %e, "Personal record update failed"),
            }
        }

        Ok(BatchOutcome { saved, new_record })
    }

    /// Mark the workout finished
    pub async fn complete(&mut self, notes: Option<&str>) -> Result<(), LogError> {
        let log = self.log.as_mut().ok_or(LogError::NoActiveLog)?;
        let now = Utc::now();
        self.backend
            .complete_workout_log(&log.id, notes, now)
            .await?;
        log.completed_at = Some(now);
        log.notes = notes.map(str::to_string);
        info!(workout_log_id = %log.id, "Workout completed");
        Ok(())
    }

    async fn ensure_log(&mut self) -> Result<String, BackendError> {
        if let Some(log) = &self.log {
            return Ok(log.id.clone());
        }
        let log = match self
            .backend
            .find_workout_log(&self.user_id, self.workout_day_id, self.week_number)
            .await?
        {
            Some(existing) => existing,
            None => {
                let created = self
                    .backend
                    .insert_workout_log(&NewWorkoutLog {
                        user_id: self.user_id.clone(),
                        workout_day_id: self.workout_day_id,
                        week_number: self.week_number,
                        completed_at: Utc::now(),
                    })
                    .await?;
                info!(workout_log_id = %created.id, "Started workout log");
                created
            }
        };
        let id = log.id.clone();
        self.log = Some(log);
        Ok(id)
    }

    async fn upsert_set(
        &self,
        log_id: &str,
        exercise_id: &str,
        exercise_name: &str,
        set: &ExerciseSet,
    ) -> Result<(), BackendError> {
        match self
            .backend
            .find_exercise_set(log_id, exercise_id, set.set_number)
            .await?
        {
            Some(row_id) => {
                self.backend
                    .update_exercise_set(&row_id, &SetUpdate::from(set))
                    .await
            }
            None => {
                self.backend
                    .insert_exercise_set(&NewExerciseLog {
                        workout_log_id: log_id.to_string(),
                        exercise_id: exercise_id.to_string(),
                        exercise_name: exercise_name.to_string(),
                        set_number: set.set_number,
                        reps: set.reps,
                        weight: set.weight,
                        rpe: set.rpe,
                        completed: set.completed,
                    })
                    .await
            }
        }
    }

    fn merge_set(&mut self, exercise_id: &str, set: ExerciseSet) {
        let list = self.sets.entry(exercise_id.to_string()).or_default();
        match list.iter_mut().find(|s| s.set_number == set.set_number) {
            Some(existing) => *existing = set,
            None => {
                list.push(set);
                list.sort_by_key(|s| s.set_number);
            }
        }
    }
}

async fn group_rows(
    backend: &dyn Backend,
    workout_log_id: &str,
) -> Result<BTreeMap<String, Vec<ExerciseSet>>, BackendError> {
    let mut grouped: BTreeMap<String, Vec<ExerciseSet>> = BTreeMap::new();
    for row in backend.exercise_logs(workout_log_id).await? {
        grouped
            .entry(row.exercise_id.clone())
            .or_default()
            .push(row.to_set());
    }
    for sets in grouped.values_mut() {
        sets.sort_by_key(|s| s.set_number);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(weight: f64, reps: u32) -> PersonalRecord {
        PersonalRecord {
            id: None,
            user_id: "u".into(),
            exercise_id: "dips".into(),
            exercise_name: "Dips".into(),
            weight,
            reps,
            achieved_at: Utc::now(),
        }
    }

    #[test]
    fn test_best_set_prefers_weight_then_reps() {
        let sets = vec![
            ExerciseSet::new(1, 100.0, 5, None),
            ExerciseSet::new(2, 100.0, 6, None),
            ExerciseSet::new(3, 90.0, 10, None),
        ];
        let best = best_set(&sets).unwrap();
        assert_eq!(best.set_number, 2);
        assert!(best_set(&[]).is_none());
    }

    #[test]
    fn test_record_rule() {
        let a = record(100.0, 5);
        assert!(beats_record(&ExerciseSet::new(1, 50.0, 1, None), None));
        assert!(beats_record(&ExerciseSet::new(1, 100.0, 6, None), Some(&a)));
        assert!(beats_record(&ExerciseSet::new(1, 102.5, 1, None), Some(&a)));
        assert!(!beats_record(&ExerciseSet::new(1, 90.0, 10, None), Some(&a)));
        assert!(!beats_record(&ExerciseSet::new(1, 100.0, 5, None), Some(&a)));
    }

    #[test]
    fn test_validate_set() {
        assert!(validate_set(&ExerciseSet::new(1, 0.0, 10, Some(7))).is_ok());
        assert!(matches!(
            validate_set(&ExerciseSet::new(0, 10.0, 5, None)),
            Err(LogError::InvalidSet { set_number: 0, .. })
        ));
        assert!(validate_set(&ExerciseSet::new(1, 10.0, 0, None)).is_err());
        assert!(validate_set(&ExerciseSet::new(1, -5.0, 5, None)).is_err());
        assert!(validate_set(&ExerciseSet::new(1, f64::NAN, 5, None)).is_err());
        assert!(validate_set(&ExerciseSet::new(1, 10.0, 5, Some(11))).is_err());
        assert!(validate_set(&ExerciseSet::new(1, 10.0, 5, Some(0))).is_err());
    }

    #[test]
    fn test_progress_display() {
        let prev = ExerciseSet::new(1, 100.0, 5, None);

        let heavier = compare_to_previous(&ExerciseSet::new(1, 102.5, 5, None), &prev);
        assert_eq!(heavier.to_string(), "+2.5 lbs");
        assert!(heavier.is_improved());

        let more_reps = compare_to_previous(&ExerciseSet::new(1, 100.0, 6, None), &prev);
        assert_eq!(more_reps.to_string(), "+1 reps");
        assert!(more_reps.is_improved());

        let lighter = compare_to_previous(&ExerciseSet::new(1, 95.0, 8, None), &prev);
        assert_eq!(lighter.to_string(), "-5.0 lbs");
        assert!(lighter.is_regressed());

        let same = compare_to_previous(&prev.clone(), &prev);
        assert_eq!(same, SetProgress::Same);
        assert_eq!(same.to_string(), "Same");
    }
}
