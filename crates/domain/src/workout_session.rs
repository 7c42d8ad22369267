use chrono::{DateTime, Utc};
use derive_more::{Deref, Display};
use uuid::Uuid;

use crate::{CreateError, ExerciseID, ExerciseIdentity, ExerciseMatcher, ReadError, Reps, Weight};

/// Append-only log of finished workout sessions.
#[allow(async_fn_in_trait)]
pub trait WorkoutSessionRepository {
    async fn read_workout_sessions(&self) -> Result<Vec<WorkoutSession>, ReadError>;
    /// Append a session. A nil id is replaced by a newly generated one.
    async fn create_workout_session(
        &self,
        workout_session: WorkoutSession,
    ) -> Result<WorkoutSession, CreateError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    pub id: WorkoutSessionID,
    pub date: DateTime<Utc>,
    pub routine_name: Option<String>,
    pub duration_minutes: u32,
    pub total_volume: f32,
    pub exercises: Vec<ExercisePerformance>,
}

impl WorkoutSession {
    #[must_use]
    pub fn completed_sets(&self) -> usize {
        self.exercises
            .iter()
            .flat_map(|e| &e.sets)
            .filter(|s| s.completed)
            .count()
    }

    /// Performances of the given exercise which contain at least one logged set.
    pub fn performances<'a>(
        &'a self,
        exercise_name: &'a str,
        matcher: &'a impl ExerciseMatcher,
    ) -> impl Iterator<Item = &'a ExercisePerformance> {
        self.exercises.iter().filter(move |e| {
            !e.sets.is_empty() && matcher.matches_name(&e.exercise_name, exercise_name)
        })
    }
}

#[derive(Deref, Debug, Default, Display, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkoutSessionID(Uuid);

impl WorkoutSessionID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for WorkoutSessionID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for WorkoutSessionID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExercisePerformance {
    pub exercise_name: String,
    pub exercise_id: Option<ExerciseID>,
    pub sets: Vec<SetRecord>,
}

impl ExercisePerformance {
    #[must_use]
    pub fn identity(&self, matcher: &impl ExerciseMatcher) -> ExerciseIdentity {
        matcher.identity(self.exercise_id.as_ref(), &self.exercise_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetRecord {
    pub set_number: u32,
    pub weight: Weight,
    pub reps: Reps,
    pub completed: bool,
}
