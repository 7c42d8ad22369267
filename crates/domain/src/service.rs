use log::{debug, error, info};
use uuid::Uuid;

use crate::{
    CreateError, ExactMatch, ExerciseMatcher, FinishError, LevelState, OverloadSuggestion,
    PersonalRecord, PersonalRecords, ProfileRepository, ReadError, Settings, SettingsRepository,
    UpdateError, WorkoutSession, WorkoutSessionRepository, XpGain, new_personal_records,
    personal_records_with, suggest_next_session_with,
};

#[allow(async_fn_in_trait)]
pub trait ProgressionService {
    type Matcher: ExerciseMatcher;

    fn matcher(&self) -> &Self::Matcher;

    async fn get_workout_sessions(&self) -> Result<Vec<WorkoutSession>, ReadError>;
    async fn get_experience(&self) -> Result<f64, ReadError>;
    async fn get_settings(&self) -> Result<Settings, ReadError>;
    async fn set_settings(&self, settings: Settings) -> Result<(), UpdateError>;
    /// Add XP to the profile and return the new total.
    async fn award_experience(&self, xp: u32) -> Result<f64, UpdateError>;
    /// Store a finished session and award its XP.
    ///
    /// A session with a nil id gets its id assigned before anything is written. On
    /// [`FinishError::Store`] the session can be finished again under the reported id. On
    /// [`FinishError::Award`] the session is already stored and only `award_experience` must be
    /// repeated.
    async fn finish_workout_session(
        &self,
        workout_session: WorkoutSession,
    ) -> Result<SessionSummary, FinishError>;

    async fn get_personal_records(&self) -> Result<PersonalRecords, ReadError> {
        Ok(personal_records_with(
            &self.get_workout_sessions().await?,
            self.matcher(),
        ))
    }

    async fn get_level(&self) -> Result<LevelState, ReadError> {
        let settings = self.get_settings().await?;
        Ok(settings
            .level_curve
            .level_state(self.get_experience().await?))
    }

    async fn suggest_next_session(
        &self,
        exercise_name: &str,
        target_set_count: u32,
        rep_range_floor: u32,
    ) -> Result<Vec<OverloadSuggestion>, ReadError> {
        let settings = self.get_settings().await?;
        let history = settings.planning_window(self.get_workout_sessions().await?);
        Ok(suggest_next_session_with(
            exercise_name,
            target_set_count,
            rep_range_floor,
            &history,
            &settings.overload,
            self.matcher(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub workout_session: WorkoutSession,
    pub new_personal_records: Vec<PersonalRecord>,
    pub xp_gained: u32,
    pub xp: XpGain,
}

pub struct Service<R, M = ExactMatch> {
    repository: R,
    matcher: M,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            matcher: ExactMatch,
        }
    }
}

impl<R, M: ExerciseMatcher> Service<R, M> {
    pub fn with_matcher(repository: R, matcher: M) -> Self {
        Self {
            repository,
            matcher,
        }
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(crate::StorageError::NoConnection) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R, M> ProgressionService for Service<R, M>
where
    R: WorkoutSessionRepository + ProfileRepository + SettingsRepository,
    M: ExerciseMatcher,
{
    type Matcher = M;

    fn matcher(&self) -> &M {
        &self.matcher
    }

    async fn get_workout_sessions(&self) -> Result<Vec<WorkoutSession>, ReadError> {
        log_on_error!(
            self.repository.read_workout_sessions(),
            ReadError,
            "get",
            "workout sessions"
        )
    }

    async fn get_experience(&self) -> Result<f64, ReadError> {
        log_on_error!(
            self.repository.read_experience(),
            ReadError,
            "get",
            "experience"
        )
    }

    async fn get_settings(&self) -> Result<Settings, ReadError> {
        log_on_error!(
            self.repository.read_settings(),
            ReadError,
            "get",
            "settings"
        )
    }

    async fn set_settings(&self, settings: Settings) -> Result<(), UpdateError> {
        log_on_error!(
            self.repository.write_settings(settings),
            UpdateError,
            "set",
            "settings"
        )
    }

    async fn award_experience(&self, xp: u32) -> Result<f64, UpdateError> {
        log_on_error!(
            self.repository.increment_experience(f64::from(xp)),
            UpdateError,
            "increment",
            "experience"
        )
    }

    async fn finish_workout_session(
        &self,
        mut workout_session: WorkoutSession,
    ) -> Result<SessionSummary, FinishError> {
        if workout_session.id.is_nil() {
            workout_session.id = Uuid::new_v4().into();
        }
        let workout_session_id = workout_session.id;

        let settings = self.get_settings().await?;
        let prior_history = self
            .get_workout_sessions()
            .await?
            .into_iter()
            .filter(|w| w.id != workout_session_id)
            .collect::<Vec<_>>();
        let new_personal_records = new_personal_records(
            &personal_records_with(&prior_history, &self.matcher),
            &workout_session,
            &self.matcher,
        );
        let xp_gained = settings
            .xp_formula
            .session_xp(&workout_session, new_personal_records.len());

        let workout_session = log_on_error!(
            self.repository.create_workout_session(workout_session),
            CreateError,
            "create",
            "workout session"
        )
        .map_err(|source| FinishError::Store {
            workout_session_id,
            source,
        })?;
        let total_xp_after = self
            .award_experience(xp_gained)
            .await
            .map_err(|source| FinishError::Award {
                workout_session_id: workout_session.id,
                xp_gained,
                source,
            })?;
        let xp = settings.level_curve.apply_xp_gain(
            total_xp_after - f64::from(xp_gained),
            f64::from(xp_gained),
        );

        info!(
            "finished workout session {}: {xp_gained} XP, {} new personal records",
            workout_session.id,
            new_personal_records.len()
        );
        if xp.leveled_up {
            info!("reached level {}", xp.new_level);
        }

        Ok(SessionSummary {
            workout_session,
            new_personal_records,
            xp_gained,
            xp,
        })
    }
}
