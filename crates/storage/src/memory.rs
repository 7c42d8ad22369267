use std::sync::{Mutex, MutexGuard};

use ironlog_domain as domain;
use log::{debug, warn};
use uuid::Uuid;

use crate::json::Snapshot;

/// Storage keeping all data in memory.
///
/// Workout sessions can only be appended and experience can only be incremented, so concurrent
/// writers never overwrite each other.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    workout_sessions: Vec<domain::WorkoutSession>,
    experience: f64,
    settings: domain::Settings,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Result<Snapshot, domain::StorageError> {
        let state = self.state()?;
        Ok(Snapshot {
            workout_sessions: state.workout_sessions.clone(),
            experience: state.experience,
            settings: state.settings,
        })
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, domain::StorageError> {
        self.state
            .lock()
            .map_err(|err| domain::StorageError::Other(err.to_string().into()))
    }
}

impl From<Snapshot> for MemoryStorage {
    fn from(value: Snapshot) -> Self {
        let mut state = State {
            workout_sessions: Vec::with_capacity(value.workout_sessions.len()),
            experience: value.experience,
            settings: value.settings,
        };
        for workout_session in value.workout_sessions {
            if let Err(err) = state.append(workout_session) {
                warn!("skipping workout session: {err}");
            }
        }
        Self {
            state: Mutex::new(state),
        }
    }
}

impl State {
    fn append(
        &mut self,
        mut workout_session: domain::WorkoutSession,
    ) -> Result<domain::WorkoutSession, domain::CreateError> {
        if workout_session.id.is_nil() {
            workout_session.id = Uuid::new_v4().into();
        } else if self
            .workout_sessions
            .iter()
            .any(|w| w.id == workout_session.id)
        {
            return Err(domain::CreateError::Conflict);
        }
        self.workout_sessions.push(workout_session.clone());
        Ok(workout_session)
    }
}

impl domain::WorkoutSessionRepository for MemoryStorage {
    async fn read_workout_sessions(&self) -> Result<Vec<domain::WorkoutSession>, domain::ReadError> {
        Ok(self.state()?.workout_sessions.clone())
    }

    async fn create_workout_session(
        &self,
        workout_session: domain::WorkoutSession,
    ) -> Result<domain::WorkoutSession, domain::CreateError> {
        self.state()?.append(workout_session)
    }
}

impl domain::ProfileRepository for MemoryStorage {
    async fn read_experience(&self) -> Result<f64, domain::ReadError> {
        Ok(self.state()?.experience)
    }

    async fn increment_experience(&self, amount: f64) -> Result<f64, domain::UpdateError> {
        let amount = if amount.is_finite() && amount >= 0.0 {
            amount
        } else {
            warn!("ignoring invalid experience increment {amount}");
            0.0
        };
        let mut state = self.state()?;
        state.experience += amount;
        debug!("experience incremented by {amount} to {}", state.experience);
        Ok(state.experience)
    }
}

impl domain::SettingsRepository for MemoryStorage {
    async fn read_settings(&self) -> Result<domain::Settings, domain::ReadError> {
        Ok(self.state()?.settings)
    }

    async fn write_settings(&self, settings: domain::Settings) -> Result<(), domain::UpdateError> {
        self.state()?.settings = settings;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use assert_approx_eq::assert_approx_eq;
    use chrono::{TimeZone, Utc};
    use ironlog_domain::{
        ExerciseID, ExerciseIdentity, ExerciseMatcher, ProfileRepository, ProgressionService,
        SettingsRepository, WorkoutSessionRepository,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::tests::data::{WORKOUT_SESSION, WORKOUT_SESSION_2, WORKOUT_SESSIONS, set};

    use super::*;

    fn storage() -> MemoryStorage {
        MemoryStorage::from(Snapshot {
            workout_sessions: WORKOUT_SESSIONS.clone(),
            ..Snapshot::default()
        })
    }

    fn empty_workout_session() -> domain::WorkoutSession {
        domain::WorkoutSession {
            id: domain::WorkoutSessionID::nil(),
            date: Utc.with_ymd_and_hms(2024, 3, 11, 18, 0, 0).unwrap(),
            routine_name: None,
            duration_minutes: 0,
            total_volume: 0.0,
            exercises: vec![],
        }
    }

    struct UnreliableProfile {
        storage: MemoryStorage,
        offline: Arc<AtomicBool>,
    }

    impl WorkoutSessionRepository for UnreliableProfile {
        async fn read_workout_sessions(
            &self,
        ) -> Result<Vec<domain::WorkoutSession>, domain::ReadError> {
            self.storage.read_workout_sessions().await
        }

        async fn create_workout_session(
            &self,
            workout_session: domain::WorkoutSession,
        ) -> Result<domain::WorkoutSession, domain::CreateError> {
            self.storage.create_workout_session(workout_session).await
        }
    }

    impl ProfileRepository for UnreliableProfile {
        async fn read_experience(&self) -> Result<f64, domain::ReadError> {
            self.storage.read_experience().await
        }

        async fn increment_experience(&self, amount: f64) -> Result<f64, domain::UpdateError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(domain::StorageError::NoConnection.into());
            }
            self.storage.increment_experience(amount).await
        }
    }

    impl SettingsRepository for UnreliableProfile {
        async fn read_settings(&self) -> Result<domain::Settings, domain::ReadError> {
            self.storage.read_settings().await
        }

        async fn write_settings(
            &self,
            settings: domain::Settings,
        ) -> Result<(), domain::UpdateError> {
            self.storage.write_settings(settings).await
        }
    }

    struct CaseInsensitive;

    impl ExerciseMatcher for CaseInsensitive {
        fn identity(
            &self,
            exercise_id: Option<&ExerciseID>,
            exercise_name: &str,
        ) -> ExerciseIdentity {
            match exercise_id {
                Some(id) => ExerciseIdentity::Id(id.clone()),
                None => ExerciseIdentity::Name(exercise_name.trim().to_lowercase()),
            }
        }

        fn matches_name(&self, logged_name: &str, exercise_name: &str) -> bool {
            logged_name.trim().eq_ignore_ascii_case(exercise_name.trim())
        }
    }

    #[tokio::test]
    async fn test_read_workout_sessions() {
        assert_eq!(
            storage().read_workout_sessions().await.unwrap(),
            WORKOUT_SESSIONS.clone()
        );
    }

    #[tokio::test]
    async fn test_create_workout_session_assigns_id() {
        let storage = MemoryStorage::new();
        let workout_session = storage
            .create_workout_session(domain::WorkoutSession {
                id: domain::WorkoutSessionID::nil(),
                ..WORKOUT_SESSION.clone()
            })
            .await
            .unwrap();

        assert!(!workout_session.id.is_nil());
        assert_eq!(
            storage.read_workout_sessions().await.unwrap(),
            vec![workout_session]
        );
    }

    #[tokio::test]
    async fn test_create_workout_session_conflict() {
        let storage = storage();
        assert!(matches!(
            storage
                .create_workout_session(WORKOUT_SESSION_2.clone())
                .await,
            Err(domain::CreateError::Conflict)
        ));
        assert_eq!(storage.read_workout_sessions().await.unwrap().len(), 2);
    }

    #[test]
    fn test_from_snapshot_skips_duplicates() {
        let storage = MemoryStorage::from(Snapshot {
            workout_sessions: vec![
                WORKOUT_SESSION.clone(),
                WORKOUT_SESSION.clone(),
                domain::WorkoutSession {
                    id: domain::WorkoutSessionID::nil(),
                    ..WORKOUT_SESSION_2.clone()
                },
            ],
            experience: 300.0,
            ..Snapshot::default()
        });
        let snapshot = storage.snapshot().unwrap();

        assert_eq!(snapshot.workout_sessions.len(), 2);
        assert_eq!(snapshot.workout_sessions[0], WORKOUT_SESSION.clone());
        assert!(!snapshot.workout_sessions[1].id.is_nil());
        assert_approx_eq!(snapshot.experience, 300.0);
    }

    #[rstest]
    #[case::valid(125.0, 125.0)]
    #[case::zero(0.0, 0.0)]
    #[case::negative(-50.0, 0.0)]
    #[case::nan(f64::NAN, 0.0)]
    #[tokio::test]
    async fn test_increment_experience(#[case] amount: f64, #[case] expected_increment: f64) {
        let storage = MemoryStorage::from(Snapshot {
            experience: 1000.0,
            ..Snapshot::default()
        });
        assert_approx_eq!(
            storage.increment_experience(amount).await.unwrap(),
            1000.0 + expected_increment
        );
        assert_approx_eq!(
            storage.read_experience().await.unwrap(),
            1000.0 + expected_increment
        );
    }

    #[test]
    fn test_increment_experience_concurrently() {
        let storage = MemoryStorage::new();
        std::thread::scope(|s| {
            for _ in 0..10 {
                s.spawn(|| {
                    let runtime = tokio::runtime::Builder::new_current_thread()
                        .build()
                        .unwrap();
                    for _ in 0..10 {
                        runtime
                            .block_on(storage.increment_experience(10.0))
                            .unwrap();
                    }
                });
            }
        });
        assert_approx_eq!(storage.snapshot().unwrap().experience, 1000.0);
    }

    #[tokio::test]
    async fn test_settings() {
        let storage = MemoryStorage::new();
        assert_eq!(
            storage.read_settings().await.unwrap(),
            domain::Settings::default()
        );

        let settings = domain::Settings {
            history_window: Some(3),
            ..domain::Settings::default()
        };
        storage.write_settings(settings).await.unwrap();
        assert_eq!(storage.read_settings().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_service_get_personal_records() {
        let service = domain::Service::new(storage());
        let records = service.get_personal_records().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_approx_eq!(
            records[&ExerciseIdentity::Id(domain::ExerciseID::from("bench-press"))],
            80.0 * (1.0 + 10.0 / 30.0),
            1e-4
        );
        assert_approx_eq!(
            records[&ExerciseIdentity::Name(String::from("Squat"))],
            100.0 * (1.0 + 5.0 / 30.0),
            1e-4
        );
    }

    #[tokio::test]
    async fn test_service_suggest_next_session() {
        let service = domain::Service::new(storage());
        let suggestions = service
            .suggest_next_session("Bench Press", 3, 8)
            .await
            .unwrap();

        assert_eq!(suggestions.len(), 3);
        for (i, suggestion) in suggestions.iter().enumerate() {
            assert_eq!(suggestion.set_number, u32::try_from(i).unwrap() + 1);
            assert_eq!(suggestion.weight, domain::Weight::new(82.5).unwrap());
            assert_eq!(suggestion.reps, domain::Reps::new(9).unwrap());
            assert!(suggestion.based_on_prior);
        }
    }

    #[tokio::test]
    async fn test_service_suggest_next_session_history_window() {
        let storage = storage();
        let service = domain::Service::new(storage);
        service
            .set_settings(domain::Settings {
                history_window: Some(1),
                ..domain::Settings::default()
            })
            .await
            .unwrap();

        let suggestions = service.suggest_next_session("Squat", 2, 8).await.unwrap();

        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|s| !s.based_on_prior));
        assert!(suggestions.iter().all(|s| s.weight == domain::Weight::ZERO));
        assert!(
            suggestions
                .iter()
                .all(|s| s.reps == domain::Reps::new(8).unwrap())
        );
    }

    #[tokio::test]
    async fn test_service_finish_workout_session() {
        let service = domain::Service::new(storage());
        let workout_session = domain::WorkoutSession {
            id: domain::WorkoutSessionID::nil(),
            date: Utc.with_ymd_and_hms(2024, 3, 11, 18, 0, 0).unwrap(),
            routine_name: Some(String::from("Push")),
            duration_minutes: 30,
            total_volume: 2050.0,
            exercises: vec![
                domain::ExercisePerformance {
                    exercise_name: String::from("Bench Press"),
                    exercise_id: Some(domain::ExerciseID::from("bench-press")),
                    sets: vec![set(1, 85.0, 10, true), set(2, 85.0, 10, false)],
                },
                domain::ExercisePerformance {
                    exercise_name: String::from("Squat"),
                    exercise_id: None,
                    sets: vec![set(1, 100.0, 4, true)],
                },
            ],
        };

        let summary = service
            .finish_workout_session(workout_session.clone())
            .await
            .unwrap();

        assert!(!summary.workout_session.id.is_nil());
        assert_eq!(
            domain::WorkoutSession {
                id: domain::WorkoutSessionID::nil(),
                ..summary.workout_session.clone()
            },
            workout_session
        );
        assert_eq!(summary.new_personal_records.len(), 1);
        assert_eq!(
            summary.new_personal_records[0].exercise,
            ExerciseIdentity::Id(domain::ExerciseID::from("bench-press"))
        );
        assert_approx_eq!(
            summary.new_personal_records[0].previous.unwrap(),
            80.0 * (1.0 + 10.0 / 30.0),
            1e-4
        );
        assert_approx_eq!(
            summary.new_personal_records[0].current,
            85.0 * (1.0 + 10.0 / 30.0),
            1e-4
        );
        // 100 + 2 × 30 + 2 × 5 + 5 × 2 + 50 × 1
        assert_eq!(summary.xp_gained, 230);
        assert_eq!(
            summary.xp,
            domain::XpGain {
                total_xp_after: 230.0,
                leveled_up: false,
                new_level: 1,
            }
        );
        assert_approx_eq!(service.get_experience().await.unwrap(), 230.0);
        assert_eq!(service.get_workout_sessions().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_service_finish_workout_session_level_up() {
        let service = domain::Service::new(MemoryStorage::from(Snapshot {
            workout_sessions: WORKOUT_SESSIONS.clone(),
            experience: 900.0,
            ..Snapshot::default()
        }));
        assert_eq!(service.get_level().await.unwrap().level, 1);

        let summary = service
            .finish_workout_session(empty_workout_session())
            .await
            .unwrap();

        assert!(summary.new_personal_records.is_empty());
        assert_eq!(summary.xp_gained, 100);
        assert_eq!(
            summary.xp,
            domain::XpGain {
                total_xp_after: 1000.0,
                leveled_up: true,
                new_level: 2,
            }
        );
        let level = service.get_level().await.unwrap();
        assert_eq!(level.level, 2);
        assert_approx_eq!(level.xp_at_level_start, 1000.0);
        assert_approx_eq!(level.xp_at_next_level, 2250.0);
        assert_approx_eq!(level.progress, 0.0);
    }

    #[tokio::test]
    async fn test_service_finish_workout_session_conflict() {
        let service = domain::Service::new(storage());

        assert!(matches!(
            service
                .finish_workout_session(WORKOUT_SESSION.clone())
                .await,
            Err(domain::FinishError::Store {
                workout_session_id,
                source: domain::CreateError::Conflict,
            }) if workout_session_id == WORKOUT_SESSION.id
        ));
        assert_approx_eq!(service.get_experience().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_service_finish_workout_session_award_failure() {
        let offline = Arc::new(AtomicBool::new(true));
        let service = domain::Service::new(UnreliableProfile {
            storage: storage(),
            offline: offline.clone(),
        });

        let Err(domain::FinishError::Award {
            workout_session_id,
            xp_gained,
            source,
        }) = service
            .finish_workout_session(empty_workout_session())
            .await
        else {
            panic!("expected the XP award to fail");
        };
        assert!(!workout_session_id.is_nil());
        assert_eq!(xp_gained, 100);
        assert!(matches!(
            source,
            domain::UpdateError::Storage(domain::StorageError::NoConnection)
        ));
        let workout_sessions = service.get_workout_sessions().await.unwrap();
        assert_eq!(workout_sessions.len(), 3);
        assert_eq!(workout_sessions[2].id, workout_session_id);
        assert_approx_eq!(service.get_experience().await.unwrap(), 0.0);

        offline.store(false, Ordering::SeqCst);
        assert_approx_eq!(service.award_experience(xp_gained).await.unwrap(), 100.0);

        assert!(matches!(
            service
                .finish_workout_session(domain::WorkoutSession {
                    id: workout_session_id,
                    ..empty_workout_session()
                })
                .await,
            Err(domain::FinishError::Store {
                source: domain::CreateError::Conflict,
                ..
            })
        ));
        assert_eq!(service.get_workout_sessions().await.unwrap().len(), 3);
        assert_approx_eq!(service.get_experience().await.unwrap(), 100.0);
    }

    #[tokio::test]
    async fn test_service_finish_workout_session_assigns_id_before_storing() {
        let service = domain::Service::new(storage());
        let summary = service
            .finish_workout_session(empty_workout_session())
            .await
            .unwrap();
        assert!(!summary.workout_session.id.is_nil());
        assert_eq!(
            service.get_workout_sessions().await.unwrap()[2].id,
            summary.workout_session.id
        );
    }

    #[tokio::test]
    async fn test_service_with_matcher() {
        let service = domain::Service::with_matcher(storage(), CaseInsensitive);

        let suggestions = service
            .suggest_next_session("bench press ", 1, 8)
            .await
            .unwrap();
        assert!(suggestions[0].based_on_prior);
        assert_eq!(suggestions[0].weight, domain::Weight::new(82.5).unwrap());

        let records = service.get_personal_records().await.unwrap();
        assert!(records.contains_key(&ExerciseIdentity::Name(String::from("squat"))));

        let suggestions = domain::Service::new(storage())
            .suggest_next_session("bench press ", 1, 8)
            .await
            .unwrap();
        assert!(!suggestions[0].based_on_prior);
    }
}
