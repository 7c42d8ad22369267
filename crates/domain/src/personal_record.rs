use std::collections::BTreeMap;

use log::debug;

use crate::{ExactMatch, ExerciseIdentity, ExerciseMatcher, StrengthScore, WorkoutSession};

/// Best estimated one-rep max ever observed per exercise.
pub type PersonalRecords = BTreeMap<ExerciseIdentity, f32>;

#[derive(Debug, Clone, PartialEq)]
pub struct PersonalRecord {
    pub exercise: ExerciseIdentity,
    pub previous: Option<f32>,
    pub current: f32,
}

#[must_use]
pub fn personal_records(history: &[WorkoutSession]) -> PersonalRecords {
    personal_records_with(history, &ExactMatch)
}

/// Scan the whole history for the best completed set of each exercise.
///
/// Sets which were not completed are ignored. The order of the sessions does not matter.
#[must_use]
pub fn personal_records_with(
    history: &[WorkoutSession],
    matcher: &impl ExerciseMatcher,
) -> PersonalRecords {
    let mut result = PersonalRecords::new();
    for workout_session in history {
        merge_best_scores(&mut result, workout_session, matcher);
    }
    result
}

/// Records set in `workout_session` compared to `prior_records`.
///
/// `prior_records` must be computed from a history which excludes `workout_session`. A record
/// is only reported if the best score of the session is strictly higher than the prior one (or
/// positive when there is no prior record).
#[must_use]
pub fn new_personal_records(
    prior_records: &PersonalRecords,
    workout_session: &WorkoutSession,
    matcher: &impl ExerciseMatcher,
) -> Vec<PersonalRecord> {
    let mut best = PersonalRecords::new();
    merge_best_scores(&mut best, workout_session, matcher);

    best.into_iter()
        .filter_map(|(exercise, current)| {
            let previous = prior_records.get(&exercise).copied();
            if current > previous.unwrap_or(0.0) {
                debug!(
                    "new personal record for {exercise}: {current} (previous {})",
                    previous.map_or_else(|| String::from("none"), |p| p.to_string())
                );
                Some(PersonalRecord {
                    exercise,
                    previous,
                    current,
                })
            } else {
                None
            }
        })
        .collect()
}

fn merge_best_scores(
    records: &mut PersonalRecords,
    workout_session: &WorkoutSession,
    matcher: &impl ExerciseMatcher,
) {
    for performance in &workout_session.exercises {
        let scores = performance
            .sets
            .iter()
            .filter(|s| s.completed)
            .map(|s| f32::from(StrengthScore::of(s)));
        let Some(best) = scores.reduce(f32::max) else {
            continue;
        };
        records
            .entry(performance.identity(matcher))
            .and_modify(|record| *record = record.max(best))
            .or_insert(best);
    }
}
