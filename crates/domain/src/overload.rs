use log::debug;

use crate::{
    ExactMatch, ExerciseIdentity, ExerciseMatcher, Reps, SetRecord, StrengthScore, Weight,
    WorkoutSession,
};

/// Double progression: add reps until the upper rep range is reached, then add weight and drop
/// back in reps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverloadRule {
    /// Reps from which the weight is increased instead of the reps.
    pub weight_increase_threshold: u32,
    pub weight_increment: f32,
    /// Reps removed when the weight is increased.
    pub rep_decrement: u32,
    /// Lowest number of reps suggested after a weight increase.
    pub min_reps: u32,
    pub rep_increment: u32,
}

impl OverloadRule {
    pub const WEIGHT_INCREASE_THRESHOLD: u32 = 10;
    pub const WEIGHT_INCREMENT: f32 = 2.5;
    pub const REP_DECREMENT: u32 = 2;
    pub const MIN_REPS: u32 = 6;
    pub const REP_INCREMENT: u32 = 1;

    /// Target for the next session based on the best set of the previous one.
    #[must_use]
    pub fn next_target(&self, prior: &SetRecord) -> (Weight, Reps) {
        let reps = u32::from(prior.reps);
        if reps >= self.weight_increase_threshold {
            (
                prior.weight.increased_by(self.weight_increment),
                Reps::saturating(reps.saturating_sub(self.rep_decrement).max(self.min_reps)),
            )
        } else {
            (
                prior.weight,
                Reps::saturating(reps.saturating_add(self.rep_increment)),
            )
        }
    }
}

impl Default for OverloadRule {
    fn default() -> Self {
        Self {
            weight_increase_threshold: Self::WEIGHT_INCREASE_THRESHOLD,
            weight_increment: Self::WEIGHT_INCREMENT,
            rep_decrement: Self::REP_DECREMENT,
            min_reps: Self::MIN_REPS,
            rep_increment: Self::REP_INCREMENT,
        }
    }
}

/// Pre-filled target for one set of the next session. The user may still edit it.
#[derive(Debug, Clone, PartialEq)]
pub struct OverloadSuggestion {
    pub exercise: ExerciseIdentity,
    pub set_number: u32,
    pub weight: Weight,
    pub reps: Reps,
    pub based_on_prior: bool,
    /// Estimated one-rep max of the prior set the suggestion is derived from.
    pub prior_one_rep_max: Option<u32>,
}

#[must_use]
pub fn suggest_next_session(
    exercise_name: &str,
    target_set_count: u32,
    rep_range_floor: u32,
    history: &[WorkoutSession],
) -> Vec<OverloadSuggestion> {
    suggest_next_session_with(
        exercise_name,
        target_set_count,
        rep_range_floor,
        history,
        &OverloadRule::default(),
        &ExactMatch,
    )
}

/// Suggest weight and reps for each set of the next session of an exercise.
///
/// The best set (heaviest, first one on ties) of the most recent session containing the
/// exercise determines a single target which is applied to all sets. Without any prior session
/// all sets get zero weight and `rep_range_floor` reps.
#[must_use]
pub fn suggest_next_session_with(
    exercise_name: &str,
    target_set_count: u32,
    rep_range_floor: u32,
    history: &[WorkoutSession],
    rule: &OverloadRule,
    matcher: &impl ExerciseMatcher,
) -> Vec<OverloadSuggestion> {
    let prior = most_recent_best_set(exercise_name, history, matcher);

    let (exercise, weight, reps, prior_one_rep_max) = match prior {
        Some((exercise, best_set)) => {
            let (weight, reps) = rule.next_target(&best_set);
            debug!(
                "suggesting {weight} × {reps} for {exercise} based on {} × {}",
                best_set.weight, best_set.reps
            );
            (
                exercise,
                weight,
                reps,
                Some(StrengthScore::of(&best_set).rounded()),
            )
        }
        None => {
            debug!("no prior session of {exercise_name}");
            (
                matcher.identity(None, exercise_name),
                Weight::ZERO,
                Reps::saturating(rep_range_floor),
                None,
            )
        }
    };

    (1..=target_set_count)
        .map(|set_number| OverloadSuggestion {
            exercise: exercise.clone(),
            set_number,
            weight,
            reps,
            based_on_prior: prior_one_rep_max.is_some(),
            prior_one_rep_max,
        })
        .collect()
}

fn most_recent_best_set(
    exercise_name: &str,
    history: &[WorkoutSession],
    matcher: &impl ExerciseMatcher,
) -> Option<(ExerciseIdentity, SetRecord)> {
    // `max_by` returns the last of equal elements, so later entries win on equal dates
    let workout_session = history
        .iter()
        .filter(|w| w.performances(exercise_name, matcher).next().is_some())
        .max_by(|a, b| a.date.cmp(&b.date))?;

    let exercise = workout_session
        .performances(exercise_name, matcher)
        .next()?
        .identity(matcher);

    let best_set = workout_session
        .performances(exercise_name, matcher)
        .flat_map(|p| &p.sets)
        .fold(None, |best: Option<&SetRecord>, set| match best {
            Some(b) if b.weight >= set.weight => Some(b),
            _ => Some(set),
        })?;

    Some((exercise, *best_set))
}
