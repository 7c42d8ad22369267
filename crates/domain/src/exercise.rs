use std::fmt;

use derive_more::{AsRef, Deref};

/// Stable identifier of an exercise in the exercise library.
#[derive(AsRef, Deref, Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(String);

impl From<&str> for ExerciseID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExerciseID {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Key under which sets of the same exercise are grouped.
///
/// Logged performances that carry a library id are keyed by it, all others by their free-text
/// name.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExerciseIdentity {
    Id(ExerciseID),
    Name(String),
}

impl fmt::Display for ExerciseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExerciseIdentity::Id(id) => write!(f, "#{}", id.as_str()),
            ExerciseIdentity::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Rule for relating logged performances to exercises.
///
/// Personal records and overload suggestions only reach exercises through this trait, so a
/// normalizing or fuzzy rule can replace [`ExactMatch`] without touching either algorithm.
pub trait ExerciseMatcher {
    fn identity(&self, exercise_id: Option<&ExerciseID>, exercise_name: &str) -> ExerciseIdentity;
    fn matches_name(&self, logged_name: &str, exercise_name: &str) -> bool;
}

/// Prefers the library id and otherwise compares names byte for byte.
///
/// Names are neither trimmed nor case folded: "Bench Press" and "bench press " are different
/// exercises.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExactMatch;

impl ExerciseMatcher for ExactMatch {
    fn identity(&self, exercise_id: Option<&ExerciseID>, exercise_name: &str) -> ExerciseIdentity {
        match exercise_id {
            Some(id) => ExerciseIdentity::Id(id.clone()),
            None => ExerciseIdentity::Name(exercise_name.to_string()),
        }
    }

    fn matches_name(&self, logged_name: &str, exercise_name: &str) -> bool {
        logged_name == exercise_name
    }
}
