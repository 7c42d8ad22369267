//! Estimated one-rep max.

use derive_more::{Display, Into};

use crate::{Reps, SetRecord, Weight};

/// Estimate the one-rep max of a set using the Epley formula `w × (1 + r/30)`.
///
/// A set without weight or without reps scores zero, a single rep scores exactly its weight.
#[must_use]
pub fn one_rep_max(weight: Weight, reps: Reps) -> f32 {
    let w = f32::from(weight);

    if w == 0.0 || reps == Reps::ZERO {
        return 0.0;
    }

    if reps == Reps::ONE {
        return w;
    }

    #[allow(clippy::cast_precision_loss)]
    let r = u32::from(reps) as f32;

    w * (1.0 + r / 30.0)
}

/// Estimated one-rep max of a logged set, kept at full precision.
#[derive(Debug, Default, Display, Clone, Copy, Into, PartialEq, PartialOrd)]
pub struct StrengthScore(f32);

impl StrengthScore {
    #[must_use]
    pub fn of(set: &SetRecord) -> Self {
        Self(one_rep_max(set.weight, set.reps))
    }

    /// Whole-unit value for display.
    #[must_use]
    pub fn rounded(self) -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = self.0.round() as u32;
        rounded
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn weight(value: f32) -> Weight {
        Weight::new(value).unwrap()
    }

    fn reps(value: u32) -> Reps {
        Reps::new(value).unwrap()
    }

    #[rstest]
    #[case(100.0, 5, 116.666_67)]
    #[case(80.0, 10, 106.666_67)]
    #[case(60.0, 30, 120.0)]
    #[case(0.0, 5, 0.0)]
    #[case(100.0, 0, 0.0)]
    #[case(0.0, 0, 0.0)]
    fn test_one_rep_max(#[case] w: f32, #[case] r: u32, #[case] expected: f32) {
        assert_approx_eq!(one_rep_max(weight(w), reps(r)), expected, 1e-3);
    }

    #[rstest]
    #[case(0.0)]
    #[case(2.5)]
    #[case(82.5)]
    #[case(317.3)]
    fn test_one_rep_max_single_rep_is_weight(#[case] w: f32) {
        assert_eq!(one_rep_max(weight(w), Reps::ONE), w);
    }

    #[rstest]
    #[case(20.0)]
    #[case(57.5)]
    #[case(140.0)]
    fn test_one_rep_max_non_decreasing_in_reps(#[case] w: f32) {
        let scores = (0..=50)
            .map(|r| one_rep_max(weight(w), reps(r)))
            .collect::<Vec<_>>();
        assert!(scores.windows(2).all(|s| s[0] <= s[1]));
    }

    #[rstest]
    #[case(100.0, 5, 117)]
    #[case(80.0, 10, 107)]
    #[case(82.5, 1, 83)]
    #[case(0.0, 8, 0)]
    fn test_strength_score_rounded(#[case] w: f32, #[case] r: u32, #[case] expected: u32) {
        let set = SetRecord {
            set_number: 1,
            weight: weight(w),
            reps: reps(r),
            completed: true,
        };
        assert_eq!(StrengthScore::of(&set).rounded(), expected);
    }
}
