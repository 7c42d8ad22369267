//! Experience points and levels.
//!
//! Levels follow a quadratic curve: reaching level `L` requires `base_xp × L²` XP, so every level
//! takes more XP than the one before. Below the first threshold the level is still 1.

use log::warn;

use crate::WorkoutSession;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCurve {
    base_xp: f64,
}

impl LevelCurve {
    pub const BASE_XP: f64 = 250.0;

    pub fn new(base_xp: f64) -> Result<Self, LevelCurveError> {
        if !base_xp.is_finite() || base_xp <= 0.0 {
            return Err(LevelCurveError::InvalidBase);
        }
        Ok(Self { base_xp })
    }

    #[must_use]
    pub fn base_xp(&self) -> f64 {
        self.base_xp
    }

    #[must_use]
    pub fn level(&self, xp: f64) -> u32 {
        let xp = non_negative(xp, "XP");

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut level = (xp / self.base_xp).sqrt().floor() as u32;

        // floating point errors must not move exact thresholds to the neighboring level
        while level < u32::MAX && self.xp_at_level_start(level + 1) <= xp {
            level += 1;
        }
        while level > 0 && self.xp_at_level_start(level) > xp {
            level -= 1;
        }

        level.max(1)
    }

    #[must_use]
    pub fn xp_at_level_start(&self, level: u32) -> f64 {
        self.base_xp * f64::from(level).powi(2)
    }

    #[must_use]
    pub fn xp_at_next_level(&self, level: u32) -> f64 {
        self.base_xp * (f64::from(level) + 1.0).powi(2)
    }

    #[must_use]
    pub fn level_state(&self, xp: f64) -> LevelState {
        let xp = non_negative(xp, "XP");
        let level = self.level(xp);
        let xp_at_level_start = self.xp_at_level_start(level);
        let xp_at_next_level = self.xp_at_next_level(level);
        LevelState {
            level,
            xp_at_level_start,
            xp_at_next_level,
            progress: ((xp - xp_at_level_start) / (xp_at_next_level - xp_at_level_start))
                .clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn apply_xp_gain(&self, total_xp_before: f64, gained: f64) -> XpGain {
        let total_xp_before = non_negative(total_xp_before, "XP");
        let gained = non_negative(gained, "XP gain");
        let total_xp_after = total_xp_before + gained;
        let previous_level = self.level(total_xp_before);
        let new_level = self.level(total_xp_after);
        XpGain {
            total_xp_after,
            leveled_up: new_level > previous_level,
            new_level,
        }
    }
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            base_xp: Self::BASE_XP,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum LevelCurveError {
    #[error("Base XP must be a positive number")]
    InvalidBase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelState {
    pub level: u32,
    pub xp_at_level_start: f64,
    pub xp_at_next_level: f64,
    /// Fraction of the current level window already covered, in [0, 1].
    pub progress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpGain {
    pub total_xp_after: f64,
    pub leveled_up: bool,
    pub new_level: u32,
}

/// XP awarded for a finished workout session.
///
/// `base + per_minute × duration + min(volume_cap, ⌊volume / volume_step⌋ × per_volume_step)
///  + per_completed_set × completed sets + per_personal_record × new records`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpFormula {
    pub base: u32,
    pub per_minute: u32,
    pub volume_step: f32,
    pub per_volume_step: u32,
    pub volume_cap: u32,
    pub per_completed_set: u32,
    pub per_personal_record: u32,
}

impl XpFormula {
    pub const BASE: u32 = 100;
    pub const PER_MINUTE: u32 = 2;
    pub const VOLUME_STEP: f32 = 1000.0;
    pub const PER_VOLUME_STEP: u32 = 5;
    pub const VOLUME_CAP: u32 = 100;
    pub const PER_COMPLETED_SET: u32 = 5;
    pub const PER_PERSONAL_RECORD: u32 = 50;

    #[must_use]
    pub fn session_xp(&self, workout_session: &WorkoutSession, new_personal_records: usize) -> u32 {
        let volume = non_negative(f64::from(workout_session.total_volume), "total volume");
        let volume_steps = if self.volume_step > 0.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let steps = (volume / f64::from(self.volume_step)).floor() as u32;
            steps
        } else {
            0
        };
        let completed_sets = u32::try_from(workout_session.completed_sets()).unwrap_or(u32::MAX);
        let new_personal_records = u32::try_from(new_personal_records).unwrap_or(u32::MAX);

        self.base
            .saturating_add(
                self.per_minute
                    .saturating_mul(workout_session.duration_minutes),
            )
            .saturating_add(
                volume_steps
                    .saturating_mul(self.per_volume_step)
                    .min(self.volume_cap),
            )
            .saturating_add(self.per_completed_set.saturating_mul(completed_sets))
            .saturating_add(
                self.per_personal_record
                    .saturating_mul(new_personal_records),
            )
    }
}

impl Default for XpFormula {
    fn default() -> Self {
        Self {
            base: Self::BASE,
            per_minute: Self::PER_MINUTE,
            volume_step: Self::VOLUME_STEP,
            per_volume_step: Self::PER_VOLUME_STEP,
            volume_cap: Self::VOLUME_CAP,
            per_completed_set: Self::PER_COMPLETED_SET,
            per_personal_record: Self::PER_PERSONAL_RECORD,
        }
    }
}

fn non_negative(value: f64, name: &str) -> f64 {
    if value.is_nan() || value < 0.0 {
        warn!("replacing invalid {name} {value} by 0");
        0.0
    } else {
        value
    }
}
