use crate::{LevelCurve, OverloadRule, ReadError, UpdateError, WorkoutSession, XpFormula};

#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    async fn read_settings(&self) -> Result<Settings, ReadError>;
    async fn write_settings(&self, settings: Settings) -> Result<(), UpdateError>;
}

/// Tunable game balance and planning parameters.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Settings {
    pub level_curve: LevelCurve,
    pub overload: OverloadRule,
    pub xp_formula: XpFormula,
    /// Number of most recent sessions considered for overload suggestions (all if `None`).
    pub history_window: Option<usize>,
}

impl Settings {
    /// Sessions ordered by date, restricted to the most recent ones if a window is set.
    ///
    /// Sessions on the same date keep their relative order.
    #[must_use]
    pub fn planning_window(&self, mut history: Vec<WorkoutSession>) -> Vec<WorkoutSession> {
        history.sort_by(|a, b| a.date.cmp(&b.date));
        if let Some(window) = self.history_window {
            let skip = history.len().saturating_sub(window);
            history.drain(..skip);
        }
        history
    }
}
