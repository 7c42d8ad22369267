use derive_more::{Display, Into};
use log::warn;

#[derive(Debug, Default, Display, Clone, Copy, Into, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reps(u32);

impl Reps {
    pub const ZERO: Reps = Reps(0);
    pub const ONE: Reps = Reps(1);
    pub const MAX: Reps = Reps(999);

    pub fn new(value: u32) -> Result<Self, RepsError> {
        if !(0..1000).contains(&value) {
            return Err(RepsError::OutOfRange);
        }

        Ok(Self(value))
    }

    /// Accept a raw logged value, replacing anything outside the valid range by zero.
    #[must_use]
    pub fn or_zero(value: i64) -> Self {
        match u32::try_from(value) {
            Ok(v) => Reps::new(v).unwrap_or_else(|err| {
                warn!("replacing invalid reps {value} by 0: {err}");
                Reps::ZERO
            }),
            Err(_) => {
                warn!("replacing negative reps {value} by 0");
                Reps::ZERO
            }
        }
    }

    /// Accept a computed target, limiting it to the largest valid rep count.
    #[must_use]
    pub fn saturating(value: u32) -> Self {
        if value > Reps::MAX.0 {
            warn!("limiting reps {value} to {}", Reps::MAX);
            return Reps::MAX;
        }
        Reps(value)
    }
}

impl TryFrom<&str> for Reps {
    type Error = RepsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().parse::<u32>() {
            Ok(parsed_value) => Reps::new(parsed_value),
            Err(_) => Err(RepsError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RepsError {
    #[error("Reps must be in the range 0 to 999")]
    OutOfRange,
    #[error("Reps must be an integer")]
    ParseError,
}

#[derive(Debug, Default, Display, Clone, Copy, Into, PartialEq, PartialOrd)]
pub struct Weight(f32);

impl Weight {
    pub const ZERO: Weight = Weight(0.0);

    pub fn new(value: f32) -> Result<Self, WeightError> {
        if !value.is_finite() {
            return Err(WeightError::NotFinite);
        }

        if value < 0.0 {
            return Err(WeightError::Negative);
        }

        if value == 0.0 {
            return Ok(Weight::ZERO);
        }

        Ok(Self(value))
    }

    /// Accept a raw logged value, replacing negative or non-finite values by zero.
    #[must_use]
    pub fn or_zero(value: f32) -> Self {
        Weight::new(value).unwrap_or_else(|err| {
            warn!("replacing invalid weight {value} by 0: {err}");
            Weight::ZERO
        })
    }

    #[must_use]
    pub fn increased_by(self, increment: f32) -> Self {
        Weight::or_zero(self.0 + increment)
    }
}

impl TryFrom<&str> for Weight {
    type Error = WeightError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.replace(',', ".").trim().parse::<f32>() {
            Ok(parsed_value) => Weight::new(parsed_value),
            Err(_) => Err(WeightError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WeightError {
    #[error("Weight must not be negative")]
    Negative,
    #[error("Weight must be a finite number")]
    NotFinite,
    #[error("Weight must be a decimal")]
    ParseError,
}
