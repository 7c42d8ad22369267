use crate::{ReadError, UpdateError};

/// Accumulated experience points of the user.
///
/// The total only ever grows through `increment_experience`. Implementations must apply the
/// increment atomically on their side; writing back a total computed by the caller would lose
/// the XP of sessions finished concurrently on another device.
#[allow(async_fn_in_trait)]
pub trait ProfileRepository {
    async fn read_experience(&self) -> Result<f64, ReadError>;
    /// Add `amount` and return the new total.
    async fn increment_experience(&self, amount: f64) -> Result<f64, UpdateError>;
}
