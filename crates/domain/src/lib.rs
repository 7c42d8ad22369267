#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod error;
mod exercise;
mod leveling;
mod overload;
mod personal_record;
mod profile;
mod service;
mod settings;
mod strength;
mod training;
mod workout_session;

pub use error::*;
pub use exercise::*;
pub use leveling::*;
pub use overload::*;
pub use personal_record::*;
pub use profile::*;
pub use service::*;
pub use settings::*;
pub use strength::*;
pub use training::*;
pub use workout_session::*;
