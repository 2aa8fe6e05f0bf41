//! `upkeep-core`: configuration, the top-level error type and the small
//! vocabulary types shared by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod types;

pub use config::UpkeepConfig;
pub use error::{Result, UpkeepError};
pub use types::{Cadence, RepetitionUnit};
