pub mod config;
pub mod error;
pub mod types;

pub use config::ModelConfig;
pub use error::{Result, SimError};
pub use types::{HouseholdId, LandlordId, Position, Step};
