pub mod model;
pub mod order;
pub mod record;

pub use model::{simulate, HousingModel};
pub use order::RelocationOrder;
pub use record::{LandlordRecord, RunOutput, RunStats, StepReport};
