//! The two agent populations

pub mod attributes;
pub mod household;
pub mod landlord;

pub use attributes::AttributeSampler;
pub use household::Household;
pub use landlord::{Landlord, Neighborhood, Occupant};
