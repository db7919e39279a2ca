//! Housing Segregation - Agent-Based Housing Market Simulation
//!
//! Households and landlords on a toroidal city grid. Landlords set rents
//! from city-wide competition; households move to the best unit they can
//! afford. Segregation emerges from repeated decentralized choices.

pub mod agents;
pub mod core;
pub mod experiment;
pub mod market;
pub mod simulation;
pub mod spatial;
