//! Spatial structures shared by both agent populations

pub mod lattice;

pub use lattice::Lattice;
