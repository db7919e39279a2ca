use thiserror::Error;

use crate::core::types::{HouseholdId, Position};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cell already occupied: {0}")]
    CellOccupied(Position),

    #[error("Position outside lattice: {0}")]
    OutOfBounds(Position),

    #[error("Agent not on lattice: {0}")]
    UnknownAgent(String),

    #[error("Agent already on lattice: {0}")]
    AlreadyPlaced(String),

    #[error("No vacant cell left on lattice")]
    NoVacancy,

    #[error("Empty choice set for {0}")]
    EmptyChoiceSet(HouseholdId),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
