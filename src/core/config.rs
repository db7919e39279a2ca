//! Model parameters
//!
//! All parameters are immutable for the lifetime of a run. Defaults follow
//! the reference experiment: a 30x30 city at 85% occupancy, Moore
//! neighborhoods of radius 1 and Beta(2, 5) attribute draws.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::simulation::order::RelocationOrder;

/// Configuration for a single simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Correlation between income and status
    ///
    /// 0 draws status independently of income, 1 makes status equal income.
    pub r_correlation: f64,

    /// Weight of neighborhood status against housing quality in landlord utility
    pub a_preferences: f64,

    /// Multiplicative decay applied to quality above the neighborhood mean rent
    pub d_decay: f64,

    /// Side length of the square lattice
    pub size: usize,

    /// Share of cells occupied by households at setup
    pub density: f64,

    /// Neighborhood radius (Chebyshev distance on the torus)
    pub vision: usize,

    /// Shape parameter `a` of the Beta(a, 2.5a) attribute distribution
    pub distribution: f64,

    /// Share of households replaced with fresh draws after every step
    pub turnover: f64,

    /// Number of steps to run
    pub steps: u64,

    /// Seed for the single random stream of the run
    pub seed: u64,

    /// Processing order of households during relocation
    pub relocation_order: RelocationOrder,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            r_correlation: 0.0,
            a_preferences: 0.0,
            d_decay: 0.95,
            size: 30,
            density: 0.85,
            vision: 1,
            distribution: 2.0,
            turnover: 0.0,
            steps: 200,
            seed: 42,
            relocation_order: RelocationOrder::default(),
        }
    }
}

impl ModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing fields fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ModelConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Number of housing units (landlords), one per cell
    pub fn housing_units(&self) -> usize {
        self.size * self.size
    }

    /// Number of households placed at setup: `round(density * size^2)`
    pub fn household_count(&self) -> usize {
        (self.density * self.housing_units() as f64).round() as usize
    }

    /// Households replaced per step for a population of `population`
    pub fn turnover_count(&self, population: usize) -> Result<usize> {
        let k = (self.turnover * population as f64).floor();
        if !(k >= 0.0) || k as usize > population {
            return Err(SimError::InvalidConfig(format!(
                "turnover {} yields {} replacements for {} households",
                self.turnover, k, population
            )));
        }
        Ok(k as usize)
    }

    /// Valid but degenerate settings worth flagging before a run
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let population = self.household_count();
        if population == 0 {
            warnings.push("no households placed, rents cannot be seeded".to_string());
        } else if population == self.housing_units() {
            warnings.push("no vacant cells, households can never relocate".to_string());
        }
        if self.turnover > 0.0 && population > 0 && self.turnover_count(population).ok() == Some(0) {
            warnings.push(format!(
                "turnover {} replaces nobody among {} households",
                self.turnover, population
            ));
        }
        warnings
    }

    /// Check every parameter against its domain
    pub fn validate(&self) -> Result<()> {
        check_unit("r_correlation", self.r_correlation)?;
        check_unit("a_preferences", self.a_preferences)?;

        if !(self.d_decay > 0.0 && self.d_decay < 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "d_decay ({}) must lie in (0, 1)",
                self.d_decay
            )));
        }
        if self.size == 0 {
            return Err(SimError::InvalidConfig("size must be positive".into()));
        }
        if !(self.density > 0.0 && self.density <= 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "density ({}) must lie in (0, 1]",
                self.density
            )));
        }
        if self.vision == 0 {
            return Err(SimError::InvalidConfig("vision must be positive".into()));
        }
        // Beta sampling is undefined for non-positive shape parameters
        if !(self.distribution > 0.0 && self.distribution.is_finite()) {
            return Err(SimError::InvalidConfig(format!(
                "distribution ({}) must be a positive real",
                self.distribution
            )));
        }
        if !(self.turnover >= 0.0 && self.turnover < 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "turnover ({}) must lie in [0, 1)",
                self.turnover
            )));
        }
        if self.steps == 0 {
            return Err(SimError::InvalidConfig("steps must be positive".into()));
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!(
            "{} ({}) must lie in [0, 1]",
            name, value
        )))
    }
}
