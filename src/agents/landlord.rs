//! Landlords (housing suppliers)
//!
//! One landlord per cell, bound to it for the whole run. Each period a
//! landlord adjusts housing quality to the neighborhood rent level, derives
//! its utility from neighborhood status and quality, and sets rent from the
//! city-wide market table.

use serde::{Deserialize, Serialize};

use crate::core::types::{HouseholdId, LandlordId, Position};

/// Household living in a landlord's unit, as seen at reporting time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    pub id: HouseholdId,
    pub income: f64,
    pub status: f64,
}

/// Precomputed neighborhood of a landlord
///
/// Both lists include the landlord itself and its own cell. They never
/// change after setup because landlords do not move.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Neighborhood {
    pub landlords: Vec<LandlordId>,
    pub cells: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landlord {
    pub id: LandlordId,
    pub position: Position,
    pub neighborhood: Neighborhood,
    pub housing_quality: f64,
    pub utility: f64,
    pub rent: f64,
    pub occupant: Option<Occupant>,
}

impl Landlord {
    /// Initial quality doubles as initial utility and rent
    pub fn new(id: LandlordId, position: Position, housing_quality: f64) -> Self {
        Self {
            id,
            position,
            neighborhood: Neighborhood::default(),
            housing_quality,
            utility: housing_quality,
            rent: housing_quality,
            occupant: None,
        }
    }

    /// Invest up to the neighborhood mean rent, or let quality decay
    pub fn update_quality(&mut self, neighborhood_mean_rent: f64, d_decay: f64) {
        if self.housing_quality <= neighborhood_mean_rent {
            self.housing_quality = neighborhood_mean_rent;
        } else {
            self.housing_quality *= d_decay;
        }
    }

    /// Cobb-Douglas blend of mean neighborhood status and own quality
    ///
    /// Zero when no household lives in the neighborhood.
    pub fn update_utility(&mut self, neighborhood_statuses: &[f64], a_preferences: f64) {
        self.utility = match mean(neighborhood_statuses) {
            Some(mean_status) => {
                mean_status.powf(a_preferences)
                    * self.housing_quality.powf(1.0 - a_preferences)
            }
            None => 0.0,
        };
    }

    #[inline]
    pub fn occupant_income(&self) -> Option<f64> {
        self.occupant.map(|o| o.income)
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
