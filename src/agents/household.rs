//! Households (housing demanders)
//!
//! A household keeps its income and status for life. Its position is owned
//! by the household lattice, not stored here.

use serde::{Deserialize, Serialize};

use crate::agents::landlord::Landlord;
use crate::core::types::{HouseholdId, LandlordId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub income: f64,
    pub status: f64,
}

impl Household {
    pub fn new(id: HouseholdId, income: f64, status: f64) -> Self {
        Self { id, income, status }
    }

    #[inline]
    pub fn can_afford(&self, landlord: &Landlord) -> bool {
        landlord.rent <= self.income
    }

    /// Pick the unit to live in next period
    ///
    /// Among affordable candidates the highest utility wins. With nothing
    /// affordable the household takes the cheapest candidate even if the
    /// rent exceeds its income. Ties go to the first candidate in iteration
    /// order, so callers pass candidates in ascending landlord id.
    ///
    /// Returns `None` only for an empty candidate set.
    pub fn choose_unit<'a, I>(&self, candidates: I) -> Option<LandlordId>
    where
        I: IntoIterator<Item = &'a Landlord>,
    {
        let mut best_affordable: Option<&Landlord> = None;
        let mut cheapest: Option<&Landlord> = None;

        for landlord in candidates {
            if self.can_afford(landlord)
                && best_affordable.map_or(true, |best| landlord.utility > best.utility)
            {
                best_affordable = Some(landlord);
            }
            if cheapest.map_or(true, |best| landlord.rent < best.rent) {
                cheapest = Some(landlord);
            }
        }

        best_affordable.or(cheapest).map(|landlord| landlord.id)
    }
}
