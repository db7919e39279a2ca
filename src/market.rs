//! City-wide housing market table and the rent rule
//!
//! The table pairs every landlord's utility with the income of whoever
//! currently lives in its unit. It is rebuilt once per period and handed to
//! the rent phase by value, so rent setting depends only on this snapshot.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::LandlordId;

/// Percentile used to benchmark rent against competing units
pub const RENT_PERCENTILE: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketEntry {
    pub landlord: LandlordId,
    pub utility: f64,
    pub occupant_income: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketTable {
    entries: Vec<MarketEntry>,
    min_income: Option<f64>,
    max_income: Option<f64>,
}

impl MarketTable {
    pub fn new(entries: Vec<MarketEntry>) -> Self {
        let incomes = entries.iter().filter_map(|e| e.occupant_income);
        let (min_income, max_income) =
            incomes.fold((None::<f64>, None::<f64>), |(lo, hi), income| {
                (
                    Some(lo.map_or(income, |lo| lo.min(income))),
                    Some(hi.map_or(income, |hi| hi.max(income))),
                )
            });
        Self {
            entries,
            min_income,
            max_income,
        }
    }

    pub fn entries(&self) -> &[MarketEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with an occupant
    pub fn occupied(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.occupant_income.is_some())
            .count()
    }

    /// Lowest occupant income in the city
    pub fn min_income(&self) -> Option<f64> {
        self.min_income
    }

    /// Highest occupant income in the city
    pub fn max_income(&self) -> Option<f64> {
        self.max_income
    }

    /// Rent for a unit of the given utility
    ///
    /// The 75th percentile of occupant incomes over units with equal or
    /// lower utility. Without any such occupied unit the rent falls back to
    /// the lowest occupant income city-wide.
    pub fn rent_for(&self, utility: f64) -> Result<f64> {
        let floor = self.min_income.ok_or_else(|| {
            SimError::InsufficientData("no occupied unit to seed rents".into())
        })?;

        let mut competitors: Vec<f64> = self
            .entries
            .iter()
            .filter(|e| e.utility <= utility)
            .filter_map(|e| e.occupant_income)
            .collect();

        if competitors.is_empty() {
            return Ok(floor);
        }
        Ok(percentile(&mut competitors, RENT_PERCENTILE))
    }
}

/// Percentile `q` (0..=100) with linear interpolation between ranks
///
/// Sorts `values` in place. Returns NaN for an empty slice.
pub fn percentile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = (q / 100.0).clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    (values[lower] + (values[upper] - values[lower]) * weight).min(values[upper])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, utility: f64, income: Option<f64>) -> MarketEntry {
        MarketEntry {
            landlord: LandlordId(id),
            utility,
            occupant_income: income,
        }
    }

    #[test]
    fn test_percentile_interpolates() {
        assert_eq!(percentile(&mut [1.0, 2.0, 3.0, 4.0], 75.0), 3.25);
        assert_eq!(percentile(&mut [4.0, 1.0, 3.0, 2.0, 5.0], 75.0), 4.0);
        assert_eq!(percentile(&mut [0.7], 75.0), 0.7);
        assert!(percentile(&mut [], 75.0).is_nan());
    }

    #[test]
    fn test_rent_uses_equal_or_lower_utility_units() {
        let table = MarketTable::new(vec![
            entry(0, 0.1, Some(0.2)),
            entry(1, 0.3, Some(0.4)),
            entry(2, 0.3, None),
            entry(3, 0.9, Some(0.9)),
        ]);
        // Competitors for utility 0.3 are incomes 0.2 and 0.4
        let rent = table.rent_for(0.3).unwrap();
        assert!((rent - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_rent_falls_back_to_city_minimum() {
        let table = MarketTable::new(vec![
            entry(0, 0.5, Some(0.6)),
            entry(1, 0.0, None),
            entry(2, 0.8, Some(0.3)),
        ]);
        assert_eq!(table.rent_for(0.1).unwrap(), 0.3);
    }

    #[test]
    fn test_rent_without_occupants_is_an_error() {
        let table = MarketTable::new(vec![entry(0, 0.5, None), entry(1, 0.2, None)]);
        assert!(matches!(
            table.rent_for(0.5),
            Err(SimError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_income_bounds() {
        let table = MarketTable::new(vec![
            entry(0, 0.5, Some(0.6)),
            entry(1, 0.0, None),
            entry(2, 0.8, Some(0.3)),
        ]);
        assert_eq!(table.min_income(), Some(0.3));
        assert_eq!(table.max_income(), Some(0.6));
        assert_eq!(table.occupied(), 2);
        assert_eq!(table.len(), 3);
    }
}
