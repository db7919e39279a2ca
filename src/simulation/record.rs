//! Per-step landlord records and run output

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agents::landlord::Landlord;
use crate::core::config::ModelConfig;
use crate::core::types::{HouseholdId, LandlordId, Step};

/// One row per landlord per recorded step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandlordRecord {
    pub t: Step,
    pub id: LandlordId,
    pub x: usize,
    pub y: usize,
    pub housing_quality: f64,
    pub utility: f64,
    pub rent: f64,
    pub occupant_id: Option<HouseholdId>,
    pub occupant_income: Option<f64>,
    pub occupant_status: Option<f64>,
}

impl LandlordRecord {
    pub fn capture(t: Step, landlord: &Landlord) -> Self {
        Self {
            t,
            id: landlord.id,
            x: landlord.position.x,
            y: landlord.position.y,
            housing_quality: landlord.housing_quality,
            utility: landlord.utility,
            rent: landlord.rent,
            occupant_id: landlord.occupant.map(|o| o.id),
            occupant_income: landlord.occupant.map(|o| o.income),
            occupant_status: landlord.occupant.map(|o| o.status),
        }
    }
}

/// What happened during one step
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub t: Step,
    /// Households that ended the relocation pass on a different cell
    pub moved: usize,
    pub removed: Vec<HouseholdId>,
    pub added: Vec<HouseholdId>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunStats {
    pub steps: u64,
    pub households: usize,
    pub landlords: usize,
    pub total_moves: usize,
    pub total_replaced: usize,
    pub simulation_time_ms: u64,
}

/// Complete output of one run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunOutput {
    pub config: ModelConfig,
    /// Records for t = 0 (after setup) through t = steps
    pub records: Vec<LandlordRecord>,
    pub statistics: RunStats,
}

impl RunOutput {
    pub fn new(
        config: ModelConfig,
        records: Vec<LandlordRecord>,
        reports: &[StepReport],
        households: usize,
        landlords: usize,
        elapsed: Duration,
    ) -> Self {
        let statistics = RunStats {
            steps: reports.len() as u64,
            households,
            landlords,
            total_moves: reports.iter().map(|r| r.moved).sum(),
            total_replaced: reports.iter().map(|r| r.removed.len()).sum(),
            simulation_time_ms: elapsed.as_millis() as u64,
        };
        Self {
            config,
            records,
            statistics,
        }
    }

    /// Records of a single step
    pub fn step_records(&self, t: Step) -> impl Iterator<Item = &LandlordRecord> + '_ {
        self.records.iter().filter(move |r| r.t == t)
    }

    pub fn to_json(&self) -> crate::core::error::Result<String> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    pub fn summary(&self) -> String {
        format!(
            "Simulated {} steps in {}ms\n{} households on {} units, {} moves, {} households replaced",
            self.statistics.steps,
            self.statistics.simulation_time_ms,
            self.statistics.households,
            self.statistics.landlords,
            self.statistics.total_moves,
            self.statistics.total_replaced,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::landlord::Occupant;
    use crate::core::types::Position;

    #[test]
    fn test_capture_copies_occupant() {
        let mut landlord = Landlord::new(LandlordId(3), Position::new(1, 2), 0.4);
        landlord.occupant = Some(Occupant {
            id: HouseholdId(9),
            income: 0.5,
            status: 0.6,
        });
        let record = LandlordRecord::capture(4, &landlord);
        assert_eq!(record.t, 4);
        assert_eq!((record.x, record.y), (1, 2));
        assert_eq!(record.occupant_id, Some(HouseholdId(9)));
        assert_eq!(record.occupant_income, Some(0.5));
        assert_eq!(record.occupant_status, Some(0.6));
    }

    #[test]
    fn test_vacant_unit_serializes_nulls() {
        let landlord = Landlord::new(LandlordId(0), Position::new(0, 0), 0.4);
        let json = serde_json::to_value(LandlordRecord::capture(0, &landlord)).unwrap();
        assert!(json["occupant_id"].is_null());
        assert!(json["occupant_income"].is_null());
        assert!(json["occupant_status"].is_null());
    }

    #[test]
    fn test_stats_sum_reports() {
        let reports = vec![
            StepReport {
                t: 1,
                moved: 3,
                removed: vec![HouseholdId(0)],
                added: vec![HouseholdId(5)],
            },
            StepReport {
                t: 2,
                moved: 1,
                removed: vec![],
                added: vec![],
            },
        ];
        let output = RunOutput::new(
            ModelConfig::default(),
            Vec::new(),
            &reports,
            5,
            9,
            Duration::from_millis(12),
        );
        assert_eq!(output.statistics.steps, 2);
        assert_eq!(output.statistics.total_moves, 4);
        assert_eq!(output.statistics.total_replaced, 1);
        assert!(output.summary().contains("4 moves"));
    }
}
