//! Housing market model
//!
//! Owns both lattices and all agents, and runs the step protocol. Each
//! step is a fixed sequence of full passes with a barrier between them:
//!
//! 1. Quality and utility update (all landlords, reads last step's rents)
//! 2. Market table rebuild from current occupancy
//! 3. Rent update (all landlords, from the table)
//! 4. Occupancy reporting (snapshot before anyone moves)
//! 5. Household relocation in the configured order
//! 6. Population turnover
//!
//! Recording the landlord rows closes the step; [`HousingModel::run`] does
//! that after every call to [`HousingModel::step`].
//!
//! All randomness comes from one `ChaCha8Rng`, seeded from the config or
//! handed in through [`HousingModel::with_rng`], and drawn
//! in a fixed order: initial household attributes, initial placement,
//! landlord qualities, then per step the relocation permutation (shuffled
//! order only), turnover sample, replacement attributes and placements.

use std::collections::BTreeMap;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::agents::attributes::AttributeSampler;
use crate::agents::household::Household;
use crate::agents::landlord::{mean, Landlord, Neighborhood, Occupant};
use crate::core::config::ModelConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{HouseholdId, LandlordId, Position, Step};
use crate::market::{MarketEntry, MarketTable};
use crate::simulation::record::{LandlordRecord, RunOutput, StepReport};
use crate::spatial::Lattice;

pub struct HousingModel {
    config: ModelConfig,
    rng: ChaCha8Rng,
    sampler: AttributeSampler,
    households: BTreeMap<HouseholdId, Household>,
    /// Indexed by `LandlordId`
    landlords: Vec<Landlord>,
    household_grid: Lattice<HouseholdId>,
    landlord_grid: Lattice<LandlordId>,
    next_household_id: u32,
    t: Step,
}

impl HousingModel {
    /// Build the initial city
    ///
    /// Places `round(density * size^2)` households on random distinct
    /// cells, one landlord on every cell, and precomputes each landlord's
    /// neighborhood.
    pub fn new(config: ModelConfig) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }

    /// Build the initial city drawing from `rng` instead of `config.seed`
    pub fn with_rng(config: ModelConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        let sampler = AttributeSampler::new(config.distribution, config.r_correlation)?;

        let cells = config.housing_units();
        let population = config.household_count();
        if population > cells {
            return Err(SimError::InvalidConfig(format!(
                "{} households do not fit on {} cells",
                population, cells
            )));
        }
        for warning in config.warnings() {
            tracing::warn!(
                size = config.size,
                density = config.density,
                turnover = config.turnover,
                "{}",
                warning
            );
        }

        let mut model = Self {
            household_grid: Lattice::new(config.size),
            landlord_grid: Lattice::new(config.size),
            households: BTreeMap::new(),
            landlords: Vec::with_capacity(cells),
            next_household_id: 0,
            t: 0,
            sampler,
            rng,
            config,
        };

        let initial = model.spawn_households(population);
        model.place_households(&initial)?;

        for index in 0..cells {
            let id = LandlordId(index as u32);
            let position = Position::from_index(index, model.config.size);
            let quality = model.sampler.housing_quality(&mut model.rng);
            model.landlord_grid.place(id, position)?;
            model.landlords.push(Landlord::new(id, position, quality));
        }
        model.build_neighborhoods()?;
        model.report_occupancy();

        tracing::info!(
            size = model.config.size,
            households = model.household_grid.len(),
            landlords = model.landlords.len(),
            seed = model.config.seed,
            "model set up"
        );
        Ok(model)
    }

    fn spawn_households(&mut self, count: usize) -> Vec<HouseholdId> {
        (0..count)
            .map(|_| {
                let id = HouseholdId(self.next_household_id);
                self.next_household_id += 1;
                let (income, status) = self.sampler.household(&mut self.rng);
                self.households.insert(id, Household::new(id, income, status));
                id
            })
            .collect()
    }

    fn place_households(&mut self, ids: &[HouseholdId]) -> Result<()> {
        for &id in ids {
            self.household_grid.place_random(id, &mut self.rng)?;
        }
        Ok(())
    }

    fn build_neighborhoods(&mut self) -> Result<()> {
        let vision = self.config.vision;
        for index in 0..self.landlords.len() {
            let id = self.landlords[index].id;
            let mut members = self.landlord_grid.neighbors(id, vision)?;
            members.push(id);
            members.sort_unstable();
            let cells = members
                .iter()
                .map(|&member| self.landlords[member.0 as usize].position)
                .collect();
            self.landlords[index].neighborhood = Neighborhood {
                landlords: members,
                cells,
            };
        }
        Ok(())
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Number of completed steps
    pub fn t(&self) -> Step {
        self.t
    }

    pub fn households(&self) -> &BTreeMap<HouseholdId, Household> {
        &self.households
    }

    pub fn household(&self, id: HouseholdId) -> Option<&Household> {
        self.households.get(&id)
    }

    pub fn household_position(&self, id: HouseholdId) -> Option<Position> {
        self.household_grid.position_of(id)
    }

    pub fn landlords(&self) -> &[Landlord] {
        &self.landlords
    }

    /// Mutable landlord state, for seeding scenarios
    pub fn landlords_mut(&mut self) -> &mut [Landlord] {
        &mut self.landlords
    }

    pub fn landlord(&self, id: LandlordId) -> Option<&Landlord> {
        self.landlords.get(id.0 as usize)
    }

    pub fn household_grid(&self) -> &Lattice<HouseholdId> {
        &self.household_grid
    }

    pub fn landlord_grid(&self) -> &Lattice<LandlordId> {
        &self.landlord_grid
    }

    fn household_at(&self, pos: Position) -> Option<&Household> {
        self.household_grid
            .agent_at(pos)
            .and_then(|id| self.households.get(&id))
    }

    /// Phase 1: quality follows neighborhood rent, utility follows
    /// neighborhood status and quality
    ///
    /// Reads rents from before this phase, so landlord order is irrelevant.
    pub fn update_quality_and_utility(&mut self) {
        let rents: Vec<f64> = self.landlords.iter().map(|l| l.rent).collect();
        let d_decay = self.config.d_decay;
        let a_preferences = self.config.a_preferences;

        for index in 0..self.landlords.len() {
            let neighborhood = &self.landlords[index].neighborhood;
            let neighborhood_rents: Vec<f64> = neighborhood
                .landlords
                .iter()
                .map(|id| rents[id.0 as usize])
                .collect();
            let statuses: Vec<f64> = neighborhood
                .cells
                .iter()
                .filter_map(|&cell| self.household_at(cell))
                .map(|h| h.status)
                .collect();

            let landlord = &mut self.landlords[index];
            if let Some(mean_rent) = mean(&neighborhood_rents) {
                landlord.update_quality(mean_rent, d_decay);
            }
            landlord.update_utility(&statuses, a_preferences);
        }
    }

    /// Phase 2: pair every landlord's utility with its current occupant's income
    pub fn build_market(&self) -> MarketTable {
        let entries = self
            .landlords
            .iter()
            .map(|landlord| MarketEntry {
                landlord: landlord.id,
                utility: landlord.utility,
                occupant_income: self.household_at(landlord.position).map(|h| h.income),
            })
            .collect();
        MarketTable::new(entries)
    }

    /// Phase 3: set every rent from the market snapshot
    pub fn update_rents(&mut self, market: &MarketTable) -> Result<()> {
        for landlord in &mut self.landlords {
            landlord.rent = market.rent_for(landlord.utility)?;
        }
        Ok(())
    }

    /// Phase 4: mirror the household lattice into each landlord's occupant
    pub fn report_occupancy(&mut self) {
        for index in 0..self.landlords.len() {
            let occupant = self
                .household_at(self.landlords[index].position)
                .map(|h| Occupant {
                    id: h.id,
                    income: h.income,
                    status: h.status,
                });
            self.landlords[index].occupant = occupant;
        }
    }

    /// Phase 5: every household picks a unit among the vacant cells and its own
    ///
    /// Households choose one after another, each seeing the vacancies left
    /// by the ones before. Returns how many changed cells.
    pub fn relocate_households(&mut self) -> Result<usize> {
        let mut order: Vec<HouseholdId> = self.household_grid.agents().collect();
        self.config
            .relocation_order
            .arrange(&mut order, &mut self.rng);

        let mut moved = 0;
        for id in order {
            let current = self
                .household_grid
                .position_of(id)
                .ok_or_else(|| SimError::UnknownAgent(id.to_string()))?;
            let household = self
                .households
                .get(&id)
                .ok_or_else(|| SimError::UnknownAgent(id.to_string()))?;

            let mut candidates: Vec<LandlordId> = self
                .household_grid
                .empty_positions()
                .iter()
                .chain(std::iter::once(&current))
                .filter_map(|&pos| self.landlord_grid.agent_at(pos))
                .collect();
            candidates.sort_unstable();

            let choice = household
                .choose_unit(candidates.iter().map(|c| &self.landlords[c.0 as usize]))
                .ok_or(SimError::EmptyChoiceSet(id))?;
            let target = self.landlords[choice.0 as usize].position;

            self.household_grid.move_to(id, target)?;
            if target != current {
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Phase 6: replace `floor(turnover * n)` random households with fresh ones
    ///
    /// Leavers are drawn without replacement and removed first; newcomers
    /// then take random vacant cells. Returns (removed, added).
    pub fn apply_turnover(&mut self) -> Result<(Vec<HouseholdId>, Vec<HouseholdId>)> {
        if self.config.turnover <= 0.0 {
            return Ok((Vec::new(), Vec::new()));
        }
        let population = self.household_grid.len();
        let count = self.config.turnover_count(population)?;

        let current: Vec<HouseholdId> = self.household_grid.agents().collect();
        let removed: Vec<HouseholdId> =
            rand::seq::index::sample(&mut self.rng, population, count)
                .into_iter()
                .map(|i| current[i])
                .collect();
        for &id in &removed {
            self.household_grid.remove(id)?;
            self.households.remove(&id);
        }

        let added = self.spawn_households(count);
        self.place_households(&added)?;

        Ok((removed, added))
    }

    /// Run phases 1-6 once
    ///
    /// Any phase error aborts the step; the model must then be discarded.
    pub fn step(&mut self) -> Result<StepReport> {
        self.update_quality_and_utility();
        let market = self.build_market();
        self.update_rents(&market)?;
        self.report_occupancy();
        let moved = self.relocate_households()?;
        let (removed, added) = self.apply_turnover()?;
        self.t += 1;

        tracing::debug!(
            t = self.t,
            moved,
            removed = removed.len(),
            added = added.len(),
            "step complete"
        );
        Ok(StepReport {
            t: self.t,
            moved,
            removed,
            added,
        })
    }

    /// Landlord rows for the current step
    pub fn snapshot(&self) -> Vec<LandlordRecord> {
        self.landlords
            .iter()
            .map(|landlord| LandlordRecord::capture(self.t, landlord))
            .collect()
    }

    /// Run all configured steps, recording after setup and after each step
    pub fn run(mut self) -> Result<RunOutput> {
        let start = Instant::now();
        let steps = self.config.steps;

        let mut records = Vec::with_capacity(self.landlords.len() * (steps as usize + 1));
        records.extend(self.snapshot());
        let mut reports = Vec::with_capacity(steps as usize);
        for _ in 0..steps {
            reports.push(self.step()?);
            records.extend(self.snapshot());
        }

        let elapsed = start.elapsed();
        tracing::info!(
            steps,
            elapsed_ms = elapsed.as_millis() as u64,
            "run complete"
        );
        Ok(RunOutput::new(
            self.config.clone(),
            records,
            &reports,
            self.household_grid.len(),
            self.landlords.len(),
            elapsed,
        ))
    }
}

/// Set up and run a model from `config`
pub fn simulate(config: ModelConfig) -> Result<RunOutput> {
    HousingModel::new(config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ModelConfig {
        ModelConfig {
            size: 6,
            density: 0.5,
            steps: 3,
            seed: 7,
            ..Default::default()
        }
    }

    #[test]
    fn test_setup_population_sizes() {
        let model = HousingModel::new(small_config()).unwrap();
        assert_eq!(model.household_grid().len(), 18);
        assert_eq!(model.households().len(), 18);
        assert_eq!(model.landlords().len(), 36);
        assert!(model.landlord_grid().is_full());
    }

    #[test]
    fn test_setup_rejects_non_positive_distribution() {
        let config = ModelConfig {
            distribution: 0.0,
            ..small_config()
        };
        assert!(matches!(
            HousingModel::new(config),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_neighborhood_includes_self() {
        let model = HousingModel::new(small_config()).unwrap();
        for landlord in model.landlords() {
            assert_eq!(landlord.neighborhood.landlords.len(), 9);
            assert!(landlord.neighborhood.landlords.contains(&landlord.id));
            assert!(landlord.neighborhood.cells.contains(&landlord.position));
        }
    }

    #[test]
    fn test_vision_wider_than_city_sees_every_landlord() {
        for vision in [3, 3000, usize::MAX] {
            let config = ModelConfig {
                size: 3,
                vision,
                ..small_config()
            };
            let model = HousingModel::new(config).unwrap();
            for landlord in model.landlords() {
                assert_eq!(landlord.neighborhood.landlords.len(), 9);
            }
        }
    }

    #[test]
    fn test_setup_reports_initial_occupancy() {
        let model = HousingModel::new(small_config()).unwrap();
        let occupied = model
            .landlords()
            .iter()
            .filter(|l| l.occupant.is_some())
            .count();
        assert_eq!(occupied, 18);
    }

    #[test]
    fn test_initial_state_equals_quality() {
        let model = HousingModel::new(small_config()).unwrap();
        for landlord in model.landlords() {
            assert_eq!(landlord.utility, landlord.housing_quality);
            assert_eq!(landlord.rent, landlord.housing_quality);
        }
    }

    #[test]
    fn test_injected_rng_matches_seeded_setup() {
        let config = small_config();
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let injected = HousingModel::with_rng(config.clone(), rng).unwrap();
        let seeded = HousingModel::new(config.clone()).unwrap();
        assert_eq!(injected.snapshot(), seeded.snapshot());

        let other = HousingModel::with_rng(config, ChaCha8Rng::seed_from_u64(8)).unwrap();
        assert_ne!(other.snapshot(), seeded.snapshot());
    }

    #[test]
    fn test_step_advances_time() {
        let mut model = HousingModel::new(small_config()).unwrap();
        let report = model.step().unwrap();
        assert_eq!(report.t, 1);
        assert_eq!(model.t(), 1);
    }

    #[test]
    fn test_rent_update_without_households_fails() {
        let config = ModelConfig {
            size: 2,
            density: 0.1,
            ..small_config()
        };
        let mut model = HousingModel::new(config).unwrap();
        assert!(model.households().is_empty());
        assert!(matches!(
            model.step(),
            Err(SimError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_run_records_every_step() {
        let output = simulate(small_config()).unwrap();
        assert_eq!(output.records.len(), 36 * 4);
        assert_eq!(output.step_records(0).count(), 36);
        assert_eq!(output.step_records(3).count(), 36);
        assert_eq!(output.statistics.steps, 3);
    }
}
