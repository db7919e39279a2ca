//! Parameter sweeps over independent runs
//!
//! Expands a full-factorial grid of model parameters, repeats it for a
//! number of iterations and executes every run on the rayon pool. Runs share
//! nothing but a read-only config; each gets its own seed, drawn up front
//! from a master stream so the plan is identical however the pool schedules
//! the work.

pub mod export;

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::config::ModelConfig;
use crate::core::error::{Result, SimError};
use crate::simulation::{simulate, RunOutput};

pub use export::JsonlSink;

/// Values to sweep per parameter; an empty list keeps the base value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepValues {
    pub r_correlation: Vec<f64>,
    pub a_preferences: Vec<f64>,
    pub d_decay: Vec<f64>,
    pub turnover: Vec<f64>,
}

impl Default for SweepValues {
    fn default() -> Self {
        Self {
            r_correlation: vec![0.0, 0.5, 1.0],
            a_preferences: vec![0.0, 0.25, 1.0],
            d_decay: vec![0.95, 0.8],
            turnover: vec![0.0, 0.02, 0.05, 0.1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Parameters shared by every run
    pub base: ModelConfig,
    pub sweep: SweepValues,
    /// Repetitions of the whole grid
    pub iterations: u32,
    /// Master seed from which run seeds are drawn
    pub seed: u64,
    /// Worker threads; `None` uses rayon's global pool
    pub threads: Option<usize>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            base: ModelConfig::default(),
            sweep: SweepValues::default(),
            iterations: 10,
            seed: 42,
            threads: None,
        }
    }
}

/// One planned run and the parameters it used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    /// `"{iteration}_{sample}"`
    pub sample_id: String,
    pub iteration: u32,
    pub sample: usize,
    #[serde(flatten)]
    pub config: ModelConfig,
}

impl ExperimentConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ExperimentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(SimError::InvalidConfig("iterations must be positive".into()));
        }
        if self.threads == Some(0) {
            return Err(SimError::InvalidConfig("threads must be positive".into()));
        }
        for sample in self.samples() {
            sample.validate()?;
        }
        Ok(())
    }

    /// Full-factorial parameter grid, turnover varying fastest
    pub fn samples(&self) -> Vec<ModelConfig> {
        let base = &self.base;
        let values = |list: &[f64], fallback: f64| {
            if list.is_empty() {
                vec![fallback]
            } else {
                list.to_vec()
            }
        };

        let mut samples = Vec::new();
        for &r_correlation in &values(&self.sweep.r_correlation, base.r_correlation) {
            for &a_preferences in &values(&self.sweep.a_preferences, base.a_preferences) {
                for &d_decay in &values(&self.sweep.d_decay, base.d_decay) {
                    for &turnover in &values(&self.sweep.turnover, base.turnover) {
                        samples.push(ModelConfig {
                            r_correlation,
                            a_preferences,
                            d_decay,
                            turnover,
                            ..base.clone()
                        });
                    }
                }
            }
        }
        samples
    }

    /// Every run of the experiment with its seed, in a fixed order
    pub fn plan(&self) -> Vec<ParameterRow> {
        let mut master = ChaCha8Rng::seed_from_u64(self.seed);
        let samples = self.samples();
        let mut rows = Vec::with_capacity(samples.len() * self.iterations as usize);
        for iteration in 0..self.iterations {
            for (sample, config) in samples.iter().enumerate() {
                rows.push(ParameterRow {
                    sample_id: format!("{}_{}", iteration, sample),
                    iteration,
                    sample,
                    config: ModelConfig {
                        seed: master.gen(),
                        ..config.clone()
                    },
                });
            }
        }
        rows
    }
}

/// Run every planned job in parallel, handing each finished run to `on_run`
///
/// Returns the parameter rows in plan order. The first failing run aborts
/// the experiment.
pub fn run_experiment<F>(config: &ExperimentConfig, on_run: F) -> Result<Vec<ParameterRow>>
where
    F: Fn(&ParameterRow, RunOutput) -> Result<()> + Sync,
{
    config.validate()?;
    let plan = config.plan();
    tracing::info!(
        runs = plan.len(),
        samples = plan.len() / config.iterations as usize,
        iterations = config.iterations,
        "starting experiment"
    );

    in_pool(config.threads, || {
        plan.par_iter().try_for_each(|row| {
            let output = simulate(row.config.clone())?;
            tracing::debug!(sample_id = %row.sample_id, "run finished");
            on_run(row, output)
        })
    })?;
    Ok(plan)
}

/// Run the experiment and keep every output in memory, in plan order
pub fn collect_experiment(config: &ExperimentConfig) -> Result<Vec<(ParameterRow, RunOutput)>> {
    config.validate()?;
    let plan = config.plan();
    let outputs: Vec<RunOutput> = in_pool(config.threads, || {
        plan.par_iter()
            .map(|row| simulate(row.config.clone()))
            .collect::<Result<_>>()
    })?;
    Ok(plan.into_iter().zip(outputs).collect())
}

/// Run `op` on a dedicated pool of `threads` workers, or on the global pool
fn in_pool<T, OP>(threads: Option<usize>, op: OP) -> Result<T>
where
    T: Send,
    OP: FnOnce() -> Result<T> + Send,
{
    match threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| SimError::InvalidConfig(format!("thread pool: {}", e)))?
            .install(op),
        None => op(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_size() {
        let config = ExperimentConfig::default();
        assert_eq!(config.samples().len(), 3 * 3 * 2 * 4);
        assert_eq!(config.plan().len(), 72 * 10);
    }

    #[test]
    fn test_empty_sweep_uses_base() {
        let config = ExperimentConfig {
            sweep: SweepValues {
                r_correlation: vec![],
                a_preferences: vec![],
                d_decay: vec![],
                turnover: vec![0.0, 0.1],
            },
            ..Default::default()
        };
        let samples = config.samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].d_decay, config.base.d_decay);
        assert_eq!(samples[1].turnover, 0.1);
    }

    #[test]
    fn test_plan_ids_and_seeds() {
        let config = ExperimentConfig {
            iterations: 2,
            ..Default::default()
        };
        let plan = config.plan();
        assert_eq!(plan[0].sample_id, "0_0");
        assert_eq!(plan[73].sample_id, "1_1");

        let mut seeds: Vec<u64> = plan.iter().map(|r| r.config.seed).collect();
        seeds.sort_unstable();
        seeds.dedup();
        assert_eq!(seeds.len(), plan.len());
        assert_eq!(config.plan(), plan);
    }

    #[test]
    fn test_invalid_sweep_value_rejected() {
        let config = ExperimentConfig {
            sweep: SweepValues {
                d_decay: vec![1.5],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_toml() {
        let config = ExperimentConfig::from_toml_str(
            r#"
            iterations = 2
            seed = 9

            [base]
            size = 10
            steps = 5

            [sweep]
            turnover = [0.0, 0.05]
            "#,
        )
        .unwrap();
        assert_eq!(config.base.size, 10);
        assert_eq!(config.sweep.turnover, vec![0.0, 0.05]);
        // Unlisted sweeps keep their defaults
        assert_eq!(config.sweep.d_decay, vec![0.95, 0.8]);
        assert_eq!(config.plan().len(), 2 * 3 * 3 * 2 * 2);
    }
}
