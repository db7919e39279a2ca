//! Attribute draws for new agents
//!
//! Income, status and initial housing quality all come from
//! Beta(a, 2.5a), a right-skewed distribution on [0, 1] with mean 2/7.
//! Larger `a` concentrates the draws around that mean.

use rand::Rng;
use rand_distr::{Beta, Distribution};

use crate::core::error::{Result, SimError};

#[derive(Debug, Clone)]
pub struct AttributeSampler {
    beta: Beta<f64>,
    r_correlation: f64,
}

impl AttributeSampler {
    pub fn new(distribution: f64, r_correlation: f64) -> Result<Self> {
        if !(distribution > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "distribution ({}) must be positive for Beta sampling",
                distribution
            )));
        }
        let beta = Beta::new(distribution, 2.5 * distribution)
            .map_err(|e| SimError::InvalidConfig(format!("Beta distribution: {}", e)))?;
        Ok(Self {
            beta,
            r_correlation,
        })
    }

    /// One raw Beta(a, 2.5a) draw
    #[inline]
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.beta.sample(rng)
    }

    /// Income and status of a new household, drawn in that order
    ///
    /// Status blends an independent draw with income:
    /// `status = (1 - r) * beta + r * income`.
    pub fn household<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let income = self.draw(rng);
        let independent = self.draw(rng);
        let status = (1.0 - self.r_correlation) * independent + self.r_correlation * income;
        (income, status)
    }

    /// Initial housing quality of a landlord
    pub fn housing_quality<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.draw(rng)
    }
}
