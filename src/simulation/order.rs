//! Household processing order for the relocation phase
//!
//! Every move changes the set of vacant cells, so the outcome of a
//! relocation pass depends on the order in which households choose. The
//! order is therefore part of the model configuration.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::HouseholdId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelocationOrder {
    /// Ascending household id, which is also creation order
    #[default]
    Ascending,
    /// A fresh permutation drawn from the run's random stream every step
    Shuffled,
}

impl RelocationOrder {
    /// Arrange `households` for this step's relocation pass
    ///
    /// `households` must arrive in ascending id order. Only `Shuffled`
    /// consumes randomness.
    pub fn arrange<R: Rng + ?Sized>(&self, households: &mut [HouseholdId], rng: &mut R) {
        match self {
            RelocationOrder::Ascending => households.sort_unstable(),
            RelocationOrder::Shuffled => households.shuffle(rng),
        }
    }
}
