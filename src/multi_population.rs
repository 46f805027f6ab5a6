//! Multi-population Normal-Inverse-Gamma: the "one independent MAB per
//! population" contextual model.
//!
//! The state is a grid of [`NigParams`], populations x arms; every cell is an
//! independent single-population belief and only the observed population's
//! chosen-arm cell is ever updated. This is a composition, not a sharing
//! scheme: statistics never cross population boundaries.

use rand::rngs::StdRng;

use crate::normal_inv_gamma::{NigDraw, NigParams};
use crate::{Observation, PosteriorModel, SimError};

/// Contextual Thompson model with one independent NIG belief per
/// `(population, arm)` cell.
#[derive(Debug, Clone, Copy)]
pub struct MultiPopulationNig {
    num_arms: usize,
    populations: usize,
}

impl MultiPopulationNig {
    /// Create a model for `populations` independent populations of
    /// `num_arms` arms each.
    ///
    /// # Errors
    ///
    /// `InvalidArmCount` when either dimension is zero.
    pub fn new(num_arms: usize, populations: usize) -> Result<Self, SimError> {
        if num_arms == 0 {
            return Err(SimError::InvalidArmCount(0));
        }
        if populations == 0 {
            return Err(SimError::BadParameter {
                what: "multi-population model needs at least one population",
            });
        }
        Ok(Self {
            num_arms,
            populations,
        })
    }

    /// The weakly informative prior replicated across every cell.
    #[must_use]
    pub fn weak_prior(&self) -> Vec<Vec<NigParams>> {
        vec![vec![NigParams::weak(); self.num_arms]; self.populations]
    }

    fn check_population(&self, population: Option<usize>) -> Result<usize, SimError> {
        let p = population.ok_or(SimError::MissingContext)?;
        if p >= self.populations {
            return Err(SimError::PopulationOutOfRange {
                population: p,
                populations: self.populations,
            });
        }
        Ok(p)
    }
}

impl PosteriorModel for MultiPopulationNig {
    /// populations x arms grid of independent NIG beliefs.
    type State = Vec<Vec<NigParams>>;
    /// One `(mu, sigma)` draw per cell.
    type Sample = Vec<Vec<NigDraw>>;

    fn validate(&self, state: &Self::State) -> Result<(), SimError> {
        if state.len() != self.populations {
            return Err(SimError::ShapeMismatch {
                expected: self.populations,
                actual: state.len(),
            });
        }
        for arms in state {
            if arms.len() != self.num_arms {
                return Err(SimError::ShapeMismatch {
                    expected: self.num_arms,
                    actual: arms.len(),
                });
            }
            for p in arms {
                p.check()?;
            }
        }
        Ok(())
    }

    fn sample_parameters(
        &self,
        state: &Self::State,
        rng: &mut StdRng,
    ) -> Result<Self::Sample, SimError> {
        state
            .iter()
            .map(|arms| arms.iter().map(|p| p.draw(rng)).collect())
            .collect()
    }

    fn expected_reward(
        &self,
        sample: &Self::Sample,
        arm: usize,
        _context: Option<&[f64]>,
        population: Option<usize>,
    ) -> Result<f64, SimError> {
        let p = self.check_population(population)?;
        sample[p]
            .get(arm)
            .map(|d| d.mu)
            .ok_or(SimError::InvalidArm(arm))
    }

    fn update(&self, state: &mut Self::State, obs: &Observation) -> Result<(), SimError> {
        let p = self.check_population(obs.population)?;
        let cell = state[p]
            .get_mut(obs.arm)
            .ok_or(SimError::InvalidArm(obs.arm))?;
        cell.absorb(obs.reward);
        Ok(())
    }
}
