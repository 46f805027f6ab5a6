//! Beta-Bernoulli posterior: the classic 0/1-reward Thompson model.
//!
//! Each arm `i` carries an independent `Beta(a_i, b_i)` belief over its
//! success probability. A reward of 1 increments `a`, a reward of 0
//! increments `b` — the whole conjugate update is two counters.

use rand::rngs::StdRng;
use rand_distr::{Beta, Distribution};

use crate::{Observation, PosteriorModel, SimError};

/// `Beta(a, b)` belief over one arm's success probability.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BetaParams {
    pub a: f64,
    pub b: f64,
}

impl BetaParams {
    /// Uniform prior `Beta(1, 1)`.
    #[must_use]
    pub fn uniform() -> Self {
        Self { a: 1.0, b: 1.0 }
    }

    /// Posterior mean `a / (a + b)`.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.a / (self.a + self.b)
    }
}

/// Beta-Bernoulli Thompson model over `num_arms` independent arms.
#[derive(Debug, Clone, Copy)]
pub struct BetaBernoulli {
    num_arms: usize,
}

impl BetaBernoulli {
    /// Create a model for `num_arms` arms.
    ///
    /// # Errors
    ///
    /// `InvalidArmCount` when `num_arms == 0`.
    pub fn new(num_arms: usize) -> Result<Self, SimError> {
        if num_arms == 0 {
            return Err(SimError::InvalidArmCount(0));
        }
        Ok(Self { num_arms })
    }

    /// Uniform `Beta(1, 1)` prior state for every arm.
    #[must_use]
    pub fn uniform_prior(&self) -> Vec<BetaParams> {
        vec![BetaParams::uniform(); self.num_arms]
    }
}

impl PosteriorModel for BetaBernoulli {
    type State = Vec<BetaParams>;
    type Sample = Vec<f64>;

    fn validate(&self, state: &Self::State) -> Result<(), SimError> {
        if state.len() != self.num_arms {
            return Err(SimError::ShapeMismatch {
                expected: self.num_arms,
                actual: state.len(),
            });
        }
        for p in state {
            if !p.a.is_finite() || !p.b.is_finite() || p.a <= 0.0 || p.b <= 0.0 {
                return Err(SimError::BadParameter {
                    what: "Beta parameters must be finite and > 0",
                });
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
            .map(|p| {
                let dist = Beta::new(p.a, p.b).map_err(|_| SimError::BadParameter {
                    what: "Beta parameters must be > 0",
                })?;
                Ok(dist.sample(rng))
            })
            .collect()
    }

    fn expected_reward(
        &self,
        sample: &Self::Sample,
        arm: usize,
        _context: Option<&[f64]>,
        _population: Option<usize>,
    ) -> Result<f64, SimError> {
        sample.get(arm).copied().ok_or(SimError::InvalidArm(arm))
    }

    fn update(&self, state: &mut Self::State, obs: &Observation) -> Result<(), SimError> {
        let p = state.get_mut(obs.arm).ok_or(SimError::InvalidArm(obs.arm))?;
        if obs.reward == 1.0 {
            p.a += 1.0;
        } else {
            p.b += 1.0;
        }
        Ok(())
    }
}
