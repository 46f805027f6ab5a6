//! Reward samplers: the hidden "true" environment a simulation runs against.
//!
//! A [`RewardSampler`] plays the world: it produces realized rewards when an
//! arm is pulled and knows the true expected reward of every arm — the latter
//! is used **only** for regret accounting, never for decision-making.
//!
//! Contextual samplers additionally generate an exogenous context before each
//! pull: one feature vector per arm plus a discrete population label.
//! Context presence is an explicit flag ([`RewardSampler::with_context`]),
//! not an empty-collection convention, so "no context" and "empty context"
//! can never be confused.
//!
//! All entropy flows through the caller-supplied `StdRng`; samplers hold no
//! random state of their own, which keeps independent runs independent.

use rand::rngs::StdRng;
use rand_distr::{Bernoulli, Distribution, Normal};

use crate::linalg::dot;
use crate::SimError;

/// One context draw: a feature vector per arm plus the population it belongs to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextDraw {
    /// Feature vector for each arm, indexed by arm.
    pub contexts_per_arm: Vec<Vec<f64>>,
    /// Discrete population label for this draw.
    pub population: usize,
}

/// The true reward-generating process.
///
/// `sample` consumes entropy from the shared random source and mutates
/// nothing else. `expected_reward` is deterministic.
pub trait RewardSampler {
    /// Number of arms this sampler models.
    fn num_arms(&self) -> usize;

    /// Whether this sampler generates a context before each pull.
    fn with_context(&self) -> bool {
        false
    }

    /// Draw one realized reward for `arm` under `context`.
    fn sample(
        &self,
        arm: usize,
        context: Option<&[f64]>,
        rng: &mut StdRng,
    ) -> Result<f64, SimError>;

    /// True expected reward of `arm` under `context`. Regret accounting only.
    fn expected_reward(&self, arm: usize, context: Option<&[f64]>) -> Result<f64, SimError>;

    /// Maximum true expected reward over all arms.
    fn best_expected_reward(
        &self,
        contexts_per_arm: Option<&[Vec<f64>]>,
    ) -> Result<f64, SimError> {
        let mut best = f64::NEG_INFINITY;
        for arm in 0..self.num_arms() {
            let ctx = contexts_per_arm.map(|cs| cs[arm].as_slice());
            let r = self.expected_reward(arm, ctx)?;
            if r > best {
                best = r;
            }
        }
        Ok(best)
    }

    /// Generate the exogenous context for the upcoming pull.
    ///
    /// Only called when [`with_context`](Self::with_context) is true;
    /// non-contextual samplers keep the default, which rejects the call.
    fn sample_context(&self, rng: &mut StdRng) -> Result<ContextDraw, SimError> {
        let _ = rng;
        Err(SimError::BadParameter {
            what: "sampler does not generate contexts",
        })
    }
}

/// Bernoulli rewards: one success probability per arm.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BernoulliSampler {
    probs: Vec<f64>,
}

impl BernoulliSampler {
    /// Create from per-arm success probabilities.
    ///
    /// # Errors
    ///
    /// `InvalidArmCount` if empty; `BadParameter` if any probability is
    /// outside `[0, 1]` or non-finite.
    pub fn new(probs: Vec<f64>) -> Result<Self, SimError> {
        if probs.is_empty() {
            return Err(SimError::InvalidArmCount(0));
        }
        if probs.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0) {
            return Err(SimError::BadParameter {
                what: "Bernoulli probability must be finite and in [0, 1]",
            });
        }
        Ok(Self { probs })
    }

    fn check_arm(&self, arm: usize) -> Result<(), SimError> {
        if arm >= self.probs.len() {
            return Err(SimError::InvalidArm(arm));
        }
        Ok(())
    }
}

impl RewardSampler for BernoulliSampler {
    fn num_arms(&self) -> usize {
        self.probs.len()
    }

    fn sample(
        &self,
        arm: usize,
        _context: Option<&[f64]>,
        rng: &mut StdRng,
    ) -> Result<f64, SimError> {
        self.check_arm(arm)?;
        let dist = Bernoulli::new(self.probs[arm]).map_err(|_| SimError::BadParameter {
            what: "Bernoulli probability must be in [0, 1]",
        })?;
        Ok(if dist.sample(rng) { 1.0 } else { 0.0 })
    }

    fn expected_reward(&self, arm: usize, _context: Option<&[f64]>) -> Result<f64, SimError> {
        self.check_arm(arm)?;
        Ok(self.probs[arm])
    }
}

/// Gaussian rewards: one `(mu, sigma)` pair per arm.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalSampler {
    arms: Vec<(f64, f64)>,
}

impl NormalSampler {
    /// Create from per-arm `(mu, sigma)` pairs.
    ///
    /// # Errors
    ///
    /// `InvalidArmCount` if empty; `BadParameter` on non-finite `mu` or
    /// non-positive `sigma`.
    pub fn new(arms: Vec<(f64, f64)>) -> Result<Self, SimError> {
        if arms.is_empty() {
            return Err(SimError::InvalidArmCount(0));
        }
        for (mu, sigma) in &arms {
            if !mu.is_finite() || !sigma.is_finite() || *sigma <= 0.0 {
                return Err(SimError::BadParameter {
                    what: "Normal arm needs finite mu and sigma > 0",
                });
            }
        }
        Ok(Self { arms })
    }

    fn check_arm(&self, arm: usize) -> Result<(), SimError> {
        if arm >= self.arms.len() {
            return Err(SimError::InvalidArm(arm));
        }
        Ok(())
    }
}

impl RewardSampler for NormalSampler {
    fn num_arms(&self) -> usize {
        self.arms.len()
    }

    fn sample(
        &self,
        arm: usize,
        _context: Option<&[f64]>,
        rng: &mut StdRng,
    ) -> Result<f64, SimError> {
        self.check_arm(arm)?;
        let (mu, sigma) = self.arms[arm];
        let dist = Normal::new(mu, sigma).map_err(|_| SimError::BadParameter {
            what: "Normal arm needs sigma > 0",
        })?;
        Ok(dist.sample(rng))
    }

    fn expected_reward(&self, arm: usize, _context: Option<&[f64]>) -> Result<f64, SimError> {
        self.check_arm(arm)?;
        Ok(self.arms[arm].0)
    }
}

/// Policy that generates the per-arm feature vectors for a linear sampler.
///
/// This is the extension point for contextual environments: the reward math
/// of [`LinearSampler`] never changes, only how contexts are produced.
pub trait ContextPolicy {
    /// Draw one context: per-arm feature vectors plus a population label.
    fn sample_context(&self, num_arms: usize, rng: &mut StdRng) -> ContextDraw;
}

/// Linear-contextual rewards: `N(beta . context, sigma)` with a single
/// `(beta, sigma)` shared across arms. Arms differ only through their
/// contexts, which a [`ContextPolicy`] generates each iteration.
#[derive(Debug, Clone)]
pub struct LinearSampler<C> {
    num_arms: usize,
    beta: Vec<f64>,
    sigma: f64,
    policy: C,
}

impl<C: ContextPolicy> LinearSampler<C> {
    /// Create a linear sampler with shared coefficients and noise scale.
    ///
    /// # Errors
    ///
    /// `InvalidArmCount` on zero arms; `BadParameter` on empty or non-finite
    /// `beta`, or non-positive `sigma`.
    pub fn new(num_arms: usize, beta: Vec<f64>, sigma: f64, policy: C) -> Result<Self, SimError> {
        if num_arms == 0 {
            return Err(SimError::InvalidArmCount(0));
        }
        if beta.is_empty() || beta.iter().any(|b| !b.is_finite()) {
            return Err(SimError::BadParameter {
                what: "linear sampler needs a non-empty finite beta",
            });
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(SimError::BadParameter {
                what: "linear sampler needs sigma > 0",
            });
        }
        Ok(Self {
            num_arms,
            beta,
            sigma,
            policy,
        })
    }

    fn mean(&self, context: Option<&[f64]>) -> Result<f64, SimError> {
        let ctx = context.ok_or(SimError::MissingContext)?;
        if ctx.len() != self.beta.len() {
            return Err(SimError::ShapeMismatch {
                expected: self.beta.len(),
                actual: ctx.len(),
            });
        }
        Ok(dot(&self.beta, ctx))
    }
}

impl<C: ContextPolicy> RewardSampler for LinearSampler<C> {
    fn num_arms(&self) -> usize {
        self.num_arms
    }

    fn with_context(&self) -> bool {
        true
    }

    fn sample(
        &self,
        arm: usize,
        context: Option<&[f64]>,
        rng: &mut StdRng,
    ) -> Result<f64, SimError> {
        if arm >= self.num_arms {
            return Err(SimError::InvalidArm(arm));
        }
        let mu = self.mean(context)?;
        let dist = Normal::new(mu, self.sigma).map_err(|_| SimError::BadParameter {
            what: "linear sampler needs sigma > 0",
        })?;
        Ok(dist.sample(rng))
    }

    fn expected_reward(&self, arm: usize, context: Option<&[f64]>) -> Result<f64, SimError> {
        if arm >= self.num_arms {
            return Err(SimError::InvalidArm(arm));
        }
        self.mean(context)
    }

    fn sample_context(&self, rng: &mut StdRng) -> Result<ContextDraw, SimError> {
        Ok(self.policy.sample_context(self.num_arms, rng))
    }
}

/// Two-population gated-shift context for a 2-arm, 3-feature linear model.
///
/// A fair coin picks the population. Arm 0 always sees the baseline feature
/// `[1, 0, 0]`; arm 1 sees `[1, 1, 0]` in population 0 and `[1, 1, 1]` in
/// population 1, so the third coefficient acts only in population 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatedShiftContext;

impl ContextPolicy for GatedShiftContext {
    fn sample_context(&self, _num_arms: usize, rng: &mut StdRng) -> ContextDraw {
        use rand::Rng;
        let bit: f64 = rng.random();
        if bit < 0.5 {
            ContextDraw {
                contexts_per_arm: vec![vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 0.0]],
                population: 0,
            }
        } else {
            ContextDraw {
                contexts_per_arm: vec![vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]],
                population: 1,
            }
        }
    }
}
