//! The Thompson-sampling decision loop.
//!
//! The engine wires one [`RewardSampler`] (the hidden truth) to one
//! [`PosteriorModel`] (the belief) and runs the loop: draw a context if the
//! environment is contextual, draw one joint posterior sample, pick the arm
//! whose implied expected reward is largest, pull it, fold the observation
//! back into the belief, and record a trace entry with a deep snapshot of
//! the post-update state.
//!
//! Determinism: construction fixes the seed (0 unless `with_seed` is used),
//! and all entropy — context draws, posterior draws, reward draws, uniform
//! picks — flows through the engine's single `StdRng`, so identical
//! construction arguments produce bit-identical traces. Ties in the argmax
//! resolve to the lowest arm index.
//!
//! Strictly sequential: step `i`'s selection depends on the posterior after
//! step `i-1`. There is no safe reordering inside a run. Independent runs
//! are embarrassingly parallel; give each its own engine (or `reseed` +
//! `reset_posterior_state` for sequential reuse of one instance).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::{ContextDraw, PosteriorModel, RewardSampler, SimError};

/// Arm-selection policy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Policy {
    /// Sample the posterior once per step and pick the argmax arm.
    #[default]
    Thompson,
    /// Pick uniformly at random, ignoring the posterior. Baseline only; the
    /// belief is still updated from every observed pull.
    Uniform,
}

impl FromStr for Policy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thompson" => Ok(Self::Thompson),
            "uniform" => Ok(Self::Uniform),
            other => Err(SimError::InvalidPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thompson => f.write_str("thompson"),
            Self::Uniform => f.write_str("uniform"),
        }
    }
}

/// One pull: which arm, what came back, and the side-information it was
/// pulled under. Immutable once appended to the history.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// Chosen arm index.
    pub arm: usize,
    /// Realized reward.
    pub reward: f64,
    /// Context vector of the chosen arm, when the environment is contextual.
    pub context: Option<Vec<f64>>,
    /// Population label of the draw, when the environment provides one.
    pub population: Option<usize>,
}

/// One step of a completed run.
///
/// `posterior` is an independent snapshot of the belief *after* this step's
/// observation was folded in; later updates can never alter it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceEntry<S> {
    /// Step index, `0..iterations`.
    pub step: usize,
    /// Arm chosen at this step.
    pub chosen_arm: usize,
    /// Deep snapshot of the posterior state after the update.
    pub posterior: S,
    /// True-expectation gap `best_arm - chosen_arm`; never negative.
    pub regret: f64,
}

/// Thompson-sampling simulation engine.
///
/// Owns the posterior state, the observation history, and the random source.
/// The state is mutated only through the model's update operation.
#[derive(Debug, Clone)]
pub struct Engine<R, P>
where
    P: PosteriorModel,
{
    num_arms: usize,
    sampler: R,
    model: P,
    state: P::State,
    history: Vec<Observation>,
    rng: StdRng,
}

impl<R, P> Engine<R, P>
where
    R: RewardSampler,
    P: PosteriorModel,
{
    /// Create an engine with the default seed (0, deterministic by default).
    ///
    /// # Errors
    ///
    /// `InvalidArmCount` on zero arms, `ShapeMismatch` if the sampler's arm
    /// count disagrees with `num_arms`, plus whatever the model's
    /// [`validate`](PosteriorModel::validate) rejects in `initial_state`.
    pub fn new(
        num_arms: usize,
        sampler: R,
        model: P,
        initial_state: P::State,
    ) -> Result<Self, SimError> {
        Self::with_seed(num_arms, sampler, model, initial_state, 0)
    }

    /// Create an engine with an explicit RNG seed.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_seed(
        num_arms: usize,
        sampler: R,
        model: P,
        initial_state: P::State,
        seed: u64,
    ) -> Result<Self, SimError> {
        if num_arms == 0 {
            return Err(SimError::InvalidArmCount(0));
        }
        if sampler.num_arms() != num_arms {
            return Err(SimError::ShapeMismatch {
                expected: num_arms,
                actual: sampler.num_arms(),
            });
        }
        model.validate(&initial_state)?;
        Ok(Self {
            num_arms,
            sampler,
            model,
            state: initial_state,
            history: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Number of arms, fixed at construction.
    #[must_use]
    pub fn num_arms(&self) -> usize {
        self.num_arms
    }

    /// Current posterior state.
    #[must_use]
    pub fn state(&self) -> &P::State {
        &self.state
    }

    /// Observations of the most recent (or in-progress) run, in order.
    #[must_use]
    pub fn history(&self) -> &[Observation] {
        &self.history
    }

    /// Replace the belief with a fresh state; sampler and arm count are
    /// unchanged. Use together with [`reseed`](Self::reseed) to reuse one
    /// engine for sequential independent runs.
    ///
    /// # Errors
    ///
    /// Whatever the model's [`validate`](PosteriorModel::validate) rejects.
    pub fn reset_posterior_state(&mut self, new_state: P::State) -> Result<(), SimError> {
        self.model.validate(&new_state)?;
        self.state = new_state;
        Ok(())
    }

    /// Re-seed the random source for a reproducible fresh run.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Run the decision loop for exactly `iterations` steps.
    ///
    /// The observation history is cleared at the start: a run never mixes
    /// observations with a previous run on the same engine. `verbose` raises
    /// the per-step progress event from debug to info level; it has no
    /// effect on results.
    ///
    /// # Errors
    ///
    /// Input-validation errors surface before any step executes; a numerical
    /// or shape error inside a step aborts the run at that step with the
    /// belief left as of the last completed update.
    pub fn run(
        &mut self,
        iterations: usize,
        policy: Policy,
        verbose: bool,
    ) -> Result<Vec<TraceEntry<P::State>>, SimError> {
        self.history.clear();
        let mut trace = Vec::with_capacity(iterations);

        for step in 0..iterations {
            if verbose {
                info!(step, %policy, "thompson step");
            } else {
                debug!(step, %policy, "thompson step");
            }

            let draw = if self.sampler.with_context() {
                let d = self.sampler.sample_context(&mut self.rng)?;
                if d.contexts_per_arm.len() != self.num_arms {
                    return Err(SimError::ShapeMismatch {
                        expected: self.num_arms,
                        actual: d.contexts_per_arm.len(),
                    });
                }
                Some(d)
            } else {
                None
            };

            let chosen_arm = match policy {
                Policy::Uniform => self.rng.random_range(0..self.num_arms),
                Policy::Thompson => self.select_thompson(draw.as_ref())?,
            };

            let context = draw
                .as_ref()
                .map(|d| d.contexts_per_arm[chosen_arm].clone());
            let population = draw.as_ref().map(|d| d.population);

            let reward = self
                .sampler
                .sample(chosen_arm, context.as_deref(), &mut self.rng)?;

            let obs = Observation {
                arm: chosen_arm,
                reward,
                context,
                population,
            };
            self.history.push(obs.clone());
            self.model.update(&mut self.state, &obs)?;

            let best = self
                .sampler
                .best_expected_reward(draw.as_ref().map(|d| d.contexts_per_arm.as_slice()))?;
            let chosen = self
                .sampler
                .expected_reward(chosen_arm, obs.context.as_deref())?;

            trace.push(TraceEntry {
                step,
                chosen_arm,
                posterior: self.state.clone(),
                regret: best - chosen,
            });
        }

        Ok(trace)
    }

    /// One joint posterior sample, scored per arm; first-occurrence argmax
    /// (lowest index wins ties).
    fn select_thompson(&mut self, draw: Option<&ContextDraw>) -> Result<usize, SimError> {
        let sample = self.model.sample_parameters(&self.state, &mut self.rng)?;
        let mut best_arm = 0;
        let mut best = f64::NEG_INFINITY;
        for arm in 0..self.num_arms {
            let ctx = draw.map(|d| d.contexts_per_arm[arm].as_slice());
            let population = draw.map(|d| d.population);
            let value = self.model.expected_reward(&sample, arm, ctx, population)?;
            if value > best {
                best = value;
                best_arm = arm;
            }
        }
        Ok(best_arm)
    }
}
