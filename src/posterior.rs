//! The conjugate-posterior capability shared by all belief models.
//!
//! A [`PosteriorModel`] is a stateless description of one conjugate-prior
//! algorithm: it knows how to validate a belief state, draw one joint sample
//! of reward-model parameters from it, score an arm under that sample, and
//! fold a new observation into it. The engine owns the state exclusively and
//! snapshots it (via `Clone`) into every trace entry, so later in-place
//! updates can never retroactively alter recorded history.
//!
//! New posterior families plug in by implementing this trait; the engine
//! never names a concrete model.

use rand::rngs::StdRng;
use std::fmt::Debug;

use crate::{Observation, SimError};

/// One conjugate-Bayesian posterior family.
pub trait PosteriorModel {
    /// Sufficient statistics of the current belief.
    type State: Clone + Debug;

    /// One joint draw of reward-model parameters covering all arms.
    type Sample;

    /// Check that `state` has the shape this model expects (per-arm
    /// dimension equal to the configured arm count, positive
    /// hyperparameters, consistent context dimensionality).
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` or `BadParameter` describing the first violation.
    fn validate(&self, state: &Self::State) -> Result<(), SimError>;

    /// Draw one sample of reward-model parameters from the belief.
    ///
    /// # Errors
    ///
    /// Numerical errors from the underlying distribution draws
    /// (`NonPositiveVariance`, `NotPositiveDefinite`).
    fn sample_parameters(
        &self,
        state: &Self::State,
        rng: &mut StdRng,
    ) -> Result<Self::Sample, SimError>;

    /// Expected reward of `arm` implied by `sample`, under the arm's context
    /// and/or population label where the family uses them.
    ///
    /// # Errors
    ///
    /// `MissingContext`, `ShapeMismatch`, or `PopulationOutOfRange` when the
    /// observation side-information disagrees with the model.
    fn expected_reward(
        &self,
        sample: &Self::Sample,
        arm: usize,
        context: Option<&[f64]>,
        population: Option<usize>,
    ) -> Result<f64, SimError>;

    /// Fold one observation into the belief, in place.
    ///
    /// The closed-form recursions here are order-dependent: callers must
    /// apply observations in the order they were made.
    ///
    /// # Errors
    ///
    /// Shape/population mismatches, or numerical failure of the recursion.
    fn update(&self, state: &mut Self::State, obs: &Observation) -> Result<(), SimError>;
}
