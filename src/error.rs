//! Error taxonomy for the simulation core.
//!
//! Three families, none of them recoverable inside a run:
//!
//! - **Input validation**: bad policy name, zero arms, a posterior state whose
//!   per-arm shape disagrees with the configured arm count. Detected before
//!   any step executes.
//! - **Numerical**: a rank-one covariance update losing positive definiteness,
//!   or a variance draw coming back non-positive. Fatal for the step —
//!   retrying identical deterministic math cannot succeed, and substituting
//!   default values would silently corrupt the posterior.
//! - **Shape mismatch at use time**: a context vector whose length disagrees
//!   with the regression coefficients, or a population index the state does
//!   not cover. Configuration errors surfaced at score/update time.

use thiserror::Error;

/// Errors produced by the simulation engine and its posterior models.
#[derive(Debug, Error)]
pub enum SimError {
    /// Unknown selection policy name.
    #[error("unknown policy {0:?}: expected \"thompson\" or \"uniform\"")]
    InvalidPolicy(String),

    /// The engine requires at least one arm.
    #[error("invalid arm count {0}: must be >= 1")]
    InvalidArmCount(usize),

    /// An arm index outside `[0, num_arms)`.
    #[error("arm index {0} out of range")]
    InvalidArm(usize),

    /// A per-arm collection does not match the configured arm count, or a
    /// context vector does not match the model dimension.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// The observed population index is not covered by the posterior state.
    #[error("population index {population} out of range: state covers {populations} populations")]
    PopulationOutOfRange {
        population: usize,
        populations: usize,
    },

    /// A contextual model was asked to score or update without a context.
    ///
    /// "No context" is an explicit `None`, never an empty vector: the two are
    /// deliberately distinguishable.
    #[error("contextual operation requires a context, none was provided")]
    MissingContext,

    /// A hyperparameter or sampler parameter is non-finite or out of domain.
    #[error("bad parameter: {what}")]
    BadParameter { what: &'static str },

    /// A covariance matrix lost (or never had) positive definiteness.
    #[error("matrix is not positive definite")]
    NotPositiveDefinite,

    /// An inverse-gamma variance draw came back non-positive or non-finite.
    #[error("variance draw was non-positive or non-finite")]
    NonPositiveVariance,
}
