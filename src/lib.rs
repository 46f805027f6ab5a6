//! `banditsim`: seedable Thompson-sampling simulation for multi-armed and
//! contextual bandits.
//!
//! You describe a hidden "true" reward process (a [`RewardSampler`]) and a
//! Bayesian belief over its parameters (a [`PosteriorModel`] plus its state);
//! the [`Engine`] repeatedly samples the belief, pulls the arm that looks
//! best under that one sample, observes a real reward, folds it back into
//! the belief, and records a trace entry with regret and a deep posterior
//! snapshot. Everything downstream — persistence, plotting, Monte-Carlo
//! aggregation — consumes the trace; none of it lives here.
//!
//! **Goals:**
//! - **Deterministic by default**: fixed seed 0 unless you pass one; the same
//!   construction arguments produce bit-identical traces. Argmax ties break
//!   to the lowest arm index.
//! - **Closed-form only**: all four posterior families are conjugate
//!   recursions; nothing iterates to convergence, so a step either succeeds
//!   exactly or fails loudly ([`SimError`]) — belief state is never patched
//!   with ad hoc values.
//! - **Explicit randomness**: one injectable `StdRng` per engine; samplers
//!   and models hold no random state, so parallel runs cannot interfere.
//! - **Small K**: arms are dense integer indices fixed at construction.
//!
//! **Posterior families:**
//! - [`BetaBernoulli`]: 0/1 rewards, independent `Beta(a, b)` per arm.
//! - [`NormalInverseGamma`]: Gaussian rewards of unknown mean and variance,
//!   independent `NIG` per arm.
//! - [`MultiPopulationNig`]: one independent `NIG` bandit per discrete
//!   population, selected by the context's population label.
//! - [`NormalLinear`]: Bayesian linear regression shared across arms; arms
//!   differ only through their feature vectors.
//!
//! **Environments:** [`BernoulliSampler`], [`NormalSampler`], and
//! [`LinearSampler`] (abstract over context generation via
//! [`ContextPolicy`]).
//!
//! **Non-goals:** no serving layer, no storage, no plotting, no intra-run
//! parallelism — one trajectory per `run`, strictly sequential because each
//! selection depends on the posterior after the previous update.
//!
//! # Example
//!
//! ```
//! use banditsim::{BernoulliSampler, BetaBernoulli, Engine, Policy};
//!
//! let sampler = BernoulliSampler::new(vec![0.4, 0.6])?;
//! let model = BetaBernoulli::new(2)?;
//! let prior = model.uniform_prior();
//! let mut engine = Engine::with_seed(2, sampler, model, prior, 7)?;
//! let trace = engine.run(200, Policy::Thompson, false)?;
//! assert_eq!(trace.len(), 200);
//! assert!(trace.iter().all(|t| t.regret >= 0.0));
//! # Ok::<(), banditsim::SimError>(())
//! ```

mod error;
pub use error::SimError;

pub mod linalg;

mod sampler;
pub use sampler::*;

mod posterior;
pub use posterior::PosteriorModel;

mod beta_bernoulli;
pub use beta_bernoulli::*;

mod normal_inv_gamma;
pub use normal_inv_gamma::{NigDraw, NigParams, NormalInverseGamma};

mod multi_population;
pub use multi_population::*;

mod normal_linear;
pub use normal_linear::*;

mod engine;
pub use engine::*;
