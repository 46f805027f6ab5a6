//! Normal-linear regression posterior: Bayesian linear regression with a
//! Normal-Inverse-Gamma prior, shared across arms.
//!
//! Reward model: `R ~ N(beta . context, sigma^2)` with
//! `beta | sigma^2 ~ N(beta', sigma^2 B)` and `sigma^2 ~ InvGamma(a/2, b/2)`.
//! Arms differ only through their context vectors, so the belief is a single
//! `(beta', B, a, b)` tuple rather than a per-arm table.
//!
//! The state carries both the covariance factor `B` and its inverse: the
//! precision recursion `B^{-1} <- B^{-1} + c c^T` is an exact rank-one
//! accumulate, and the covariance side follows by Sherman-Morrison, so no
//! full inversion happens on the update path. A denominator collapse in the
//! Sherman-Morrison step surfaces as [`SimError::NotPositiveDefinite`]
//! rather than being patched over.

use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use crate::linalg::{cholesky, dot, invert_spd, mat_vec, outer_add, quad_form, sherman_morrison};
use crate::normal_inv_gamma::sample_inverse_gamma;
use crate::{Observation, PosteriorModel, SimError};

/// `(beta', B, B^{-1}, a, b)` belief shared across all arms.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearParams {
    /// Posterior mean coefficients `beta'`.
    pub beta: Vec<f64>,
    /// Covariance factor `B` (row-major, `dim x dim`).
    pub cov: Vec<f64>,
    /// Precision factor `B^{-1}` (row-major, `dim x dim`).
    pub prec: Vec<f64>,
    /// Inverse-gamma shape numerator (`sigma^2 ~ InvGamma(a/2, b/2)`).
    pub a: f64,
    /// Inverse-gamma scale numerator.
    pub b: f64,
}

impl LinearParams {
    /// Build a state from `beta'`, `B`, `a`, `b`, deriving `B^{-1}`.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if `cov` is not `dim x dim` for `dim = beta.len()`;
    /// `NotPositiveDefinite` if `B` cannot be Cholesky-factorized;
    /// `BadParameter` on non-positive `a` or `b`.
    pub fn new(beta: Vec<f64>, cov: Vec<f64>, a: f64, b: f64) -> Result<Self, SimError> {
        let dim = beta.len();
        if dim == 0 {
            return Err(SimError::BadParameter {
                what: "linear model needs at least one coefficient",
            });
        }
        if cov.len() != dim * dim {
            return Err(SimError::ShapeMismatch {
                expected: dim * dim,
                actual: cov.len(),
            });
        }
        if !a.is_finite() || !b.is_finite() || a <= 0.0 || b <= 0.0 {
            return Err(SimError::BadParameter {
                what: "linear model needs a > 0 and b > 0",
            });
        }
        let prec = invert_spd(&cov, dim)?;
        Ok(Self {
            beta,
            cov,
            prec,
            a,
            b,
        })
    }

    /// Zero-mean prior with identity covariance: `beta' = 0`, `B = I`.
    ///
    /// # Errors
    ///
    /// `BadParameter` on zero dimension or non-positive `a`/`b`.
    pub fn identity_prior(dim: usize, a: f64, b: f64) -> Result<Self, SimError> {
        let mut cov = vec![0.0; dim * dim];
        for i in 0..dim {
            cov[i * dim + i] = 1.0;
        }
        Self::new(vec![0.0; dim], cov, a, b)
    }

    /// Coefficient dimensionality.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.beta.len()
    }
}

/// One posterior draw of the shared regression parameters.
#[derive(Debug, Clone)]
pub struct LinearDraw {
    /// Sampled coefficient vector.
    pub beta: Vec<f64>,
    /// Sampled noise variance.
    pub sigma2: f64,
}

/// Normal-linear contextual Thompson model.
#[derive(Debug, Clone, Copy)]
pub struct NormalLinear {
    num_arms: usize,
    dim: usize,
}

impl NormalLinear {
    /// Create a model for `num_arms` arms and `dim`-dimensional contexts.
    ///
    /// # Errors
    ///
    /// `InvalidArmCount` when `num_arms == 0`; `BadParameter` when `dim == 0`.
    pub fn new(num_arms: usize, dim: usize) -> Result<Self, SimError> {
        if num_arms == 0 {
            return Err(SimError::InvalidArmCount(0));
        }
        if dim == 0 {
            return Err(SimError::BadParameter {
                what: "linear model needs dim >= 1",
            });
        }
        Ok(Self { num_arms, dim })
    }

    fn check_context<'c>(&self, context: Option<&'c [f64]>) -> Result<&'c [f64], SimError> {
        let c = context.ok_or(SimError::MissingContext)?;
        if c.len() != self.dim {
            return Err(SimError::ShapeMismatch {
                expected: self.dim,
                actual: c.len(),
            });
        }
        Ok(c)
    }
}

impl PosteriorModel for NormalLinear {
    type State = LinearParams;
    type Sample = LinearDraw;

    fn validate(&self, state: &Self::State) -> Result<(), SimError> {
        if state.dim() != self.dim {
            return Err(SimError::ShapeMismatch {
                expected: self.dim,
                actual: state.dim(),
            });
        }
        if state.cov.len() != self.dim * self.dim || state.prec.len() != self.dim * self.dim {
            return Err(SimError::ShapeMismatch {
                expected: self.dim * self.dim,
                actual: state.cov.len().max(state.prec.len()),
            });
        }
        if !state.a.is_finite() || !state.b.is_finite() || state.a <= 0.0 || state.b <= 0.0 {
            return Err(SimError::BadParameter {
                what: "linear model needs a > 0 and b > 0",
            });
        }
        if state.beta.iter().any(|x| !x.is_finite()) {
            return Err(SimError::BadParameter {
                what: "linear model coefficients must be finite",
            });
        }
        // The covariance must still be in the positive definite cone.
        cholesky(&state.cov, self.dim).map(|_| ())
    }

    fn sample_parameters(
        &self,
        state: &Self::State,
        rng: &mut StdRng,
    ) -> Result<Self::Sample, SimError> {
        let d = self.dim;
        let sigma2 = sample_inverse_gamma(state.a * 0.5, state.b * 0.5, rng)?;
        // chol(sigma^2 B) = sigma * chol(B).
        let l = cholesky(&state.cov, d)?;
        let sigma = sigma2.sqrt();
        let z: Vec<f64> = (0..d).map(|_| StandardNormal.sample(rng)).collect();
        let mut beta = state.beta.clone();
        for i in 0..d {
            let mut s = 0.0;
            for j in 0..=i {
                s += l[i * d + j] * z[j];
            }
            beta[i] += sigma * s;
        }
        Ok(LinearDraw { beta, sigma2 })
    }

    fn expected_reward(
        &self,
        sample: &Self::Sample,
        arm: usize,
        context: Option<&[f64]>,
        _population: Option<usize>,
    ) -> Result<f64, SimError> {
        if arm >= self.num_arms {
            return Err(SimError::InvalidArm(arm));
        }
        let c = self.check_context(context)?;
        Ok(dot(&sample.beta, c))
    }

    fn update(&self, state: &mut Self::State, obs: &Observation) -> Result<(), SimError> {
        let d = self.dim;
        let c = self.check_context(obs.context.as_deref())?;
        let r = obs.reward;

        // post_B via Sherman-Morrison on the covariance side; the precision
        // side is the exact rank-one accumulate.
        let post_cov = sherman_morrison(&state.cov, d, c)?;
        let mut post_prec = state.prec.clone();
        outer_add(&mut post_prec, d, c);

        // post_beta' = post_B (B^{-1} beta' + c r).
        let mut rhs = mat_vec(&state.prec, d, &state.beta);
        for i in 0..d {
            rhs[i] += c[i] * r;
        }
        let post_beta = mat_vec(&post_cov, d, &rhs);

        // post_b = b + r^2 + beta'^T B^{-1} beta' - post_beta'^T post_B^{-1} post_beta'.
        let post_b = state.b + r * r + quad_form(&state.prec, d, &state.beta)
            - quad_form(&post_prec, d, &post_beta);
        if !post_b.is_finite() {
            return Err(SimError::NonPositiveVariance);
        }

        state.beta = post_beta;
        state.cov = post_cov;
        state.prec = post_prec;
        state.a += 1.0;
        state.b = post_b;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn obs(reward: f64, context: Vec<f64>) -> Observation {
        Observation {
            arm: 0,
            reward,
            context: Some(context),
            population: None,
        }
    }

    #[test]
    fn rank_one_update_matches_closed_form() {
        let model = NormalLinear::new(2, 3).unwrap();
        let mut state = LinearParams::identity_prior(3, 0.2, 0.2).unwrap();
        let r = 1.5;
        model.update(&mut state, &obs(r, vec![1.0, 0.0, 0.0])).unwrap();

        // With B = I and c = e1: post_B = diag(1/2, 1, 1),
        // post_beta' = [r/2, 0, 0], post_a = a+1,
        // post_b = b + r^2 + 0 - (r/2)^2 * 2 = b + r^2/2.
        let expect_cov = [0.5, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        for (got, want) in state.cov.iter().zip(expect_cov.iter()) {
            assert!((got - want).abs() < 1e-12);
        }
        assert!((state.beta[0] - r / 2.0).abs() < 1e-12);
        assert_eq!(state.beta[1], 0.0);
        assert_eq!(state.beta[2], 0.0);
        assert!((state.a - 1.2).abs() < 1e-12);
        assert!((state.b - (0.2 + r * r / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn covariance_stays_symmetric_positive_definite() {
        let model = NormalLinear::new(2, 3).unwrap();
        let mut state = LinearParams::identity_prior(3, 0.2, 0.2).unwrap();
        let contexts = [
            vec![1.0, 0.0, 0.0],
            vec![1.0, 1.0, 0.0],
            vec![1.0, 1.0, 1.0],
            vec![1.0, 0.5, -0.5],
        ];
        for (i, c) in contexts.iter().cycle().take(40).enumerate() {
            model
                .update(&mut state, &obs(0.1 * i as f64, c.clone()))
                .unwrap();
        }
        let d = 3;
        for i in 0..d {
            for j in 0..d {
                let diff = (state.cov[i * d + j] - state.cov[j * d + i]).abs();
                assert!(diff < 1e-9, "asymmetry at ({i},{j}): {diff}");
            }
        }
        assert!(cholesky(&state.cov, d).is_ok(), "cov must stay PD");
        assert!(state.b > 0.0);
    }

    #[test]
    fn posterior_mean_approaches_true_coefficients() {
        // Noise-free rewards from beta = [1, -2, 0.5]: the posterior mean
        // must converge onto the generating coefficients.
        let model = NormalLinear::new(2, 3).unwrap();
        let mut state = LinearParams::identity_prior(3, 0.2, 0.2).unwrap();
        let true_beta = [1.0, -2.0, 0.5];
        let contexts = [
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ];
        for c in contexts.iter().cycle().take(400) {
            let r = dot(&true_beta, c);
            model.update(&mut state, &obs(r, c.clone())).unwrap();
        }
        for (got, want) in state.beta.iter().zip(true_beta.iter()) {
            assert!((got - want).abs() < 0.05, "{got} vs {want}");
        }
    }

    #[test]
    fn context_shape_is_enforced() {
        let model = NormalLinear::new(2, 3).unwrap();
        let mut state = LinearParams::identity_prior(3, 0.2, 0.2).unwrap();
        assert!(matches!(
            model.update(&mut state, &obs(1.0, vec![1.0, 0.0])),
            Err(SimError::ShapeMismatch {
                expected: 3,
                actual: 2
            })
        ));
        let no_ctx = Observation {
            arm: 0,
            reward: 1.0,
            context: None,
            population: None,
        };
        assert!(matches!(
            model.update(&mut state, &no_ctx),
            Err(SimError::MissingContext)
        ));
    }

    #[test]
    fn sampled_beta_is_finite_and_dimensioned() {
        let model = NormalLinear::new(2, 3).unwrap();
        let state = LinearParams::identity_prior(3, 0.2, 0.2).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let draw = model.sample_parameters(&state, &mut rng).unwrap();
        assert_eq!(draw.beta.len(), 3);
        assert!(draw.sigma2 > 0.0);
        assert!(draw.beta.iter().all(|x| x.is_finite()));
        let c = [1.0, 1.0, 0.0];
        let r = model.expected_reward(&draw, 0, Some(&c), None).unwrap();
        assert!((r - (draw.beta[0] + draw.beta[1])).abs() < 1e-12);
    }
}
