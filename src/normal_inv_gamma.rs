//! Normal-Inverse-Gamma posterior for Gaussian rewards of unknown mean and
//! variance.
//!
//! Each arm `i` carries `(mu'_i, lambda_i, alpha_i, beta_i)`: the reward is
//! `N(mu_i, sigma_i^2)` with `(mu_i, sigma_i^2) ~ NIG(mu'_i, lambda_i,
//! alpha_i, beta_i)`. Sampling draws the variance from the inverse-gamma
//! marginal, then the mean conditionally; the conjugate update is a four-line
//! closed form over the pre-update values.
//!
//! Parameterization note: `beta` is the inverse-gamma **scale**, so the
//! precision `1/sigma^2` is `Gamma(shape = alpha, rate = beta)`. With
//! `rand_distr`'s scale-parameterized `Gamma`, that is
//! `Gamma::new(alpha, 1.0 / beta)` inverted. The distributional unit test
//! below pins this down via the inverse-gamma mean `beta / (alpha - 1)`.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Gamma, Normal};

use crate::{Observation, PosteriorModel, SimError};

/// `NIG(mu', lambda, alpha, beta)` belief over one arm's `(mu, sigma^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NigParams {
    /// Prior mean `mu'`.
    pub mu: f64,
    /// Pseudo-observation count `lambda` scaling the mean's precision.
    pub lambda: f64,
    /// Inverse-gamma shape.
    pub alpha: f64,
    /// Inverse-gamma scale.
    pub beta: f64,
}

impl NigParams {
    /// Weakly informative prior `NIG(0, 1, 0.1, 0.1)`.
    #[must_use]
    pub fn weak() -> Self {
        Self {
            mu: 0.0,
            lambda: 1.0,
            alpha: 0.1,
            beta: 0.1,
        }
    }

    pub(crate) fn check(&self) -> Result<(), SimError> {
        let ok = self.mu.is_finite()
            && self.lambda.is_finite()
            && self.alpha.is_finite()
            && self.beta.is_finite()
            && self.lambda > 0.0
            && self.alpha > 0.0
            && self.beta > 0.0;
        if ok {
            Ok(())
        } else {
            Err(SimError::BadParameter {
                what: "NIG parameters need finite mu and lambda, alpha, beta > 0",
            })
        }
    }

    /// Fold one reward into this belief (conjugate closed form).
    pub(crate) fn absorb(&mut self, reward: f64) {
        let prior = *self;
        self.mu = (prior.lambda * prior.mu + reward) / (prior.lambda + 1.0);
        self.lambda = prior.lambda + 1.0;
        self.alpha = prior.alpha + 0.5;
        self.beta = prior.beta
            + (prior.lambda * (reward - prior.mu).powi(2)) / (2.0 * (prior.lambda + 1.0));
    }

    /// One `(mu, sigma)` draw from this belief.
    pub(crate) fn draw(&self, rng: &mut StdRng) -> Result<NigDraw, SimError> {
        let sigma2 = sample_inverse_gamma(self.alpha, self.beta, rng)?;
        let sd = (sigma2 / self.lambda).sqrt();
        let dist = Normal::new(self.mu, sd).map_err(|_| SimError::NonPositiveVariance)?;
        Ok(NigDraw {
            mu: dist.sample(rng),
            sigma: sigma2.sqrt(),
        })
    }
}

/// One posterior draw of an arm's reward-model parameters.
#[derive(Debug, Clone, Copy)]
pub struct NigDraw {
    /// Sampled reward mean.
    pub mu: f64,
    /// Sampled reward standard deviation.
    pub sigma: f64,
}

/// Draw `sigma^2 ~ InvGamma(shape, scale)` as an inverted gamma variate.
///
/// # Errors
///
/// `NonPositiveVariance` if the draw is non-positive or non-finite.
pub(crate) fn sample_inverse_gamma(
    shape: f64,
    scale: f64,
    rng: &mut StdRng,
) -> Result<f64, SimError> {
    // InvGamma(shape, scale) == 1 / Gamma(shape, rate = scale).
    let dist = Gamma::new(shape, 1.0 / scale).map_err(|_| SimError::BadParameter {
        what: "inverse-gamma needs shape > 0 and scale > 0",
    })?;
    let precision = dist.sample(rng);
    let sigma2 = precision.recip();
    if !sigma2.is_finite() || sigma2 <= 0.0 {
        return Err(SimError::NonPositiveVariance);
    }
    Ok(sigma2)
}

/// Single-population Normal-Inverse-Gamma Thompson model.
#[derive(Debug, Clone, Copy)]
pub struct NormalInverseGamma {
    num_arms: usize,
}

impl NormalInverseGamma {
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

    /// The weakly informative `NIG(0, 1, 0.1, 0.1)` prior for every arm.
    #[must_use]
    pub fn weak_prior(&self) -> Vec<NigParams> {
        vec![NigParams::weak(); self.num_arms]
    }
}

impl PosteriorModel for NormalInverseGamma {
    type State = Vec<NigParams>;
    type Sample = Vec<NigDraw>;

    fn validate(&self, state: &Self::State) -> Result<(), SimError> {
        if state.len() != self.num_arms {
            return Err(SimError::ShapeMismatch {
                expected: self.num_arms,
                actual: state.len(),
            });
        }
        for p in state {
            p.check()?;
        }
        Ok(())
    }

    fn sample_parameters(
        &self,
        state: &Self::State,
        rng: &mut StdRng,
    ) -> Result<Self::Sample, SimError> {
        state.iter().map(|p| p.draw(rng)).collect()
    }

    fn expected_reward(
        &self,
        sample: &Self::Sample,
        arm: usize,
        _context: Option<&[f64]>,
        _population: Option<usize>,
    ) -> Result<f64, SimError> {
        sample
            .get(arm)
            .map(|d| d.mu)
            .ok_or(SimError::InvalidArm(arm))
    }

    fn update(&self, state: &mut Self::State, obs: &Observation) -> Result<(), SimError> {
        let p = state.get_mut(obs.arm).ok_or(SimError::InvalidArm(obs.arm))?;
        p.absorb(obs.reward);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn single_observation_matches_closed_form() {
        let model = NormalInverseGamma::new(1).unwrap();
        let mut state = vec![NigParams::weak()];
        let r = 2.0;
        model
            .update(
                &mut state,
                &Observation {
                    arm: 0,
                    reward: r,
                    context: None,
                    population: None,
                },
            )
            .unwrap();

        // Prior (mu'=0, lambda=1, alpha=0.1, beta=0.1):
        //   mu'    = (1*0 + 2) / 2      = 1.0
        //   lambda = 2.0
        //   alpha  = 0.6
        //   beta   = 0.1 + 1*(2-0)^2 / (2*2) = 1.1
        let p = state[0];
        assert!((p.mu - 1.0).abs() < 1e-12);
        assert!((p.lambda - 2.0).abs() < 1e-12);
        assert!((p.alpha - 0.6).abs() < 1e-12);
        assert!((p.beta - 1.1).abs() < 1e-12);
    }

    #[test]
    fn mean_concentrates_on_observed_average() {
        let mut p = NigParams::weak();
        for _ in 0..200 {
            p.absorb(3.0);
        }
        assert!((p.mu - 3.0).abs() < 0.05);
        assert!((p.lambda - 201.0).abs() < 1e-9);
    }

    #[test]
    fn inverse_gamma_mean_pins_parameterization() {
        // InvGamma(alpha, beta) has mean beta / (alpha - 1) for alpha > 1.
        let (alpha, beta) = (5.0, 8.0);
        let mut rng = StdRng::seed_from_u64(42);
        let n = 200_000;
        let mut sum = 0.0;
        for _ in 0..n {
            sum += sample_inverse_gamma(alpha, beta, &mut rng).unwrap();
        }
        let mean = sum / f64::from(n);
        let expected = beta / (alpha - 1.0);
        assert!(
            (mean - expected).abs() < 0.05,
            "empirical mean {mean} vs expected {expected}"
        );
    }

    #[test]
    fn sample_has_one_draw_per_arm() {
        let model = NormalInverseGamma::new(4).unwrap();
        let state = model.weak_prior();
        let mut rng = StdRng::seed_from_u64(9);
        let sample = model.sample_parameters(&state, &mut rng).unwrap();
        assert_eq!(sample.len(), 4);
        for d in &sample {
            assert!(d.sigma > 0.0);
            assert!(d.mu.is_finite());
        }
    }

    #[test]
    fn validate_rejects_bad_state() {
        let model = NormalInverseGamma::new(2).unwrap();
        assert!(model.validate(&vec![NigParams::weak(); 2]).is_ok());
        assert!(model.validate(&vec![NigParams::weak(); 1]).is_err());
        let mut bad = vec![NigParams::weak(); 2];
        bad[1].lambda = 0.0;
        assert!(matches!(
            model.validate(&bad),
            Err(SimError::BadParameter { .. })
        ));
    }
}
