//! End-to-end simulation scenarios: full runs with statistical assertions.
//!
//! These mirror how the engine is actually driven: a true environment, a
//! conjugate belief, a thousand-ish steps, and loose (tolerance-bounded)
//! claims about what a working Thompson sampler must do.

use banditsim::{
    BernoulliSampler, BetaBernoulli, Engine, GatedShiftContext, LinearParams, LinearSampler,
    MultiPopulationNig, NormalInverseGamma, NormalLinear, Policy,
};

#[test]
fn thompson_learns_the_better_bernoulli_arm() {
    // True means [0.4, 0.6], Beta(1,1) priors, 1000 steps: a working sampler
    // must concentrate on arm 1 by the end. Statistical, not exact.
    let sampler = BernoulliSampler::new(vec![0.4, 0.6]).unwrap();
    let model = BetaBernoulli::new(2).unwrap();
    let mut engine = Engine::with_seed(2, sampler, model, model.uniform_prior(), 12345).unwrap();
    let trace = engine.run(1000, Policy::Thompson, false).unwrap();

    assert_eq!(trace.len(), 1000);
    let last = trace.last().unwrap();
    assert!(last.regret.is_finite());
    assert!(last.regret >= 0.0);

    let arm1_tail = trace[900..]
        .iter()
        .filter(|t| t.chosen_arm == 1)
        .count() as f64
        / 100.0;
    assert!(
        arm1_tail > 0.5,
        "expected arm 1 to dominate the last 100 steps, got frequency {arm1_tail}"
    );

    // Per-step regret is one of {0, 0.2} here, so cumulative regret of the
    // tail reflects how often the wrong arm was still pulled.
    let cumulative: f64 = trace.iter().map(|t| t.regret).sum();
    assert!(cumulative < 200.0, "cumulative regret {cumulative} too high");
}

#[test]
fn uniform_policy_frequencies_converge_to_half() {
    let sampler = BernoulliSampler::new(vec![0.4, 0.6]).unwrap();
    let model = BetaBernoulli::new(2).unwrap();
    let mut engine = Engine::with_seed(2, sampler, model, model.uniform_prior(), 7).unwrap();
    let trace = engine.run(100_000, Policy::Uniform, false).unwrap();

    let arm0 = trace.iter().filter(|t| t.chosen_arm == 0).count() as f64 / 100_000.0;
    // ~6-sigma band around 0.5 for n = 100k.
    assert!(
        (arm0 - 0.5).abs() < 0.01,
        "uniform arm-0 frequency {arm0} not near 0.5"
    );
}

#[test]
fn normal_linear_cmab_beats_uniform_on_the_gated_environment() {
    // Gated-shift environment: beta = [0.0, 0.3, -1.2], sigma = 0.5, two
    // populations gating the third coefficient.
    let beta = vec![0.0, 0.3, -1.2];
    let sigma = 0.5;

    let sampler = LinearSampler::new(2, beta.clone(), sigma, GatedShiftContext).unwrap();
    let model = NormalLinear::new(2, 3).unwrap();
    let prior = LinearParams::identity_prior(3, 0.2, 0.2).unwrap();
    let mut cmab = Engine::with_seed(2, sampler, model, prior, 5).unwrap();
    let cmab_trace = cmab.run(1000, Policy::Thompson, false).unwrap();

    let sampler = LinearSampler::new(2, beta, sigma, GatedShiftContext).unwrap();
    let model = NormalLinear::new(2, 3).unwrap();
    let prior = LinearParams::identity_prior(3, 0.2, 0.2).unwrap();
    let mut unif = Engine::with_seed(2, sampler, model, prior, 5).unwrap();
    let unif_trace = unif.run(1000, Policy::Uniform, false).unwrap();

    let cmab_regret: f64 = cmab_trace.iter().map(|t| t.regret).sum();
    let unif_regret: f64 = unif_trace.iter().map(|t| t.regret).sum();
    assert!(
        cmab_regret < unif_regret,
        "contextual Thompson ({cmab_regret}) should beat uniform ({unif_regret})"
    );

    // Wherever population 1 was drawn, arm 0 is the better arm
    // (0.0 > 0.3 - 1.2); the learned policy should reflect that late in
    // the run.
    let late = &cmab.history()[800..];
    let (mut right, mut total) = (0usize, 0usize);
    for obs in late {
        if obs.population == Some(1) {
            total += 1;
            if obs.arm == 0 {
                right += 1;
            }
        }
    }
    assert!(total > 0);
    assert!(
        right as f64 / total as f64 > 0.7,
        "population 1 should mostly route to arm 0 late in the run ({right}/{total})"
    );
}

#[test]
fn single_population_nig_runs_on_the_contextual_environment() {
    // The non-contextual NIG belief over a contextual environment: it cannot
    // exploit the populations, but the loop must still satisfy every trace
    // invariant.
    let sampler = LinearSampler::new(2, vec![0.0, 0.3, -1.2], 0.5, GatedShiftContext).unwrap();
    let model = NormalInverseGamma::new(2).unwrap();
    let mut engine = Engine::with_seed(2, sampler, model, model.weak_prior(), 21).unwrap();
    let trace = engine.run(500, Policy::Thompson, false).unwrap();

    assert_eq!(trace.len(), 500);
    for t in &trace {
        assert!(t.regret >= 0.0);
        assert!(t.regret.is_finite());
    }
    assert!(engine.history().iter().all(|o| o.context.is_some()));
}

#[test]
fn multi_population_nig_separates_the_populations() {
    let sampler = LinearSampler::new(2, vec![0.0, 0.3, -1.2], 0.5, GatedShiftContext).unwrap();
    let model = MultiPopulationNig::new(2, 2).unwrap();
    let mut engine = Engine::with_seed(2, sampler, model, model.weak_prior(), 99).unwrap();
    let trace = engine.run(1000, Policy::Thompson, false).unwrap();

    let last = trace.last().unwrap();
    // Every observation carried a population label, and each cell's lambda
    // growth accounts exactly for the pulls routed to it.
    for (p, arms) in last.posterior.iter().enumerate() {
        for (arm, cell) in arms.iter().enumerate() {
            let pulls = engine
                .history()
                .iter()
                .filter(|o| o.population == Some(p) && o.arm == arm)
                .count() as f64;
            assert!(
                (cell.lambda - (1.0 + pulls)).abs() < 1e-9,
                "population {p} arm {arm}: lambda {} vs pulls {pulls}",
                cell.lambda
            );
        }
    }

    // In population 1 the better arm is arm 0; late in the run the policy
    // should have figured that out.
    let late = &engine.history()[800..];
    let (mut right, mut total) = (0usize, 0usize);
    for obs in late {
        if obs.population == Some(1) {
            total += 1;
            if obs.arm == 0 {
                right += 1;
            }
        }
    }
    assert!(total > 0);
    assert!(
        right as f64 / total as f64 > 0.6,
        "population 1 should favor arm 0 ({right}/{total})"
    );
}
