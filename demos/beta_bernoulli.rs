//! Minimal Thompson run: 2 Bernoulli arms with true means [0.4, 0.6] and
//! uniform Beta(1, 1) priors.
//!
//! ```sh
//! cargo run --example beta_bernoulli
//! ```

use banditsim::{BernoulliSampler, BetaBernoulli, Engine, Policy, SimError};

fn main() -> Result<(), SimError> {
    let sampler = BernoulliSampler::new(vec![0.4, 0.6])?;
    let model = BetaBernoulli::new(2)?;
    let mut engine = Engine::new(2, sampler, model, model.uniform_prior())?;

    let trace = engine.run(1000, Policy::Thompson, false)?;

    let last = trace.last().expect("non-empty trace");
    println!("final step:     {}", last.step);
    println!("chosen arm:     {}", last.chosen_arm);
    println!("regret:         {}", last.regret);
    for (arm, p) in last.posterior.iter().enumerate() {
        println!(
            "arm {arm}: Beta(a = {}, b = {}), posterior mean {:.3}",
            p.a,
            p.b,
            p.mean()
        );
    }

    let cumulative: f64 = trace.iter().map(|t| t.regret).sum();
    println!("cumulative regret over 1000 steps: {cumulative:.2}");
    Ok(())
}
