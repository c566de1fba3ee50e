//! Binomial by Enumeration
//!
//! This example counts heads over a handful of biased coin flips by
//! enumerating every sequence of outcomes, then compares the exact posterior
//! against the closed-form binomial distribution.
//!
//! The flips are written as a recursive CPS function; the recursion goes
//! through `Cont` so the continuation type stays finite.

use fugue_exact::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const FLIPS: u32 = 10;
const BIAS: f64 = 0.3;

fn count_heads<'a>(
    rt: &mut Runtime<'a, u64>,
    coin: &'a Distribution<bool>,
    remaining: u32,
    heads: u64,
    k: Cont<'a, u64, u64>,
) -> Step {
    if remaining == 0 {
        return k.resume(rt, heads);
    }
    sample(rt, coin, move |rt, h| {
        count_heads(rt, coin, remaining - 1, heads + u64::from(h), k)
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Binomial by Enumeration ===\n");

    let coin = &bernoulli(BIAS)?;

    let exploration = Enumerate::builder()
        .max_paths(1 << 12)
        .build()?
        .run(|rt, exit| {
            count_heads(rt, coin, FLIPS, 0, Cont::new(move |rt, n| exit.resume(rt, n)))
        })?;
    println!("{}\n", exploration.stats.summary());

    let posterior = exploration.posterior()?;
    let exact = binomial(u64::from(FLIPS), BIAS)?;

    println!("{:>6} {:>12} {:>12}", "heads", "enumerated", "closed form");
    for k in 0..=u64::from(FLIPS) {
        println!(
            "{:>6} {:>12.6} {:>12.6}",
            k,
            posterior.probability(&k),
            exact.probability(&k)
        );
    }

    let mean = posterior.expectation(|k| *k as f64);
    println!("\nMean heads: {:.4} (expected {:.4})", mean, f64::from(FLIPS) * BIAS);

    // Posteriors are ordinary distributions once aggregated
    let mut rng = StdRng::seed_from_u64(42);
    let draws: Vec<u64> = (0..10).filter_map(|_| posterior.draw(&mut rng).copied()).collect();
    println!("Ten draws from the posterior: {:?}", draws);

    Ok(())
}
