//! Burglary Alarm
//!
//! The classic Bayesian network: a burglary or an earthquake may set off an
//! alarm, and two neighbours may call when they hear it. Given that both
//! neighbours called, how likely is a burglary?
//!
//! Observations are encoded with `observe`, which re-weights each path by the
//! likelihood of the observed value.

use fugue_exact::prelude::*;

fn alarm_probability(burglary: bool, earthquake: bool) -> f64 {
    match (burglary, earthquake) {
        (true, true) => 0.95,
        (true, false) => 0.94,
        (false, true) => 0.29,
        (false, false) => 0.001,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Burglary Alarm ===\n");

    let burglary = &bernoulli(0.001)?;
    let earthquake = &bernoulli(0.002)?;

    let exploration = Enumerate::builder()
        .record_traces(true)
        .build()?
        .run(|rt, exit| {
            sample(rt, burglary, move |rt, b| {
                sample(rt, earthquake, move |rt, e| {
                    sample(rt, &bernoulli(alarm_probability(b, e))?, move |rt, alarm| {
                        let john = bernoulli(if alarm { 0.90 } else { 0.05 })?;
                        observe(rt, &john, &true, move |rt, ()| {
                            let mary = bernoulli(if alarm { 0.70 } else { 0.01 })?;
                            observe(rt, &mary, &true, move |rt, ()| exit.resume(rt, b))
                        })
                    })
                })
            })
        })?;

    println!("{}\n", exploration.stats.summary());
    for outcome in &exploration.outcomes {
        let choices = outcome.trace.as_ref().map_or(0, |t| t.choices.len());
        println!(
            "burglary={:<5} log_weight={:>10.4} choices={}",
            outcome.value, outcome.log_weight, choices
        );
    }

    let posterior = exploration.posterior()?;
    println!("\nP(burglary | john and mary call) = {:.6}", posterior.probability(&true));
    println!("log evidence = {:.6}", posterior.log_evidence());

    Ok(())
}
