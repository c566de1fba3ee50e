//! End-to-end enumeration scenarios
//!
//! Each test writes a small program in continuation-passing style and checks
//! the exact posterior, the outcome order or the failure mode of the run.

use fugue::{addr, ChoiceValue};
use fugue_exact::prelude::*;

const EPS: f64 = 1e-12;

/// Count heads over `remaining` flips, recursing through a type-erased continuation
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

/// Flip until heads; `limit` caps the count when set
fn flips_until_heads<'a>(
    rt: &mut Runtime<'a, u32>,
    coin: &'a Distribution<bool>,
    flips: u32,
    limit: Option<u32>,
    k: Cont<'a, u32, u32>,
) -> Step {
    sample(rt, coin, move |rt, heads| {
        let flips = flips + 1;
        if heads || limit == Some(flips) {
            k.resume(rt, flips)
        } else {
            flips_until_heads(rt, coin, flips, limit, k)
        }
    })
}

/// Product of two rolls, keeping only even first rolls
fn even_first_product<'a>(
    rt: &mut Runtime<'a, i64>,
    exit: Exit<i64>,
    die: &'a Distribution<i64>,
) -> Step {
    sample(rt, die, move |rt, a| {
        condition(rt, a % 2 == 0, move |rt, ()| {
            sample(rt, die, move |rt, b| exit.resume(rt, a * b))
        })
    })
}

#[test]
fn three_flips_match_binomial() {
    let coin = &bernoulli(0.5).unwrap();
    let posterior = infer(|rt, exit| {
        count_heads(rt, coin, 3, 0, Cont::new(move |rt, n| exit.resume(rt, n)))
    })
    .unwrap();

    let expected = binomial(3, 0.5).unwrap();
    assert_eq!(posterior.len(), 4);
    for k in 0..=3u64 {
        assert!((posterior.probability(&k) - expected.probability(&k)).abs() < EPS);
    }
    assert!((posterior.probability(&1) - 0.375).abs() < EPS);
    assert!(posterior.log_evidence().abs() < EPS);
}

#[test]
fn no_effects_yield_point_mass() {
    let outcomes = explore(|rt, exit| exit.resume(rt, "done")).unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].log_weight, 0.0);

    let posterior = infer(|rt, exit| exit.resume(rt, "done")).unwrap();
    assert_eq!(posterior.probability(&"done"), 1.0);
}

#[test]
fn every_path_impossible_is_empty_posterior() {
    let die = &uniform_range(1..7).unwrap();
    let err = infer(|rt, exit| {
        sample(rt, die, move |rt, face| {
            factor(rt, f64::NEG_INFINITY, move |rt, ()| exit.resume(rt, face))
        })
    })
    .unwrap_err();
    assert_eq!(err, InferenceError::EmptyPosterior);
}

#[test]
fn burglary_alarm_posterior() {
    let burglary = &bernoulli(0.001).unwrap();
    let earthquake = &bernoulli(0.002).unwrap();
    let alarm_given = |b: bool, e: bool| match (b, e) {
        (true, true) => 0.95,
        (true, false) => 0.94,
        (false, true) => 0.29,
        (false, false) => 0.001,
    };

    let posterior = infer(|rt, exit| {
        sample(rt, burglary, move |rt, b| {
            sample(rt, earthquake, move |rt, e| {
                let alarm = bernoulli(alarm_given(b, e))?;
                observe(rt, &alarm, &true, move |rt, ()| exit.resume(rt, b))
            })
        })
    })
    .unwrap();

    let joint = |b: bool, e: bool| {
        burglary.probability(&b) * earthquake.probability(&e) * alarm_given(b, e)
    };
    let with_burglary = joint(true, true) + joint(true, false);
    let evidence = with_burglary + joint(false, true) + joint(false, false);

    assert!((posterior.probability(&true) - with_burglary / evidence).abs() < 1e-9);
    assert!((posterior.log_evidence() - evidence.ln()).abs() < 1e-9);
    assert_eq!(posterior.mode(), Some(&false));
}

#[test]
fn coin_bias_from_observations() {
    let bias = &uniform(vec![0.25_f64, 0.5, 0.75]).unwrap();
    let data = [true, true, false, true];

    let posterior = infer(|rt, exit| {
        sample(rt, bias, move |rt, p| {
            let heads = data.iter().filter(|d| **d).count() as f64;
            let tails = data.len() as f64 - heads;
            factor(rt, heads * p.ln() + tails * (1.0 - p).ln(), move |rt, ()| {
                exit.resume(rt, p)
            })
        })
    })
    .unwrap();

    let likelihood = |p: f64| p.powi(3) * (1.0 - p);
    let total: f64 = [0.25, 0.5, 0.75].iter().map(|p| likelihood(*p)).sum();
    for p in [0.25, 0.5, 0.75] {
        assert!((posterior.probability(&p) - likelihood(p) / total).abs() < 1e-9);
    }
    assert_eq!(posterior.mode(), Some(&0.75));
}

#[test]
fn large_factors_keep_mass_normalized() {
    let coin = &bernoulli(0.5).unwrap();
    for log_weight in [-1e17_f64, 1e17] {
        let posterior = infer(|rt, exit| {
            sample(rt, coin, move |rt, h| {
                factor(rt, log_weight, move |rt, ()| exit.resume(rt, h))
            })
        })
        .unwrap();

        assert!((posterior.total_mass() - 1.0).abs() < 1e-12);
        assert!((posterior.probability(&true) - 0.5).abs() < 1e-12);
        assert!((posterior.log_evidence() - log_weight).abs() <= log_weight.abs() * 1e-15);
    }
}

#[test]
fn condition_restricts_support() {
    let die = &uniform_range(1..7).unwrap();
    let posterior = infer(|rt, exit| {
        sample(rt, die, move |rt, a| {
            sample(rt, die, move |rt, b| {
                condition(rt, a + b == 7, move |rt, ()| exit.resume(rt, a))
            })
        })
    })
    .unwrap();

    assert_eq!(posterior.len(), 6);
    for face in 1..7 {
        assert!((posterior.probability(&face) - 1.0 / 6.0).abs() < EPS);
    }
    assert!((posterior.log_evidence() - (1.0_f64 / 6.0).ln()).abs() < EPS);
}

#[test]
fn prune_and_record_agree() {
    let die = &uniform_range(1..5).unwrap();
    let pruned = Enumerate::new()
        .run(|rt, exit| even_first_product(rt, exit, die))
        .unwrap();
    let recorded = Enumerate::builder()
        .impossible_paths(ImpossiblePathPolicy::Record)
        .build()
        .unwrap()
        .run(|rt, exit| even_first_product(rt, exit, die))
        .unwrap();

    assert_eq!(pruned.stats.pruned_paths, 2);
    assert_eq!(recorded.outcomes.len(), 8 + 2 * 4);
    assert_eq!(pruned.posterior().unwrap(), recorded.posterior().unwrap());
}

#[test]
fn truncated_geometric_by_recursion() {
    let coin = &bernoulli(0.5).unwrap();
    let posterior = infer(|rt, exit| {
        flips_until_heads(rt, coin, 0, Some(5), Cont::new(move |rt, n| exit.resume(rt, n)))
    })
    .unwrap();

    for n in 1..5 {
        assert!((posterior.probability(&n) - 0.5_f64.powi(n as i32)).abs() < EPS);
    }
    assert!((posterior.probability(&5) - 0.5_f64.powi(4)).abs() < EPS);
    assert!((posterior.total_mass() - 1.0).abs() < EPS);
}

#[test]
fn unbounded_recursion_hits_depth_budget() {
    let coin = &bernoulli(0.5).unwrap();
    let err = Enumerate::builder()
        .max_depth(20)
        .build()
        .unwrap()
        .run(|rt, exit| {
            flips_until_heads(rt, coin, 0, None, Cont::new(move |rt, n| exit.resume(rt, n)))
        })
        .unwrap_err();

    match err {
        InferenceError::BudgetExceeded { reason, state } => {
            assert_eq!(reason, "Maximum path depth exceeded");
            assert_eq!(state.depth, 21);
            assert_eq!(state.paths, 20);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn many_paths_keep_stack_bounded() {
    let coin = &bernoulli(0.5).unwrap();
    let exploration = Enumerate::new()
        .run(|rt, exit| {
            count_heads(rt, coin, 16, 0, Cont::new(move |rt, n| exit.resume(rt, n)))
        })
        .unwrap();

    assert_eq!(exploration.outcomes.len(), 1 << 16);
    assert_eq!(exploration.stats.max_depth, 16);
    assert_eq!(exploration.stats.max_pending, 16);
    assert!(exploration.stats.is_balanced());

    let posterior = exploration.posterior().unwrap();
    let expected = binomial(16, 0.5).unwrap();
    for k in 0..=16u64 {
        assert!((posterior.probability(&k) - expected.probability(&k)).abs() < 1e-9);
    }
}

#[test]
fn traces_record_choice_indices() {
    let color = &uniform(vec!["red", "green", "blue"]).unwrap();
    let coin = &bernoulli(0.25).unwrap();
    let outcomes = Enumerate::builder()
        .record_traces(true)
        .build()
        .unwrap()
        .run(|rt, exit| {
            sample(rt, color, move |rt, c| {
                sample(rt, coin, move |rt, h| exit.resume(rt, (c, h)))
            })
        })
        .unwrap()
        .into_outcomes();

    assert_eq!(outcomes.len(), 6);
    let first = &outcomes[0];
    assert_eq!(first.value, ("blue", true));

    let trace = first.trace.as_ref().unwrap();
    assert_eq!(trace.choices.len(), 2);
    let color_choice = &trace.choices[&addr!("sample", 0)];
    assert!(matches!(color_choice.value, ChoiceValue::Usize(2)));
    assert!((color_choice.logp - (1.0_f64 / 3.0).ln()).abs() < EPS);
    let coin_choice = &trace.choices[&addr!("sample", 1)];
    assert!(matches!(coin_choice.value, ChoiceValue::Usize(1)));

    // Resumed branches carry their own snapshot, not the previous path's
    let last = &outcomes[5];
    assert_eq!(last.value, ("red", false));
    let trace = last.trace.as_ref().unwrap();
    assert!(matches!(
        trace.choices[&addr!("sample", 0)].value,
        ChoiceValue::Usize(0)
    ));
    assert!(matches!(
        trace.choices[&addr!("sample", 1)].value,
        ChoiceValue::Usize(0)
    ));
}

#[test]
fn traces_off_by_default() {
    let coin = &bernoulli(0.5).unwrap();
    let outcomes = explore(|rt, exit| sample(rt, coin, move |rt, h| exit.resume(rt, h))).unwrap();
    assert!(outcomes.iter().all(|o| o.trace.is_none()));
}

#[test]
fn nested_inference_through_posterior() {
    let die = &uniform_range(1..4).unwrap();
    let inner = infer(|rt, exit| {
        sample(rt, die, move |rt, a| {
            sample(rt, die, move |rt, b| exit.resume(rt, a.max(b)))
        })
    })
    .unwrap();
    let max_of_two = &inner.to_distribution("max_of_two").unwrap();

    let outer = infer(|rt, exit| {
        sample(rt, max_of_two, move |rt, m| {
            condition(rt, m >= 2, move |rt, ()| exit.resume(rt, m))
        })
    })
    .unwrap();

    // max of two draws from 1..=3: P(1)=1/9, P(2)=3/9, P(3)=5/9
    assert!((outer.probability(&2) - 3.0 / 8.0).abs() < EPS);
    assert!((outer.probability(&3) - 5.0 / 8.0).abs() < EPS);
    assert!((outer.log_evidence() - (8.0_f64 / 9.0).ln()).abs() < EPS);
}

#[test]
fn domain_error_aborts_whole_run() {
    let die = &uniform_range(1..4).unwrap();
    let err = explore(|rt, exit| {
        sample(rt, die, move |rt, face| {
            // Only the last branch explored is malformed; earlier outcomes are discarded
            let p = if face == 1 { 2.0 } else { 0.5 };
            let coin = bernoulli(p)?;
            sample(rt, &coin, move |rt, h| exit.resume(rt, (face, h)))
        })
    })
    .unwrap_err();

    assert!(matches!(
        err,
        InferenceError::Domain(DomainError::InvalidParameter { .. })
    ));
}

#[test]
fn explorations_share_no_state() {
    let handles: Vec<_> = (1..=4u32)
        .map(|n| {
            std::thread::spawn(move || {
                let die = &uniform((0..n).collect::<Vec<_>>()).unwrap();
                infer(|rt, exit| sample(rt, die, move |rt, v| exit.resume(rt, v)))
                    .unwrap()
                    .len()
            })
        })
        .collect();

    let sizes: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(sizes, vec![1, 2, 3, 4]);
}

#[test]
fn config_from_json() {
    let config: ExploreConfig =
        serde_json::from_str(r#"{"max_paths": 3, "impossible_paths": "record"}"#).unwrap();
    let coin = &bernoulli(0.5).unwrap();
    let outcomes = Enumerate::from_config(config)
        .unwrap()
        .run(|rt, exit| {
            sample(rt, coin, move |rt, h| {
                condition(rt, h, move |rt, ()| exit.resume(rt, h))
            })
        })
        .unwrap()
        .into_outcomes();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[1].is_impossible());
}
