//! Log-space numerics

/// Numerically stable `ln(sum(exp(x)))`.
///
/// Shifts by the maximum before exponentiating. Returns `-inf` for an empty
/// input or when every term is `-inf`.
pub fn log_sum_exp<I>(log_values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let values: Vec<f64> = log_values.into_iter().collect();

    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }

    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Normalize log-weights so their exponentials sum to one.
///
/// Returns the normalized log-weights together with the log normalizer.
/// Each weight is shifted by the maximum before the log-sum is subtracted,
/// so the result stays normalized even when `max + ln(sum)` rounds back to
/// `max`. Returns `None` when every weight is `-inf` or the input is empty.
pub fn log_normalize(log_weights: &[f64]) -> Option<(Vec<f64>, f64)> {
    let max = log_weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }

    let ln_sum = log_weights
        .iter()
        .map(|w| (w - max).exp())
        .sum::<f64>()
        .ln();
    let normalized = log_weights.iter().map(|w| (w - max) - ln_sum).collect();
    Some((normalized, max + ln_sum))
}
