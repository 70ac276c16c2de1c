//! Temporal Z-score: where the last value of a series sits within that
//! series' own history. Used on ADX, not across entities.

/// `(last - mean) / sample_std` over the finite values of `values`.
///
/// NaN entries (indicator warm-up) are ignored. Returns 0.0 when fewer than
/// two finite values exist, when the last entry is not finite, or when the
/// finite values are all equal.
pub fn z_score(values: &[f64]) -> f64 {
    let Some(&last) = values.last() else {
        return 0.0;
    };
    if !last.is_finite() {
        return 0.0;
    }

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = finite.len();
    if n < 2 {
        return 0.0;
    }

    let (min, max) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min == max {
        return 0.0;
    }

    let mean = finite.iter().sum::<f64>() / n as f64;
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();

    // Rounding in the mean leaves a residual deviation on near-flat input.
    if !std.is_finite() || std <= f64::EPSILON * mean.abs().max(1.0) * n as f64 {
        return 0.0;
    }
    (last - mean) / std
}
