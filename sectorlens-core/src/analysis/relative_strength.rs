//! RS_Rating: cumulative out/under-performance against the benchmark, mapped
//! onto a 0–10 scale centred on 5.

use chrono::NaiveDateTime;

use crate::domain::{align_on_timestamps, PriceSeries};

/// Neutral rating used when there is nothing to compare.
pub const NEUTRAL_RS_RATING: f64 = 5.0;

/// Map a relative cumulative return onto 0..=10.
///
/// Each percentage point of outperformance adds 0.25.
pub fn rating_from_relative_perf(relative_perf: f64) -> f64 {
    (5.0 + relative_perf * 25.0).clamp(0.0, 10.0)
}

/// RS_Rating from two timestamped return series.
///
/// Returns are inner-joined on timestamp; fewer than two shared points, or a
/// non-finite cumulative return, yields `None`.
pub fn relative_strength_rating(
    entity_returns: &[(NaiveDateTime, f64)],
    benchmark_returns: &[(NaiveDateTime, f64)],
) -> Option<f64> {
    if entity_returns.len() < 2 || benchmark_returns.len() < 2 {
        return None;
    }

    let aligned = align_on_timestamps(entity_returns, benchmark_returns);
    if aligned.len() < 2 {
        return None;
    }

    let (entity_growth, benchmark_growth) = aligned
        .iter()
        .fold((1.0, 1.0), |(e, b), p| (e * (1.0 + p.left), b * (1.0 + p.right)));
    let relative_perf = (entity_growth - 1.0) - (benchmark_growth - 1.0);

    if !relative_perf.is_finite() {
        return None;
    }
    Some(rating_from_relative_perf(relative_perf))
}

/// RS_Rating of one series against the benchmark, using bar-to-bar returns.
pub fn rs_rating_for(series: &PriceSeries, benchmark: &PriceSeries) -> Option<f64> {
    relative_strength_rating(&series.pct_returns(), &benchmark.pct_returns())
}
