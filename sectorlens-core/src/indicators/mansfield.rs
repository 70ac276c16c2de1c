//! Mansfield relative strength.
//!
//! ratio = close(entity) / close(benchmark) on shared timestamps
//! MRS = (ratio / SMA(ratio, period) - 1) * 10
//!
//! Positive values mean the entity is outperforming the benchmark relative to
//! its own recent norm.

use chrono::NaiveDateTime;

use super::smoothing::rolling_mean;
use super::{latest_value, IndicatorError};
use crate::domain::{align_on_timestamps, PriceSeries};

/// Neutral Mansfield RS reported when the ratio cannot be computed.
pub const NEUTRAL_MANSFIELD: f64 = 0.0;

/// Full Mansfield RS series on the timestamps shared by both inputs.
///
/// Leading points without a full moving-average window are NaN. Fails only
/// when the two series have no timestamp in common.
pub fn mansfield_rs_series(
    series: &PriceSeries,
    benchmark: &PriceSeries,
    period: usize,
) -> Result<Vec<(NaiveDateTime, f64)>, IndicatorError> {
    let aligned = align_on_timestamps(&series.closes(), &benchmark.closes());
    if aligned.is_empty() {
        return Err(IndicatorError::AlignmentFailure {
            indicator: format!("mansfield_rs_{period}"),
        });
    }

    let ratio: Vec<f64> = aligned
        .iter()
        .map(|p| {
            if p.right == 0.0 {
                f64::NAN
            } else {
                p.left / p.right
            }
        })
        .collect();
    let ratio_ma = rolling_mean(&ratio, period.max(1));

    Ok(aligned
        .iter()
        .zip(ratio.iter().zip(ratio_ma))
        .map(|(p, (&r, ma))| {
            let value = if ma == 0.0 || ma.is_nan() {
                f64::NAN
            } else {
                (r / ma - 1.0) * 10.0
            };
            (p.timestamp, value)
        })
        .collect())
}

/// Mansfield RS at the most recent shared timestamp.
pub fn mansfield_rs(
    series: &PriceSeries,
    benchmark: &PriceSeries,
    period: usize,
) -> Result<f64, IndicatorError> {
    let values: Vec<f64> = mansfield_rs_series(series, benchmark, period)?
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    latest_value(&format!("mansfield_rs_{period}"), &values, period)
}
