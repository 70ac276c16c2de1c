//! Indicator library.
//!
//! Indicators are pure functions: bar history in, numeric series out. Leading
//! bars without enough history are `f64::NAN`. Reducing a series to its most
//! recent value goes through [`latest_value`], which turns "no value" into an
//! explicit [`IndicatorError`] instead of a silent NaN; the entity analyzer
//! decides which neutral default replaces it.
//!
//! Relative indicators (Mansfield RS) take a benchmark series as well and live
//! outside the single-series [`Indicator`] trait.

pub mod adx;
pub mod cmf;
pub mod mansfield;
pub mod rsi;
pub mod smoothing;
pub mod zscore;

pub use adx::{Adx, AdxLine, AdxSeries};
pub use cmf::Cmf;
pub use mansfield::{mansfield_rs, mansfield_rs_series};
pub use rsi::Rsi;
pub use smoothing::{rolling_mean, rolling_sum, true_range, wilder_smooth};
pub use zscore::z_score;

use crate::domain::Bar;
use thiserror::Error;

/// Why an indicator produced no usable value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("{indicator}: needs {required} bars, have {available}")]
    InsufficientHistory {
        indicator: String,
        required: usize,
        available: usize,
    },

    #[error("{indicator}: value at the most recent bar is undefined")]
    UndefinedAtLatest { indicator: String },

    #[error("{indicator}: series and benchmark share no timestamps")]
    AlignmentFailure { indicator: String },

    #[error("malformed input: {0}")]
    MalformedInput(String),
}

/// Trait for single-series indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `bars`; the first
/// `lookback()` values are `f64::NAN`.
///
/// # Look-ahead guard
/// No value at bar t may depend on bar t+1 or later, so truncating the input
/// and recomputing yields the same prefix. The trend replayer relies on this.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14", "cmf_20").
    fn name(&self) -> &str;

    /// Number of leading bars without a value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Value at the most recent bar.
    fn latest(&self, bars: &[Bar]) -> Result<f64, IndicatorError> {
        latest_value(self.name(), &self.compute(bars), self.lookback() + 1)
    }
}

/// Reduce a computed series to its last value.
///
/// An entirely undefined series is `InsufficientHistory`; a series that had
/// values earlier but none at the last bar is `UndefinedAtLatest`.
pub fn latest_value(name: &str, series: &[f64], required: usize) -> Result<f64, IndicatorError> {
    if series.iter().all(|v| !v.is_finite()) {
        return Err(IndicatorError::InsufficientHistory {
            indicator: name.to_string(),
            required,
            available: series.len(),
        });
    }
    match series.last() {
        Some(&v) if v.is_finite() => Ok(v),
        _ => Err(IndicatorError::UndefinedAtLatest {
            indicator: name.to_string(),
        }),
    }
}

/// Create synthetic daily bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Create daily bars from explicit (open, high, low, close, volume) tuples.
#[cfg(test)]
pub fn make_ohlcv_bars(data: &[(f64, f64, f64, f64, u64)]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close, volume))| Bar {
            timestamp: base + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
