//! Chaikin Money Flow (CMF).
//!
//! multiplier = ((close - low) - (high - close)) / (high - low), 0 when high == low
//! CMF = sum(multiplier * volume, period) / sum(volume, period)
//! Lookback: period - 1. A window with zero total volume reports 0.

use super::smoothing::rolling_sum;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Cmf {
    period: usize,
    name: String,
}

impl Cmf {
    /// Periods below 1 are clamped to 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("cmf_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Default for Cmf {
    fn default() -> Self {
        Self::new(20)
    }
}

/// Money flow multiplier for one bar, in [-1, 1] for sane bars.
pub fn money_flow_multiplier(bar: &Bar) -> f64 {
    let range = bar.high - bar.low;
    if range == 0.0 {
        return 0.0;
    }
    ((bar.close - bar.low) - (bar.high - bar.close)) / range
}

impl Indicator for Cmf {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let flow_volume: Vec<f64> = bars
            .iter()
            .map(|b| money_flow_multiplier(b) * b.volume as f64)
            .collect();
        let volume: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        let flow_sums = rolling_sum(&flow_volume, self.period);
        let volume_sums = rolling_sum(&volume, self.period);

        flow_sums
            .into_iter()
            .zip(volume_sums)
            .map(|(flow, vol)| match (flow.is_nan(), vol) {
                (true, _) => f64::NAN,
                (false, v) if v == 0.0 => 0.0,
                (false, v) => flow / v,
            })
            .collect()
    }
}
