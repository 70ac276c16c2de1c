//! ADX: Average Directional Index (Wilder), with the directional lines.
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive bars
//! 2. Smooth +DM, -DM, and TR using Wilder smoothing (alpha = 1/period)
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR)
//! 4. -DI = 100 * smoothed(-DM) / smoothed(TR)
//! 5. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 6. ADX = Wilder-smoothed DX
//!
//! DI lines start at bar `period`; ADX starts at bar `2 * period - 1`.

use super::smoothing::{true_range, wilder_smooth};
use super::{latest_value, Indicator, IndicatorError};
use crate::domain::Bar;

/// One of the four lines produced by [`Adx::components`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdxLine {
    Adx,
    PlusDi,
    MinusDi,
    DiSpread,
}

impl AdxLine {
    pub fn label(self) -> &'static str {
        match self {
            AdxLine::Adx => "adx",
            AdxLine::PlusDi => "plus_di",
            AdxLine::MinusDi => "minus_di",
            AdxLine::DiSpread => "di_spread",
        }
    }
}

/// Full ADX output, each vector the same length as the input bars.
#[derive(Debug, Clone, Default)]
pub struct AdxSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
    pub di_spread: Vec<f64>,
    period: usize,
}

impl AdxSeries {
    pub fn line(&self, line: AdxLine) -> &[f64] {
        match line {
            AdxLine::Adx => &self.adx,
            AdxLine::PlusDi => &self.plus_di,
            AdxLine::MinusDi => &self.minus_di,
            AdxLine::DiSpread => &self.di_spread,
        }
    }

    /// Most recent value of one line.
    pub fn latest(&self, line: AdxLine) -> Result<f64, IndicatorError> {
        let required = match line {
            AdxLine::Adx => 2 * self.period,
            _ => self.period + 1,
        };
        let name = format!("{}_{}", line.label(), self.period);
        latest_value(&name, self.line(line), required)
    }
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    /// Periods below 1 are clamped to 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Compute ADX, +DI, -DI and DI spread in one pass.
    pub fn components(&self, bars: &[Bar]) -> AdxSeries {
        let n = bars.len();
        let mut series = AdxSeries {
            adx: vec![f64::NAN; n],
            plus_di: vec![f64::NAN; n],
            minus_di: vec![f64::NAN; n],
            di_spread: vec![f64::NAN; n],
            period: self.period,
        };

        if n < 2 {
            return series;
        }

        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];

        for i in 1..n {
            let (curr, prev) = (&bars[i], &bars[i - 1]);
            if curr.high.is_nan() || curr.low.is_nan() || prev.high.is_nan() || prev.low.is_nan() {
                continue;
            }

            let up_move = curr.high - prev.high;
            let down_move = prev.low - curr.low;

            plus_dm[i] = if up_move > down_move && up_move > 0.0 {
                up_move
            } else {
                0.0
            };
            minus_dm[i] = if down_move > up_move && down_move > 0.0 {
                down_move
            } else {
                0.0
            };
        }

        let smooth_tr = wilder_smooth(&true_range(bars), self.period);
        let smooth_plus_dm = wilder_smooth(&plus_dm, self.period);
        let smooth_minus_dm = wilder_smooth(&minus_dm, self.period);

        let mut dx = vec![f64::NAN; n];
        for i in 0..n {
            let tr = smooth_tr[i];
            if tr.is_nan() || smooth_plus_dm[i].is_nan() || smooth_minus_dm[i].is_nan() || tr == 0.0 {
                continue;
            }

            let plus_di = 100.0 * smooth_plus_dm[i] / tr;
            let minus_di = 100.0 * smooth_minus_dm[i] / tr;
            series.plus_di[i] = plus_di;
            series.minus_di[i] = minus_di;
            series.di_spread[i] = plus_di - minus_di;

            let di_sum = plus_di + minus_di;
            dx[i] = if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            };
        }

        series.adx = wilder_smooth(&dx, self.period);
        series
    }
}

impl Default for Adx {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        self.components(bars).adx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlcv_bars};

    fn choppy_bars() -> Vec<Bar> {
        make_ohlcv_bars(&[
            (100.0, 105.0, 95.0, 102.0, 1000),
            (102.0, 108.0, 100.0, 106.0, 1000),
            (106.0, 107.0, 98.0, 99.0, 1000),
            (99.0, 103.0, 97.0, 101.0, 1000),
            (101.0, 106.0, 100.0, 105.0, 1000),
            (105.0, 110.0, 103.0, 108.0, 1000),
            (108.0, 112.0, 106.0, 110.0, 1000),
            (110.0, 111.0, 104.0, 105.0, 1000),
            (105.0, 109.0, 103.0, 107.0, 1000),
            (107.0, 113.0, 105.0, 112.0, 1000),
        ])
    }

    #[test]
    fn adx_bounds() {
        let result = Adx::new(3).compute(&choppy_bars());
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "ADX out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn first_values_land_where_documented() {
        let series = Adx::new(3).components(&choppy_bars());
        assert!(series.plus_di[2].is_nan());
        assert!(!series.plus_di[3].is_nan());
        assert!(series.adx[4].is_nan());
        assert!(!series.adx[5].is_nan());
    }

    #[test]
    fn di_spread_is_difference() {
        let series = Adx::new(3).components(&choppy_bars());
        for i in 3..series.adx.len() {
            assert_approx(
                series.di_spread[i],
                series.plus_di[i] - series.minus_di[i],
                1e-12,
            );
        }
    }

    #[test]
    fn uptrend_has_positive_spread_and_elevated_adx() {
        let data: Vec<_> = (0..20)
            .map(|i| {
                let base = 100.0 + i as f64 * 5.0;
                (base - 1.0, base + 3.0, base - 3.0, base + 2.0, 1000)
            })
            .collect();
        let series = Adx::new(5).components(&make_ohlcv_bars(&data));

        let adx = series.latest(AdxLine::Adx).unwrap();
        assert!(adx > 10.0, "ADX should be elevated in strong trend, got {adx}");
        assert!(series.latest(AdxLine::DiSpread).unwrap() > 0.0);
        assert_approx(series.latest(AdxLine::MinusDi).unwrap(), 0.0, 1e-12);
    }

    #[test]
    fn adx_lookback() {
        assert_eq!(Adx::new(14).lookback(), 27);
        assert_eq!(Adx::default().period(), 14);
    }

    #[test]
    fn adx_too_few_bars() {
        let bars = make_ohlcv_bars(&[(100.0, 105.0, 95.0, 102.0, 1000)]);
        let series = Adx::new(3).components(&bars);
        assert!(series.adx.iter().all(|v| v.is_nan()));
        assert!(matches!(
            series.latest(AdxLine::Adx),
            Err(IndicatorError::InsufficientHistory { required: 6, .. })
        ));
    }
}
