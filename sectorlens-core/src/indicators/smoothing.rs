//! Shared building blocks: true range, Wilder smoothing and rolling windows.

use crate::domain::Bar;

/// Compute the True Range series from bars.
///
/// TR[0] is NaN (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];

    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            continue;
        }
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }

    tr
}

/// Apply Wilder smoothing to a series: an EMA with alpha = 1/period, seeded
/// by the simple mean of the first `period` consecutive valid values.
///
/// Leading NaNs are skipped when locating the seed window. A NaN after the
/// seed poisons everything from that point on.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let Some(seed_start) = (0..=n - period).find(|&i| values[i..i + period].iter().all(|v| !v.is_nan()))
    else {
        return result;
    };
    let seed_end = seed_start + period;

    let seed = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;

    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}

/// Rolling sum over a trailing window. Windows containing NaN are NaN.
pub fn rolling_sum(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().sum();
    }

    result
}

/// Simple moving average over a trailing window.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling_sum(values, period)
        .into_iter()
        .map(|s| s / period as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlcv_bars, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        let bars = make_ohlcv_bars(&[
            (100.0, 105.0, 95.0, 102.0, 0),  // no previous close
            (102.0, 108.0, 100.0, 106.0, 0), // TR = max(8, |108-102|, |100-102|) = 8
            (106.0, 107.0, 98.0, 99.0, 0),   // TR = max(9, |107-106|, |98-106|) = 9
        ]);
        let tr = true_range(&bars);
        assert!(tr[0].is_nan());
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bars = make_ohlcv_bars(&[
            (98.0, 102.0, 97.0, 100.0, 0),
            (110.0, 115.0, 108.0, 112.0, 0), // TR = max(7, |115-100|, |108-100|) = 15
        ]);
        assert_approx(true_range(&bars)[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_seed_then_smooth() {
        // seed skips the leading NaN: mean(8, 9, 6) = 23/3
        // next = (1/3)*6 + (2/3)*(23/3) = 64/9
        let values = [f64::NAN, 8.0, 9.0, 6.0, 6.0];
        let result = wilder_smooth(&values, 3);
        assert!(result[..3].iter().all(|v| v.is_nan()));
        assert_approx(result[3], 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_too_short() {
        assert!(wilder_smooth(&[1.0, 2.0], 3).iter().all(|v| v.is_nan()));
        assert!(wilder_smooth(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_sum_and_mean() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let sums = rolling_sum(&values, 2);
        assert!(sums[0].is_nan());
        assert_approx(sums[1], 3.0, DEFAULT_EPSILON);
        assert_approx(sums[3], 7.0, DEFAULT_EPSILON);

        let means = rolling_mean(&values, 4);
        assert_approx(means[3], 2.5, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_window_with_nan() {
        let values = [1.0, f64::NAN, 3.0, 4.0];
        let sums = rolling_sum(&values, 2);
        assert!(sums[1].is_nan());
        assert!(sums[2].is_nan());
        assert_approx(sums[3], 7.0, DEFAULT_EPSILON);
    }
}
