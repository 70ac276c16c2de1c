//! Price provider trait and structured fetch errors.
//!
//! The PriceProvider trait abstracts over data sources (CSV files, synthetic
//! data, wrapped caches) so the pipeline can swap implementations and tests
//! can mock them. Providers return validated, ascending `PriceSeries` values.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sectorlens_core::domain::{Bar, HistoryPeriod, Interval, PriceSeries, SeriesError};
use sectorlens_core::MIN_DATA_POINTS;

/// Structured error types for fetch operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("{symbol}: only {bars} bars in the window, need {required}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        required: usize,
    },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{symbol}: no response within {secs}s")]
    TimedOut { symbol: String, secs: u64 },

    #[error("invalid series: {0}")]
    Series(#[from] SeriesError),

    #[error("fetch pool error: {0}")]
    Pool(String),
}

/// What to fetch: granularity, how far back, and up to when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub interval: Interval,
    pub period: HistoryPeriod,
    /// Last calendar day included in the window.
    pub end: NaiveDate,
    pub min_data_points: usize,
}

impl FetchRequest {
    pub fn new(interval: Interval, period: HistoryPeriod, end: NaiveDate) -> Self {
        Self {
            interval,
            period,
            end,
            min_data_points: MIN_DATA_POINTS,
        }
    }

    /// First calendar day of the window.
    pub fn start(&self) -> NaiveDate {
        self.end - Duration::days(self.interval.fetch_window_days(self.period))
    }

    /// Inclusive timestamp bounds of the window.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.start().and_time(NaiveTime::MIN);
        let end = self.end.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::seconds(1);
        (start, end)
    }
}

/// Trait for price providers (CSV files, synthetic data, caches).
///
/// Implementations handle the specifics of one source. Caching sits above
/// this trait in [`crate::cache::CachedProvider`].
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the bar history for `symbol` over the request window.
    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<PriceSeries, FetchError>;
}

/// Turn raw bars into a request-conformant series.
///
/// Drops non-finite or inconsistent rows (high below low, non-positive
/// close), sorts, de-duplicates, aggregates to weekly bars when asked,
/// clips to the window, and enforces the minimum bar count.
pub fn finish_series(
    symbol: &str,
    bars: Vec<Bar>,
    request: &FetchRequest,
    source_interval: Interval,
) -> Result<PriceSeries, FetchError> {
    let (start, end) = request.bounds();
    let clean: Vec<Bar> = bars
        .into_iter()
        .filter(Bar::is_sane)
        .filter(|b| b.timestamp >= start && b.timestamp <= end)
        .collect();

    let series = PriceSeries::from_unsorted(symbol, clean);
    let series = if request.interval == Interval::Weekly && source_interval != Interval::Weekly {
        aggregate_weekly(&series)?
    } else {
        series
    };

    if series.len() < request.min_data_points {
        return Err(FetchError::InsufficientData {
            symbol: symbol.to_string(),
            bars: series.len(),
            required: request.min_data_points,
        });
    }
    Ok(series)
}

/// Roll finer bars up into Monday-stamped weekly bars.
pub fn aggregate_weekly(series: &PriceSeries) -> Result<PriceSeries, SeriesError> {
    let mut weeks: Vec<Bar> = Vec::new();
    for bar in series.bars() {
        let date = bar.timestamp.date();
        let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        let stamp = monday.and_time(NaiveTime::MIN);

        match weeks.last_mut() {
            Some(week) if week.timestamp == stamp => {
                week.high = week.high.max(bar.high);
                week.low = week.low.min(bar.low);
                week.close = bar.close;
                week.volume += bar.volume;
            }
            _ => weeks.push(Bar {
                timestamp: stamp,
                ..bar.clone()
            }),
        }
    }
    PriceSeries::new(series.entity_id(), weeks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn bar(ts: NaiveDateTime, close: f64) -> Bar {
        Bar {
            timestamp: ts,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100,
        }
    }

    #[test]
    fn window_bounds() {
        let req = FetchRequest::new(
            Interval::Daily,
            HistoryPeriod::OneYear,
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        );
        assert_eq!(req.start(), NaiveDate::from_ymd_opt(2023, 5, 27).unwrap());
        let (_, end) = req.bounds();
        assert_eq!(end.date(), req.end);
    }

    #[test]
    fn weekly_aggregation() {
        // 2024-03-04 is a Monday; 4th..8th are one week, 11th starts the next
        let bars = vec![
            bar(day(4), 10.0),
            bar(day(5), 12.0),
            bar(day(8), 11.0),
            bar(day(11), 15.0),
        ];
        let series = PriceSeries::new("X", bars).unwrap();
        let weekly = aggregate_weekly(&series).unwrap();

        assert_eq!(weekly.len(), 2);
        let first = &weekly.bars()[0];
        assert_eq!(first.timestamp, day(4));
        assert_eq!(first.open, 10.0);
        assert_eq!(first.high, 13.0);
        assert_eq!(first.low, 9.0);
        assert_eq!(first.close, 11.0);
        assert_eq!(first.volume, 300);
        assert_eq!(weekly.bars()[1].timestamp, day(11));
    }

    #[test]
    fn finish_series_enforces_minimum() {
        let mut req = FetchRequest::new(
            Interval::Daily,
            HistoryPeriod::OneYear,
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        req.min_data_points = 3;

        let mut bars = vec![bar(day(4), 10.0), bar(day(5), 11.0)];
        let err = finish_series("X", bars.clone(), &req, Interval::Daily).unwrap_err();
        assert_eq!(
            err,
            FetchError::InsufficientData {
                symbol: "X".into(),
                bars: 2,
                required: 3
            }
        );

        let mut broken = bar(day(6), 12.0);
        broken.close = f64::NAN;
        bars.push(broken);
        bars.push(bar(day(7), 13.0));
        let series = finish_series("X", bars, &req, Interval::Daily).unwrap();
        assert_eq!(series.len(), 3, "NaN row dropped");
    }

    #[test]
    fn finish_series_drops_inconsistent_rows() {
        let mut req = FetchRequest::new(
            Interval::Daily,
            HistoryPeriod::OneYear,
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        req.min_data_points = 1;

        let mut inverted = bar(day(5), 11.0);
        inverted.high = 9.0;
        let mut zero_close = bar(day(6), 0.0);
        zero_close.low = 0.0;

        let bars = vec![bar(day(4), 10.0), inverted, zero_close, bar(day(7), 12.0)];
        let series = finish_series("X", bars, &req, Interval::Daily).unwrap();
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, [10.0, 12.0]);
    }
}
