//! PriceSeries: an ordered, read-only bar history for one entity.
//!
//! Invariant: bars are strictly ascending by timestamp. Gaps (non-trading
//! days) are allowed; duplicate or out-of-order timestamps are rejected at
//! construction. All transforms return new series; nothing mutates in place.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Bar;

/// Structural problems with a bar history.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("price series is empty")]
    Empty,

    #[error("bar {index} is earlier than its predecessor")]
    OutOfOrder { index: usize },

    #[error("duplicate timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: NaiveDateTime },

    #[error("bar {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    entity_id: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, validating timestamp order.
    ///
    /// An empty series is allowed here; the analyzer treats it as malformed.
    pub fn new(entity_id: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for i in 1..bars.len() {
            let prev = bars[i - 1].timestamp;
            let curr = bars[i].timestamp;
            if curr == prev {
                return Err(SeriesError::DuplicateTimestamp { timestamp: curr });
            }
            if curr < prev {
                return Err(SeriesError::OutOfOrder { index: i });
            }
        }
        Ok(Self {
            entity_id: entity_id.into(),
            bars,
        })
    }

    /// Sort and de-duplicate raw bars (keeping the last bar per timestamp),
    /// then build the series.
    pub fn from_unsorted(entity_id: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            entity_id: entity_id.into(),
            bars: deduped,
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Same bars under a different id (e.g. a display name instead of a ticker).
    pub fn with_entity_id(self, entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            bars: self.bars,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Check every bar for non-finite OHLC values.
    pub fn validate_finite(&self) -> Result<(), SeriesError> {
        if self.bars.is_empty() {
            return Err(SeriesError::Empty);
        }
        for (index, bar) in self.bars.iter().enumerate() {
            if let Some(field) = bar.non_finite_field() {
                return Err(SeriesError::NonFinite { index, field });
            }
        }
        Ok(())
    }

    /// Timestamped close prices.
    pub fn closes(&self) -> Vec<(NaiveDateTime, f64)> {
        self.bars.iter().map(|b| (b.timestamp, b.close)).collect()
    }

    /// Timestamped bar-to-bar simple returns. The first bar has no return and
    /// is dropped, as are returns against a zero previous close.
    pub fn pct_returns(&self) -> Vec<(NaiveDateTime, f64)> {
        self.bars
            .windows(2)
            .filter(|w| w[0].close != 0.0)
            .map(|w| (w[1].timestamp, w[1].close / w[0].close - 1.0))
            .filter(|(_, r)| r.is_finite())
            .collect()
    }

    /// Percentage change of the last close versus the previous close.
    ///
    /// 0.0 when there is no previous bar or the previous close is zero.
    pub fn pct_change(&self) -> f64 {
        let n = self.bars.len();
        if n < 2 {
            return 0.0;
        }
        let prev = self.bars[n - 2].close;
        let curr = self.bars[n - 1].close;
        if prev == 0.0 {
            0.0
        } else {
            (curr - prev) / prev * 100.0
        }
    }

    /// Point-in-time view: a new series holding only bars at or before `cutoff`.
    pub fn truncate_at(&self, cutoff: NaiveDateTime) -> PriceSeries {
        let end = self.bars.partition_point(|b| b.timestamp <= cutoff);
        PriceSeries {
            entity_id: self.entity_id.clone(),
            bars: self.bars[..end].to_vec(),
        }
    }

    /// Index of the last bar at or before `cutoff`.
    pub fn index_at(&self, cutoff: NaiveDateTime) -> Option<usize> {
        self.bars
            .partition_point(|b| b.timestamp <= cutoff)
            .checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn rejects_duplicate_timestamps() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        bars[2].timestamp = bars[1].timestamp;
        let err = PriceSeries::new("X", bars).unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateTimestamp { .. }));
    }

    #[test]
    fn rejects_out_of_order() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        bars.swap(0, 2);
        let err = PriceSeries::new("X", bars).unwrap_err();
        assert_eq!(err, SeriesError::OutOfOrder { index: 1 });
    }

    #[test]
    fn from_unsorted_sorts_and_dedupes() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        let mut dup = bars[1].clone();
        dup.close = 999.0;
        bars.push(dup);
        bars.reverse();
        let series = PriceSeries::from_unsorted("X", bars);
        assert_eq!(series.len(), 3);
        assert!(series.bars().windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn pct_change_uses_last_two_closes() {
        let series = PriceSeries::new("X", make_bars(&[100.0, 110.0])).unwrap();
        assert!((series.pct_change() - 10.0).abs() < 1e-12);

        let single = PriceSeries::new("X", make_bars(&[100.0])).unwrap();
        assert_eq!(single.pct_change(), 0.0);
    }

    #[test]
    fn pct_returns_drop_first_bar() {
        let series = PriceSeries::new("X", make_bars(&[100.0, 110.0, 99.0])).unwrap();
        let returns = series.pct_returns();
        assert_eq!(returns.len(), 2);
        assert!((returns[0].1 - 0.10).abs() < 1e-12);
        assert!((returns[1].1 + 0.10).abs() < 1e-12);
        assert_eq!(returns[0].0, series.bars()[1].timestamp);
    }

    #[test]
    fn truncate_at_is_inclusive() {
        let series = PriceSeries::new("X", make_bars(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        let cutoff = series.bars()[1].timestamp;
        let cut = series.truncate_at(cutoff);
        assert_eq!(cut.len(), 2);
        assert_eq!(cut.last().unwrap().close, 2.0);
        assert_eq!(series.len(), 4, "original series untouched");
        assert_eq!(series.index_at(cutoff), Some(1));
    }

    #[test]
    fn validate_finite_flags_nan_close() {
        let mut bars = make_bars(&[1.0, 2.0]);
        bars[1].close = f64::NAN;
        let series = PriceSeries::new("X", bars).unwrap();
        assert_eq!(
            series.validate_finite(),
            Err(SeriesError::NonFinite {
                index: 1,
                field: "close"
            })
        );
        let empty = PriceSeries::new("X", Vec::new()).unwrap();
        assert_eq!(empty.validate_finite(), Err(SeriesError::Empty));
    }
}
