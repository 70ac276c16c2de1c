//! Deterministic synthetic price data for demos and tests.
//!
//! Each symbol gets its own random walk seeded from the BLAKE3 hash of the
//! symbol, so the same symbol always produces the same bars.

use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sectorlens_core::domain::{Bar, Interval, PriceSeries};

use crate::csv_provider::write_series;
use crate::provider::{finish_series, FetchError, FetchRequest, PriceProvider};

/// Trading hours covered by hourly synthetic bars (09:00 .. 15:00 opens).
const HOURLY_OPENS: std::ops::RangeInclusive<u32> = 9..=15;

/// Generate a weekday-only random walk between `start` and `end` inclusive.
pub fn generate_bars(symbol: &str, start: NaiveDate, end: NaiveDate, interval: Interval) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = rng.gen_range(80.0..120.0_f64);
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        let stamps: Vec<_> = match interval {
            Interval::Hourly => HOURLY_OPENS
                .filter_map(|h| NaiveTime::from_hms_opt(h, 15, 0))
                .map(|t| current.and_time(t))
                .collect(),
            Interval::Daily | Interval::Weekly => vec![current.and_time(NaiveTime::MIN)],
        };
        let step = if interval == Interval::Hourly { 0.008 } else { 0.03 };

        for timestamp in stamps {
            let ret: f64 = rng.gen_range(-step..step);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }
        current += Duration::days(1);
    }
    bars
}

/// Provider that fabricates bars instead of reading them.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<PriceSeries, FetchError> {
        let source = match request.interval {
            Interval::Hourly => Interval::Hourly,
            Interval::Daily | Interval::Weekly => Interval::Daily,
        };
        let bars = generate_bars(symbol, request.start(), request.end, source);
        finish_series(symbol, bars, request, source)
    }
}

/// Write one synthetic daily CSV per symbol into `dir`, in the layout the
/// CSV provider reads. Returns the number of files written.
pub fn write_synthetic_csvs(
    dir: &Path,
    symbols: &[&str],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<usize, FetchError> {
    std::fs::create_dir_all(dir).map_err(|e| FetchError::Io(format!("{}: {e}", dir.display())))?;
    for symbol in symbols {
        let series = PriceSeries::new(*symbol, generate_bars(symbol, start, end, Interval::Daily))?;
        write_series(&dir.join(format!("{symbol}.csv")), &series)?;
    }
    Ok(symbols.len())
}
