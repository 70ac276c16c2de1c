//! CSV-backed price provider.
//!
//! One file per symbol at `{dir}/{symbol}.csv` with the header
//! `timestamp,open,high,low,close,volume`. Timestamps are `YYYY-MM-DD` or
//! `YYYY-MM-DD HH:MM[:SS]`.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use sectorlens_core::domain::{Bar, Interval, PriceSeries};

use crate::provider::{finish_series, FetchError, FetchRequest, PriceProvider};

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, FetchError> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| FetchError::Parse(format!("unrecognized timestamp '{raw}'")))
}

/// Read every bar in a CSV file. Rows are returned in file order.
pub fn read_bars(path: &Path) -> Result<Vec<Bar>, FetchError> {
    let file = File::open(path).map_err(|e| FetchError::Io(format!("{}: {e}", path.display())))?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let mut bars = Vec::new();
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| FetchError::Parse(format!("{} row {}: {e}", path.display(), line + 1)))?;
        bars.push(Bar {
            timestamp: parse_timestamp(&row.timestamp)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: if row.volume.is_finite() && row.volume > 0.0 {
                row.volume.round() as u64
            } else {
                0
            },
        });
    }
    Ok(bars)
}

/// Write a series in the layout [`CsvProvider`] reads.
pub fn write_series(path: &Path, series: &PriceSeries) -> Result<(), FetchError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for bar in series.bars() {
        let timestamp = if bar.timestamp.time() == chrono::NaiveTime::MIN {
            bar.timestamp.format("%Y-%m-%d").to_string()
        } else {
            bar.timestamp.format("%Y-%m-%d %H:%M").to_string()
        };
        wtr.serialize(CsvRow {
            timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume as f64,
        })
        .map_err(|e| FetchError::Io(e.to_string()))?;
    }
    let data = wtr.into_inner().map_err(|e| FetchError::Io(e.to_string()))?;

    let mut file = File::create(path).map_err(|e| FetchError::Io(format!("{}: {e}", path.display())))?;
    file.write_all(&data)
        .map_err(|e| FetchError::Io(format!("{}: {e}", path.display())))
}

/// Provider reading `{dir}/{symbol}.csv`.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
    source_interval: Interval,
}

impl CsvProvider {
    /// Files are assumed to hold daily bars.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            source_interval: Interval::Daily,
        }
    }

    /// Granularity of the bars stored in the files.
    pub fn with_source_interval(mut self, interval: Interval) -> Self {
        self.source_interval = interval;
        self
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl PriceProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<PriceSeries, FetchError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let bars = read_bars(&path)?;
        debug!(symbol, rows = bars.len(), path = %path.display(), "read csv");
        finish_series(symbol, bars, request, self.source_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectorlens_core::domain::HistoryPeriod;

    #[test]
    fn parses_date_and_datetime() {
        let d = parse_timestamp("2024-03-07").unwrap();
        assert_eq!(d.format("%Y-%m-%d %H:%M").to_string(), "2024-03-07 00:00");
        let h = parse_timestamp("2024-03-07 10:15").unwrap();
        assert_eq!(h.format("%H:%M").to_string(), "10:15");
        assert!(parse_timestamp("07/03/2024").is_err());
    }

    #[test]
    fn missing_file_is_symbol_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvProvider::new(dir.path());
        let req = FetchRequest::new(
            Interval::Daily,
            HistoryPeriod::OneYear,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );
        assert_eq!(
            provider.fetch("^NSEI", &req).unwrap_err(),
            FetchError::SymbolNotFound {
                symbol: "^NSEI".into()
            }
        );
    }

    #[test]
    fn reads_unsorted_rows_and_drops_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ITBEES.NS.csv");
        std::fs::write(
            &path,
            "timestamp,open,high,low,close,volume\n\
             2024-01-03,11,12,10,11.5,2000\n\
             2024-01-02,10,11,9,10.5,1000\n\
             2024-01-04,11.5,12.5,11,NaN,1500\n",
        )
        .unwrap();

        let mut req = FetchRequest::new(
            Interval::Daily,
            HistoryPeriod::OneYear,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        req.min_data_points = 2;

        let series = CsvProvider::new(dir.path()).fetch("ITBEES.NS", &req).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().close, 10.5);
        assert_eq!(series.entity_id(), "ITBEES.NS");
    }
}
