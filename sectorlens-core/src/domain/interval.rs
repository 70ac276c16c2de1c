//! Bar granularity and the interval-dependent constants that go with it.

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Hourly,
    #[default]
    Daily,
    Weekly,
}

impl Interval {
    /// Moving-average window for the Mansfield RS ratio.
    ///
    /// Daily uses ~one trading year. Weekly uses 52 weeks. Hourly history is
    /// capped at ~60 calendar days by providers, so the window is sized to fit it.
    pub fn mansfield_period(self) -> usize {
        match self {
            Interval::Hourly => 100,
            Interval::Daily => 250,
            Interval::Weekly => 52,
        }
    }

    /// Number of historical points replayed for the performance reports,
    /// given the benchmark's bar count.
    pub fn performance_lookback(self, benchmark_len: usize) -> usize {
        let available = benchmark_len.saturating_sub(20);
        match self {
            Interval::Hourly => available.min(500),
            Interval::Daily => available.min(126),
            Interval::Weekly => available.min(26),
        }
    }

    /// Calendar days of history requested from a provider for a lookback period.
    pub fn fetch_window_days(self, period: HistoryPeriod) -> i64 {
        match (self, period) {
            (Interval::Hourly, _) => 60,
            (_, HistoryPeriod::OneYear) => 400,
            (_, HistoryPeriod::TwoYears) => 800,
        }
    }

    /// Human label for the market date of the most recent bar.
    pub fn market_date_label(self, timestamp: NaiveDateTime) -> String {
        match self {
            Interval::Hourly => timestamp.format("%Y-%m-%d %H:%M").to_string(),
            Interval::Daily => timestamp.format("%Y-%m-%d").to_string(),
            Interval::Weekly => {
                let offset = timestamp.weekday().num_days_from_monday() as i64;
                let week_start = timestamp - Duration::days(offset);
                format!("Week of {}", week_start.format("%Y-%m-%d"))
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interval::Hourly => "hourly",
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hourly" | "1h" => Ok(Interval::Hourly),
            "daily" | "1d" => Ok(Interval::Daily),
            "weekly" | "1wk" => Ok(Interval::Weekly),
            other => Err(format!("unknown interval '{other}' (expected hourly, daily or weekly)")),
        }
    }
}

/// How much trailing history to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
}

impl HistoryPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
        }
    }
}
