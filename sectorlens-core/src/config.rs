//! Serializable analysis configuration.
//!
//! Everything that changes the numbers in a RankTable lives here, so a run
//! can be reproduced from its config alone.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Interval;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("weight {name} is negative ({value})")]
    NegativeWeight { name: &'static str, value: f64 },

    #[error("{config} weights sum to zero")]
    ZeroWeightSum { config: &'static str },

    #[error("period {name} must be at least 1")]
    InvalidPeriod { name: &'static str },

    #[error("{name} is out of range ({value})")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config I/O error: {0}")]
    Io(String),
}

/// Percentage weights for the Momentum_Score.
///
/// Applied literally as `rank * weight / 100`; the sum is not renormalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumWeights {
    #[serde(rename = "ADX_Z")]
    pub adx_z: f64,
    #[serde(rename = "RS_Rating")]
    pub rs_rating: f64,
    #[serde(rename = "RSI")]
    pub rsi: f64,
    #[serde(rename = "DI_Spread")]
    pub di_spread: f64,
}

impl Default for MomentumWeights {
    fn default() -> Self {
        Self {
            adx_z: 20.0,
            rs_rating: 40.0,
            rsi: 30.0,
            di_spread: 10.0,
        }
    }
}

impl MomentumWeights {
    pub fn total(&self) -> f64 {
        self.adx_z + self.rs_rating + self.rsi + self.di_spread
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative(&[
            ("ADX_Z", self.adx_z),
            ("RS_Rating", self.rs_rating),
            ("RSI", self.rsi),
            ("DI_Spread", self.di_spread),
        ])
    }
}

/// Percentage weights for the Reversal_Score. Renormalized by their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReversalWeights {
    #[serde(rename = "RS_Rating")]
    pub rs_rating: f64,
    #[serde(rename = "CMF")]
    pub cmf: f64,
    #[serde(rename = "RSI")]
    pub rsi: f64,
    #[serde(rename = "ADX_Z")]
    pub adx_z: f64,
}

impl Default for ReversalWeights {
    fn default() -> Self {
        Self {
            rs_rating: 40.0,
            cmf: 40.0,
            rsi: 10.0,
            adx_z: 10.0,
        }
    }
}

impl ReversalWeights {
    pub fn total(&self) -> f64 {
        self.rs_rating + self.cmf + self.rsi + self.adx_z
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative(&[
            ("RS_Rating", self.rs_rating),
            ("CMF", self.cmf),
            ("RSI", self.rsi),
            ("ADX_Z", self.adx_z),
        ])?;
        if self.total() <= 0.0 {
            return Err(ConfigError::ZeroWeightSum { config: "reversal" });
        }
        Ok(())
    }
}

fn check_non_negative(weights: &[(&'static str, f64)]) -> Result<(), ConfigError> {
    for &(name, value) in weights {
        if value < 0.0 || value.is_nan() {
            return Err(ConfigError::NegativeWeight { name, value });
        }
    }
    Ok(())
}

/// User-supplied reversal pre-filter: an entity must be below both cutoffs
/// before the fixed tiers are even consulted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReversalThresholds {
    #[serde(rename = "RSI")]
    pub rsi: f64,
    #[serde(rename = "ADX_Z")]
    pub adx_z: f64,
}

impl Default for ReversalThresholds {
    fn default() -> Self {
        Self {
            rsi: 40.0,
            adx_z: -0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorPeriods {
    pub rsi: usize,
    pub adx: usize,
    pub cmf: usize,
    /// Overrides the interval's Mansfield window when set.
    pub mansfield: Option<usize>,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            rsi: 14,
            adx: 14,
            cmf: 20,
            mansfield: None,
        }
    }
}

impl IndicatorPeriods {
    pub fn mansfield_for(&self, interval: Interval) -> usize {
        self.mansfield.unwrap_or_else(|| interval.mansfield_period())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("rsi", Some(self.rsi)),
            ("adx", Some(self.adx)),
            ("cmf", Some(self.cmf)),
            ("mansfield", self.mansfield),
        ] {
            if value == Some(0) {
                return Err(ConfigError::InvalidPeriod { name });
            }
        }
        Ok(())
    }
}

/// Settings for the trend and historical-performance replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Bars an entity needs at a cut-off to be included in a trend point.
    pub min_history: usize,
    /// Bars an entity needs at a cut-off to be included in a historical report.
    pub performance_min_history: usize,
    /// Entities reported per historical date.
    pub top_n: usize,
    /// Forward return horizons, in bars.
    pub forward_horizons: Vec<usize>,
    /// Points in a trend (T-k .. T).
    pub trend_periods: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            min_history: 14,
            performance_min_history: 50,
            top_n: 2,
            forward_horizons: vec![7, 14],
            trend_periods: 8,
        }
    }
}

/// Full analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub interval: Interval,
    pub periods: IndicatorPeriods,
    pub momentum_weights: MomentumWeights,
    pub reversal_weights: ReversalWeights,
    pub reversal_thresholds: Option<ReversalThresholds>,
    pub replay: ReplayConfig,
    /// Percentile of Momentum_Score at or above which an entity is a leader.
    pub leader_percentile: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            interval: Interval::Daily,
            periods: IndicatorPeriods::default(),
            momentum_weights: MomentumWeights::default(),
            reversal_weights: ReversalWeights::default(),
            reversal_thresholds: None,
            replay: ReplayConfig::default(),
            leader_percentile: 70.0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.periods.validate()?;
        self.momentum_weights.validate()?;
        self.reversal_weights.validate()?;
        if !(0.0..=100.0).contains(&self.leader_percentile) {
            return Err(ConfigError::OutOfRange {
                name: "leader_percentile",
                value: self.leader_percentile,
            });
        }
        Ok(())
    }

    pub fn mansfield_period(&self) -> usize {
        self.periods.mansfield_for(self.interval)
    }
}
