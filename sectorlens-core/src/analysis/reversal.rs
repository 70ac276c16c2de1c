//! Reversal classification and the absolute (peer-free) reversal score.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ReversalThresholds, ReversalWeights};

/// Three-state reversal classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReversalStatus {
    #[serde(rename = "BUY_DIV")]
    BuyDiv,
    #[serde(rename = "Watch")]
    Watch,
    #[serde(rename = "No")]
    No,
}

impl ReversalStatus {
    /// Eligible entities form the pool for rank-based reversal scoring.
    pub fn is_eligible(self) -> bool {
        self != ReversalStatus::No
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReversalStatus::BuyDiv => "BUY_DIV",
            ReversalStatus::Watch => "Watch",
            ReversalStatus::No => "No",
        }
    }
}

impl fmt::Display for ReversalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Cutoffs for one tier: all three must hold (`rsi <`, `adx_z <`, `cmf >`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReversalTier {
    pub rsi: f64,
    pub adx_z: f64,
    pub cmf: f64,
}

impl ReversalTier {
    fn matches(&self, rsi: f64, adx_z: f64, cmf: f64) -> bool {
        rsi < self.rsi && adx_z < self.adx_z && cmf > self.cmf
    }
}

pub const BUY_DIV_TIER: ReversalTier = ReversalTier {
    rsi: 40.0,
    adx_z: -0.5,
    cmf: 0.1,
};

pub const WATCH_TIER: ReversalTier = ReversalTier {
    rsi: 50.0,
    adx_z: 0.5,
    cmf: 0.0,
};

/// Classify one entity.
///
/// When `thresholds` is given the entity must satisfy `rsi < RSI` and
/// `adx_z < ADX_Z` first, or it is `No` without consulting the tiers.
pub fn classify(
    rsi: f64,
    adx_z: f64,
    cmf: f64,
    thresholds: Option<&ReversalThresholds>,
) -> ReversalStatus {
    if let Some(t) = thresholds {
        if !(rsi < t.rsi && adx_z < t.adx_z) {
            return ReversalStatus::No;
        }
    }

    if BUY_DIV_TIER.matches(rsi, adx_z, cmf) {
        ReversalStatus::BuyDiv
    } else if WATCH_TIER.matches(rsi, adx_z, cmf) {
        ReversalStatus::Watch
    } else {
        ReversalStatus::No
    }
}

/// Absolute reversal score on normalized 0–10 inputs, weighted by
/// `weight / total * 100`. Higher means more reversal-favorable.
///
/// A zero weight total yields 0.
pub fn absolute_reversal_score(
    rsi: f64,
    adx_z: f64,
    cmf: f64,
    rs_rating: f64,
    weights: &ReversalWeights,
) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }

    let rsi_norm = (100.0 - rsi) / 10.0;
    let adx_z_norm = (-adx_z).max(0.0) * 2.0;
    let cmf_norm = (cmf + 1.0) * 5.0;
    let rs_norm = 10.0 - rs_rating;

    (rsi_norm * weights.rsi
        + adx_z_norm * weights.adx_z
        + cmf_norm * weights.cmf
        + rs_norm * weights.rs_rating)
        / total
        * 100.0
}
