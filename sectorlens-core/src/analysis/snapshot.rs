//! Per-entity indicator values at the most recent bar.

use serde::{Deserialize, Serialize};

/// A scalar indicator value plus whether it was actually computed.
///
/// `computed == false` means `value` is the documented neutral default that
/// stood in for an indicator that could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub computed: bool,
}

impl Reading {
    pub fn computed(value: f64) -> Self {
        Self {
            value,
            computed: true,
        }
    }

    pub fn neutral(value: f64) -> Self {
        Self {
            value,
            computed: false,
        }
    }

    /// Keep `result` when it is `Ok`, otherwise fall back to `default`.
    pub fn or_neutral<E>(result: Result<f64, E>, default: f64) -> Self {
        match result {
            Ok(v) => Self::computed(v),
            Err(_) => Self::neutral(default),
        }
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Self::computed(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Reading,
    pub adx: Reading,
    pub plus_di: Reading,
    pub minus_di: Reading,
    pub di_spread: Reading,
    pub adx_z: Reading,
    pub cmf: Reading,
    pub mansfield_rs: Reading,
    pub rs_rating: Reading,
}

impl IndicatorSnapshot {
    /// Snapshot built from raw values, all flagged as computed.
    ///
    /// Handy when indicator values come from somewhere other than the
    /// analyzer (tests, replays of stored tables).
    pub fn from_values(rsi: f64, adx_z: f64, cmf: f64, rs_rating: f64, di_spread: f64) -> Self {
        Self {
            rsi: rsi.into(),
            adx: Reading::neutral(0.0),
            plus_di: Reading::neutral(0.0),
            minus_di: Reading::neutral(0.0),
            di_spread: di_spread.into(),
            adx_z: adx_z.into(),
            cmf: cmf.into(),
            mansfield_rs: Reading::neutral(0.0),
            rs_rating: rs_rating.into(),
        }
    }

    /// Names of readings that fell back to a neutral default.
    pub fn defaulted(&self) -> Vec<&'static str> {
        [
            ("rsi", self.rsi),
            ("adx", self.adx),
            ("plus_di", self.plus_di),
            ("minus_di", self.minus_di),
            ("di_spread", self.di_spread),
            ("adx_z", self.adx_z),
            ("cmf", self.cmf),
            ("mansfield_rs", self.mansfield_rs),
            ("rs_rating", self.rs_rating),
        ]
        .into_iter()
        .filter(|(_, r)| !r.computed)
        .map(|(name, _)| name)
        .collect()
    }
}
