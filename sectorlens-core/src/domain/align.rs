//! Pairwise time alignment.
//!
//! Relative indicators compare an entity against the benchmark only on
//! timestamps both series share (inner join). Nothing is forward-filled.

use chrono::NaiveDateTime;
use std::collections::HashMap;

/// One timestamp present in both inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPoint {
    pub timestamp: NaiveDateTime,
    pub left: f64,
    pub right: f64,
}

/// Inner-join two timestamped value series.
///
/// Output follows the order of `left`, which callers keep ascending.
pub fn align_on_timestamps(
    left: &[(NaiveDateTime, f64)],
    right: &[(NaiveDateTime, f64)],
) -> Vec<AlignedPoint> {
    let lookup: HashMap<NaiveDateTime, f64> = right.iter().copied().collect();

    left.iter()
        .filter_map(|&(timestamp, l)| {
            lookup.get(&timestamp).map(|&r| AlignedPoint {
                timestamp,
                left: l,
                right: r,
            })
        })
        .collect()
}
