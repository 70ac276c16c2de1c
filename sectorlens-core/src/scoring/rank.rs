//! Competition ("min") ranking.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Rank 1 is the lowest value.
    Ascending,
    /// Rank 1 is the highest value.
    Descending,
}

/// Rank `values` 1..=n; ties share the minimum rank of their group and the
/// next distinct value skips ahead (1, 2, 2, 2, 5).
///
/// Output is in input order. NaN sorts after every number in either order.
pub fn competition_rank(values: &[f64], order: RankOrder) -> Vec<usize> {
    let cmp = |a: f64, b: f64| -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match order {
                RankOrder::Ascending => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                RankOrder::Descending => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
            },
        }
    };

    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| cmp(values[a], values[b]));

    let mut ranks = vec![0; values.len()];
    for (pos, &i) in idx.iter().enumerate() {
        ranks[i] = match pos.checked_sub(1).map(|p| idx[p]) {
            Some(prev) if cmp(values[prev], values[i]) == Ordering::Equal => ranks[prev],
            _ => pos + 1,
        };
    }
    ranks
}
