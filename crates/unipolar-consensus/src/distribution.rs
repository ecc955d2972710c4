//! Per-node decision distributions, double-buffered across rounds.
//!
//! Rows live in one flat row-major buffer. A round reads only `current` and
//! writes only `next`; [`DistributionStore::swap`] hands `next` over as the
//! new `current` once every node has been written.

use rand::Rng;

use crate::error::{Error, Result};

/// Probability vectors for every node.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionStore {
    decisions: usize,
    current: Vec<f64>,
    next: Vec<f64>,
}

impl DistributionStore {
    /// Validate and normalize initial rows.
    ///
    /// Every row must have `decisions` finite, non-negative entries with a
    /// positive sum.
    pub fn from_rows(rows: Vec<Vec<f64>>, decisions: usize) -> Result<Self> {
        if decisions == 0 {
            return Err(Error::InvalidConfig(
                "decision count must be at least 1".to_string(),
            ));
        }

        let mut current = Vec::with_capacity(rows.len() * decisions);
        for (index, mut row) in rows.into_iter().enumerate() {
            if row.len() != decisions {
                return Err(Error::InvalidDistribution {
                    row: index,
                    reason: format!("expected {} entries, got {}", decisions, row.len()),
                });
            }
            if let Some(bad) = row.iter().find(|v| !v.is_finite() || **v < 0.0) {
                return Err(Error::InvalidDistribution {
                    row: index,
                    reason: format!("entry {} is negative or not finite", bad),
                });
            }
            if normalize_in_place(&mut row).is_none() {
                return Err(Error::InvalidDistribution {
                    row: index,
                    reason: "row sums to zero".to_string(),
                });
            }
            current.extend_from_slice(&row);
        }

        let next = vec![0.0; current.len()];
        Ok(Self {
            decisions,
            current,
            next,
        })
    }

    /// Number of candidate decisions (D).
    #[inline]
    pub fn decision_count(&self) -> usize {
        self.decisions
    }

    /// Number of nodes (N).
    #[inline]
    pub fn node_count(&self) -> usize {
        self.current.len() / self.decisions
    }

    /// Current distribution of `node`.
    #[inline]
    pub fn row(&self, node: usize) -> &[f64] {
        let start = node * self.decisions;
        &self.current[start..start + self.decisions]
    }

    /// Current distributions of all nodes, in node order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> {
        self.current.chunks_exact(self.decisions)
    }

    /// Copy the current rows out.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    /// Current buffer for reading and next buffer for writing.
    pub(crate) fn buffers(&mut self) -> (&[f64], &mut [f64]) {
        (&self.current, &mut self.next)
    }

    /// Publish the next buffer as current.
    pub(crate) fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

/// Index of the largest entry. Ties go to the lowest index.
pub fn dominant(row: &[f64]) -> usize {
    let mut best = 0;
    for (index, &value) in row.iter().enumerate().skip(1) {
        if value > row[best] {
            best = index;
        }
    }
    best
}

/// Sum of absolute per-decision differences.
pub fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// Divide a row by its sum. Returns the sum, or `None` (leaving the row
/// untouched) when the sum is zero or not finite.
pub fn normalize_in_place(row: &mut [f64]) -> Option<f64> {
    let sum: f64 = row.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        return None;
    }
    for value in row.iter_mut() {
        *value /= sum;
    }
    Some(sum)
}

/// Uniform random rows in `[0, 1)`, unnormalized.
pub fn random_rows<R: Rng + ?Sized>(rng: &mut R, nodes: usize, decisions: usize) -> Vec<Vec<f64>> {
    (0..nodes)
        .map(|_| (0..decisions).map(|_| rng.gen::<f64>()).collect())
        .collect()
}
