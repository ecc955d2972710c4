//! Frozen per-round view of every node's distribution and label.

use rayon::prelude::*;
use unipolar_topology::NodeIndex;

use crate::distribution::dominant;

/// The sole read source for one round.
///
/// Borrows the store's current buffer, which nothing writes to until the
/// round ends, and caches each node's dominant decision.
#[derive(Debug, Clone)]
pub struct RoundSnapshot<'a> {
    round: u64,
    values: &'a [f64],
    decisions: usize,
    labels: Vec<usize>,
}

impl<'a> RoundSnapshot<'a> {
    /// Freeze `values` (row-major, `decisions` wide) for `round`.
    pub fn new(round: u64, values: &'a [f64], decisions: usize) -> Self {
        let labels = values.par_chunks(decisions).map(dominant).collect();
        Self {
            round,
            values,
            decisions,
            labels,
        }
    }

    /// Round this snapshot belongs to.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Number of decisions per row.
    pub fn decision_count(&self) -> usize {
        self.decisions
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Frozen distribution of `node`.
    #[inline]
    pub fn row(&self, node: NodeIndex) -> &'a [f64] {
        let start = node * self.decisions;
        &self.values[start..start + self.decisions]
    }

    /// Dominant decision of every node.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Dominant decision of `node`.
    #[inline]
    pub fn label(&self, node: NodeIndex) -> usize {
        self.labels[node]
    }

    /// Probability `node` assigns to its own dominant decision.
    pub fn confidence(&self, node: NodeIndex) -> f64 {
        self.row(node)[self.labels[node]]
    }

    /// Release the frozen buffer, keeping the labels.
    pub fn into_labels(self) -> Vec<usize> {
        self.labels
    }
}
