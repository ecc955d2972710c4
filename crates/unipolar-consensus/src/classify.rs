//! Local agreement test.

use rayon::prelude::*;
use unipolar_topology::{NodeIndex, Topology};

/// Whether a node's neighborhood agrees with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Convergence {
    /// Every neighbor shares the node's dominant decision (or it has none)
    Converged,
    /// At least one neighbor prefers another decision
    Divergent,
}

impl Convergence {
    /// Check for the converged case.
    pub fn is_converged(self) -> bool {
        self == Convergence::Converged
    }
}

/// Classify a single node against its neighbors' labels.
pub fn classify_node(topology: &Topology, labels: &[usize], node: NodeIndex) -> Convergence {
    let own = labels[node];
    if topology.neighbors(node).iter().all(|&n| labels[n] == own) {
        Convergence::Converged
    } else {
        Convergence::Divergent
    }
}

/// Classify every node. Each node is independent, so this runs in parallel.
pub fn classify(topology: &Topology, labels: &[usize]) -> Vec<Convergence> {
    (0..topology.node_count())
        .into_par_iter()
        .map(|node| classify_node(topology, labels, node))
        .collect()
}
