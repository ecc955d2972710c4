//! Read-only per-round view for external observers.

use unipolar_topology::NodeIndex;

use crate::distribution::DistributionStore;
use crate::subgroup::{SubgroupId, Subgroups};

/// What an observer sees of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct NodeObservation {
    /// Dominant decision the round was computed with
    pub dominant: usize,
    /// Subgroup the node belonged to
    pub subgroup: SubgroupId,
    /// Size of that subgroup
    pub subgroup_size: usize,
    /// Probability now assigned to `dominant`
    pub confidence: f64,
}

/// Every node's observation after a round.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Observation {
    /// Round the labels and subgroups were computed in
    pub round: u64,
    /// Per-node view, in node order
    pub nodes: Vec<NodeObservation>,
    /// Number of subgroups
    pub subgroup_count: usize,
}

impl Observation {
    /// Combine a round's labels and subgroups with the distributions now in
    /// `store`.
    pub fn capture(
        round: u64,
        labels: &[usize],
        subgroups: &Subgroups,
        store: &DistributionStore,
    ) -> Self {
        let nodes = labels
            .iter()
            .enumerate()
            .map(|(node, &dominant)| NodeObservation {
                dominant,
                subgroup: subgroups.id_of(node),
                subgroup_size: subgroups.size_of(node),
                confidence: store.row(node)[dominant],
            })
            .collect();

        Self {
            round,
            nodes,
            subgroup_count: subgroups.len(),
        }
    }

    /// View of one node.
    pub fn node(&self, node: NodeIndex) -> &NodeObservation {
        &self.nodes[node]
    }

    /// Whether every node had the same dominant decision.
    pub fn is_unanimous(&self) -> bool {
        self.nodes
            .split_first()
            .map_or(true, |(first, rest)| rest.iter().all(|n| n.dominant == first.dominant))
    }

    /// Mean of the per-node confidence values.
    pub fn mean_confidence(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        self.nodes.iter().map(|n| n.confidence).sum::<f64>() / self.nodes.len() as f64
    }

    /// Size of the biggest subgroup.
    pub fn largest_subgroup(&self) -> usize {
        self.nodes.iter().map(|n| n.subgroup_size).max().unwrap_or(0)
    }
}
