//! Same-decision connected components ("subgroups").
//!
//! A subgroup is a maximal connected set of nodes sharing one dominant
//! decision. Detection drains a pool of unassigned nodes:
//!
//! 1. The lowest pooled node starts a new subgroup and seeds a frontier with
//!    its pooled neighbors.
//! 2. A cursor walks the frontier front to back. A candidate with the
//!    subgroup's label joins, leaves the pool, and appends its pooled,
//!    not-yet-queued neighbors to the back of the frontier.
//! 3. A candidate with a different label is a boundary node: the cursor
//!    passes it and it is never examined again for this subgroup. It stays
//!    in the pool for a later subgroup.
//! 4. The subgroup closes when the cursor reaches the end of the frontier.
//!
//! Pool and frontier membership are flag arrays indexed by node, so every
//! membership test is O(1) and each edge is inspected a bounded number of
//! times per round.

use tracing::trace;
use unipolar_topology::{NodeIndex, Topology};

use crate::error::{Error, Result};

/// Subgroup identity within one round, in discovery order.
pub type SubgroupId = usize;

const NOT_QUEUED: SubgroupId = SubgroupId::MAX;

/// Partition of all nodes into subgroups for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgroups {
    members: Vec<Vec<NodeIndex>>,
    labels: Vec<usize>,
    assignment: Vec<SubgroupId>,
}

impl Subgroups {
    /// Number of subgroups.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True only for an empty graph.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Subgroup containing `node`.
    #[inline]
    pub fn id_of(&self, node: NodeIndex) -> SubgroupId {
        self.assignment[node]
    }

    /// Size of the subgroup containing `node`.
    #[inline]
    pub fn size_of(&self, node: NodeIndex) -> usize {
        self.members[self.assignment[node]].len()
    }

    /// Members of subgroup `id`, in the order they joined.
    pub fn members(&self, id: SubgroupId) -> &[NodeIndex] {
        &self.members[id]
    }

    /// Shared dominant decision of subgroup `id`.
    pub fn label(&self, id: SubgroupId) -> usize {
        self.labels[id]
    }

    /// All subgroups in discovery order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[NodeIndex]> {
        self.members.iter().map(Vec::as_slice)
    }

    /// The biggest subgroup; the earliest discovered wins ties.
    pub fn largest(&self) -> Option<SubgroupId> {
        (0..self.members.len()).reduce(|best, id| {
            if self.members[id].len() > self.members[best].len() {
                id
            } else {
                best
            }
        })
    }

    /// Subgroup size of every node, in node order.
    pub fn sizes(&self) -> Vec<usize> {
        (0..self.assignment.len()).map(|n| self.size_of(n)).collect()
    }
}

/// Partition `topology` into same-label connected components.
///
/// `labels[i]` is node `i`'s dominant decision for this round. The result is
/// checked with [`verify_partition`] before it is returned.
pub fn detect(topology: &Topology, labels: &[usize]) -> Result<Subgroups> {
    let node_count = topology.node_count();
    debug_assert_eq!(labels.len(), node_count);

    let mut in_pool = vec![true; node_count];
    let mut queued_for = vec![NOT_QUEUED; node_count];
    let mut frontier: Vec<NodeIndex> = Vec::new();
    let mut members: Vec<Vec<NodeIndex>> = Vec::new();
    let mut group_labels = Vec::new();

    for first in 0..node_count {
        if !in_pool[first] {
            continue;
        }

        let id = members.len();
        let label = labels[first];
        in_pool[first] = false;
        queued_for[first] = id;
        let mut group = vec![first];

        frontier.clear();
        for &neighbor in topology.neighbors(first) {
            if in_pool[neighbor] {
                queued_for[neighbor] = id;
                frontier.push(neighbor);
            }
        }

        let mut cursor = 0;
        while cursor < frontier.len() {
            let candidate = frontier[cursor];
            cursor += 1;

            if labels[candidate] != label {
                continue;
            }

            in_pool[candidate] = false;
            group.push(candidate);
            for &neighbor in topology.neighbors(candidate) {
                if in_pool[neighbor] && queued_for[neighbor] != id {
                    queued_for[neighbor] = id;
                    frontier.push(neighbor);
                }
            }
        }

        trace!(subgroup = id, label, size = group.len(), "subgroup closed");
        members.push(group);
        group_labels.push(label);
    }

    let assignment = verify_partition(node_count, &members)?;
    Ok(Subgroups {
        members,
        labels: group_labels,
        assignment,
    })
}

/// Confirm every node appears in exactly one subgroup and return each
/// node's subgroup id.
pub fn verify_partition(
    node_count: usize,
    members: &[Vec<NodeIndex>],
) -> Result<Vec<SubgroupId>> {
    let mut counts = vec![0usize; node_count];
    let mut assignment = vec![NOT_QUEUED; node_count];

    for (id, group) in members.iter().enumerate() {
        for &node in group {
            // An index past the graph can only come from a detector defect
            let slot = counts.get_mut(node).ok_or(Error::PartitionViolation {
                node,
                assignments: 0,
            })?;
            *slot += 1;
            assignment[node] = id;
        }
    }

    match counts.iter().position(|&c| c != 1) {
        Some(node) => Err(Error::PartitionViolation {
            node,
            assignments: counts[node],
        }),
        None => Ok(assignment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use unipolar_topology::Honeycomb;

    fn path(n: usize) -> Topology {
        let edges: Vec<_> = (1..n).map(|i| (i - 1, i)).collect();
        Topology::from_edges(n, &edges).unwrap()
    }

    #[test]
    fn matching_path_is_one_subgroup() {
        let groups = detect(&path(3), &[0, 0, 0]).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.members(0), &[0, 1, 2]);
        assert_eq!(groups.sizes(), vec![3, 3, 3]);
        assert_eq!(groups.label(0), 0);
    }

    #[test]
    fn alternating_path_splits_every_node() {
        let groups = detect(&path(4), &[0, 1, 0, 1]).unwrap();
        assert_eq!(groups.len(), 4);
        for node in 0..4 {
            assert_eq!(groups.size_of(node), 1);
            assert_eq!(groups.id_of(node), node);
        }
    }

    #[test]
    fn same_label_but_disconnected_are_separate() {
        // 0 - 1 - 2 with 1 dissenting: the two ends share a label but no path
        let groups = detect(&path(3), &[4, 2, 4]).unwrap();
        assert_eq!(groups.len(), 3);
        assert_ne!(groups.id_of(0), groups.id_of(2));
    }

    #[test]
    fn boundary_node_joins_a_later_subgroup() {
        // 0 - 1, 0 - 2, 1 - 2, 2 - 3; node 1 dissents but touches the others
        let t = Topology::from_edges(4, &[(0, 1), (0, 2), (1, 2), (2, 3)]).unwrap();
        let groups = detect(&t, &[0, 1, 0, 0]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.members(0), &[0, 2, 3]);
        assert_eq!(groups.members(1), &[1]);
        assert_eq!(groups.label(1), 1);
        assert_eq!(groups.largest(), Some(0));
    }

    #[test]
    fn isolated_nodes_are_singletons() {
        let groups = detect(&Topology::isolated(3), &[0, 0, 0]).unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups.sizes(), vec![1, 1, 1]);
    }

    #[test]
    fn empty_graph_has_no_subgroups() {
        let groups = detect(&Topology::isolated(0), &[]).unwrap();
        assert!(groups.is_empty());
        assert_eq!(groups.largest(), None);
    }

    #[test]
    fn largest_prefers_earliest_on_ties() {
        let groups = detect(&path(4), &[0, 0, 1, 1]).unwrap();
        assert_eq!(groups.largest(), Some(0));
    }

    #[test]
    fn verify_catches_missing_and_duplicate_nodes() {
        let missing = vec![vec![0], vec![2]];
        assert_eq!(
            verify_partition(3, &missing).unwrap_err(),
            Error::PartitionViolation { node: 1, assignments: 0 }
        );

        let doubled = vec![vec![0, 1], vec![1, 2]];
        assert_eq!(
            verify_partition(3, &doubled).unwrap_err(),
            Error::PartitionViolation { node: 1, assignments: 2 }
        );

        let foreign = vec![vec![0, 1, 2, 9]];
        assert!(matches!(
            verify_partition(3, &foreign),
            Err(Error::PartitionViolation { node: 9, .. })
        ));
    }

    fn honeycomb_case() -> impl Strategy<Value = (Topology, Vec<usize>)> {
        (1usize..60, 1usize..4).prop_flat_map(|(n, d)| {
            let topology = Honeycomb::spiral(n).into_topology();
            proptest::collection::vec(0..d, n).prop_map(move |labels| (topology.clone(), labels))
        })
    }

    proptest! {
        #[test]
        fn subgroups_are_maximal_connected_components((topology, labels) in honeycomb_case()) {
            let groups = detect(&topology, &labels).unwrap();

            // Partition: every node exactly once
            let mut seen = vec![0usize; topology.node_count()];
            for group in groups.iter() {
                for &node in group {
                    seen[node] += 1;
                }
            }
            prop_assert!(seen.iter().all(|&c| c == 1));

            // Homogeneous and connected within the subgroup
            for (id, group) in groups.iter().enumerate() {
                prop_assert!(group.iter().all(|&n| labels[n] == groups.label(id)));
                prop_assert_eq!(groups.size_of(group[0]), group.len());

                let mut reached = vec![group[0]];
                let mut cursor = 0;
                while cursor < reached.len() {
                    let node = reached[cursor];
                    cursor += 1;
                    for &next in topology.neighbors(node) {
                        if groups.id_of(next) == id && !reached.contains(&next) {
                            reached.push(next);
                        }
                    }
                }
                prop_assert_eq!(reached.len(), group.len());
            }

            // Maximal: a same-label edge never crosses subgroups
            for a in topology.nodes() {
                for &b in topology.neighbors(a) {
                    if labels[a] == labels[b] {
                        prop_assert_eq!(groups.id_of(a), groups.id_of(b));
                    }
                }
            }
        }
    }
}
