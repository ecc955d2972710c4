//! Immutable adjacency over a fixed node set.

use crate::TopologyError;

/// Stable node identity, `0..node_count`.
pub type NodeIndex = usize;

/// A validated, symmetric, loop-free graph.
///
/// Neighbor lists are stored sorted so that every traversal over a node's
/// neighbors visits them in the same order regardless of how the caller
/// supplied them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<Vec<NodeIndex>>", into = "Vec<Vec<NodeIndex>>")
)]
pub struct Topology {
    neighbors: Vec<Vec<NodeIndex>>,
}

impl Topology {
    /// Build a topology from per-node neighbor lists.
    ///
    /// Fails if `adjacency.len() != node_count`, if any list references an
    /// out-of-range index, contains the node itself, repeats a neighbor, or
    /// has an edge whose reverse is missing.
    pub fn new(node_count: usize, adjacency: Vec<Vec<NodeIndex>>) -> Result<Self, TopologyError> {
        if adjacency.len() != node_count {
            return Err(TopologyError::AdjacencyLength {
                expected: node_count,
                actual: adjacency.len(),
            });
        }

        let mut neighbors = adjacency;
        for (node, list) in neighbors.iter_mut().enumerate() {
            for &neighbor in list.iter() {
                if neighbor >= node_count {
                    return Err(TopologyError::OutOfRange {
                        node,
                        neighbor,
                        node_count,
                    });
                }
                if neighbor == node {
                    return Err(TopologyError::SelfLoop { node });
                }
            }

            list.sort_unstable();
            if let Some(pair) = list.windows(2).find(|w| w[0] == w[1]) {
                return Err(TopologyError::DuplicateNeighbor {
                    node,
                    neighbor: pair[0],
                });
            }
        }

        // Lists are sorted now, so the reverse lookup is a binary search
        for (from, list) in neighbors.iter().enumerate() {
            for &to in list {
                if neighbors[to].binary_search(&from).is_err() {
                    return Err(TopologyError::Asymmetric { from, to });
                }
            }
        }

        Ok(Self { neighbors })
    }

    /// Build a topology from an undirected edge list.
    ///
    /// Each `(a, b)` pair produces both `a -> b` and `b -> a`. Listing the
    /// same edge twice (in either orientation) is a duplicate.
    pub fn from_edges(
        node_count: usize,
        edges: &[(NodeIndex, NodeIndex)],
    ) -> Result<Self, TopologyError> {
        let mut adjacency = vec![Vec::new(); node_count];
        for &(a, b) in edges {
            for (node, neighbor) in [(a, b), (b, a)] {
                if neighbor >= node_count {
                    return Err(TopologyError::OutOfRange {
                        node,
                        neighbor,
                        node_count,
                    });
                }
            }
            if a == b {
                return Err(TopologyError::SelfLoop { node: a });
            }
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        Self::new(node_count, adjacency)
    }

    /// Wrap neighbor lists that are symmetric, loop-free and free of
    /// duplicates by construction. Lists are sorted here.
    pub(crate) fn from_valid_lists(mut neighbors: Vec<Vec<NodeIndex>>) -> Self {
        for list in &mut neighbors {
            list.sort_unstable();
        }
        debug_assert!(Self::new(neighbors.len(), neighbors.clone()).is_ok());
        Self { neighbors }
    }

    /// Graph with `node_count` nodes and no edges.
    pub fn isolated(node_count: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); node_count],
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Neighbors of `node`, ascending.
    ///
    /// Panics if `node` is out of range.
    #[inline]
    pub fn neighbors(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.neighbors[node]
    }

    /// Number of neighbors of `node`.
    #[inline]
    pub fn degree(&self, node: NodeIndex) -> usize {
        self.neighbors[node].len()
    }

    /// Whether `node` has no neighbors.
    #[inline]
    pub fn is_isolated(&self, node: NodeIndex) -> bool {
        self.neighbors[node].is_empty()
    }

    /// Check if two nodes share an edge.
    pub fn are_adjacent(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.neighbors
            .get(a)
            .is_some_and(|list| list.binary_search(&b).is_ok())
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// All node indices in order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeIndex> {
        0..self.neighbors.len()
    }
}

impl TryFrom<Vec<Vec<NodeIndex>>> for Topology {
    type Error = TopologyError;

    fn try_from(adjacency: Vec<Vec<NodeIndex>>) -> Result<Self, Self::Error> {
        Self::new(adjacency.len(), adjacency)
    }
}

impl From<Topology> for Vec<Vec<NodeIndex>> {
    fn from(topology: Topology) -> Self {
        topology.neighbors
    }
}
