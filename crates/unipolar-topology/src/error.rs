//! Topology validation errors.

use thiserror::Error;

use crate::{HexCoord, NodeIndex};

/// A supplied adjacency does not describe a valid static graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Adjacency has a different number of lists than declared nodes
    #[error("adjacency has {actual} neighbor lists, expected {expected}")]
    AdjacencyLength { expected: usize, actual: usize },

    /// A node lists itself as a neighbor
    #[error("node {node} lists itself as a neighbor")]
    SelfLoop { node: NodeIndex },

    /// A neighbor index is not a node of this graph
    #[error("node {node} references neighbor {neighbor}, but only {node_count} nodes exist")]
    OutOfRange {
        node: NodeIndex,
        neighbor: NodeIndex,
        node_count: usize,
    },

    /// The same neighbor appears twice in one list
    #[error("node {node} lists neighbor {neighbor} more than once")]
    DuplicateNeighbor { node: NodeIndex, neighbor: NodeIndex },

    /// `to` is a neighbor of `from` but not the reverse
    #[error("edge {from} -> {to} has no reverse edge")]
    Asymmetric { from: NodeIndex, to: NodeIndex },

    /// Two lattice nodes share a position
    #[error("position {coord} is occupied by nodes {first} and {second}")]
    DuplicatePosition {
        coord: HexCoord,
        first: NodeIndex,
        second: NodeIndex,
    },
}
