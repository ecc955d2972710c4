//! Error types for unipolar-consensus.

use thiserror::Error;
use unipolar_topology::{NodeIndex, TopologyError};

/// Result type for convergence operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or driving a convergence run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The supplied graph is malformed.
    #[error("invalid topology: {0}")]
    Topology(#[from] TopologyError),

    /// An initial distribution row cannot be used.
    #[error("invalid distribution at row {row}: {reason}")]
    InvalidDistribution { row: usize, reason: String },

    /// A configuration value is out of range or unparsable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A normalization had nothing (or nothing finite) to divide by.
    #[error("degenerate distribution sum for node {node} in round {round}")]
    DegenerateSum { node: NodeIndex, round: u64 },

    /// Subgroup detection did not assign a node exactly once.
    ///
    /// This is a defect in the detector, never an input problem.
    #[error("subgroup partition violated: node {node} assigned {assignments} times")]
    PartitionViolation { node: NodeIndex, assignments: usize },

    /// A previous round failed; the run cannot continue.
    #[error("run aborted in round {round}")]
    Aborted { round: u64 },
}
