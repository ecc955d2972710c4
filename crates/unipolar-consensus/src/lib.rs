//! Probabilistic Convergence
//!
//! A fixed population of nodes, each holding a private probability
//! distribution over the same `D` candidate decisions, reaches collective
//! agreement by repeatedly exchanging distributions with immediate
//! neighbors. No node sees the whole network.
//!
//! # Core Insight
//!
//! Agreement grows outward from local agreement. Where a node's whole
//! neighborhood already prefers its decision, the node averages with them
//! and then **sharpens**: it pushes probability mass toward its dominant
//! decision, more aggressively the more closely the neighborhood agrees.
//! Where neighbors disagree, the node averages with weights equal to each
//! participant's **subgroup** size, so large connected blocks of agreement
//! absorb their boundaries.
//!
//! # Round Structure
//!
//! 1. Freeze the current distributions ([`RoundSnapshot`])
//! 2. Label each node with its dominant decision (ties → lowest index)
//! 3. Partition the graph into same-label components ([`detect`])
//! 4. Classify each node as converged or divergent ([`classify`])
//! 5. Compute every next distribution from the snapshot ([`update_all`])
//! 6. Swap the next buffer in
//!
//! Steps 4 and 5 are per-node and run in parallel; the snapshot makes them
//! order-independent.
//!
//! # Example
//!
//! ```
//! use unipolar_consensus::{ConvergenceConfig, RoundDriver};
//! use unipolar_topology::Topology;
//!
//! let topology = Topology::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
//! let rows = vec![vec![0.9, 0.1], vec![0.5, 0.5], vec![0.5, 0.5]];
//! let mut driver = RoundDriver::from_rows(topology, rows, ConvergenceConfig::new(2)).unwrap();
//!
//! let report = driver.step().unwrap();
//! assert_eq!(report.observation.subgroup_count, 1);
//! ```

mod classify;
mod config;
mod distribution;
mod error;
mod observe;
mod round;
mod snapshot;
mod subgroup;
mod update;

pub use classify::{classify, classify_node, Convergence};
pub use config::{
    ConvergenceConfig, DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_DECISION_COUNT,
    DEFAULT_SHARPEN_POWER, ENV_DECISIONS, ENV_POWER, ENV_THRESHOLD,
};
pub use distribution::{dominant, l1_distance, normalize_in_place, random_rows, DistributionStore};
pub use error::{Error, Result};
pub use observe::{NodeObservation, Observation};
pub use round::{DriverState, RoundDriver, RoundReport};
pub use snapshot::RoundSnapshot;
pub use subgroup::{detect, verify_partition, SubgroupId, Subgroups};
pub use update::{
    clique_diff_max, update_all, update_node, weighted_mean, NodeOutcome, Sharpener,
};
