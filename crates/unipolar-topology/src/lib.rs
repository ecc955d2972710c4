//! Unipolar Topology
//!
//! Static node graphs for the probabilistic convergence algorithm.
//!
//! # Model
//!
//! A [`Topology`] is a fixed set of `N` nodes indexed `0..N` with a symmetric,
//! loop-free adjacency. It is validated once at construction and never mutated
//! afterwards: every round of the convergence algorithm reads the same graph.
//!
//! # Honeycomb Lattice
//!
//! Swarm networks are laid out on a 2D hexagonal lattice using axial
//! coordinates. Two nodes are neighbors iff their positions differ by one of
//! the six unit directions:
//!
//! ```text
//!        (0,-1)  (1,-1)
//!    (-1,0)  (q,r)  (1,0)
//!        (-1,1)  (0,1)
//! ```
//!
//! [`Honeycomb`] derives a [`Topology`] from positions, or fills a compact
//! patch of `N` nodes ring by ring around the origin.

mod error;
mod graph;
mod hex;
mod honeycomb;

pub use error::TopologyError;
pub use graph::{NodeIndex, Topology};
pub use hex::HexCoord;
pub use honeycomb::{slots_in_ring, spiral_coord, total_slots_through, Honeycomb};

/// Maximum number of neighbors a node can have on the honeycomb lattice.
pub const HONEYCOMB_DEGREE: usize = 6;

const _: () = assert!(HexCoord::DIRECTIONS.len() == HONEYCOMB_DEGREE);
