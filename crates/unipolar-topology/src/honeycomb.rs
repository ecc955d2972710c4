//! Honeycomb networks: topologies derived from hexagonal lattice positions.
//!
//! # Spiral Fill
//!
//! [`Honeycomb::spiral`] places nodes ring by ring around the origin:
//!
//! - Ring 0: just the origin (1 slot)
//! - Ring n > 0: 6n slots, walked counter-clockwise from the east corner
//!
//! Any prefix of the spiral is a connected, compact patch, so a spiral
//! honeycomb of any size is a connected graph.

use std::collections::HashMap;

use crate::{HexCoord, NodeIndex, Topology, TopologyError};

/// Total number of slots in ring n.
#[inline]
pub const fn slots_in_ring(ring: u64) -> u64 {
    if ring == 0 {
        1
    } else {
        6 * ring
    }
}

/// Total slots through ring n (inclusive): 1 + 3n(n+1).
#[inline]
pub const fn total_slots_through(ring: u64) -> u64 {
    1 + 3 * ring * (ring + 1)
}

fn ring_of(index: u64) -> u64 {
    if index == 0 {
        return 0;
    }

    let mut low = 1u64;
    let mut high = ((index as f64).sqrt() as u64) + 2;
    while low < high {
        let mid = (low + high) / 2;
        if total_slots_through(mid) <= index {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}

/// Lattice position of the `index`-th slot in spiral order.
pub fn spiral_coord(index: u64) -> HexCoord {
    if index == 0 {
        return HexCoord::ORIGIN;
    }

    let ring = ring_of(index);
    let offset = index - total_slots_through(ring - 1);
    let edge = (offset / ring) as usize;
    let step = (offset % ring) as i64;
    let n = ring as i64;

    // Corner that starts each edge, and the direction walked along it
    let corners = [
        HexCoord::new(n, 0),
        HexCoord::new(0, n),
        HexCoord::new(-n, n),
        HexCoord::new(-n, 0),
        HexCoord::new(0, -n),
        HexCoord::new(n, -n),
    ];
    let directions = [
        HexCoord::new(-1, 1),
        HexCoord::new(-1, 0),
        HexCoord::new(0, -1),
        HexCoord::new(1, -1),
        HexCoord::new(1, 0),
        HexCoord::new(0, 1),
    ];

    let corner = corners[edge];
    let dir = directions[edge];
    HexCoord::new(corner.q + dir.q * step, corner.r + dir.r * step)
}

/// Neighbor lists of every position, looked up in `index`.
fn lattice_adjacency(
    coords: &[HexCoord],
    index: &HashMap<HexCoord, NodeIndex>,
) -> Vec<Vec<NodeIndex>> {
    coords
        .iter()
        .map(|coord| {
            coord
                .neighbors()
                .iter()
                .filter_map(|n| index.get(n).copied())
                .collect()
        })
        .collect()
}

/// A topology whose nodes sit on hexagonal lattice positions.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Honeycomb {
    coords: Vec<HexCoord>,
    topology: Topology,
}

impl Honeycomb {
    /// Derive adjacency from positions: node `i` is adjacent to node `j` iff
    /// their positions differ by one lattice unit direction.
    pub fn from_coords(coords: Vec<HexCoord>) -> Result<Self, TopologyError> {
        let mut index: HashMap<HexCoord, NodeIndex> = HashMap::with_capacity(coords.len());
        for (node, &coord) in coords.iter().enumerate() {
            if let Some(first) = index.insert(coord, node) {
                return Err(TopologyError::DuplicatePosition {
                    coord,
                    first,
                    second: node,
                });
            }
        }

        let topology = Topology::new(coords.len(), lattice_adjacency(&coords, &index))?;
        Ok(Self { coords, topology })
    }

    /// A compact patch of `node_count` nodes filled in spiral order.
    pub fn spiral(node_count: usize) -> Self {
        let coords: Vec<HexCoord> = (0..node_count as u64).map(spiral_coord).collect();
        let index: HashMap<HexCoord, NodeIndex> =
            coords.iter().enumerate().map(|(node, &coord)| (coord, node)).collect();
        debug_assert_eq!(index.len(), coords.len(), "spiral positions repeat");

        // Distinct positions: the six unit directions are distinct, non-zero
        // and closed under negation, so the lists are already valid
        let topology = Topology::from_valid_lists(lattice_adjacency(&coords, &index));
        Self { coords, topology }
    }

    /// The derived graph.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Lattice position of every node.
    pub fn coords(&self) -> &[HexCoord] {
        &self.coords
    }

    /// Position of one node.
    pub fn coord(&self, node: NodeIndex) -> HexCoord {
        self.coords[node]
    }

    /// Consume the honeycomb, keeping only the graph.
    pub fn into_topology(self) -> Topology {
        self.topology
    }
}
