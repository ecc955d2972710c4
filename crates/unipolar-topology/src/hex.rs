//! Hexagonal lattice positions in axial coordinates.
//!
//! Axial coordinates use two axes (q, r) at 60 degrees, with an implicit
//! third axis s = -q - r. Swarm networks live on a single plane, so there is
//! no layer coordinate.

use std::ops::{Add, Neg, Sub};

/// A position on the 2D hexagonal lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HexCoord {
    /// First axial coordinate
    pub q: i64,
    /// Second axial coordinate
    pub r: i64,
}

impl HexCoord {
    /// Origin of the coordinate system.
    pub const ORIGIN: Self = Self { q: 0, r: 0 };

    /// The six unit directions.
    ///
    /// A coordinate difference is a lattice edge iff it is one of these:
    /// one axis moves by 1 and the other by 0, or the two axes move by
    /// +1 and -1.
    pub const DIRECTIONS: [Self; 6] = [
        Self { q: 1, r: 0 },  // East
        Self { q: 1, r: -1 }, // Northeast
        Self { q: 0, r: -1 }, // Northwest
        Self { q: -1, r: 0 }, // West
        Self { q: -1, r: 1 }, // Southwest
        Self { q: 0, r: 1 },  // Southeast
    ];

    /// Create a new coordinate.
    pub const fn new(q: i64, r: i64) -> Self {
        Self { q, r }
    }

    /// Compute the implicit third axis: s = -q - r.
    pub const fn s(&self) -> i64 {
        -self.q - self.r
    }

    /// Hexagonal distance: max(|dq|, |dr|, |ds|).
    pub fn hex_distance(&self, other: &Self) -> u64 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = ((self.q - other.q) + (self.r - other.r)).unsigned_abs();
        dq.max(dr).max(ds)
    }

    /// Ring number around the origin (0 = origin, 1 = first ring, etc.)
    pub fn ring(&self) -> u64 {
        self.hex_distance(&Self::ORIGIN)
    }

    /// All six lattice neighbors.
    pub fn neighbors(&self) -> [Self; 6] {
        Self::DIRECTIONS.map(|d| *self + d)
    }

    /// Whether two positions share a lattice edge.
    pub fn is_adjacent(&self, other: &Self) -> bool {
        Self::DIRECTIONS.contains(&(*other - *self))
    }
}

impl Add for HexCoord {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            q: self.q + other.q,
            r: self.r + other.r,
        }
    }
}

impl Sub for HexCoord {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            q: self.q - other.q,
            r: self.r - other.r,
        }
    }
}

impl Neg for HexCoord {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            q: -self.q,
            r: -self.r,
        }
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s_axis_constraint() {
        for c in [HexCoord::ORIGIN, HexCoord::new(1, -1), HexCoord::new(-3, 5)] {
            assert_eq!(c.q + c.r + c.s(), 0);
        }
    }

    #[test]
    fn directions_are_ring_one() {
        for dir in HexCoord::DIRECTIONS {
            assert_eq!(dir.ring(), 1);
        }
        assert_eq!(HexCoord::new(2, 0).ring(), 2);
        assert_eq!(HexCoord::new(1, 1).ring(), 2);
    }

    #[test]
    fn adjacency_matches_unit_differences() {
        let a = HexCoord::new(3, -2);
        for n in a.neighbors() {
            assert!(a.is_adjacent(&n));
            assert!(n.is_adjacent(&a));
        }
        // (1, 1) and (-1, -1) are not lattice edges
        assert!(!a.is_adjacent(&(a + HexCoord::new(1, 1))));
        assert!(!a.is_adjacent(&(a + HexCoord::new(-1, -1))));
        assert!(!a.is_adjacent(&a));
    }

    #[test]
    fn neighbors_are_unique() {
        let mut n = HexCoord::ORIGIN.neighbors().to_vec();
        n.sort();
        n.dedup();
        assert_eq!(n.len(), 6);
    }

    #[test]
    fn addition_subtraction() {
        let a = HexCoord::new(1, 2);
        let b = HexCoord::new(4, -1);

        assert_eq!(a + b, HexCoord::new(5, 1));
        assert_eq!(a - b, HexCoord::new(-3, 3));
        assert_eq!(a + (-b), a - b);
        assert_eq!(a.to_string(), "(1, 2)");
    }
}
