//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a household (housing demander)
///
/// Ids are handed out in creation order and never reused, so ascending id
/// order is also insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HouseholdId(pub u32);

/// Identifier of a landlord (housing supplier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LandlordId(pub u32);

impl fmt::Display for HouseholdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "household#{}", self.0)
    }
}

impl fmt::Display for LandlordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "landlord#{}", self.0)
    }
}

/// Simulation step counter (t = 0 is the post-setup state)
pub type Step = u64;

/// Cell coordinates on a square lattice
///
/// Ordering is row-major on `(y, x)` so that sorted positions follow the
/// cell index order used by [`crate::spatial::Lattice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Row-major cell index on a lattice of side `size`
    #[inline]
    pub fn index(&self, size: usize) -> usize {
        self.y * size + self.x
    }

    #[inline]
    pub fn from_index(index: usize, size: usize) -> Self {
        Self {
            x: index % size,
            y: index / size,
        }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_index_roundtrip() {
        let pos = Position::new(3, 2);
        assert_eq!(pos.index(5), 13);
        assert_eq!(Position::from_index(13, 5), pos);
    }

    #[test]
    fn test_position_order_is_row_major() {
        let mut cells = vec![Position::new(1, 1), Position::new(2, 0), Position::new(0, 1)];
        cells.sort();
        assert_eq!(
            cells,
            vec![Position::new(2, 0), Position::new(0, 1), Position::new(1, 1)]
        );
    }
}
