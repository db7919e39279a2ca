//! Toroidal square lattice with at most one agent per cell

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use rand::Rng;

use crate::core::error::{Result, SimError};
use crate::core::types::Position;

/// Fixed-size `size x size` grid that wraps around on both axes
///
/// Keeps the cell -> agent and agent -> cell mappings in sync together with
/// the set of vacant cells. All collections are ordered, so iteration is
/// reproducible for a given sequence of mutations.
#[derive(Debug, Clone)]
pub struct Lattice<A: Copy + Ord + Debug> {
    size: usize,
    cells: Vec<Option<A>>,
    positions: BTreeMap<A, Position>,
    empty: BTreeSet<Position>,
}

impl<A: Copy + Ord + Debug> Lattice<A> {
    pub fn new(size: usize) -> Self {
        let empty = (0..size * size)
            .map(|index| Position::from_index(index, size))
            .collect();
        Self {
            size,
            cells: vec![None; size * size],
            positions: BTreeMap::new(),
            empty,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of agents on the lattice
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when every cell holds an agent
    #[inline]
    pub fn is_full(&self) -> bool {
        self.empty.is_empty()
    }

    fn check_bounds(&self, pos: Position) -> Result<()> {
        if pos.x < self.size && pos.y < self.size {
            Ok(())
        } else {
            Err(SimError::OutOfBounds(pos))
        }
    }

    /// Agent occupying `pos`, if any
    #[inline]
    pub fn agent_at(&self, pos: Position) -> Option<A> {
        if pos.x < self.size && pos.y < self.size {
            self.cells[pos.index(self.size)]
        } else {
            None
        }
    }

    #[inline]
    pub fn position_of(&self, agent: A) -> Option<Position> {
        self.positions.get(&agent).copied()
    }

    #[inline]
    pub fn contains(&self, agent: A) -> bool {
        self.positions.contains_key(&agent)
    }

    /// Agent -> position mapping, ordered by agent
    pub fn positions(&self) -> &BTreeMap<A, Position> {
        &self.positions
    }

    /// Vacant cells in row-major order
    pub fn empty_positions(&self) -> &BTreeSet<Position> {
        &self.empty
    }

    /// Agents in ascending order
    pub fn agents(&self) -> impl Iterator<Item = A> + '_ {
        self.positions.keys().copied()
    }

    /// Put `agent` on a specific cell
    pub fn place(&mut self, agent: A, pos: Position) -> Result<()> {
        self.check_bounds(pos)?;
        if self.positions.contains_key(&agent) {
            return Err(SimError::AlreadyPlaced(format!("{:?}", agent)));
        }
        let index = pos.index(self.size);
        if self.cells[index].is_some() {
            return Err(SimError::CellOccupied(pos));
        }
        self.cells[index] = Some(agent);
        self.positions.insert(agent, pos);
        self.empty.remove(&pos);
        Ok(())
    }

    /// Put `agent` on a vacant cell drawn uniformly at random
    pub fn place_random<R: Rng + ?Sized>(&mut self, agent: A, rng: &mut R) -> Result<Position> {
        if self.empty.is_empty() {
            return Err(SimError::NoVacancy);
        }
        let pick = rng.gen_range(0..self.empty.len());
        let pos = self
            .empty
            .iter()
            .nth(pick)
            .copied()
            .ok_or(SimError::NoVacancy)?;
        self.place(agent, pos)?;
        Ok(pos)
    }

    /// Take `agent` off the lattice, vacating its cell
    pub fn remove(&mut self, agent: A) -> Result<Position> {
        let pos = self
            .positions
            .remove(&agent)
            .ok_or_else(|| SimError::UnknownAgent(format!("{:?}", agent)))?;
        self.cells[pos.index(self.size)] = None;
        self.empty.insert(pos);
        Ok(pos)
    }

    /// Move `agent` to `target`, vacating its old cell
    ///
    /// Moving onto the agent's own cell is a no-op. Fails without mutating
    /// anything if the target is held by another agent.
    pub fn move_to(&mut self, agent: A, target: Position) -> Result<()> {
        self.check_bounds(target)?;
        let current = self
            .position_of(agent)
            .ok_or_else(|| SimError::UnknownAgent(format!("{:?}", agent)))?;
        if current == target {
            return Ok(());
        }
        let target_index = target.index(self.size);
        if self.cells[target_index].is_some() {
            return Err(SimError::CellOccupied(target));
        }
        self.cells[current.index(self.size)] = None;
        self.empty.insert(current);
        self.cells[target_index] = Some(agent);
        self.empty.remove(&target);
        self.positions.insert(agent, target);
        Ok(())
    }

    /// Cells within Chebyshev distance `radius` of `center`, wrapping around
    ///
    /// Excludes `center` itself. Offsets that wrap onto the same cell on a
    /// small lattice are reported once. Any radius of at least `size`
    /// covers the whole torus.
    pub fn neighborhood(&self, center: Position, radius: usize) -> Vec<Position> {
        let size = self.size as i64;
        let r = radius.min(self.size) as i64;
        let mut cells = BTreeSet::new();
        for dy in -r..=r {
            for dx in -r..=r {
                let x = (center.x as i64 + dx).rem_euclid(size) as usize;
                let y = (center.y as i64 + dy).rem_euclid(size) as usize;
                cells.insert(Position::new(x, y));
            }
        }
        cells.remove(&center);
        cells.into_iter().collect()
    }

    /// Agents within distance `radius` of `agent`, excluding `agent`
    pub fn neighbors(&self, agent: A, radius: usize) -> Result<Vec<A>> {
        let center = self
            .position_of(agent)
            .ok_or_else(|| SimError::UnknownAgent(format!("{:?}", agent)))?;
        Ok(self
            .neighborhood(center, radius)
            .into_iter()
            .filter_map(|pos| self.agent_at(pos))
            .collect())
    }
}
