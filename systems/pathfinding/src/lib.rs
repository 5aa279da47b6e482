#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! A* shortest paths over maze grids.
//!
//! Moves are 4-connected with unit cost and the heuristic is the Manhattan
//! distance, which never overestimates on such a grid, so every returned path
//! is a shortest one.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
};

use ascii_wars_core::{CellCoord, Grid};

/// Reusable A* search state.
///
/// The open heap, score maps and closed set are kept between searches so
/// repeated queries during a level do not reallocate.
#[derive(Debug, Default)]
pub struct Pathfinder {
    open: BinaryHeap<Node>,
    g_scores: HashMap<usize, u32>,
    came_from: HashMap<usize, CellCoord>,
    closed: HashSet<usize>,
    sequence: u64,
}

impl Pathfinder {
    /// Creates a pathfinder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a shortest path from `start` to `goal`.
    ///
    /// The returned cells begin with the first step after `start` and end with
    /// `goal`. An empty path means the two cells coincide. `None` is returned
    /// when the goal lies outside the grid, is a wall, or cannot be reached.
    pub fn find_path(
        &mut self,
        grid: &Grid,
        start: CellCoord,
        goal: CellCoord,
    ) -> Option<Vec<CellCoord>> {
        if !grid.contains(start) || !grid.is_walkable_cell(goal) {
            return None;
        }
        if start == goal {
            return Some(Vec::new());
        }

        self.reset();
        let start_key = grid.index(start)?;
        let _ = self.g_scores.insert(start_key, 0);
        self.push(start, 0, goal);

        while let Some(node) = self.open.pop() {
            let Some(key) = grid.index(node.cell) else {
                continue;
            };
            if !self.closed.insert(key) {
                continue;
            }
            if node.cell == goal {
                return Some(self.reconstruct(grid, start, goal));
            }

            let tentative = node.g + 1;
            for neighbor in grid.walkable_neighbors(node.cell) {
                let Some(neighbor_key) = grid.index(neighbor) else {
                    continue;
                };
                if self.closed.contains(&neighbor_key) {
                    continue;
                }
                let improved = self
                    .g_scores
                    .get(&neighbor_key)
                    .map_or(true, |&best| tentative < best);
                if improved {
                    let _ = self.g_scores.insert(neighbor_key, tentative);
                    let _ = self.came_from.insert(neighbor_key, node.cell);
                    self.push(neighbor, tentative, goal);
                }
            }
        }

        None
    }

    fn reset(&mut self) {
        self.open.clear();
        self.g_scores.clear();
        self.came_from.clear();
        self.closed.clear();
        self.sequence = 0;
    }

    fn push(&mut self, cell: CellCoord, g: u32, goal: CellCoord) {
        let h = cell.manhattan_distance(goal);
        self.open.push(Node {
            cell,
            g,
            f: g + h,
            h,
            sequence: self.sequence,
        });
        self.sequence += 1;
    }

    fn reconstruct(&self, grid: &Grid, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(&previous) = grid
            .index(current)
            .and_then(|key| self.came_from.get(&key))
        {
            if previous == start {
                break;
            }
            path.push(previous);
            current = previous;
        }
        path.reverse();
        path
    }
}

/// One-shot convenience wrapper around [`Pathfinder::find_path`].
#[must_use]
pub fn find_path(grid: &Grid, start: CellCoord, goal: CellCoord) -> Option<Vec<CellCoord>> {
    Pathfinder::new().find_path(grid, start, goal)
}

#[derive(Clone, Copy, Debug)]
struct Node {
    cell: CellCoord,
    g: u32,
    f: u32,
    h: u32,
    sequence: u64,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl Ord for Node {
    // Reversed so the max-heap pops the lowest f first; ties go to the node
    // closer to the goal, then to the earliest pushed.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
