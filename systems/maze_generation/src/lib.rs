#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded maze generation for ASCII Wars levels.
//!
//! Mazes are carved with a recursive backtracker over the odd-coordinate
//! lattice, opened up with a handful of rectangular rooms, and finished with
//! a guaranteed start room and an exit placed as far from the start as the
//! topology allows.

use ascii_wars_core::{config::MIN_GRID_EDGE, Cell, CellCoord, Grid, MazeConfig};
use log::debug;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Cell every level starts the player on.
pub const START: CellCoord = CellCoord::new(1, 1);

const START_ROOM_EDGE: u32 = 3;

/// Reasons maze generation may fail.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MazeError {
    /// The requested dimensions cannot hold the lattice.
    #[error("maze must be at least {min}x{min} cells, got {columns}x{rows}", min = MIN_GRID_EDGE)]
    TooSmall {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
}

/// Output of a single generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    /// Carved grid with the exit marked.
    pub grid: Grid,
    /// Player start cell.
    pub start: CellCoord,
    /// Exit cell.
    pub exit: CellCoord,
}

/// Maze generator driven by an injected seeded RNG.
#[derive(Debug)]
pub struct MazeGenerator {
    rng: ChaCha8Rng,
}

impl MazeGenerator {
    /// Creates a generator seeded with the provided value.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Creates a generator that draws from an existing RNG.
    #[must_use]
    pub fn from_rng(rng: ChaCha8Rng) -> Self {
        Self { rng }
    }

    /// Generates a complete maze: passages, rooms, start room and exit.
    pub fn generate(&mut self, config: &MazeConfig) -> Result<Maze, MazeError> {
        let mut grid = self.carve_passages(config.columns, config.rows)?;
        let rooms = self.carve_rooms(&mut grid, config);
        carve_start_room(&mut grid);
        let exit = place_exit(&mut grid, START);
        debug!(
            "generated {}x{} maze with {rooms} rooms, exit at ({}, {})",
            config.columns,
            config.rows,
            exit.column(),
            exit.row()
        );
        Ok(Maze {
            grid,
            start: START,
            exit,
        })
    }

    /// Carves the tree of passages without rooms or an exit.
    ///
    /// Even dimensions leave their last row or column as extra wall, so the
    /// outer ring stays solid regardless of the requested size.
    pub fn carve_passages(&mut self, columns: u32, rows: u32) -> Result<Grid, MazeError> {
        if columns < MIN_GRID_EDGE || rows < MIN_GRID_EDGE {
            return Err(MazeError::TooSmall { columns, rows });
        }

        let lattice_columns = odd_floor(columns);
        let lattice_rows = odd_floor(rows);
        let mut grid = Grid::filled(columns, rows, Cell::Wall);
        let _ = grid.set(START, Cell::Floor);

        let mut stack = vec![START];
        while let Some(&current) = stack.last() {
            let candidates = unvisited_neighbors(&grid, current, lattice_columns, lattice_rows);
            let Some(&(between, next)) = candidates.choose(&mut self.rng) else {
                let _ = stack.pop();
                continue;
            };
            let _ = grid.set(between, Cell::Floor);
            let _ = grid.set(next, Cell::Floor);
            stack.push(next);
        }

        Ok(grid)
    }

    /// Returns every floor cell outside `exclude`, uniformly shuffled.
    ///
    /// Callers slice disjoint prefixes of the result to place different kinds of
    /// objects without overlap.
    pub fn spawnable_cells(&mut self, grid: &Grid, exclude: &[CellCoord]) -> Vec<CellCoord> {
        let mut cells: Vec<CellCoord> = grid
            .floor_cells()
            .into_iter()
            .filter(|cell| !exclude.contains(cell))
            .collect();
        cells.shuffle(&mut self.rng);
        cells
    }

    fn carve_rooms(&mut self, grid: &mut Grid, config: &MazeConfig) -> usize {
        if config.room_count == 0 {
            return 0;
        }

        let max_size = config.max_room_size;
        let min_size = config.min_room_size.min(max_size);
        let column_limit = grid.columns().saturating_sub(1);
        let row_limit = grid.rows().saturating_sub(1);
        let mut anchors: Vec<CellCoord> = grid
            .floor_cells()
            .into_iter()
            .filter(|cell| {
                cell.column() + max_size < column_limit && cell.row() + max_size < row_limit
            })
            .collect();
        anchors.shuffle(&mut self.rng);
        anchors.truncate(usize::try_from(config.room_count).unwrap_or(usize::MAX));

        for anchor in &anchors {
            let width = self.rng.gen_range(min_size..=max_size);
            let height = self.rng.gen_range(min_size..=max_size);
            carve_rect(grid, *anchor, width, height);
        }
        anchors.len()
    }
}

/// Marks the floor cell farthest from `start` as the exit and returns it.
///
/// Cells are scanned in row-major order and only a strictly greater distance
/// replaces the current pick, so the first farthest cell wins. A grid without
/// any floor gets its exit at the bottom-right interior corner.
pub fn place_exit(grid: &mut Grid, start: CellCoord) -> CellCoord {
    let mut exit = CellCoord::new(
        grid.columns().saturating_sub(2),
        grid.rows().saturating_sub(2),
    );
    let mut best_distance = 0;
    for row in 1..grid.rows().saturating_sub(1) {
        for column in 1..grid.columns().saturating_sub(1) {
            let cell = CellCoord::new(column, row);
            if grid.cell(cell) != Cell::Floor {
                continue;
            }
            let distance = cell.manhattan_distance(start);
            if distance > best_distance {
                best_distance = distance;
                exit = cell;
            }
        }
    }

    let _ = grid.set(exit, Cell::Exit);
    exit
}

fn odd_floor(value: u32) -> u32 {
    if value % 2 == 0 {
        value - 1
    } else {
        value
    }
}

fn unvisited_neighbors(
    grid: &Grid,
    cell: CellCoord,
    lattice_columns: u32,
    lattice_rows: u32,
) -> Vec<(CellCoord, CellCoord)> {
    const OFFSETS: [(i32, i32); 4] = [(0, -2), (0, 2), (-2, 0), (2, 0)];

    OFFSETS
        .iter()
        .filter_map(|&(column_delta, row_delta)| {
            let next = cell.offset(column_delta, row_delta)?;
            let inside = next.column() > 0
                && next.column() < lattice_columns
                && next.row() > 0
                && next.row() < lattice_rows;
            if !inside || grid.cell(next) != Cell::Wall {
                return None;
            }
            let between = cell.offset(column_delta / 2, row_delta / 2)?;
            Some((between, next))
        })
        .collect()
}

fn carve_rect(grid: &mut Grid, origin: CellCoord, width: u32, height: u32) {
    for row in origin.row()..origin.row().saturating_add(height) {
        for column in origin.column()..origin.column().saturating_add(width) {
            let cell = CellCoord::new(column, row);
            if grid.contains(cell) && !grid.is_border(cell) && grid.cell(cell) == Cell::Wall {
                let _ = grid.set(cell, Cell::Floor);
            }
        }
    }
}

fn carve_start_room(grid: &mut Grid) {
    carve_rect(grid, START, START_ROOM_EDGE, START_ROOM_EDGE);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_rooms(columns: u32, rows: u32) -> MazeConfig {
        MazeConfig {
            columns,
            rows,
            room_count: 0,
            min_room_size: 2,
            max_room_size: 5,
        }
    }

    #[test]
    fn rejects_tiny_grids() {
        let mut generator = MazeGenerator::new(7);
        assert_eq!(
            generator.generate(&no_rooms(4, 9)),
            Err(MazeError::TooSmall {
                columns: 4,
                rows: 9
            })
        );
    }

    #[test]
    fn even_dimensions_keep_padding_as_wall() {
        let mut generator = MazeGenerator::new(11);
        let grid = generator.carve_passages(10, 8).expect("valid size");
        for row in 0..8 {
            assert_eq!(grid.cell(CellCoord::new(8, row)), Cell::Wall);
            assert_eq!(grid.cell(CellCoord::new(9, row)), Cell::Wall);
        }
        for column in 0..10 {
            assert_eq!(grid.cell(CellCoord::new(column, 6)), Cell::Wall);
            assert_eq!(grid.cell(CellCoord::new(column, 7)), Cell::Wall);
        }
    }

    #[test]
    fn passages_visit_every_lattice_cell() {
        let mut generator = MazeGenerator::new(3);
        let grid = generator.carve_passages(11, 9).expect("valid size");
        for row in (1..9).step_by(2) {
            for column in (1..11).step_by(2) {
                assert_eq!(grid.cell(CellCoord::new(column, row)), Cell::Floor);
            }
        }
    }

    #[test]
    fn start_room_is_open() {
        let mut generator = MazeGenerator::new(99);
        let maze = generator.generate(&no_rooms(21, 15)).expect("valid size");
        for row in 1..=3 {
            for column in 1..=3 {
                assert!(maze.grid.is_walkable(column, row));
            }
        }
        assert_eq!(maze.start, START);
    }

    #[test]
    fn exit_takes_first_farthest_floor_cell() {
        let mut grid = Grid::from_rows(&[
            "#######", //
            "#.....#", //
            "#.###.#", //
            "#.....#", //
            "#######",
        ]);
        let exit = place_exit(&mut grid, START);
        // (5,3) is the only cell at distance 6.
        assert_eq!(exit, CellCoord::new(5, 3));
        assert_eq!(grid.cell(exit), Cell::Exit);

        let mut tied = Grid::from_rows(&[
            "#####", //
            "#...#", //
            "#.###", //
            "#.###", //
            "#####",
        ]);
        // (3,1) and (1,3) are both at distance 2; row-major scan picks (3,1).
        assert_eq!(place_exit(&mut tied, START), CellCoord::new(3, 1));
    }

    #[test]
    fn exit_falls_back_without_floor() {
        let mut grid = Grid::filled(7, 5, Cell::Wall);
        assert_eq!(place_exit(&mut grid, START), CellCoord::new(5, 3));
    }

    #[test]
    fn rooms_only_add_floor() {
        let config = MazeConfig {
            columns: 31,
            rows: 21,
            room_count: 6,
            min_room_size: 2,
            max_room_size: 5,
        };
        let mut plain = MazeGenerator::new(5);
        let passages = plain.carve_passages(31, 21).expect("valid size");

        let mut generator = MazeGenerator::new(5);
        let maze = generator.generate(&config).expect("valid size");
        for cell in passages.floor_cells() {
            assert!(maze.grid.is_walkable_cell(cell), "room carving removed {cell:?}");
        }
    }

    #[test]
    fn spawnable_cells_exclude_requested_cells() {
        let mut generator = MazeGenerator::new(42);
        let maze = generator
            .generate(&MazeConfig::default())
            .expect("valid size");
        let cells = generator.spawnable_cells(&maze.grid, &[maze.start]);
        assert!(!cells.contains(&maze.start));
        assert!(!cells.contains(&maze.exit));
        assert_eq!(cells.len(), maze.grid.floor_cells().len() - 1);
    }

    #[test]
    fn same_seed_same_maze() {
        let config = MazeConfig::default();
        let first = MazeGenerator::new(1234).generate(&config);
        let second = MazeGenerator::new(1234).generate(&config);
        assert_eq!(first, second);
    }
}
