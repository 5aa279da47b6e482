use serde::{Deserialize, Serialize};

use crate::{CellCoord, Direction};

/// Type of terrain stored in a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Solid wall that blocks entities and discs.
    Wall,
    /// Open floor.
    Floor,
    /// Floor cell that ends the level once unlocked.
    Exit,
}

impl Cell {
    /// Reports whether entities may stand on the cell.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// Dense row-major cell storage for a single level.
///
/// Dimensions are fixed when the grid is created. Every query treats
/// coordinates outside the grid as [`Cell::Wall`], so callers never need to
/// bounds-check before asking.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid where every cell holds the provided value.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, cell: Cell) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![cell; capacity],
        }
    }

    /// Parses a grid from text rows where `#` is wall, `E` is the exit and
    /// every other character is floor.
    ///
    /// Rows shorter than the widest row are padded with walls.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let columns = u32::try_from(width).unwrap_or(0);
        let row_count = u32::try_from(rows.len()).unwrap_or(0);
        let mut grid = Self::filled(columns, row_count, Cell::Wall);
        for (row, text) in (0..row_count).zip(rows) {
            for (column, glyph) in (0..columns).zip(text.chars()) {
                let cell = match glyph {
                    '#' => Cell::Wall,
                    'E' => Cell::Exit,
                    _ => Cell::Floor,
                };
                let _ = grid.set(CellCoord::new(column, row), cell);
            }
        }
        grid
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Columns and rows, in that order.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Reports whether the column and row lie inside the grid.
    #[must_use]
    pub const fn is_in_bounds(&self, column: u32, row: u32) -> bool {
        column < self.columns && row < self.rows
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        self.is_in_bounds(cell.column(), cell.row())
    }

    /// Reports whether the column and row hold a walkable cell.
    ///
    /// Out-of-bounds coordinates are never walkable.
    #[must_use]
    pub fn is_walkable(&self, column: u32, row: u32) -> bool {
        self.is_walkable_cell(CellCoord::new(column, row))
    }

    /// Coordinate form of [`Grid::is_walkable`].
    #[must_use]
    pub fn is_walkable_cell(&self, cell: CellCoord) -> bool {
        self.cell(cell).is_walkable()
    }

    /// Reports whether the cell sits on the outer ring of the grid.
    #[must_use]
    pub const fn is_border(&self, cell: CellCoord) -> bool {
        cell.column() == 0
            || cell.row() == 0
            || cell.column() + 1 >= self.columns
            || cell.row() + 1 >= self.rows
    }

    /// Returns the cell stored at the coordinate, or a wall when outside.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Cell {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(Cell::Wall)
    }

    /// Overwrites a single cell in place.
    ///
    /// Returns `false` without mutating anything when the coordinate is outside
    /// the grid.
    pub fn set(&mut self, cell: CellCoord, value: Cell) -> bool {
        match self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Walkable cardinal neighbors of the cell, in up, down, left, right order.
    #[must_use]
    pub fn walkable_neighbors(&self, cell: CellCoord) -> Neighbors {
        let mut neighbors = Neighbors::default();
        for direction in Direction::ALL {
            if let Some(next) = cell.step(direction) {
                if self.is_walkable_cell(next) {
                    neighbors.push(next);
                }
            }
        }
        neighbors
    }

    /// Every floor cell in row-major order. Exit cells are not included.
    #[must_use]
    pub fn floor_cells(&self) -> Vec<CellCoord> {
        self.coordinates()
            .filter(|cell| self.cell(*cell) == Cell::Floor)
            .collect()
    }

    /// Every walkable cell in row-major order.
    #[must_use]
    pub fn walkable_cells(&self) -> Vec<CellCoord> {
        self.coordinates()
            .filter(|cell| self.is_walkable_cell(*cell))
            .collect()
    }

    /// Flattened row-major index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn coordinates(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns;
        (0..self.rows)
            .flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }
}

/// Fixed-capacity iterator over up to four neighboring cells.
#[derive(Clone, Debug, Default)]
pub struct Neighbors {
    buffer: [Option<CellCoord>; 4],
    len: usize,
    cursor: usize,
}

impl Neighbors {
    fn push(&mut self, cell: CellCoord) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(cell);
            self.len += 1;
        }
    }
}

impl Iterator for Neighbors {
    type Item = CellCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}
