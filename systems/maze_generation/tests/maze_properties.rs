use std::collections::VecDeque;

use ascii_wars_core::{Cell, CellCoord, Grid, MazeConfig};
use ascii_wars_system_maze_generation::{MazeGenerator, START};
use proptest::prelude::*;

fn reachable_from(grid: &Grid, start: CellCoord) -> Vec<CellCoord> {
    let mut seen = vec![false; (grid.columns() * grid.rows()) as usize];
    let mut queue = VecDeque::from([start]);
    let mut reached = Vec::new();
    if let Some(index) = grid.index(start) {
        seen[index] = true;
    }
    while let Some(cell) = queue.pop_front() {
        reached.push(cell);
        for next in grid.walkable_neighbors(cell) {
            let index = grid.index(next).expect("neighbor inside grid");
            if !seen[index] {
                seen[index] = true;
                queue.push_back(next);
            }
        }
    }
    reached.sort();
    reached
}

fn assert_border_is_wall(grid: &Grid) {
    let last_column = grid.columns() - 1;
    let last_row = grid.rows() - 1;
    for column in 0..grid.columns() {
        assert_eq!(grid.cell(CellCoord::new(column, 0)), Cell::Wall);
        assert_eq!(grid.cell(CellCoord::new(column, last_row)), Cell::Wall);
    }
    for row in 0..grid.rows() {
        assert_eq!(grid.cell(CellCoord::new(0, row)), Cell::Wall);
        assert_eq!(grid.cell(CellCoord::new(last_column, row)), Cell::Wall);
    }
}

#[test]
fn roomless_41_by_31_maze_is_a_single_component_over_the_lattice() {
    let mut generator = MazeGenerator::new(0x5eed);
    let grid = generator.carve_passages(41, 31).expect("valid size");

    let mut lattice = Vec::new();
    for row in (1..30).step_by(2) {
        for column in (1..40).step_by(2) {
            lattice.push(CellCoord::new(column, row));
        }
    }
    let floor = grid.floor_cells();
    for cell in &lattice {
        assert!(floor.contains(cell), "lattice cell {cell:?} left as wall");
    }

    let mut expected = floor.clone();
    expected.sort();
    assert_eq!(reachable_from(&grid, START), expected);

    // A spanning tree over n lattice cells carves exactly n - 1 connectors.
    assert_eq!(floor.len(), lattice.len() * 2 - 1);
    assert_border_is_wall(&grid);
}

#[test]
fn default_level_is_connected_and_bordered() {
    let mut generator = MazeGenerator::new(77);
    let maze = generator
        .generate(&MazeConfig::default())
        .expect("valid size");

    assert_border_is_wall(&maze.grid);
    assert_eq!(maze.grid.cell(maze.exit), Cell::Exit);
    let mut walkable = maze.grid.walkable_cells();
    walkable.sort();
    assert_eq!(reachable_from(&maze.grid, maze.start), walkable);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn passages_are_connected_and_bordered(
        seed in any::<u64>(),
        columns in 5u32..48,
        rows in 5u32..36,
    ) {
        let mut generator = MazeGenerator::new(seed);
        let grid = generator.carve_passages(columns, rows).expect("valid size");
        let mut floor = grid.floor_cells();
        floor.sort();
        prop_assert_eq!(reachable_from(&grid, START), floor);
        assert_border_is_wall(&grid);
    }

    #[test]
    fn finished_mazes_stay_connected_and_bordered(
        seed in any::<u64>(),
        columns in 5u32..48,
        rows in 5u32..36,
        room_count in 0u32..8,
    ) {
        let config = MazeConfig {
            columns,
            rows,
            room_count,
            min_room_size: 2,
            max_room_size: 5,
        };
        let mut generator = MazeGenerator::new(seed);
        let maze = generator.generate(&config).expect("valid size");
        assert_border_is_wall(&maze.grid);

        let mut walkable = maze.grid.walkable_cells();
        walkable.sort();
        prop_assert_eq!(reachable_from(&maze.grid, maze.start), walkable);

        let exit_distance = maze.exit.manhattan_distance(maze.start);
        for cell in maze.grid.floor_cells() {
            prop_assert!(cell.manhattan_distance(maze.start) <= exit_distance);
        }
    }
}
