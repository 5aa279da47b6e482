#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic level composition: maze, pickups and entity placements.

use std::collections::HashSet;

use ascii_wars_core::{
    Cell, CellCoord, Direction, EntityKind, GameConfig, Grid, LevelLayout, SpawnPlan,
};
use ascii_wars_system_maze_generation::{MazeError, MazeGenerator};
use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Reasons a level cannot be built.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The maze for the level could not be generated.
    #[error("failed to generate maze for level {level}")]
    Maze {
        /// Level being built.
        level: u32,
        /// Underlying generation failure.
        #[source]
        source: MazeError,
    },
}

/// Population targets for a single level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelPlan {
    /// Level the targets were computed for, clamped to the configured maximum.
    pub level: u32,
    /// Tokens to scatter.
    pub tokens: u32,
    /// Speed bonuses to scatter.
    pub speed_bonuses: u32,
    /// Enemies to spawn.
    pub enemies: u32,
    /// Snakes to spawn.
    pub snakes: u32,
    /// Carriers to spawn.
    pub carriers: u32,
    /// Body segments behind each snake head.
    pub snake_body_length: u32,
}

impl LevelPlan {
    /// Computes the populations requested for a 1-based level.
    #[must_use]
    pub fn for_level(level: u32, config: &GameConfig) -> Self {
        let level = level.clamp(1, config.progression.max_level.max(1));
        Self {
            level,
            tokens: config.progression.tokens_at(level),
            speed_bonuses: config.speed_bonus.escalation.count_at(level),
            enemies: config.progression.enemies_at(level),
            snakes: config.snake.escalation.count_at(level),
            carriers: config.carrier.escalation.count_at(level),
            snake_body_length: config.snake.body_length_at(level),
        }
    }
}

/// Builds complete level layouts from a single session seed.
#[derive(Clone, Debug)]
pub struct LevelBuilder {
    config: GameConfig,
    seed: u64,
}

impl LevelBuilder {
    /// Creates a builder; each level draws from its own stream of `seed`.
    #[must_use]
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        Self {
            config: config.clone(),
            seed,
        }
    }

    /// Generates the maze for `level` and places pickups and entities on it.
    ///
    /// Populations are clamped to the free cells the maze offers, so a small
    /// maze yields fewer objects instead of an error.
    pub fn build(&self, level: u32) -> Result<LevelLayout, LevelError> {
        let plan = LevelPlan::for_level(level, &self.config);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(u64::from(level));
        let mut generator = MazeGenerator::from_rng(rng);
        let maze = generator
            .generate(&self.config.maze)
            .map_err(|source| LevelError::Maze { level, source })?;
        let candidates = generator.spawnable_cells(&maze.grid, &[maze.start, maze.exit]);

        let min_distance = self.config.enemy.min_spawn_distance;
        let mut placer = Placer::new(&maze.grid, maze.start, candidates);
        let tokens = placer.take(plan.tokens, |_| true);
        let speed_bonuses = placer.take(plan.speed_bonuses, |_| true);

        let mut spawns: Vec<SpawnPlan> = placer
            .take(plan.enemies, |cell| {
                is_safe_spawn(&maze.grid, cell, maze.start, min_distance)
            })
            .into_iter()
            .map(|cell| SpawnPlan {
                kind: EntityKind::Enemy,
                cell,
                body: Vec::new(),
            })
            .collect();

        let body_length = usize::try_from(plan.snake_body_length).unwrap_or(usize::MAX);
        for _ in 0..plan.snakes {
            let Some((cell, body)) = placer.take_snake(body_length, min_distance) else {
                break;
            };
            spawns.push(SpawnPlan {
                kind: EntityKind::Snake,
                cell,
                body,
            });
        }

        spawns.extend(
            placer
                .take(plan.carriers, |_| true)
                .into_iter()
                .map(|cell| SpawnPlan {
                    kind: EntityKind::Carrier,
                    cell,
                    body: Vec::new(),
                }),
        );

        debug!(
            "built level {level}: {} tokens, {} speed bonuses, {} spawns",
            tokens.len(),
            speed_bonuses.len(),
            spawns.len()
        );

        Ok(LevelLayout {
            level,
            grid: maze.grid,
            start: maze.start,
            exit: maze.exit,
            tokens,
            speed_bonuses,
            spawns,
        })
    }
}

/// Reports whether `from` and `to` share a row or column with only floor between.
#[must_use]
pub fn has_line_of_sight(grid: &Grid, from: CellCoord, to: CellCoord) -> bool {
    if from.column() == to.column() {
        let (low, high) = ordered(from.row(), to.row());
        return (low + 1..high)
            .all(|row| grid.cell(CellCoord::new(from.column(), row)) == Cell::Floor);
    }
    if from.row() == to.row() {
        let (low, high) = ordered(from.column(), to.column());
        return (low + 1..high)
            .all(|column| grid.cell(CellCoord::new(column, from.row())) == Cell::Floor);
    }
    false
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn is_safe_spawn(grid: &Grid, cell: CellCoord, start: CellCoord, min_distance: u32) -> bool {
    cell.manhattan_distance(start) >= min_distance && !has_line_of_sight(grid, cell, start)
}

struct Placer<'a> {
    grid: &'a Grid,
    start: CellCoord,
    candidates: Vec<CellCoord>,
    used: HashSet<CellCoord>,
}

impl<'a> Placer<'a> {
    fn new(grid: &'a Grid, start: CellCoord, candidates: Vec<CellCoord>) -> Self {
        Self {
            grid,
            start,
            candidates,
            used: HashSet::new(),
        }
    }

    /// Claims up to `count` unused candidates accepted by `accept`, in shuffled order.
    fn take<F>(&mut self, count: u32, accept: F) -> Vec<CellCoord>
    where
        F: Fn(CellCoord) -> bool,
    {
        let count = usize::try_from(count).unwrap_or(usize::MAX);
        let taken: Vec<CellCoord> = self
            .candidates
            .iter()
            .copied()
            .filter(|cell| !self.used.contains(cell) && accept(*cell))
            .take(count)
            .collect();
        self.used.extend(taken.iter().copied());
        taken
    }

    /// Claims a safe head cell plus a chain of adjacent floor cells behind it.
    fn take_snake(
        &mut self,
        body_length: usize,
        min_distance: u32,
    ) -> Option<(CellCoord, Vec<CellCoord>)> {
        for index in 0..self.candidates.len() {
            let head = self.candidates[index];
            if self.used.contains(&head)
                || !is_safe_spawn(self.grid, head, self.start, min_distance)
            {
                continue;
            }
            let Some(body) = self.chain(head, body_length) else {
                continue;
            };
            let _ = self.used.insert(head);
            self.used.extend(body.iter().copied());
            return Some((head, body));
        }
        None
    }

    fn chain(&self, head: CellCoord, length: usize) -> Option<Vec<CellCoord>> {
        let mut body: Vec<CellCoord> = Vec::with_capacity(length);
        let mut tail = head;
        while body.len() < length {
            let next = Direction::ALL
                .iter()
                .filter_map(|direction| tail.step(*direction))
                .find(|cell| {
                    self.grid.cell(*cell) == Cell::Floor
                        && *cell != head
                        && *cell != self.start
                        && !body.contains(cell)
                        && !self.used.contains(cell)
                })?;
            body.push(next);
            tail = next;
        }
        Some(body)
    }
}
