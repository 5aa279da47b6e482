//! Scripted player used for unattended runs.

use std::iter;

use ascii_wars_core::{CellCoord, Direction, Grid};
use ascii_wars_headless::FrameInput;
use ascii_wars_system_pathfinding::Pathfinder;
use ascii_wars_world::{query, World};

/// Walks toward the nearest token, then the exit, and fires down open corridors.
#[derive(Debug, Default)]
pub(crate) struct Autopilot {
    pathfinder: Pathfinder,
}

impl Autopilot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Chooses the input for the next frame. Firing takes priority over moving.
    pub(crate) fn next_input(&mut self, world: &World) -> FrameInput {
        let player = query::player(world);
        if !player.alive {
            return FrameInput::default();
        }
        if let Some(direction) = target_in_sight(world, player.cell) {
            return FrameInput {
                movement: None,
                fire: Some(direction),
            };
        }
        FrameInput {
            movement: self.next_step(world, player.cell),
            fire: None,
        }
    }

    fn next_step(&mut self, world: &World, from: CellCoord) -> Option<Direction> {
        let grid = query::grid(world);
        let tokens = query::tokens(world);
        let goals: Vec<CellCoord> = if !tokens.is_empty() {
            tokens.to_vec()
        } else if query::is_exit_unlocked(world) {
            vec![query::exit(world)]
        } else {
            Vec::new()
        };

        let path = goals
            .iter()
            .filter_map(|goal| self.pathfinder.find_path(grid, from, *goal))
            .filter(|path| !path.is_empty())
            .min_by_key(Vec::len)?;
        path.first()
            .and_then(|next| Direction::between(from, *next))
    }
}

fn target_in_sight(world: &World, origin: CellCoord) -> Option<Direction> {
    if query::discs(world).iter().any(|disc| disc.active) {
        return None;
    }
    let grid = query::grid(world);
    let range = query::config(world).disc.max_range;
    let hostiles: Vec<CellCoord> = query::entity_view(world)
        .iter()
        .filter(|entity| entity.alive && entity.kind.is_hostile())
        .flat_map(|entity| iter::once(entity.cell).chain(entity.body.iter().copied()))
        .collect();

    Direction::ALL.into_iter().find(|direction| {
        query::can_fire(world, origin, *direction).is_ok()
            && lane(grid, origin, *direction, range).any(|cell| hostiles.contains(&cell))
    })
}

fn lane(
    grid: &Grid,
    origin: CellCoord,
    direction: Direction,
    range: u32,
) -> impl Iterator<Item = CellCoord> + '_ {
    let reach = usize::try_from(range).unwrap_or(usize::MAX).saturating_add(1);
    iter::successors(Some(origin), move |cell| cell.step(direction))
        .skip(1)
        .take_while(|cell| grid.is_walkable_cell(*cell))
        .take(reach)
}
