//! Per-entity patrol and chase state.

use ascii_wars_core::{
    CellCoord, Direction, EntityKind, EntitySnapshot, GameConfig, Grid, Mode, PlayerSnapshot,
    Wander,
};
use ascii_wars_system_pathfinding::Pathfinder;
use log::trace;
use rand::{seq::SliceRandom, Rng};
use rand_chacha::ChaCha8Rng;

const RELOCATE_ATTEMPTS: usize = 10;
const MIN_RELOCATE_SEPARATION: u32 = 3;

/// How far an idle entity may stray from its anchor before turning back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Leash {
    Manhattan(u32),
    Chebyshev(u32),
}

impl Leash {
    fn exceeded(self, cell: CellCoord, anchor: CellCoord) -> bool {
        match self {
            Self::Manhattan(radius) => cell.manhattan_distance(anchor) > radius,
            Self::Chebyshev(radius) => cell.chebyshev_distance(anchor) > radius,
        }
    }
}

/// Tuning that distinguishes one kind of entity from another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Profile {
    chase_range: Option<u32>,
    leash: Leash,
    /// Anchor relocation bounds; `None` keeps the spawn anchor forever.
    relocation: Option<Wander>,
    alert_capable: bool,
}

impl Profile {
    pub(crate) fn for_kind(kind: EntityKind, config: &GameConfig) -> Self {
        match kind {
            EntityKind::Enemy => Self {
                chase_range: Some(config.enemy.chase_range),
                leash: Leash::Manhattan(config.enemy.wander.radius),
                relocation: Some(config.enemy.wander),
                alert_capable: false,
            },
            EntityKind::Snake => Self {
                chase_range: Some(config.snake.chase_range),
                leash: Leash::Manhattan(config.snake.wander.radius),
                relocation: Some(config.snake.wander),
                alert_capable: true,
            },
            EntityKind::Carrier => Self {
                chase_range: None,
                leash: Leash::Chebyshev(config.carrier.patrol_radius),
                relocation: None,
                alert_capable: false,
            },
        }
    }
}

/// Outcome of one decision: the mode to be in and the step to try.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Decision {
    pub(crate) mode: Mode,
    pub(crate) direction: Option<Direction>,
}

#[derive(Debug)]
pub(crate) struct Controller {
    profile: Profile,
    anchor: CellCoord,
    moves: u32,
    threshold: Option<u32>,
    rng: ChaCha8Rng,
}

impl Controller {
    pub(crate) fn new(profile: Profile, anchor: CellCoord, rng: ChaCha8Rng) -> Self {
        let mut controller = Self {
            profile,
            anchor,
            moves: 0,
            threshold: None,
            rng,
        };
        controller.threshold = controller.roll_threshold();
        controller
    }

    pub(crate) fn anchor(&self) -> CellCoord {
        self.anchor
    }

    pub(crate) fn decide(
        &mut self,
        entity: &EntitySnapshot,
        player: &PlayerSnapshot,
        grid: &Grid,
        pathfinder: &mut Pathfinder,
    ) -> Decision {
        let alert = entity.alert && self.profile.alert_capable;
        let in_range = self.in_range(entity.cell, player, alert);

        if entity.mode == Mode::Chase && !in_range {
            self.reset_anchor(entity.cell);
        }

        if in_range {
            Decision {
                mode: Mode::Chase,
                direction: self.chase_direction(entity, player.cell, alert, grid, pathfinder),
            }
        } else {
            Decision {
                mode: Mode::Patrol,
                direction: self.patrol_direction(entity, grid),
            }
        }
    }

    fn in_range(&self, cell: CellCoord, player: &PlayerSnapshot, alert: bool) -> bool {
        let Some(range) = self.profile.chase_range else {
            return false;
        };
        let range = if alert { range.saturating_mul(2) } else { range };
        player.alive && !player.invulnerable && cell.manhattan_distance(player.cell) <= range
    }

    fn reset_anchor(&mut self, cell: CellCoord) {
        self.anchor = cell;
        self.moves = 0;
        self.threshold = self.roll_threshold();
    }

    fn roll_threshold(&mut self) -> Option<u32> {
        let wander = self.profile.relocation?;
        let low = wander.relocate_min_moves.min(wander.relocate_max_moves);
        let high = wander.relocate_min_moves.max(wander.relocate_max_moves);
        Some(self.rng.gen_range(low..=high))
    }

    fn chase_direction(
        &mut self,
        entity: &EntitySnapshot,
        target: CellCoord,
        alert: bool,
        grid: &Grid,
        pathfinder: &mut Pathfinder,
    ) -> Option<Direction> {
        if alert {
            let first_step = pathfinder
                .find_path(grid, entity.cell, target)
                .and_then(|path| path.first().copied())
                .and_then(|next| Direction::between(entity.cell, next))
                .filter(|direction| is_open(entity, grid, *direction));
            if first_step.is_some() {
                return first_step;
            }
        }
        self.toward(entity, target, grid)
            .or_else(|| self.random_open(entity, grid))
    }

    fn patrol_direction(&mut self, entity: &EntitySnapshot, grid: &Grid) -> Option<Direction> {
        if let Some(threshold) = self.threshold {
            self.moves = self.moves.saturating_add(1);
            if self.moves >= threshold {
                self.relocate(entity.cell, grid);
                self.moves = 0;
                self.threshold = self.roll_threshold();
            }
        }

        if self.profile.leash.exceeded(entity.cell, self.anchor) {
            if let Some(direction) = self.toward(entity, self.anchor, grid) {
                return Some(direction);
            }
        }
        self.random_open(entity, grid)
    }

    /// Moves the anchor to a random nearby floor cell, keeping it if none is found.
    fn relocate(&mut self, cell: CellCoord, grid: &Grid) {
        let Some(wander) = self.profile.relocation else {
            return;
        };
        let reach = i32::try_from(wander.relocate_distance).unwrap_or(i32::MAX);
        for _ in 0..RELOCATE_ATTEMPTS {
            let column_delta = self.rng.gen_range(-reach..=reach);
            let row_delta = self.rng.gen_range(-reach..=reach);
            let Some(candidate) = self.anchor.offset(column_delta, row_delta) else {
                continue;
            };
            if candidate.manhattan_distance(cell) >= MIN_RELOCATE_SEPARATION
                && grid.is_walkable_cell(candidate)
            {
                trace!(
                    "anchor moved to ({}, {})",
                    candidate.column(),
                    candidate.row()
                );
                self.anchor = candidate;
                return;
            }
        }
    }

    fn toward(
        &mut self,
        entity: &EntitySnapshot,
        target: CellCoord,
        grid: &Grid,
    ) -> Option<Direction> {
        let cell = entity.cell;
        let mut candidates = Vec::with_capacity(4);
        if target.row() < cell.row() {
            candidates.push(Direction::North);
        }
        if target.row() > cell.row() {
            candidates.push(Direction::South);
        }
        if target.column() < cell.column() {
            candidates.push(Direction::West);
        }
        if target.column() > cell.column() {
            candidates.push(Direction::East);
        }
        candidates.shuffle(&mut self.rng);
        candidates
            .into_iter()
            .find(|direction| is_open(entity, grid, *direction))
    }

    fn random_open(&mut self, entity: &EntitySnapshot, grid: &Grid) -> Option<Direction> {
        let mut candidates = Direction::ALL;
        candidates.shuffle(&mut self.rng);
        candidates
            .into_iter()
            .find(|direction| is_open(entity, grid, *direction))
    }
}

fn is_open(entity: &EntitySnapshot, grid: &Grid, direction: Direction) -> bool {
    entity
        .cell
        .step(direction)
        .is_some_and(|cell| grid.is_walkable_cell(cell) && !entity.body.contains(&cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascii_wars_core::{Cell, EntityId};
    use rand::SeedableRng;
    use std::time::Duration;

    fn snapshot(kind: EntityKind, cell: CellCoord) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(0),
            kind,
            cell,
            body: Vec::new(),
            alive: true,
            mode: Mode::Patrol,
            alert: false,
            lost_segments: 0,
            ready_for_step: true,
            accumulated: Duration::ZERO,
        }
    }

    fn player_at(cell: CellCoord) -> PlayerSnapshot {
        PlayerSnapshot {
            cell,
            facing: Direction::East,
            alive: true,
            invulnerable: false,
            lives: 3,
        }
    }

    fn controller(kind: EntityKind, anchor: CellCoord) -> Controller {
        Controller::new(
            Profile::for_kind(kind, &GameConfig::default()),
            anchor,
            ChaCha8Rng::seed_from_u64(9),
        )
    }

    #[test]
    fn greedy_chase_reduces_distance() {
        let grid = Grid::filled(12, 12, Cell::Floor);
        let mut pathfinder = Pathfinder::new();
        let entity = snapshot(EntityKind::Enemy, CellCoord::new(2, 2));
        let player = player_at(CellCoord::new(5, 6));
        let mut controller = controller(EntityKind::Enemy, entity.cell);

        for _ in 0..20 {
            let decision = controller.decide(&entity, &player, &grid, &mut pathfinder);
            assert_eq!(decision.mode, Mode::Chase);
            let next = entity
                .cell
                .step(decision.direction.expect("direction"))
                .expect("inside grid");
            let before = entity.cell.manhattan_distance(player.cell);
            assert!(next.manhattan_distance(player.cell) < before);
        }
    }

    #[test]
    fn invulnerable_player_is_ignored() {
        let grid = Grid::filled(12, 12, Cell::Floor);
        let mut pathfinder = Pathfinder::new();
        let entity = snapshot(EntityKind::Enemy, CellCoord::new(2, 2));
        let mut player = player_at(CellCoord::new(3, 2));
        player.invulnerable = true;
        let mut controller = controller(EntityKind::Enemy, entity.cell);
        let decision = controller.decide(&entity, &player, &grid, &mut pathfinder);
        assert_eq!(decision.mode, Mode::Patrol);
    }

    #[test]
    fn carrier_never_chases() {
        let grid = Grid::filled(12, 12, Cell::Floor);
        let mut pathfinder = Pathfinder::new();
        let entity = snapshot(EntityKind::Carrier, CellCoord::new(2, 2));
        let player = player_at(CellCoord::new(3, 2));
        let mut controller = controller(EntityKind::Carrier, entity.cell);
        let decision = controller.decide(&entity, &player, &grid, &mut pathfinder);
        assert_eq!(decision.mode, Mode::Patrol);
    }

    #[test]
    fn carrier_anchor_stays_at_spawn() {
        let grid = Grid::filled(30, 30, Cell::Floor);
        let mut pathfinder = Pathfinder::new();
        let spawn = CellCoord::new(15, 15);
        let mut entity = snapshot(EntityKind::Carrier, spawn);
        let player = player_at(CellCoord::new(1, 1));
        let mut controller = controller(EntityKind::Carrier, spawn);

        for _ in 0..200 {
            let decision = controller.decide(&entity, &player, &grid, &mut pathfinder);
            let direction = decision.direction.expect("open floor all around");
            entity.cell = entity.cell.step(direction).expect("inside grid");
            assert_eq!(controller.anchor(), spawn);
            assert!(entity.cell.chebyshev_distance(spawn) <= 6);
        }
    }

    #[test]
    fn carrier_turns_back_outside_chebyshev_radius() {
        let grid = Grid::filled(30, 30, Cell::Floor);
        let mut pathfinder = Pathfinder::new();
        let anchor = CellCoord::new(10, 10);
        let player = player_at(CellCoord::new(1, 1));
        let mut controller = controller(EntityKind::Carrier, anchor);

        // Diagonal offset of 6 on both axes: Chebyshev 6, Manhattan 12.
        let entity = snapshot(EntityKind::Carrier, CellCoord::new(16, 16));
        for _ in 0..20 {
            let decision = controller.decide(&entity, &player, &grid, &mut pathfinder);
            assert!(matches!(
                decision.direction,
                Some(Direction::North | Direction::West)
            ));
        }

        // Manhattan 8 exceeds 5 but Chebyshev 4 does not, so the carrier roams freely.
        let inside = snapshot(EntityKind::Carrier, CellCoord::new(14, 14));
        let mut seen = Vec::new();
        for _ in 0..60 {
            let decision = controller.decide(&inside, &player, &grid, &mut pathfinder);
            seen.extend(decision.direction);
        }
        assert!(seen.contains(&Direction::South) || seen.contains(&Direction::East));
        assert_eq!(controller.anchor(), anchor);
    }

    #[test]
    fn alert_snake_doubles_range_and_follows_astar() {
        let grid = Grid::from_rows(&[
            "###########", //
            "#.........#", //
            "#.#######.#", //
            "#.#.....#.#", //
            "#.#.###.#.#", //
            "#...#.....#", //
            "###########",
        ]);
        let mut pathfinder = Pathfinder::new();
        let mut entity = snapshot(EntityKind::Snake, CellCoord::new(3, 3));
        let player = player_at(CellCoord::new(5, 5));
        let mut controller = controller(EntityKind::Snake, entity.cell);

        // Distance 4 is inside the base range of 6 even without alert.
        entity.alert = true;
        let expected = pathfinder
            .find_path(&grid, entity.cell, player.cell)
            .and_then(|path| path.first().copied())
            .and_then(|next| Direction::between(entity.cell, next));
        for _ in 0..8 {
            let decision = controller.decide(&entity, &player, &grid, &mut pathfinder);
            assert_eq!(decision.mode, Mode::Chase);
            assert_eq!(decision.direction, expected);
        }

        let far = player_at(CellCoord::new(9, 5));
        entity.cell = CellCoord::new(1, 1);
        assert_eq!(entity.cell.manhattan_distance(far.cell), 12);
        let decision = controller.decide(&entity, &far, &grid, &mut pathfinder);
        assert_eq!(decision.mode, Mode::Chase);

        entity.alert = false;
        let decision = controller.decide(&entity, &far, &grid, &mut pathfinder);
        assert_eq!(decision.mode, Mode::Patrol);
    }

    #[test]
    fn leaving_chase_moves_anchor_to_current_cell() {
        let grid = Grid::filled(30, 30, Cell::Floor);
        let mut pathfinder = Pathfinder::new();
        let mut entity = snapshot(EntityKind::Enemy, CellCoord::new(20, 20));
        entity.mode = Mode::Chase;
        let player = player_at(CellCoord::new(1, 1));
        let mut controller = controller(EntityKind::Enemy, CellCoord::new(3, 3));

        let decision = controller.decide(&entity, &player, &grid, &mut pathfinder);
        assert_eq!(decision.mode, Mode::Patrol);
        assert_eq!(controller.anchor(), CellCoord::new(20, 20));
    }

    #[test]
    fn never_steps_into_own_body() {
        let grid = Grid::from_rows(&["#####", "#...#", "#####"]);
        let mut pathfinder = Pathfinder::new();
        let mut entity = snapshot(EntityKind::Snake, CellCoord::new(2, 1));
        entity.body = vec![CellCoord::new(1, 1)];
        let player = player_at(CellCoord::new(1, 1));
        let mut controller = controller(EntityKind::Snake, entity.cell);
        for _ in 0..10 {
            let decision = controller.decide(&entity, &player, &grid, &mut pathfinder);
            assert_eq!(decision.direction, Some(Direction::East));
        }
    }

    #[test]
    fn boxed_in_entity_has_no_direction() {
        let grid = Grid::from_rows(&["###", "#.#", "###"]);
        let mut pathfinder = Pathfinder::new();
        let entity = snapshot(EntityKind::Enemy, CellCoord::new(1, 1));
        let player = player_at(CellCoord::new(1, 1));
        let mut controller = controller(EntityKind::Enemy, entity.cell);
        let decision = controller.decide(&entity, &player, &grid, &mut pathfinder);
        assert_eq!(decision.direction, None);
    }
}
