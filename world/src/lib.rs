#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for ASCII Wars levels.
//!
//! The world owns the grid, the entity list, the disc pool and the player.
//! Every mutation goes through [`apply`], which reports what happened as
//! [`Event`]s; systems read state through the [`query`] module.

mod discs;
mod entities;
mod player;
pub mod scoring;

use std::time::Duration;

use ascii_wars_core::{
    Cell, CellCoord, Command, Direction, EntityId, EntityKind, Event, FireRejection, GameConfig,
    Grid, LevelLayout, Mode,
};
use log::{debug, info, trace, warn};

use discs::{DiscPool, DiscStep};
use entities::{Entity, StepOutcome};
use player::Player;

const INITIAL_START: CellCoord = CellCoord::new(1, 1);

/// Represents the authoritative ASCII Wars world state.
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    level: u32,
    grid: Grid,
    start: CellCoord,
    exit: CellCoord,
    exit_unlocked: bool,
    tokens: Vec<CellCoord>,
    speed_bonuses: Vec<CellCoord>,
    entities: Vec<Entity>,
    discs: DiscPool,
    player: Player,
    score: u32,
    discs_remaining: u32,
    elapsed: Duration,
    level_complete: bool,
    game_over: bool,
}

impl World {
    /// Creates an empty world that waits for a [`Command::LoadLevel`].
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self {
            level: 0,
            grid: Grid::filled(0, 0, Cell::Wall),
            start: INITIAL_START,
            exit: INITIAL_START,
            exit_unlocked: false,
            tokens: Vec::new(),
            speed_bonuses: Vec::new(),
            entities: Vec::new(),
            discs: DiscPool::new(config.disc.pool_size),
            player: Player::new(INITIAL_START, config.player.lives),
            score: 0,
            discs_remaining: 0,
            elapsed: Duration::ZERO,
            level_complete: false,
            game_over: false,
            config,
        }
    }

    fn is_frozen(&self) -> bool {
        self.level_complete || self.game_over
    }

    fn entity_index(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|entity| entity.id == id)
    }

    fn load_level(&mut self, layout: LevelLayout, out_events: &mut Vec<Event>) {
        let LevelLayout {
            level,
            grid,
            start,
            exit,
            tokens,
            speed_bonuses,
            spawns,
        } = layout;

        self.level = level;
        self.grid = grid;
        self.start = start;
        self.exit = exit;
        self.exit_unlocked = false;
        self.tokens = tokens;
        self.speed_bonuses = speed_bonuses;
        self.entities.clear();
        self.discs.clear();
        self.discs_remaining = self.config.disc.per_level;
        self.elapsed = Duration::ZERO;
        self.level_complete = false;
        self.player.enter_level(start);

        out_events.push(Event::LevelLoaded {
            level,
            grid: self.grid.clone(),
            start,
            exit,
            tokens: self.tokens.clone(),
            speed_bonuses: self.speed_bonuses.clone(),
        });

        for plan in &spawns {
            if !self.grid.is_walkable_cell(plan.cell) {
                warn!(
                    "skipping {:?} spawn on blocked cell ({}, {})",
                    plan.kind,
                    plan.cell.column(),
                    plan.cell.row()
                );
                continue;
            }
            let id = EntityId::new(u32::try_from(self.entities.len()).unwrap_or(u32::MAX));
            let entity = Entity::spawn(id, plan);
            out_events.push(Event::EntitySpawned {
                entity: id,
                kind: entity.kind(),
                cell: entity.cell,
                body: entity.body().to_vec(),
            });
            self.entities.push(entity);
        }

        out_events.push(Event::DiscsChanged {
            remaining: self.discs_remaining,
        });
        if self.tokens.is_empty() {
            self.unlock_exit(out_events);
        }

        debug!(
            "loaded level {level} with {} entities and {} tokens",
            self.entities.len(),
            self.tokens.len()
        );
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        if self.is_frozen() {
            return;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        let boosted = !self.player.boost_remaining().is_zero();
        if self.player.tick(dt, &self.config.player, self.start) {
            out_events.push(Event::PlayerRespawned { cell: self.start });
        }
        if boosted && self.player.boost_remaining().is_zero() {
            out_events.push(Event::SpeedBonusExpired);
        }
        for entity in &mut self.entities {
            entity.accumulate(dt, &self.config);
        }
    }

    fn move_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.is_frozen() {
            return;
        }
        if let Some(from) = self
            .player
            .try_move(direction, &self.grid, &self.config.player)
        {
            out_events.push(Event::PlayerMoved {
                from,
                to: self.player.cell,
            });
        }
    }

    fn step_entity(
        &mut self,
        id: EntityId,
        direction: Option<Direction>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(index) = self.entity_index(id) else {
            warn!("step requested for unknown entity {}", id.get());
            return;
        };
        let entity = &mut self.entities[index];
        match entity.attempt_step(direction, &mut self.grid, &self.config) {
            StepOutcome::Idle | StepOutcome::Blocked => {}
            StepOutcome::Moved { from, to, duration } => {
                out_events.push(Event::EntityMoved {
                    entity: id,
                    from,
                    to,
                    mode: entity.mode,
                    duration,
                    body: entity.body().to_vec(),
                });
            }
            StepOutcome::Stuck { stuck_for, eaten } => {
                out_events.push(Event::EntityStuck {
                    entity: id,
                    stuck_for,
                });
                if let Some(cell) = eaten {
                    debug!(
                        "snake {} ate wall at ({}, {})",
                        id.get(),
                        cell.column(),
                        cell.row()
                    );
                    out_events.push(Event::WallEaten { entity: id, cell });
                }
            }
        }
    }

    fn set_mode(&mut self, id: EntityId, mode: Mode, out_events: &mut Vec<Event>) {
        let Some(index) = self.entity_index(id) else {
            warn!("mode change requested for unknown entity {}", id.get());
            return;
        };
        let entity = &mut self.entities[index];
        if !entity.alive || entity.mode == mode {
            return;
        }
        if mode == Mode::Chase && entity.kind() == EntityKind::Carrier {
            return;
        }
        entity.change_mode(mode, &self.config);
        trace!("entity {} entered {mode:?}", id.get());
        out_events.push(Event::ModeChanged { entity: id, mode });
    }

    fn raise_alert(&mut self, out_events: &mut Vec<Event>) {
        for entity in &mut self.entities {
            if entity.alive && entity.is_snake() && !entity.alert {
                entity.alert = true;
                out_events.push(Event::AlertRaised { entity: entity.id });
            }
        }
    }

    fn sever_at(&mut self, index: usize, segment: usize, out_events: &mut Vec<Event>) {
        let Some(entity) = self.entities.get_mut(index) else {
            return;
        };
        let id = entity.id;
        let Some(severed) = entity.sever(segment) else {
            return;
        };
        let removed = u32::try_from(severed.len()).unwrap_or(u32::MAX);
        let reward = self.config.snake.segment_score.saturating_mul(removed);
        out_events.push(Event::SnakeSevered {
            entity: id,
            segment,
            severed,
        });
        self.add_score(reward, out_events);
    }

    fn kill_at(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let Some(entity) = self.entities.get_mut(index) else {
            return;
        };
        if !entity.alive {
            return;
        }
        let id = entity.id;
        let kind = entity.kind();
        let cell = entity.cell;
        let body = entity.kill();
        let remaining = u32::try_from(body.len()).unwrap_or(u32::MAX);
        let reward = match kind {
            EntityKind::Enemy => self.config.scoring.enemy_kill,
            EntityKind::Snake => self
                .config
                .snake
                .kill_score
                .saturating_add(self.config.snake.segment_score.saturating_mul(remaining)),
            EntityKind::Carrier => 0,
        };
        out_events.push(Event::EntityKilled {
            entity: id,
            kind,
            cell,
            body,
        });
        self.add_score(reward, out_events);
    }

    fn add_score(&mut self, points: u32, out_events: &mut Vec<Event>) {
        if points == 0 {
            return;
        }
        self.score = self.score.saturating_add(points);
        out_events.push(Event::ScoreChanged { score: self.score });
    }

    fn fire_disc(&mut self, origin: CellCoord, direction: Direction, out_events: &mut Vec<Event>) {
        let rejected = |reason| Event::DiscRejected {
            origin,
            direction,
            reason,
        };
        let cell = match query::can_fire(self, origin, direction) {
            Ok(cell) => cell,
            Err(reason) => {
                out_events.push(rejected(reason));
                return;
            }
        };
        let Some(disc) = self.discs.acquire(cell, direction) else {
            out_events.push(rejected(FireRejection::PoolExhausted));
            return;
        };

        self.discs_remaining -= 1;
        out_events.push(Event::DiscFired {
            disc,
            cell,
            direction,
        });
        out_events.push(Event::DiscsChanged {
            remaining: self.discs_remaining,
        });

        let index = usize::try_from(disc.get()).unwrap_or(usize::MAX);
        let _ = self.strike(index, cell, out_events);
    }

    fn advance_discs(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let step = self.config.disc.step();
        let max_range = self.config.disc.max_range;

        for index in 0..self.discs.len() {
            let Some(cell) = self
                .discs
                .slot(index)
                .filter(|disc| disc.active)
                .map(|disc| disc.cell)
            else {
                continue;
            };
            // Entities may have walked onto the disc since it last moved.
            if self.strike(index, cell, out_events) {
                continue;
            }

            let mut pending = dt;
            loop {
                let Some(disc) = self.discs.slot_mut(index) else {
                    break;
                };
                if !disc.active || !disc.consume_step(pending, step) {
                    break;
                }
                pending = Duration::ZERO;
                let id = disc.id;
                match disc.advance(&self.grid, max_range) {
                    DiscStep::Moved(cell) => {
                        out_events.push(Event::DiscStepped { disc: id, cell });
                        if self.strike(index, cell, out_events) {
                            break;
                        }
                    }
                    DiscStep::HitWall(cell) => {
                        out_events.push(Event::DiscHitWall { disc: id, cell });
                        break;
                    }
                    DiscStep::Expired(cell) => {
                        out_events.push(Event::DiscExpired { disc: id, cell });
                        break;
                    }
                }
            }
        }
    }

    /// Resolves a disc against the first hostile entity on `cell`.
    ///
    /// Entities are checked in id order; a snake matches on its head before
    /// its body. Returns `true` when the disc hit something.
    fn strike(&mut self, disc_index: usize, cell: CellCoord, out_events: &mut Vec<Event>) -> bool {
        let Some(disc_id) = self
            .discs
            .slot(disc_index)
            .filter(|disc| disc.active)
            .map(|disc| disc.id)
        else {
            return false;
        };
        let Some((target, segment)) = self.target_at(cell) else {
            return false;
        };

        if let Some(disc) = self.discs.slot_mut(disc_index) {
            disc.active = false;
        }
        out_events.push(Event::DiscHitEnemy {
            disc: disc_id,
            entity: self.entities[target].id,
            cell,
        });
        match segment {
            None => self.kill_at(target, out_events),
            Some(segment) => self.sever_at(target, segment, out_events),
        }
        true
    }

    fn target_at(&self, cell: CellCoord) -> Option<(usize, Option<usize>)> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, entity)| entity.alive && entity.kind().is_hostile())
            .find_map(|(index, entity)| {
                if entity.cell == cell {
                    return Some((index, None));
                }
                entity
                    .body()
                    .iter()
                    .position(|segment| *segment == cell)
                    .map(|segment| (index, Some(segment)))
            })
    }

    fn resolve_collisions(&mut self, out_events: &mut Vec<Event>) {
        if self.is_frozen() || !self.player.alive {
            return;
        }

        let cell = self.player.cell;
        let caught = !self.player.is_invulnerable()
            && self
                .entities
                .iter()
                .any(|entity| entity.alive && entity.kind().is_hostile() && entity.occupies(cell));
        if caught {
            self.hit_player(out_events);
            return;
        }

        self.collect_carriers(cell, out_events);
        self.collect_speed_bonus(cell, out_events);
        self.collect_token(cell, out_events);
        if self.exit_unlocked && cell == self.exit {
            self.complete_level(out_events);
        }
    }

    fn hit_player(&mut self, out_events: &mut Vec<Event>) {
        let cell = self.player.cell;
        let boosted = !self.player.boost_remaining().is_zero();
        let respawning = self.player.hit(&self.config.player);
        out_events.push(Event::PlayerHit {
            cell,
            lives_remaining: self.player.lives,
        });
        if boosted {
            out_events.push(Event::SpeedBonusExpired);
        }
        if respawning {
            return;
        }

        self.game_over = true;
        info!(
            "game over on level {} with score {}",
            self.level, self.score
        );
        out_events.push(Event::GameOver {
            score: self.score,
            level: self.level,
        });
    }

    fn collect_carriers(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let awarded = self.config.carrier.discs_awarded;
        let score = self.config.carrier.score;
        for entity in &mut self.entities {
            if !entity.alive || entity.kind() != EntityKind::Carrier || entity.cell != cell {
                continue;
            }
            let body = entity.kill();
            out_events.push(Event::CarrierCollected {
                entity: entity.id,
                discs: awarded,
            });
            out_events.push(Event::EntityKilled {
                entity: entity.id,
                kind: EntityKind::Carrier,
                cell,
                body,
            });
            self.discs_remaining = self.discs_remaining.saturating_add(awarded);
            out_events.push(Event::DiscsChanged {
                remaining: self.discs_remaining,
            });
            self.score = self.score.saturating_add(score);
            out_events.push(Event::ScoreChanged { score: self.score });
        }
    }

    fn collect_speed_bonus(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(position) = self.speed_bonuses.iter().position(|bonus| *bonus == cell) else {
            return;
        };
        let _ = self.speed_bonuses.remove(position);
        let bonus = &self.config.speed_bonus;
        let duration = bonus.duration();
        self.player.boost(duration, bonus.multiplier);
        debug!("speed bonus collected at ({}, {})", cell.column(), cell.row());
        out_events.push(Event::SpeedBonusCollected { cell, duration });
        self.add_score(self.config.speed_bonus.score, out_events);
    }

    fn collect_token(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(position) = self.tokens.iter().position(|token| *token == cell) else {
            return;
        };
        let _ = self.tokens.remove(position);
        out_events.push(Event::TokenCollected {
            cell,
            remaining: u32::try_from(self.tokens.len()).unwrap_or(u32::MAX),
        });
        self.add_score(self.config.scoring.token, out_events);
        if self.tokens.is_empty() {
            self.unlock_exit(out_events);
        }
    }

    fn unlock_exit(&mut self, out_events: &mut Vec<Event>) {
        if self.exit_unlocked {
            return;
        }
        self.exit_unlocked = true;
        out_events.push(Event::ExitUnlocked { cell: self.exit });
        self.raise_alert(out_events);
    }

    fn complete_level(&mut self, out_events: &mut Vec<Event>) {
        self.level_complete = true;
        let scoring = &self.config.scoring;
        let time_bonus = scoring
            .level_complete
            .saturating_mul(scoring.time_multiplier(self.elapsed));
        let disc_bonus = scoring.disc_bonus(self.discs_remaining);
        self.score = self
            .score
            .saturating_add(time_bonus)
            .saturating_add(disc_bonus);
        info!(
            "level {} completed in {:.1}s, score {}",
            self.level,
            self.elapsed.as_secs_f32(),
            self.score
        );
        out_events.push(Event::LevelCompleted {
            level: self.level,
            elapsed: self.elapsed,
            time_bonus,
            disc_bonus,
            score: self.score,
        });
        out_events.push(Event::ScoreChanged { score: self.score });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { layout } => world.load_level(layout, out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::MovePlayer { direction } => world.move_player(direction, out_events),
        Command::FireDisc { origin, direction } => world.fire_disc(origin, direction, out_events),
        Command::SetEntityMode { entity, mode } => world.set_mode(entity, mode, out_events),
        Command::StepEntity { entity, direction } => {
            world.step_entity(entity, direction, out_events);
        }
        Command::SeverSnake { entity, segment } => {
            let Some(index) = world.entity_index(entity) else {
                warn!("sever requested for unknown entity {}", entity.get());
                return;
            };
            world.sever_at(index, segment, out_events);
        }
        Command::RaiseAlert => world.raise_alert(out_events),
        Command::AdvanceDiscs { dt } => world.advance_discs(dt, out_events),
        Command::ResolveCollisions => world.resolve_collisions(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use ascii_wars_core::{
        CellCoord, Direction, DiscSnapshot, EntityView, FireRejection, GameConfig, Grid,
        PlayerSnapshot,
    };

    use super::World;

    /// Configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Current 1-based level, or 0 before the first level loads.
    #[must_use]
    pub fn level(world: &World) -> u32 {
        world.level
    }

    /// Provides read-only access to the level grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Player start cell of the current level.
    #[must_use]
    pub fn start(world: &World) -> CellCoord {
        world.start
    }

    /// Exit cell of the current level.
    #[must_use]
    pub fn exit(world: &World) -> CellCoord {
        world.exit
    }

    /// Reports whether every token has been collected.
    #[must_use]
    pub fn is_exit_unlocked(world: &World) -> bool {
        world.exit_unlocked
    }

    /// Tokens still waiting to be collected.
    #[must_use]
    pub fn tokens(world: &World) -> &[CellCoord] {
        &world.tokens
    }

    /// Captures the player's current state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Captures a read-only view of every entity, living or dead, in id order.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView::from_snapshots(
            world
                .entities
                .iter()
                .map(|entity| entity.snapshot(&world.config))
                .collect(),
        )
    }

    /// Snapshots of every disc pool slot, active or not.
    #[must_use]
    pub fn discs(world: &World) -> Vec<DiscSnapshot> {
        world.discs.snapshots()
    }

    /// Speed bonuses still lying in the level.
    #[must_use]
    pub fn speed_bonuses(world: &World) -> &[CellCoord] {
        &world.speed_bonuses
    }

    /// Time left on the player's speed boost; zero when not boosted.
    #[must_use]
    pub fn boost_remaining(world: &World) -> Duration {
        world.player.boost_remaining()
    }

    /// Current score.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Discs the player can still throw.
    #[must_use]
    pub fn discs_remaining(world: &World) -> u32 {
        world.discs_remaining
    }

    /// Time spent on the current level.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Reports whether the player reached the unlocked exit.
    #[must_use]
    pub fn is_level_complete(world: &World) -> bool {
        world.level_complete
    }

    /// Reports whether the player ran out of lives.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.game_over
    }

    /// Checks whether a disc thrown from `origin` would leave the hand.
    ///
    /// Returns the first cell the disc would occupy, or the reason the throw
    /// would be refused. Ammunition is checked first, then the first cell,
    /// then the pool.
    pub fn can_fire(
        world: &World,
        origin: CellCoord,
        direction: Direction,
    ) -> Result<CellCoord, FireRejection> {
        if world.discs_remaining == 0 {
            return Err(FireRejection::NoAmmunition);
        }
        let cell = origin
            .step(direction)
            .filter(|cell| world.grid.is_walkable_cell(*cell))
            .ok_or(FireRejection::Blocked)?;
        if !world.discs.has_free_slot() {
            return Err(FireRejection::PoolExhausted);
        }
        Ok(cell)
    }
}
