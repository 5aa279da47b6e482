#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver that runs the world and its systems without any presentation.
//!
//! A [`Session`] owns the world, the behavior system and the level builder.
//! Each call to [`Session::frame`] executes one pass of the fixed order:
//! tick, player input, behavior, disc flight and collision resolution. Events
//! raised after the behavior step are carried into the next frame so the
//! system observes every event exactly once.

use std::{mem, time::Duration};

use ascii_wars_core::{Command, ConfigError, Direction, Event, GameConfig, LevelLayout};
use ascii_wars_system_behavior::Behavior;
use ascii_wars_system_spawning::{LevelBuilder, LevelError};
use ascii_wars_world::{
    self as world, query,
    scoring::{HighScoreEntry, HighScoreTable},
    World,
};
use log::info;
use thiserror::Error;

/// Name recorded in the high-score table when none was supplied.
pub const DEFAULT_PLAYER_NAME: &str = "PLAYER";

/// Failures raised while setting up or advancing a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The supplied configuration failed validation.
    #[error("invalid game configuration")]
    Config(#[from] ConfigError),
    /// A level could not be built.
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Player requests for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Direction the player attempts to step in.
    pub movement: Option<Direction>,
    /// Direction a disc is fired in from the player's cell.
    pub fire: Option<Direction>,
}

/// Seeded run over consecutive levels.
#[derive(Debug)]
pub struct Session {
    world: World,
    behavior: Behavior,
    levels: LevelBuilder,
    high_scores: HighScoreTable,
    player_name: String,
    pending: Vec<Event>,
    finished: bool,
}

impl Session {
    /// Validates `config` and prepares a session whose randomness derives from `seed`.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            behavior: Behavior::new(&config, seed),
            levels: LevelBuilder::new(&config, seed),
            world: World::new(config),
            high_scores: HighScoreTable::new(),
            player_name: DEFAULT_PLAYER_NAME.to_owned(),
            pending: Vec::new(),
            finished: false,
        })
    }

    /// Sets the name recorded with the final score.
    #[must_use]
    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = name.into();
        self
    }

    /// Seeds the session with an existing high-score table.
    #[must_use]
    pub fn with_high_scores(mut self, table: HighScoreTable) -> Self {
        self.high_scores = table;
        self
    }

    /// Builds `level` from the session seed and loads it.
    pub fn start(&mut self, level: u32, out: &mut Vec<Event>) -> Result<(), SessionError> {
        let layout = self.levels.build(level)?;
        self.load(layout, out);
        Ok(())
    }

    /// Loads a prepared layout, discarding events still queued for the previous level.
    pub fn load(&mut self, layout: LevelLayout, out: &mut Vec<Event>) {
        self.pending.clear();
        self.finished = false;
        world::apply(&mut self.world, Command::LoadLevel { layout }, &mut self.pending);
        out.extend(self.pending.iter().cloned());
    }

    /// Advances the simulation by one frame of `dt`.
    ///
    /// Completing a level loads the next one; completing the last level or
    /// losing the final life ends the run and records the score.
    pub fn frame(
        &mut self,
        dt: Duration,
        input: FrameInput,
        out: &mut Vec<Event>,
    ) -> Result<(), SessionError> {
        if self.finished {
            return Ok(());
        }

        let mut events = mem::take(&mut self.pending);
        let carried = events.len();

        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        if let Some(direction) = input.movement {
            world::apply(&mut self.world, Command::MovePlayer { direction }, &mut events);
        }
        if let Some(direction) = input.fire {
            let origin = query::player(&self.world).cell;
            world::apply(
                &mut self.world,
                Command::FireDisc { origin, direction },
                &mut events,
            );
        }

        let mut commands = Vec::new();
        self.behavior.handle(
            &events,
            &query::entity_view(&self.world),
            &query::player(&self.world),
            query::grid(&self.world),
            &mut commands,
        );
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        out.extend(events.drain(carried..));

        world::apply(&mut self.world, Command::AdvanceDiscs { dt }, &mut self.pending);
        world::apply(&mut self.world, Command::ResolveCollisions, &mut self.pending);
        out.extend(self.pending.iter().cloned());

        self.settle(out)
    }

    fn settle(&mut self, out: &mut Vec<Event>) -> Result<(), SessionError> {
        if query::is_game_over(&self.world) {
            self.finish();
            return Ok(());
        }
        if !query::is_level_complete(&self.world) {
            return Ok(());
        }

        let level = query::level(&self.world);
        if level >= query::config(&self.world).progression.max_level {
            info!("run cleared the final level {level}");
            self.finish();
            return Ok(());
        }
        self.start(level + 1, out)
    }

    fn finish(&mut self) {
        self.finished = true;
        let score = query::score(&self.world);
        let entry = HighScoreEntry {
            name: self.player_name.clone(),
            score,
            level: query::level(&self.world),
        };
        match self.high_scores.insert(entry) {
            Some(rank) => info!("final score {score} ranked #{rank}"),
            None => info!("final score {score} did not reach the high-score table"),
        }
    }

    /// World driven by the session.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// High scores recorded so far.
    #[must_use]
    pub fn high_scores(&self) -> &HighScoreTable {
        &self.high_scores
    }

    /// Reports whether the run ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascii_wars_core::{CellCoord, EntityKind, Grid, SpawnPlan};

    const FRAME: Duration = Duration::from_millis(200);

    fn corridor(spawns: Vec<SpawnPlan>) -> LevelLayout {
        LevelLayout {
            level: 1,
            grid: Grid::from_rows(&["#######", "#..E..#", "#######"]),
            start: CellCoord::new(1, 1),
            exit: CellCoord::new(3, 1),
            tokens: Vec::new(),
            speed_bonuses: Vec::new(),
            spawns,
        }
    }

    fn east() -> FrameInput {
        FrameInput {
            movement: Some(Direction::East),
            fire: None,
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = GameConfig::default();
        config.disc.pool_size = 0;
        let error = Session::new(config, 1).expect_err("zero pool");
        assert!(matches!(error, SessionError::Config(_)));
    }

    #[test]
    fn start_announces_level_and_spawns() {
        let mut session = Session::new(GameConfig::default(), 5).expect("valid config");
        let mut events = Vec::new();
        session.start(2, &mut events).expect("level builds");

        assert!(matches!(events[0], Event::LevelLoaded { level: 2, .. }));
        let spawned = events
            .iter()
            .filter(|event| matches!(event, Event::EntitySpawned { .. }))
            .count();
        assert_eq!(spawned, query::entity_view(session.world()).iter().count());
    }

    #[test]
    fn reaching_the_exit_loads_the_next_level() {
        let mut session = Session::new(GameConfig::default(), 9).expect("valid config");
        let mut events = Vec::new();
        session.load(corridor(Vec::new()), &mut events);

        session.frame(FRAME, east(), &mut events).expect("frame");
        session.frame(FRAME, east(), &mut events).expect("frame");

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::LevelCompleted { level: 1, .. })));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::LevelLoaded { level: 2, .. })));
        assert_eq!(query::level(session.world()), 2);
        assert!(!session.is_finished());
    }

    #[test]
    fn clearing_the_last_level_records_the_score() {
        let mut config = GameConfig::default();
        config.progression.max_level = 1;
        let mut session = Session::new(config, 9)
            .expect("valid config")
            .with_player_name("ADA");
        let mut events = Vec::new();
        session.load(corridor(Vec::new()), &mut events);

        session.frame(FRAME, east(), &mut events).expect("frame");
        session.frame(FRAME, east(), &mut events).expect("frame");

        assert!(session.is_finished());
        let best = &session.high_scores().entries()[0];
        assert_eq!(best.name, "ADA");
        assert_eq!(best.score, 6_500);
        assert_eq!(best.level, 1);

        let before = events.len();
        session.frame(FRAME, east(), &mut events).expect("frame");
        assert_eq!(events.len(), before);
    }

    #[test]
    fn losing_the_last_life_ends_the_run() {
        let mut config = GameConfig::default();
        config.player.lives = 1;
        let mut session = Session::new(config, 3).expect("valid config");
        let mut events = Vec::new();
        session.load(
            corridor(vec![SpawnPlan {
                kind: EntityKind::Enemy,
                cell: CellCoord::new(2, 1),
                body: Vec::new(),
            }]),
            &mut events,
        );

        session.frame(FRAME, east(), &mut events).expect("frame");

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::GameOver { level: 1, .. })));
        assert!(session.is_finished());
        assert_eq!(session.high_scores().entries().len(), 1);
    }
}
