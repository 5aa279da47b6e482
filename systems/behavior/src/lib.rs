#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Patrol and chase AI for enemies, snakes and carriers.
//!
//! The system keeps one controller per living entity. Controllers are
//! created from `EntitySpawned` events, dropped on `EntityKilled`, and asked
//! for a decision whenever the world reports the entity ready to step.

mod controller;

use std::collections::BTreeMap;

use ascii_wars_core::{
    CellCoord, Command, EntityId, EntityView, Event, GameConfig, Grid, Mode, PlayerSnapshot,
};
use ascii_wars_system_pathfinding::Pathfinder;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use controller::{Controller, Profile};

/// Pure system that turns world views into entity step commands.
#[derive(Debug)]
pub struct Behavior {
    config: GameConfig,
    seed: u64,
    controllers: BTreeMap<EntityId, Controller>,
    pathfinder: Pathfinder,
}

impl Behavior {
    /// Creates a behavior system whose random streams derive from `seed`.
    #[must_use]
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        Self {
            config: config.clone(),
            seed,
            controllers: BTreeMap::new(),
            pathfinder: Pathfinder::new(),
        }
    }

    /// Patrol anchor currently assigned to `entity`.
    #[must_use]
    pub fn anchor_of(&self, entity: EntityId) -> Option<CellCoord> {
        self.controllers.get(&entity).map(Controller::anchor)
    }

    /// Consumes world events and immutable views to emit entity commands.
    ///
    /// Every living entity that is ready to step gets exactly one
    /// `StepEntity`, preceded by a `SetEntityMode` when its mode changes so
    /// the step is paced in the new mode.
    pub fn handle(
        &mut self,
        events: &[Event],
        entities: &EntityView,
        player: &PlayerSnapshot,
        grid: &Grid,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::LevelLoaded { .. } => self.controllers.clear(),
                Event::EntitySpawned {
                    entity, kind, cell, ..
                } => {
                    let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                    rng.set_stream(u64::from(entity.get()));
                    let controller =
                        Controller::new(Profile::for_kind(*kind, &self.config), *cell, rng);
                    let _ = self.controllers.insert(*entity, controller);
                }
                Event::EntityKilled { entity, .. } => {
                    let _ = self.controllers.remove(entity);
                }
                Event::AlertRaised { entity } => out.push(Command::SetEntityMode {
                    entity: *entity,
                    mode: Mode::Chase,
                }),
                _ => {}
            }
        }

        for entity in entities.iter() {
            if !entity.alive || !entity.ready_for_step {
                continue;
            }
            let Some(controller) = self.controllers.get_mut(&entity.id) else {
                continue;
            };

            let decision = controller.decide(entity, player, grid, &mut self.pathfinder);
            if decision.mode != entity.mode {
                out.push(Command::SetEntityMode {
                    entity: entity.id,
                    mode: decision.mode,
                });
            }
            out.push(Command::StepEntity {
                entity: entity.id,
                direction: decision.direction,
            });
        }
    }
}
