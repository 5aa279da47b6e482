use std::time::Duration;

use ascii_wars_core::{CellCoord, Direction, Grid, PlayerConfig, PlayerSnapshot};

#[derive(Clone, Debug)]
pub(crate) struct Player {
    pub(crate) cell: CellCoord,
    facing: Direction,
    pub(crate) alive: bool,
    pub(crate) lives: u32,
    cooldown: Duration,
    respawn_in: Option<Duration>,
    invulnerable_for: Duration,
    boost_for: Duration,
    boost_multiplier: u32,
}

impl Player {
    pub(crate) fn new(cell: CellCoord, lives: u32) -> Self {
        Self {
            cell,
            facing: Direction::East,
            alive: true,
            lives,
            cooldown: Duration::ZERO,
            respawn_in: None,
            invulnerable_for: Duration::ZERO,
            boost_for: Duration::ZERO,
            boost_multiplier: 1,
        }
    }

    /// Places a living player on `start` at the beginning of a level.
    pub(crate) fn enter_level(&mut self, start: CellCoord) {
        self.cell = start;
        self.facing = Direction::East;
        self.cooldown = Duration::ZERO;
        self.invulnerable_for = Duration::ZERO;
        self.boost_for = Duration::ZERO;
        self.respawn_in = None;
        self.alive = self.lives > 0;
    }

    pub(crate) fn is_invulnerable(&self) -> bool {
        !self.invulnerable_for.is_zero()
    }

    pub(crate) fn boost_remaining(&self) -> Duration {
        self.boost_for
    }

    /// Divides the step cooldown by `multiplier` for `duration`. A second
    /// pickup restarts the timer rather than stacking.
    pub(crate) fn boost(&mut self, duration: Duration, multiplier: u32) {
        self.boost_for = duration;
        self.boost_multiplier = multiplier.max(1);
    }

    fn step_cooldown(&self, config: &PlayerConfig) -> Duration {
        if self.boost_for.is_zero() {
            config.step()
        } else {
            config.step() / self.boost_multiplier
        }
    }

    /// Runs down the timers. Returns `true` when the player respawned.
    pub(crate) fn tick(&mut self, dt: Duration, config: &PlayerConfig, start: CellCoord) -> bool {
        self.cooldown = self.cooldown.saturating_sub(dt);
        self.invulnerable_for = self.invulnerable_for.saturating_sub(dt);
        self.boost_for = self.boost_for.saturating_sub(dt);

        let Some(remaining) = self.respawn_in else {
            return false;
        };
        let remaining = remaining.saturating_sub(dt);
        if !remaining.is_zero() {
            self.respawn_in = Some(remaining);
            return false;
        }

        self.respawn_in = None;
        self.alive = true;
        self.cell = start;
        self.cooldown = Duration::ZERO;
        self.invulnerable_for = config.invulnerability();
        true
    }

    /// Turns toward `direction` and steps if the cooldown allows it.
    ///
    /// Returns the vacated cell when the player moved.
    pub(crate) fn try_move(
        &mut self,
        direction: Direction,
        grid: &Grid,
        config: &PlayerConfig,
    ) -> Option<CellCoord> {
        if !self.alive {
            return None;
        }
        self.facing = direction;
        if !self.cooldown.is_zero() {
            return None;
        }
        let target = self
            .cell
            .step(direction)
            .filter(|cell| grid.is_walkable_cell(*cell))?;
        let from = self.cell;
        self.cell = target;
        self.cooldown = self.step_cooldown(config);
        Some(from)
    }

    /// Takes a life. Returns `true` when lives remain and a respawn is pending.
    pub(crate) fn hit(&mut self, config: &PlayerConfig) -> bool {
        self.alive = false;
        self.boost_for = Duration::ZERO;
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.respawn_in = None;
            return false;
        }
        self.respawn_in = Some(config.respawn_delay());
        true
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            cell: self.cell,
            facing: self.facing,
            alive: self.alive,
            invulnerable: self.is_invulnerable(),
            lives: self.lives,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascii_wars_core::Cell;

    #[test]
    fn blocked_move_still_turns() {
        let grid = Grid::from_rows(&["###", "#.#", "###"]);
        let config = PlayerConfig::default();
        let mut player = Player::new(CellCoord::new(1, 1), 3);
        assert_eq!(player.try_move(Direction::North, &grid, &config), None);
        assert_eq!(player.snapshot().facing, Direction::North);
        assert_eq!(player.cell, CellCoord::new(1, 1));
    }

    #[test]
    fn cooldown_gates_consecutive_moves() {
        let grid = Grid::filled(6, 3, Cell::Floor);
        let config = PlayerConfig::default();
        let start = CellCoord::new(0, 1);
        let mut player = Player::new(start, 3);

        assert_eq!(player.try_move(Direction::East, &grid, &config), Some(start));
        assert_eq!(player.try_move(Direction::East, &grid, &config), None);
        let _ = player.tick(Duration::from_millis(119), &config, start);
        assert_eq!(player.try_move(Direction::East, &grid, &config), None);
        let _ = player.tick(Duration::from_millis(1), &config, start);
        assert_eq!(
            player.try_move(Direction::East, &grid, &config),
            Some(CellCoord::new(1, 1))
        );
    }

    #[test]
    fn boost_halves_cooldown_until_it_runs_out() {
        let grid = Grid::filled(8, 3, Cell::Floor);
        let config = PlayerConfig::default();
        let start = CellCoord::new(0, 1);
        let mut player = Player::new(start, 3);
        player.boost(Duration::from_millis(200), 2);

        assert_eq!(player.try_move(Direction::East, &grid, &config), Some(start));
        let _ = player.tick(Duration::from_millis(60), &config, start);
        assert_eq!(
            player.try_move(Direction::East, &grid, &config),
            Some(CellCoord::new(1, 1))
        );

        let _ = player.tick(Duration::from_millis(140), &config, start);
        assert!(player.boost_remaining().is_zero());
        assert_eq!(
            player.try_move(Direction::East, &grid, &config),
            Some(CellCoord::new(2, 1))
        );
        let _ = player.tick(Duration::from_millis(60), &config, start);
        assert_eq!(player.try_move(Direction::East, &grid, &config), None);
    }

    #[test]
    fn respawns_invulnerable_after_delay() {
        let config = PlayerConfig::default();
        let start = CellCoord::new(1, 1);
        let mut player = Player::new(CellCoord::new(4, 4), 3);

        assert!(player.hit(&config));
        assert!(!player.alive);
        assert!(!player.tick(Duration::from_millis(1_000), &config, start));
        assert!(player.tick(Duration::from_millis(200), &config, start));
        assert!(player.alive);
        assert_eq!(player.cell, start);
        assert!(player.is_invulnerable());

        let _ = player.tick(config.invulnerability(), &config, start);
        assert!(!player.is_invulnerable());
    }

    #[test]
    fn last_life_never_respawns() {
        let config = PlayerConfig::default();
        let mut player = Player::new(CellCoord::new(1, 1), 1);
        assert!(!player.hit(&config));
        assert!(!player.tick(Duration::from_secs(10), &config, CellCoord::new(1, 1)));
        assert!(!player.alive);
        assert_eq!(player.lives, 0);
    }
}
