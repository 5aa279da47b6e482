//! Immutable tuning supplied to the world and systems at level start.
//!
//! Every section deserializes with `#[serde(default)]`, so a configuration
//! file only needs to mention the values it overrides. Durations are stored as
//! whole milliseconds and exposed through [`Duration`] accessors.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest grid edge the maze generator can carve a lattice into.
pub const MIN_GRID_EDGE: u32 = 5;

/// Reasons a [`GameConfig`] fails validation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The requested grid cannot hold a maze.
    #[error("maze must be at least {min}x{min} cells, got {columns}x{rows}", min = MIN_GRID_EDGE)]
    GridTooSmall {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// A `[min, max]` pair is inverted.
    #[error("{field}: minimum {min} exceeds maximum {max}")]
    InvertedRange {
        /// Dotted path of the offending setting.
        field: &'static str,
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },
    /// A value that must be positive was zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Dotted path of the offending setting.
        field: &'static str,
    },
    /// The snake speed floor lies outside `(0, 1]`.
    #[error("snake.min_speed_factor must lie within (0, 1], got {0}")]
    SpeedFactorOutOfRange(f32),
    /// The per-segment speed boost is negative or not finite.
    #[error("snake.boost_per_lost_segment must be a finite non-negative number, got {0}")]
    InvalidBoost(f32),
}

/// Step duration and inter-step pause for one movement mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    /// Time a single step takes to play out, in milliseconds.
    pub step_ms: u64,
    /// Rest between two steps, in milliseconds.
    pub pause_ms: u64,
}

impl Pacing {
    /// Creates a pacing pair from millisecond values.
    #[must_use]
    pub const fn from_millis(step_ms: u64, pause_ms: u64) -> Self {
        Self { step_ms, pause_ms }
    }

    /// Duration of a single step.
    #[must_use]
    pub const fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    /// Full tick interval: step plus pause.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.step_ms.saturating_add(self.pause_ms))
    }
}

/// Patrol wandering radius and anchor relocation bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wander {
    /// Manhattan radius an idle entity stays within around its anchor.
    pub radius: u32,
    /// Fewest patrol moves before the anchor is relocated.
    pub relocate_min_moves: u32,
    /// Most patrol moves before the anchor is relocated.
    pub relocate_max_moves: u32,
    /// Largest per-axis offset used when sampling a new anchor.
    pub relocate_distance: u32,
}

impl Wander {
    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.relocate_min_moves > self.relocate_max_moves {
            return Err(ConfigError::InvertedRange {
                field,
                min: self.relocate_min_moves,
                max: self.relocate_max_moves,
            });
        }
        Ok(())
    }
}

/// Level thresholds at which one and then two entities of a kind appear.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    /// First level that receives one entity.
    pub min_level: u32,
    /// First level that receives two entities.
    pub double_level: u32,
}

impl Escalation {
    /// Number of entities that appear on the provided level.
    #[must_use]
    pub const fn count_at(&self, level: u32) -> u32 {
        if level >= self.double_level {
            2
        } else if level >= self.min_level {
            1
        } else {
            0
        }
    }
}

/// Grid dimensions and room carving bounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    /// Columns in the generated grid.
    pub columns: u32,
    /// Rows in the generated grid.
    pub rows: u32,
    /// Upper bound on rooms carved into the maze.
    pub room_count: u32,
    /// Smallest room edge.
    pub min_room_size: u32,
    /// Largest room edge.
    pub max_room_size: u32,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            columns: 40,
            rows: 30,
            room_count: 6,
            min_room_size: 2,
            max_room_size: 5,
        }
    }
}

/// Player movement and life cycle tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Cooldown between two player steps, in milliseconds.
    pub step_ms: u64,
    /// Lives granted at the start of a run.
    pub lives: u32,
    /// Delay before a hit player reappears at the start cell, in milliseconds.
    pub respawn_delay_ms: u64,
    /// Invulnerability window after respawning, in milliseconds.
    pub invulnerability_ms: u64,
}

impl PlayerConfig {
    /// Cooldown between two player steps.
    #[must_use]
    pub const fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    /// Delay before a hit player reappears.
    #[must_use]
    pub const fn respawn_delay(&self) -> Duration {
        Duration::from_millis(self.respawn_delay_ms)
    }

    /// Invulnerability window after respawning.
    #[must_use]
    pub const fn invulnerability(&self) -> Duration {
        Duration::from_millis(self.invulnerability_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            step_ms: 120,
            lives: 3,
            respawn_delay_ms: 1200,
            invulnerability_ms: 1600,
        }
    }
}

/// Tuning for the simple chasing enemy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Pacing while patrolling.
    pub patrol: Pacing,
    /// Pacing while chasing.
    pub chase: Pacing,
    /// Manhattan distance at which the player is noticed.
    pub chase_range: u32,
    /// Patrol radius and relocation bounds.
    pub wander: Wander,
    /// Smallest Manhattan distance from the start cell an enemy may spawn at.
    pub min_spawn_distance: u32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            patrol: Pacing::from_millis(400, 600),
            chase: Pacing::from_millis(220, 100),
            chase_range: 8,
            wander: Wander {
                radius: 4,
                relocate_min_moves: 6,
                relocate_max_moves: 14,
                relocate_distance: 6,
            },
            min_spawn_distance: 6,
        }
    }
}

/// Tuning for the multi-segment snake.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    /// Pacing while patrolling.
    pub patrol: Pacing,
    /// Pacing while chasing.
    pub chase: Pacing,
    /// Manhattan distance at which the player is noticed. Doubled when alert.
    pub chase_range: u32,
    /// Patrol radius and relocation bounds.
    pub wander: Wander,
    /// Body segments behind the head on early levels.
    pub body_length: u32,
    /// Body segments behind the head from [`SnakeConfig::long_body_level`] on.
    pub long_body_length: u32,
    /// First level that spawns snakes with the long body.
    pub long_body_level: u32,
    /// Fraction of the tick interval removed per lost segment.
    pub boost_per_lost_segment: f32,
    /// Floor applied to the speed factor.
    pub min_speed_factor: f32,
    /// Accumulated stuck time before the snake eats the wall ahead, in milliseconds.
    pub stuck_threshold_ms: u64,
    /// Score for destroying the head.
    pub kill_score: u32,
    /// Score for each destroyed body segment.
    pub segment_score: u32,
    /// Levels that receive one and two snakes.
    pub escalation: Escalation,
}

impl SnakeConfig {
    /// Multiplier applied to the snake's interval after losing segments.
    ///
    /// Shrinks linearly with every lost segment and never drops below
    /// [`SnakeConfig::min_speed_factor`].
    #[must_use]
    pub fn speed_factor(&self, lost_segments: u32) -> f32 {
        let lost = lost_segments as f32;
        (1.0 - lost * self.boost_per_lost_segment).clamp(self.min_speed_factor, 1.0)
    }

    /// Body length for snakes spawned on the provided level.
    #[must_use]
    pub const fn body_length_at(&self, level: u32) -> u32 {
        if level >= self.long_body_level {
            self.long_body_length
        } else {
            self.body_length
        }
    }

    /// Stuck time that triggers wall-eating.
    #[must_use]
    pub const fn stuck_threshold(&self) -> Duration {
        Duration::from_millis(self.stuck_threshold_ms)
    }
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            patrol: Pacing::from_millis(500, 700),
            chase: Pacing::from_millis(180, 80),
            chase_range: 6,
            wander: Wander {
                radius: 5,
                relocate_min_moves: 5,
                relocate_max_moves: 10,
                relocate_distance: 5,
            },
            body_length: 3,
            long_body_length: 4,
            long_body_level: 8,
            boost_per_lost_segment: 0.12,
            min_speed_factor: 0.4,
            stuck_threshold_ms: 10_000,
            kill_score: 500,
            segment_score: 100,
            escalation: Escalation {
                min_level: 4,
                double_level: 7,
            },
        }
    }
}

/// Tuning for the slow patrol-only carrier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierConfig {
    /// Pacing of every carrier step.
    pub patrol: Pacing,
    /// Chebyshev radius kept around the fixed spawn anchor.
    pub patrol_radius: u32,
    /// Score for touching a carrier.
    pub score: u32,
    /// Discs handed to the player when a carrier is touched.
    pub discs_awarded: u32,
    /// Levels that receive one and two carriers.
    pub escalation: Escalation,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            patrol: Pacing::from_millis(600, 800),
            patrol_radius: 5,
            score: 5000,
            discs_awarded: 3,
            escalation: Escalation {
                min_level: 5,
                double_level: 8,
            },
        }
    }
}

/// Temporary player speed-up picked up from the maze floor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedBonusConfig {
    /// How long the boost lasts after pickup, in milliseconds.
    pub duration_ms: u64,
    /// Divisor applied to the player's step cooldown while boosted.
    pub multiplier: u32,
    /// Score for collecting a bonus.
    pub score: u32,
    /// Levels that receive one and two bonuses.
    pub escalation: Escalation,
}

impl SpeedBonusConfig {
    /// Lifetime of one boost.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for SpeedBonusConfig {
    fn default() -> Self {
        Self {
            duration_ms: 10_000,
            multiplier: 2,
            score: 2500,
            escalation: Escalation {
                min_level: 2,
                double_level: 4,
            },
        }
    }
}

/// Disc projectile tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscConfig {
    /// Steps a disc travels beyond its first cell before expiring.
    pub max_range: u32,
    /// Number of discs that may be in flight at once.
    pub pool_size: u32,
    /// Time between two disc steps, in milliseconds.
    pub step_ms: u64,
    /// Discs granted at the start of every level.
    pub per_level: u32,
}

impl DiscConfig {
    /// Time between two disc steps.
    #[must_use]
    pub const fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }
}

impl Default for DiscConfig {
    fn default() -> Self {
        Self {
            max_range: 15,
            pool_size: 10,
            step_ms: 60,
            per_level: 6,
        }
    }
}

/// Per-level population growth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Enemies on level one.
    pub base_enemies: u32,
    /// Enemies added per level.
    pub enemies_per_level: u32,
    /// Upper bound on enemies.
    pub max_enemies: u32,
    /// Tokens on level one.
    pub base_tokens: u32,
    /// Tokens added per level.
    pub tokens_per_level: u32,
    /// Upper bound on tokens.
    pub max_tokens: u32,
    /// Last level of a run.
    pub max_level: u32,
}

impl ProgressionConfig {
    /// Enemies requested for the provided 1-based level.
    #[must_use]
    pub fn enemies_at(&self, level: u32) -> u32 {
        grow(self.base_enemies, self.enemies_per_level, self.max_enemies, level)
    }

    /// Tokens requested for the provided 1-based level.
    #[must_use]
    pub fn tokens_at(&self, level: u32) -> u32 {
        grow(self.base_tokens, self.tokens_per_level, self.max_tokens, level)
    }
}

fn grow(base: u32, per_level: u32, max: u32, level: u32) -> u32 {
    let steps = level.saturating_sub(1);
    base.saturating_add(per_level.saturating_mul(steps)).min(max)
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_enemies: 3,
            enemies_per_level: 1,
            max_enemies: 12,
            base_tokens: 5,
            tokens_per_level: 2,
            max_tokens: 20,
            max_level: 10,
        }
    }
}

/// Multiplier granted when a level is finished in under `under_secs` seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBonusTier {
    /// Exclusive upper bound on the level time, in seconds.
    pub under_secs: u64,
    /// Multiplier applied to the level-complete bonus.
    pub multiplier: u32,
}

/// Point values and level completion bonuses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score for killing a simple enemy.
    pub enemy_kill: u32,
    /// Score for collecting a token.
    pub token: u32,
    /// Base bonus for reaching the exit.
    pub level_complete: u32,
    /// Time tiers checked in order; the first matching tier wins.
    pub time_bonus: Vec<TimeBonusTier>,
    /// Bonus indexed by discs left when the level ends.
    pub disc_bonus: Vec<u32>,
}

impl ScoringConfig {
    /// Multiplier earned for finishing a level after `elapsed`.
    #[must_use]
    pub fn time_multiplier(&self, elapsed: Duration) -> u32 {
        self.time_bonus
            .iter()
            .find(|tier| elapsed < Duration::from_secs(tier.under_secs))
            .map_or(1, |tier| tier.multiplier)
    }

    /// Bonus earned for finishing a level with `discs_left` discs unused.
    #[must_use]
    pub fn disc_bonus(&self, discs_left: u32) -> u32 {
        let index = usize::try_from(discs_left).unwrap_or(usize::MAX);
        self.disc_bonus
            .get(index)
            .or_else(|| self.disc_bonus.last())
            .copied()
            .unwrap_or(0)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            enemy_kill: 250,
            token: 100,
            level_complete: 500,
            time_bonus: vec![
                TimeBonusTier {
                    under_secs: 30,
                    multiplier: 10,
                },
                TimeBonusTier {
                    under_secs: 60,
                    multiplier: 5,
                },
                TimeBonusTier {
                    under_secs: 90,
                    multiplier: 3,
                },
                TimeBonusTier {
                    under_secs: 120,
                    multiplier: 2,
                },
            ],
            disc_bonus: vec![0, 100, 250, 500, 750, 1000, 1500],
        }
    }
}

/// Complete immutable configuration for a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Maze dimensions and rooms.
    pub maze: MazeConfig,
    /// Player tuning.
    pub player: PlayerConfig,
    /// Simple enemy tuning.
    pub enemy: EnemyConfig,
    /// Snake tuning.
    pub snake: SnakeConfig,
    /// Carrier tuning.
    pub carrier: CarrierConfig,
    /// Disc tuning.
    pub disc: DiscConfig,
    /// Speed bonus pickups.
    pub speed_bonus: SpeedBonusConfig,
    /// Level population growth.
    pub progression: ProgressionConfig,
    /// Scoring rules.
    pub scoring: ScoringConfig,
}

impl GameConfig {
    /// Checks the cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let maze = &self.maze;
        if maze.columns < MIN_GRID_EDGE || maze.rows < MIN_GRID_EDGE {
            return Err(ConfigError::GridTooSmall {
                columns: maze.columns,
                rows: maze.rows,
            });
        }
        if maze.min_room_size > maze.max_room_size {
            return Err(ConfigError::InvertedRange {
                field: "maze.room_size",
                min: maze.min_room_size,
                max: maze.max_room_size,
            });
        }
        if self.disc.pool_size == 0 {
            return Err(ConfigError::Zero {
                field: "disc.pool_size",
            });
        }
        if self.disc.step_ms == 0 {
            return Err(ConfigError::Zero {
                field: "disc.step_ms",
            });
        }
        if self.progression.max_level == 0 {
            return Err(ConfigError::Zero {
                field: "progression.max_level",
            });
        }
        if self.enemy.patrol.interval().is_zero() || self.enemy.chase.interval().is_zero() {
            return Err(ConfigError::Zero {
                field: "enemy.pacing",
            });
        }
        if self.snake.patrol.interval().is_zero() || self.snake.chase.interval().is_zero() {
            return Err(ConfigError::Zero {
                field: "snake.pacing",
            });
        }
        if self.carrier.patrol.interval().is_zero() {
            return Err(ConfigError::Zero {
                field: "carrier.pacing",
            });
        }
        self.enemy.wander.validate("enemy.wander.relocate_moves")?;
        self.snake.wander.validate("snake.wander.relocate_moves")?;
        if self.speed_bonus.multiplier == 0 {
            return Err(ConfigError::Zero {
                field: "speed_bonus.multiplier",
            });
        }

        let floor = self.snake.min_speed_factor;
        if !(floor > 0.0 && floor <= 1.0) {
            return Err(ConfigError::SpeedFactorOutOfRange(floor));
        }
        let boost = self.snake.boost_per_lost_segment;
        if !boost.is_finite() || boost < 0.0 {
            return Err(ConfigError::InvalidBoost(boost));
        }
        Ok(())
    }
}
