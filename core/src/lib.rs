#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the ASCII Wars simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems and presentation layers react to. Systems consume event
//! streams, query immutable snapshots, and respond exclusively with new command
//! batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod config;
mod grid;

pub use config::{
    CarrierConfig, ConfigError, DiscConfig, EnemyConfig, Escalation, GameConfig, MazeConfig,
    Pacing, PlayerConfig, ProgressionConfig, ScoringConfig, SnakeConfig, SpeedBonusConfig,
    TimeBonusTier, Wander,
};
pub use grid::{Cell, Grid, Neighbors};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the current level with a freshly generated layout.
    LoadLevel {
        /// Maze, start, exit, tokens and entity placements for the level.
        layout: LevelLayout,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the player step one cell in the given direction.
    MovePlayer {
        /// Direction of the attempted step. The player faces it even when blocked.
        direction: Direction,
    },
    /// Requests a disc thrown from `origin` toward `direction`.
    FireDisc {
        /// Cell the disc is thrown from; the disc appears one cell further.
        origin: CellCoord,
        /// Direction of travel.
        direction: Direction,
    },
    /// Records a behavior mode transition decided by an AI controller.
    SetEntityMode {
        /// Entity whose mode changed.
        entity: EntityId,
        /// Mode the entity entered.
        mode: Mode,
    },
    /// Consumes one pacing interval of a ready entity.
    ///
    /// `None`, or a direction that turns out to be blocked, counts as a stuck tick.
    StepEntity {
        /// Entity attempting to move.
        entity: EntityId,
        /// Chosen direction, if the controller found any legal move.
        direction: Option<Direction>,
    },
    /// Cuts a snake's body from `segment` to the tail.
    SeverSnake {
        /// Snake to cut.
        entity: EntityId,
        /// Index of the first removed body segment; 0 is nearest the head.
        segment: usize,
    },
    /// Escalates every living snake to alert mode.
    RaiseAlert,
    /// Moves in-flight discs and resolves their hits.
    AdvanceDiscs {
        /// Simulated time since the previous disc update.
        dt: Duration,
    },
    /// Resolves player contact with entities, tokens and the exit.
    ResolveCollisions,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Event {
    /// Announces that a new level replaced the previous one.
    LevelLoaded {
        /// 1-based level number.
        level: u32,
        /// Generated maze.
        grid: Grid,
        /// Player start cell.
        start: CellCoord,
        /// Exit cell; locked until every token is collected.
        exit: CellCoord,
        /// Token cells awaiting collection.
        tokens: Vec<CellCoord>,
        /// Speed bonus cells awaiting pickup.
        speed_bonuses: Vec<CellCoord>,
    },
    /// Confirms that an entity was placed into the level.
    EntitySpawned {
        /// Identifier assigned by the world.
        entity: EntityId,
        /// Kind of entity that spawned.
        kind: EntityKind,
        /// Cell occupied by the entity (the head for snakes).
        cell: CellCoord,
        /// Body segments behind the head; empty for non-snakes.
        body: Vec<CellCoord>,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell the player left.
        from: CellCoord,
        /// Cell the player entered.
        to: CellCoord,
    },
    /// Reports that the player lost a life.
    PlayerHit {
        /// Cell where the player was caught.
        cell: CellCoord,
        /// Lives left after the hit.
        lives_remaining: u32,
    },
    /// Confirms that the player reappeared at the start cell.
    PlayerRespawned {
        /// Start cell the player respawned on.
        cell: CellCoord,
    },
    /// Announces that the player ran out of lives.
    GameOver {
        /// Final score.
        score: u32,
        /// Level the run ended on.
        level: u32,
    },
    /// Confirms that an entity advanced a single step.
    EntityMoved {
        /// Entity that moved.
        entity: EntityId,
        /// Cell occupied before the step.
        from: CellCoord,
        /// Cell occupied after the step.
        to: CellCoord,
        /// Mode the step was taken in.
        mode: Mode,
        /// Time the step takes to play out.
        duration: Duration,
        /// Body segments after the shift; empty for non-snakes.
        body: Vec<CellCoord>,
    },
    /// Reports a snake tick without a legal move.
    EntityStuck {
        /// Snake that could not move.
        entity: EntityId,
        /// Stuck time accumulated so far.
        stuck_for: Duration,
    },
    /// Confirms that a snake converted a wall cell into floor.
    WallEaten {
        /// Snake that ate the wall.
        entity: EntityId,
        /// Former wall cell, now floor.
        cell: CellCoord,
    },
    /// Announces that an entity switched between patrol and chase.
    ModeChanged {
        /// Entity whose mode changed.
        entity: EntityId,
        /// Mode that became active.
        mode: Mode,
    },
    /// Announces that a snake entered its permanent alert state.
    AlertRaised {
        /// Snake that became alert.
        entity: EntityId,
    },
    /// Reports that part of a snake's body was cut away.
    SnakeSevered {
        /// Snake that lost segments.
        entity: EntityId,
        /// Index of the first removed segment.
        segment: usize,
        /// Removed cells in head-to-tail order.
        severed: Vec<CellCoord>,
    },
    /// Reports that an entity was destroyed or collected.
    EntityKilled {
        /// Entity that died.
        entity: EntityId,
        /// Kind of the entity.
        kind: EntityKind,
        /// Cell the entity occupied.
        cell: CellCoord,
        /// Body segments destroyed with it; empty for non-snakes.
        body: Vec<CellCoord>,
    },
    /// Confirms that a disc left the player's hands.
    DiscFired {
        /// Pool slot that holds the disc.
        disc: DiscId,
        /// First cell occupied by the disc.
        cell: CellCoord,
        /// Direction of travel.
        direction: Direction,
    },
    /// Confirms that a disc advanced one cell.
    DiscStepped {
        /// Disc that moved.
        disc: DiscId,
        /// Cell entered by the disc.
        cell: CellCoord,
    },
    /// Reports that a disc struck an entity and deactivated.
    DiscHitEnemy {
        /// Disc that hit.
        disc: DiscId,
        /// Entity that was struck.
        entity: EntityId,
        /// Cell where the hit happened.
        cell: CellCoord,
    },
    /// Reports that a disc reached a wall and deactivated.
    DiscHitWall {
        /// Disc that stopped.
        disc: DiscId,
        /// Last cell the disc occupied.
        cell: CellCoord,
    },
    /// Reports that a disc used up its range and deactivated.
    DiscExpired {
        /// Disc that stopped.
        disc: DiscId,
        /// Last cell the disc occupied.
        cell: CellCoord,
    },
    /// Reports that a disc throw was refused.
    DiscRejected {
        /// Requested origin.
        origin: CellCoord,
        /// Requested direction.
        direction: Direction,
        /// Specific reason the throw failed.
        reason: FireRejection,
    },
    /// Confirms that the player picked up a token.
    TokenCollected {
        /// Cell of the collected token.
        cell: CellCoord,
        /// Tokens still waiting in the level.
        remaining: u32,
    },
    /// Announces that every token is collected and the exit is open.
    ExitUnlocked {
        /// Exit cell.
        cell: CellCoord,
    },
    /// Confirms that the player picked up a speed bonus.
    SpeedBonusCollected {
        /// Cell of the collected bonus.
        cell: CellCoord,
        /// How long the player moves faster.
        duration: Duration,
    },
    /// Announces that the player's speed boost ran out or was lost.
    SpeedBonusExpired,
    /// Confirms that the player touched a carrier.
    CarrierCollected {
        /// Carrier that was collected.
        entity: EntityId,
        /// Discs handed to the player.
        discs: u32,
    },
    /// Reports a new score total.
    ScoreChanged {
        /// Score after the change.
        score: u32,
    },
    /// Reports a new disc count.
    DiscsChanged {
        /// Discs left to throw.
        remaining: u32,
    },
    /// Announces that the player reached the unlocked exit.
    LevelCompleted {
        /// Level that was finished.
        level: u32,
        /// Time spent on the level.
        elapsed: Duration,
        /// Level bonus after the time multiplier.
        time_bonus: u32,
        /// Bonus for unused discs.
        disc_bonus: u32,
        /// Score after both bonuses.
        score: u32,
    },
}

/// Cardinal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in up, down, left, right order.
    pub const ALL: [Direction; 4] = [Self::North, Self::South, Self::West, Self::East];

    /// Column and row offset of a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Direction leading from `from` to an adjacent `to`.
    ///
    /// Returns `None` when the cells are not cardinal neighbors.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        let column_diff = from.column().abs_diff(to.column());
        let row_diff = from.row().abs_diff(to.row());
        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column() > from.column() {
                Some(Self::East)
            } else {
                Some(Self::West)
            }
        } else if to.row() > from.row() {
            Some(Self::South)
        } else {
            Some(Self::North)
        }
    }
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a slot in the disc pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscId(u32);

impl DiscId {
    /// Creates a new disc identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Chebyshev distance: the larger of the two axis offsets.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }

    /// Neighboring cell in the given direction, unless it would be negative.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (column_delta, row_delta) = direction.delta();
        self.offset(column_delta, row_delta)
    }

    /// Cell displaced by the given signed offsets, unless it would be negative.
    #[must_use]
    pub fn offset(self, column_delta: i32, row_delta: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(column_delta)?;
        let row = self.row.checked_add_signed(row_delta)?;
        Some(Self::new(column, row))
    }
}

/// Kinds of autonomous entities living in a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Simple enemy that patrols and chases greedily.
    Enemy,
    /// Multi-segment enemy that eats walls and can be cut apart.
    Snake,
    /// Harmless patrol-only entity that rewards the player on contact.
    Carrier,
}

impl EntityKind {
    /// Reports whether touching the entity costs the player a life.
    #[must_use]
    pub const fn is_hostile(self) -> bool {
        matches!(self, Self::Enemy | Self::Snake)
    }
}

/// Behavior mode of an AI-driven entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Wandering around the patrol anchor.
    Patrol,
    /// Pursuing the player.
    Chase,
}

/// Reasons a disc throw may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireRejection {
    /// The player has no discs left.
    NoAmmunition,
    /// The first cell in the throw direction is not walkable. No disc is spent.
    Blocked,
    /// Every pool slot already holds an active disc.
    PoolExhausted,
}

/// Placement of a single entity in a level layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnPlan {
    /// Kind of entity to spawn.
    pub kind: EntityKind,
    /// Cell of the entity (the head for snakes).
    pub cell: CellCoord,
    /// Body segments behind the head, nearest first; empty for non-snakes.
    pub body: Vec<CellCoord>,
}

/// Everything the world needs to start a level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelLayout {
    /// 1-based level number.
    pub level: u32,
    /// Generated maze.
    pub grid: Grid,
    /// Player start cell.
    pub start: CellCoord,
    /// Exit cell.
    pub exit: CellCoord,
    /// Token cells.
    pub tokens: Vec<CellCoord>,
    /// Speed bonus cells.
    pub speed_bonuses: Vec<CellCoord>,
    /// Entity placements in spawn order.
    pub spawns: Vec<SpawnPlan>,
}

/// Immutable representation of the player used by systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Cell occupied by the player.
    pub cell: CellCoord,
    /// Direction the player faces; discs are thrown this way.
    pub facing: Direction,
    /// Whether the player is currently in the level.
    pub alive: bool,
    /// Whether contact with enemies is currently ignored.
    pub invulnerable: bool,
    /// Lives left.
    pub lives: u32,
}

/// Immutable representation of a single entity's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntitySnapshot {
    /// Unique identifier assigned to the entity.
    pub id: EntityId,
    /// Kind of entity.
    pub kind: EntityKind,
    /// Cell occupied by the entity (the head for snakes).
    pub cell: CellCoord,
    /// Body segments behind the head; empty for non-snakes.
    pub body: Vec<CellCoord>,
    /// Whether the entity is still in play.
    pub alive: bool,
    /// Mode recorded by the world.
    pub mode: Mode,
    /// Whether the entity is in permanent alert.
    pub alert: bool,
    /// Segments lost to severance.
    pub lost_segments: u32,
    /// Indicates whether the entity accrued enough time to attempt a step.
    pub ready_for_step: bool,
    /// Duration accumulated toward the next step.
    pub accumulated: Duration,
}

impl EntitySnapshot {
    /// Reports whether the head or any body segment covers the cell.
    #[must_use]
    pub fn occupies(&self, cell: CellCoord) -> bool {
        self.cell == cell || self.body.contains(&cell)
    }
}

/// Read-only snapshot describing all entities within the level.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the entity with the given identifier.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a disc pool slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscSnapshot {
    /// Pool slot identifier.
    pub id: DiscId,
    /// Cell occupied by the disc.
    pub cell: CellCoord,
    /// Direction of travel.
    pub direction: Direction,
    /// Steps taken since the throw.
    pub distance: u32,
    /// Whether the disc is in flight.
    pub active: bool,
}
