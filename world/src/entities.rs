//! Entity storage and per-entity movement rules.

use std::time::Duration;

use ascii_wars_core::{
    Cell, CellCoord, Direction, EntityId, EntityKind, EntitySnapshot, GameConfig, Grid, Mode,
    Pacing, SpawnPlan,
};

#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) cell: CellCoord,
    pub(crate) alive: bool,
    pub(crate) mode: Mode,
    pub(crate) alert: bool,
    accumulator: Duration,
    form: Form,
}

#[derive(Clone, Debug)]
enum Form {
    Enemy,
    Snake(SnakeBody),
    Carrier,
}

#[derive(Clone, Debug, Default)]
struct SnakeBody {
    segments: Vec<CellCoord>,
    lost: u32,
    stuck_for: Duration,
    last_direction: Option<Direction>,
}

/// Result of spending one pacing interval on a step attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// The entity was dead or had not accumulated a full interval.
    Idle,
    /// The entity advanced one cell.
    Moved {
        from: CellCoord,
        to: CellCoord,
        duration: Duration,
    },
    /// A non-snake entity had no legal move.
    Blocked,
    /// A snake had no legal move.
    Stuck {
        stuck_for: Duration,
        eaten: Option<CellCoord>,
    },
}

impl Entity {
    pub(crate) fn spawn(id: EntityId, plan: &SpawnPlan) -> Self {
        let form = match plan.kind {
            EntityKind::Enemy => Form::Enemy,
            EntityKind::Carrier => Form::Carrier,
            EntityKind::Snake => Form::Snake(SnakeBody {
                segments: plan.body.clone(),
                ..SnakeBody::default()
            }),
        };
        Self {
            id,
            cell: plan.cell,
            alive: true,
            mode: Mode::Patrol,
            alert: false,
            accumulator: Duration::ZERO,
            form,
        }
    }

    pub(crate) fn kind(&self) -> EntityKind {
        match self.form {
            Form::Enemy => EntityKind::Enemy,
            Form::Snake(_) => EntityKind::Snake,
            Form::Carrier => EntityKind::Carrier,
        }
    }

    pub(crate) fn body(&self) -> &[CellCoord] {
        match &self.form {
            Form::Snake(body) => &body.segments,
            Form::Enemy | Form::Carrier => &[],
        }
    }

    pub(crate) fn is_snake(&self) -> bool {
        matches!(self.form, Form::Snake(_))
    }

    pub(crate) fn occupies(&self, cell: CellCoord) -> bool {
        self.cell == cell || self.body().contains(&cell)
    }

    fn lost_segments(&self) -> u32 {
        match &self.form {
            Form::Snake(body) => body.lost,
            Form::Enemy | Form::Carrier => 0,
        }
    }

    fn pacing(&self, config: &GameConfig) -> Pacing {
        match (&self.form, self.mode) {
            (Form::Enemy, Mode::Patrol) => config.enemy.patrol,
            (Form::Enemy, Mode::Chase) => config.enemy.chase,
            (Form::Snake(_), Mode::Patrol) => config.snake.patrol,
            (Form::Snake(_), Mode::Chase) => config.snake.chase,
            (Form::Carrier, _) => config.carrier.patrol,
        }
    }

    fn speed_factor(&self, config: &GameConfig) -> f32 {
        match &self.form {
            Form::Snake(body) => config.snake.speed_factor(body.lost),
            Form::Enemy | Form::Carrier => 1.0,
        }
    }

    /// Time between two step attempts in the current mode.
    pub(crate) fn interval(&self, config: &GameConfig) -> Duration {
        scaled(self.pacing(config).interval(), self.speed_factor(config))
    }

    fn step_duration(&self, config: &GameConfig) -> Duration {
        scaled(self.pacing(config).step(), self.speed_factor(config))
    }

    fn ready_for_step(&self, config: &GameConfig) -> bool {
        self.alive && self.accumulator >= self.interval(config)
    }

    /// Switches movement mode.
    ///
    /// An entity that was ready to step stays ready, and its next step is
    /// paced and timed in the new mode.
    pub(crate) fn change_mode(&mut self, mode: Mode, config: &GameConfig) {
        let ready = self.ready_for_step(config);
        self.mode = mode;
        let interval = self.interval(config);
        self.accumulator = if ready {
            interval
        } else {
            self.accumulator.min(interval)
        };
    }

    /// Adds elapsed time toward the next step.
    ///
    /// The accumulator saturates at one interval, so a long frame grants a
    /// single step rather than a burst.
    pub(crate) fn accumulate(&mut self, dt: Duration, config: &GameConfig) {
        if !self.alive {
            return;
        }
        let interval = self.interval(config);
        self.accumulator = self.accumulator.saturating_add(dt).min(interval);
    }

    /// Spends one interval on moving toward `direction`.
    ///
    /// A missing direction, a wall, or one of the entity's own segments counts
    /// as a stuck tick. Snakes that stay stuck long enough eat the wall ahead.
    pub(crate) fn attempt_step(
        &mut self,
        direction: Option<Direction>,
        grid: &mut Grid,
        config: &GameConfig,
    ) -> StepOutcome {
        if !self.ready_for_step(config) {
            return StepOutcome::Idle;
        }

        let interval = self.interval(config);
        let duration = self.step_duration(config);
        self.accumulator = self.accumulator.saturating_sub(interval);

        let from = self.cell;
        let target = direction
            .and_then(|direction| from.step(direction))
            .filter(|cell| grid.is_walkable_cell(*cell) && !self.body().contains(cell));

        if let Some(to) = target {
            self.cell = to;
            if let Form::Snake(body) = &mut self.form {
                body.shift(from);
                body.last_direction = direction;
                body.stuck_for = Duration::ZERO;
            }
            return StepOutcome::Moved { from, to, duration };
        }

        match &mut self.form {
            Form::Snake(body) => {
                body.stuck_for = body.stuck_for.saturating_add(interval);
                let stuck_for = body.stuck_for;
                let eaten = if stuck_for >= config.snake.stuck_threshold() {
                    body.stuck_for = Duration::ZERO;
                    body.eat_wall_ahead(from, grid)
                } else {
                    None
                };
                StepOutcome::Stuck { stuck_for, eaten }
            }
            Form::Enemy | Form::Carrier => StepOutcome::Blocked,
        }
    }

    /// Removes body segments from `index` to the tail.
    ///
    /// Returns the removed cells in head-to-tail order, or `None` when the
    /// entity is dead, not a snake, or the index lies past the tail.
    pub(crate) fn sever(&mut self, index: usize) -> Option<Vec<CellCoord>> {
        if !self.alive {
            return None;
        }
        let Form::Snake(body) = &mut self.form else {
            return None;
        };
        if index >= body.segments.len() {
            return None;
        }
        let severed = body.segments.split_off(index);
        let removed = u32::try_from(severed.len()).unwrap_or(u32::MAX);
        body.lost = body.lost.saturating_add(removed);
        Some(severed)
    }

    /// Marks the entity dead and cancels its pending step and wall-eating.
    ///
    /// Returns the body that died with it.
    pub(crate) fn kill(&mut self) -> Vec<CellCoord> {
        self.alive = false;
        self.accumulator = Duration::ZERO;
        match &mut self.form {
            Form::Snake(body) => {
                body.stuck_for = Duration::ZERO;
                std::mem::take(&mut body.segments)
            }
            Form::Enemy | Form::Carrier => Vec::new(),
        }
    }

    pub(crate) fn snapshot(&self, config: &GameConfig) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            kind: self.kind(),
            cell: self.cell,
            body: self.body().to_vec(),
            alive: self.alive,
            mode: self.mode,
            alert: self.alert,
            lost_segments: self.lost_segments(),
            ready_for_step: self.ready_for_step(config),
            accumulated: self.accumulator,
        }
    }
}

/// Scales a pacing duration, rounded to whole microseconds.
fn scaled(duration: Duration, factor: f32) -> Duration {
    if factor >= 1.0 {
        return duration;
    }
    let micros = duration.as_micros() as f64 * f64::from(factor);
    Duration::from_micros(micros.round() as u64)
}

impl SnakeBody {
    fn shift(&mut self, vacated: CellCoord) {
        if self.segments.is_empty() {
            return;
        }
        self.segments.rotate_right(1);
        self.segments[0] = vacated;
    }

    fn facing(&self, head: CellCoord) -> Option<Direction> {
        self.segments
            .first()
            .and_then(|first| Direction::between(*first, head))
            .or(self.last_direction)
    }

    fn eat_wall_ahead(&self, head: CellCoord, grid: &mut Grid) -> Option<CellCoord> {
        let target = head.step(self.facing(head)?)?;
        if !grid.contains(target) || grid.is_border(target) || grid.cell(target) != Cell::Wall {
            return None;
        }
        if grid.set(target, Cell::Floor) {
            Some(target)
        } else {
            None
        }
    }
}
