//! Fixed-capacity pool of thrown discs.

use std::time::Duration;

use ascii_wars_core::{CellCoord, DiscId, DiscSnapshot, Direction, Grid};

#[derive(Clone, Debug)]
pub(crate) struct Disc {
    pub(crate) id: DiscId,
    pub(crate) cell: CellCoord,
    direction: Direction,
    distance: u32,
    pub(crate) active: bool,
    accumulator: Duration,
}

/// What happened to a disc on one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DiscStep {
    Moved(CellCoord),
    HitWall(CellCoord),
    Expired(CellCoord),
}

impl Disc {
    fn idle(id: DiscId) -> Self {
        Self {
            id,
            cell: CellCoord::new(0, 0),
            direction: Direction::East,
            distance: 0,
            active: false,
            accumulator: Duration::ZERO,
        }
    }

    /// Adds elapsed time and reports whether a full step is due.
    pub(crate) fn consume_step(&mut self, dt: Duration, step: Duration) -> bool {
        self.accumulator = self.accumulator.saturating_add(dt);
        if self.accumulator < step {
            return false;
        }
        self.accumulator -= step;
        true
    }

    /// Moves one cell, stopping at walls and at the end of the range.
    pub(crate) fn advance(&mut self, grid: &Grid, max_range: u32) -> DiscStep {
        let next = self
            .cell
            .step(self.direction)
            .filter(|cell| grid.is_walkable_cell(*cell));
        match next {
            None => {
                self.active = false;
                DiscStep::HitWall(self.cell)
            }
            Some(_) if self.distance >= max_range => {
                self.active = false;
                DiscStep::Expired(self.cell)
            }
            Some(cell) => {
                self.cell = cell;
                self.distance += 1;
                DiscStep::Moved(cell)
            }
        }
    }

    fn snapshot(&self) -> DiscSnapshot {
        DiscSnapshot {
            id: self.id,
            cell: self.cell,
            direction: self.direction,
            distance: self.distance,
            active: self.active,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct DiscPool {
    slots: Vec<Disc>,
}

impl DiscPool {
    pub(crate) fn new(capacity: u32) -> Self {
        Self {
            slots: (0..capacity).map(|id| Disc::idle(DiscId::new(id))).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn has_free_slot(&self) -> bool {
        self.slots.iter().any(|disc| !disc.active)
    }

    /// Activates the lowest free slot at `cell` with no distance travelled.
    pub(crate) fn acquire(&mut self, cell: CellCoord, direction: Direction) -> Option<DiscId> {
        let disc = self.slots.iter_mut().find(|disc| !disc.active)?;
        disc.cell = cell;
        disc.direction = direction;
        disc.distance = 0;
        disc.active = true;
        disc.accumulator = Duration::ZERO;
        Some(disc.id)
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&Disc> {
        self.slots.get(index)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Disc> {
        self.slots.get_mut(index)
    }

    pub(crate) fn clear(&mut self) {
        for disc in &mut self.slots {
            disc.active = false;
            disc.accumulator = Duration::ZERO;
        }
    }

    pub(crate) fn snapshots(&self) -> Vec<DiscSnapshot> {
        self.slots.iter().map(Disc::snapshot).collect()
    }
}
