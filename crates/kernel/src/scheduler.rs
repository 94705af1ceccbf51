use std::collections::BTreeSet;

use blockworld_common::CellCoord;
use serde::{Deserialize, Serialize};

/// Slack applied when comparing accumulated time against the tick interval,
/// so that feeding exactly `N * interval` seconds yields `N` ticks despite
/// floating-point residue.
const ACCUMULATOR_EPSILON: f64 = 1e-9;

/// The deferred effects the world knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    /// Spawn vegetation on top of a turf cell.
    VegetationRespawn,
    /// Turn uncovered soil into turf.
    TurfGrowth,
}

/// A pending mutation keyed by `(kind, cell)`.
///
/// The action only names its cell; the premise is re-checked against the
/// grid when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub due_tick: u64,
    pub kind: ActionKind,
    pub cell: CellCoord,
}

/// Fixed-interval tick accumulator plus a deduplicated list of pending
/// actions.
///
/// The scheduler never touches the grid. It hands due actions back to the
/// caller, which validates and executes them.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval: f64,
    accumulated: f64,
    tick: u64,
    /// Insertion-ordered. Scanned linearly each tick.
    pending: Vec<ScheduledAction>,
    scheduled_respawn: BTreeSet<CellCoord>,
    scheduled_growth: BTreeSet<CellCoord>,
}

impl TickScheduler {
    pub fn new(interval_secs: f64) -> Self {
        assert!(
            interval_secs.is_finite() && interval_secs > 0.0,
            "tick interval must be positive, got {interval_secs}"
        );
        Self {
            interval: interval_secs,
            accumulated: 0.0,
            tick: 0,
            pending: Vec::new(),
            scheduled_respawn: BTreeSet::new(),
            scheduled_growth: BTreeSet::new(),
        }
    }

    /// Current tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Seconds accumulated toward the next tick.
    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    /// Feed wall-clock time. Negative and non-finite deltas are ignored.
    pub fn advance_time(&mut self, delta_seconds: f64) {
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            self.accumulated += delta_seconds;
        }
    }

    /// Consume one interval of accumulated time if available, advance the
    /// tick and return the actions now due.
    pub fn step_tick(&mut self) -> Option<(u64, Vec<ScheduledAction>)> {
        if self.accumulated + ACCUMULATOR_EPSILON < self.interval {
            return None;
        }
        self.accumulated = (self.accumulated - self.interval).max(0.0);
        Some(self.force_tick())
    }

    /// Advance one tick regardless of accumulated time.
    pub fn force_tick(&mut self) -> (u64, Vec<ScheduledAction>) {
        self.tick += 1;
        let due = self.take_due();
        (self.tick, due)
    }

    /// Queue `(kind, cell)` to fire `delay_ticks` from now (at least one).
    /// Returns `false` if that pair is already pending.
    pub fn schedule(&mut self, kind: ActionKind, cell: CellCoord, delay_ticks: u64) -> bool {
        if !self.dedup_set_mut(kind).insert(cell) {
            return false;
        }
        let due_tick = self.tick + delay_ticks.max(1);
        self.pending.push(ScheduledAction {
            due_tick,
            kind,
            cell,
        });
        tracing::debug!(?kind, %cell, due_tick, "scheduled action");
        true
    }

    /// Drop the pending `(kind, cell)` action. Returns whether one existed.
    pub fn cancel(&mut self, kind: ActionKind, cell: CellCoord) -> bool {
        if !self.dedup_set_mut(kind).remove(&cell) {
            return false;
        }
        self.pending.retain(|a| !(a.kind == kind && a.cell == cell));
        tracing::debug!(?kind, %cell, "cancelled action");
        true
    }

    pub fn is_pending(&self, kind: ActionKind, cell: CellCoord) -> bool {
        self.dedup_set(kind).contains(&cell)
    }

    /// The pending `(kind, cell)` action, if any.
    pub fn find(&self, kind: ActionKind, cell: CellCoord) -> Option<&ScheduledAction> {
        self.pending.iter().find(|a| a.kind == kind && a.cell == cell)
    }

    pub fn pending(&self) -> &[ScheduledAction] {
        &self.pending
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_count_of(&self, kind: ActionKind) -> usize {
        self.dedup_set(kind).len()
    }

    fn take_due(&mut self) -> Vec<ScheduledAction> {
        let now = self.tick;
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|a| a.due_tick <= now);
        self.pending = waiting;
        for action in &due {
            self.dedup_set_mut(action.kind).remove(&action.cell);
        }
        due
    }

    fn dedup_set(&self, kind: ActionKind) -> &BTreeSet<CellCoord> {
        match kind {
            ActionKind::VegetationRespawn => &self.scheduled_respawn,
            ActionKind::TurfGrowth => &self.scheduled_growth,
        }
    }

    fn dedup_set_mut(&mut self, kind: ActionKind) -> &mut BTreeSet<CellCoord> {
        match kind {
            ActionKind::VegetationRespawn => &mut self.scheduled_respawn,
            ActionKind::TurfGrowth => &mut self.scheduled_growth,
        }
    }
}
