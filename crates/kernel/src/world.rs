use std::collections::{BTreeMap, BTreeSet};

use blockworld_common::{CellCoord, CellType};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::WorldConfig;
use crate::event::{WorldEvent, WorldObserver};
use crate::exposure::{has_open_sky, is_exposed};
use crate::grid::VoxelGrid;
use crate::scheduler::{ActionKind, ScheduledAction, TickScheduler};
use crate::vegetation::{Tuft, VegetationPolicy};

/// Result of a placement that touched the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// The cell now holds a different type.
    Applied,
    /// The cell already held that type. The cascade still ran.
    Unchanged,
}

/// Errors from placement and removal operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    #[error("cell {0} is outside the world")]
    OutOfBounds(CellCoord),
    #[error("cell {coord} holds unbreakable {cell}")]
    Unbreakable { coord: CellCoord, cell: CellType },
    #[error("cell {0} is already empty")]
    NothingToBreak(CellCoord),
}

/// Point-in-time diagnostic view of the world, for inspectors and logs.
#[derive(Debug, Clone, Serialize)]
pub struct DebugSnapshot {
    pub tick: u64,
    pub extent: [u32; 3],
    pub cell_counts: BTreeMap<CellType, usize>,
    pub materialized: usize,
    pub vegetation_patches: usize,
    pub pending: Vec<ScheduledAction>,
    pub logged_events: usize,
}

impl DebugSnapshot {
    pub fn pending_of(&self, kind: ActionKind) -> usize {
        self.pending.iter().filter(|a| a.kind == kind).count()
    }
}

/// The authoritative voxel world.
///
/// Every change to cell contents goes through [`World::place_cell`], which
/// runs the cascade rules synchronously and records what changed in the
/// event log. Deferred effects (turf growth, vegetation respawn) are queued
/// on the tick scheduler and re-validated when they fire.
///
/// Given the same config (including seed) and the same sequence of calls,
/// two worlds end in identical states.
#[derive(Debug, Clone)]
pub struct World {
    config: WorldConfig,
    grid: VoxelGrid,
    /// Cells currently reported to the render side as materialized.
    materialized: BTreeSet<CellCoord>,
    /// Vegetation keyed by the empty cell it occupies.
    vegetation: BTreeMap<CellCoord, Vec<Tuft>>,
    scheduler: TickScheduler,
    policy: VegetationPolicy,
    rng: ChaCha8Rng,
    /// Append-only log of observable changes, drained by collaborators.
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Create an all-empty world with the configured extent.
    ///
    /// Panics if the extent has a zero axis or the tick interval is not
    /// positive; see [`WorldConfig::validate`] for a non-panicking check.
    pub fn new(config: WorldConfig) -> Self {
        let grid = VoxelGrid::new(config.extent);
        Self::from_grid(config, grid)
    }

    /// Adopt a prebuilt grid. The config's extent is replaced by the grid's.
    ///
    /// Every initially exposed cell is reported as materialized, so an
    /// observer draining the log builds the full initial scene.
    pub fn from_grid(mut config: WorldConfig, grid: VoxelGrid) -> Self {
        config.extent = grid.extent();
        let mut world = Self {
            scheduler: TickScheduler::new(config.tick_interval_secs),
            policy: VegetationPolicy::new(&config.vegetation),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            grid,
            materialized: BTreeSet::new(),
            vegetation: BTreeMap::new(),
            event_log: Vec::new(),
        };
        let exposed: Vec<CellCoord> = world
            .grid
            .iter()
            .map(|(c, _)| c)
            .filter(|c| is_exposed(&world.grid, *c))
            .collect();
        for coord in exposed {
            world.materialized.insert(coord);
            world.event_log.push(WorldEvent::VisualChanged {
                coord,
                materialized: true,
            });
        }
        tracing::debug!(
            extent = ?world.grid.extent(),
            materialized = world.materialized.len(),
            "world created"
        );
        world
    }

    /// Spawn vegetation immediately on every eligible turf cell. Used at
    /// world-build time. Returns the number of patches created.
    pub fn populate_vegetation(&mut self) -> usize {
        let supports: Vec<CellCoord> = self
            .grid
            .iter()
            .filter(|(c, cell)| *cell == CellType::Turf && self.can_host_vegetation(*c))
            .map(|(c, _)| c)
            .collect();
        let created = supports
            .into_iter()
            .filter(|support| self.spawn_vegetation(*support))
            .count();
        tracing::debug!(created, "populated vegetation");
        created
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.scheduler.tick()
    }

    /// What occupies `coord`; `Empty` outside the world.
    pub fn cell_type(&self, coord: CellCoord) -> CellType {
        self.grid.get(coord)
    }

    /// Whether the render side should show a visual for `coord`.
    pub fn is_materialized(&self, coord: CellCoord) -> bool {
        is_exposed(&self.grid, coord)
    }

    pub fn has_vegetation(&self, coord: CellCoord) -> bool {
        self.vegetation.contains_key(&coord)
    }

    pub fn vegetation_at(&self, coord: CellCoord) -> Option<&[Tuft]> {
        self.vegetation.get(&coord).map(Vec::as_slice)
    }

    /// All vegetation, keyed by the empty cell it occupies.
    pub fn vegetation(&self) -> &BTreeMap<CellCoord, Vec<Tuft>> {
        &self.vegetation
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Drain the event log into `observer`, in order.
    pub fn dispatch_events(&mut self, observer: &mut dyn WorldObserver) -> usize {
        let events = self.drain_events();
        for event in &events {
            event.dispatch(observer);
        }
        events.len()
    }

    /// Place `cell` at `coord` and run the cascade. Returns `false` (and does
    /// nothing) when `coord` is outside the world.
    pub fn place_cell(&mut self, coord: CellCoord, cell: CellType) -> bool {
        self.try_place_cell(coord, cell).is_ok()
    }

    /// Like [`World::place_cell`], with the reason for a rejection.
    pub fn try_place_cell(
        &mut self,
        coord: CellCoord,
        cell: CellType,
    ) -> Result<PlaceOutcome, PlaceError> {
        let old = self.grid.get(coord);
        if !self.grid.set(coord, cell) {
            tracing::trace!(%coord, "placement outside world ignored");
            return Err(PlaceError::OutOfBounds(coord));
        }
        if old != cell {
            self.event_log.push(WorldEvent::CellChanged {
                coord,
                old,
                new: cell,
            });
        }
        tracing::debug!(%coord, %old, new = %cell, "place cell");

        // Actions keyed on this cell lose their premise once its type moves on.
        if cell != CellType::Soil {
            self.scheduler.cancel(ActionKind::TurfGrowth, coord);
        }
        if cell != CellType::Turf {
            self.scheduler.cancel(ActionKind::VegetationRespawn, coord);
        }

        // Nothing grows inside an occupied cell, and a rewritten support
        // loses what grew on it. Fresh turf is reseeded by the new-turf rule.
        self.clear_vegetation(coord);
        self.clear_vegetation(coord.up());

        let below = coord.down();
        if cell.is_solid() {
            match self.grid.get(below) {
                CellType::Turf => self.smother(below),
                CellType::Soil => {
                    self.scheduler.cancel(ActionKind::TurfGrowth, below);
                }
                _ => {}
            }
        } else if self.grid.get(below) == CellType::Soil {
            self.scheduler.schedule(
                ActionKind::TurfGrowth,
                below,
                self.config.delays.soil_to_turf_ticks,
            );
        }

        if cell == CellType::Turf && self.can_host_vegetation(coord) {
            self.scheduler.schedule(
                ActionKind::VegetationRespawn,
                coord,
                self.config.delays.new_turf_vegetation_ticks,
            );
        }

        self.refresh_neighborhood(coord, old != cell);

        Ok(if old == cell {
            PlaceOutcome::Unchanged
        } else {
            PlaceOutcome::Applied
        })
    }

    /// Player-style removal: refuses empty and unbreakable cells, otherwise
    /// places `Empty` and returns what was there.
    pub fn break_cell(&mut self, coord: CellCoord) -> Result<CellType, PlaceError> {
        if !self.grid.contains(coord) {
            return Err(PlaceError::OutOfBounds(coord));
        }
        let cell = self.grid.get(coord);
        if cell.is_empty() {
            return Err(PlaceError::NothingToBreak(coord));
        }
        if cell.is_unbreakable() {
            return Err(PlaceError::Unbreakable { coord, cell });
        }
        self.try_place_cell(coord, CellType::Empty)?;
        Ok(cell)
    }

    /// Queue a deferred action. Returns `false` if `(kind, cell)` is
    /// already pending.
    pub fn schedule(&mut self, kind: ActionKind, cell: CellCoord, delay_ticks: u64) -> bool {
        self.scheduler.schedule(kind, cell, delay_ticks)
    }

    pub fn schedule_turf_growth(&mut self, cell: CellCoord, delay_ticks: u64) -> bool {
        self.schedule(ActionKind::TurfGrowth, cell, delay_ticks)
    }

    pub fn cancel(&mut self, kind: ActionKind, cell: CellCoord) -> bool {
        self.scheduler.cancel(kind, cell)
    }

    /// Feed wall-clock time and run every tick it completes, in order.
    /// Returns the number of ticks processed.
    ///
    /// Each processed tick appends a [`WorldEvent::Ticked`] to the event log,
    /// so callers that advance the clock should drain or dispatch the log
    /// regularly.
    pub fn advance(&mut self, delta_seconds: f64) -> u64 {
        let _span = tracing::info_span!("world_advance", delta_seconds).entered();
        self.scheduler.advance_time(delta_seconds);
        let mut processed = 0;
        while let Some((tick, due)) = self.scheduler.step_tick() {
            self.process_tick(tick, due);
            processed += 1;
        }
        processed
    }

    /// Run exactly one tick, independent of accumulated time.
    pub fn step(&mut self) {
        let (tick, due) = self.scheduler.force_tick();
        self.process_tick(tick, due);
    }

    pub fn debug_snapshot(&self) -> DebugSnapshot {
        let mut cell_counts = BTreeMap::new();
        for (_, cell) in self.grid.iter() {
            *cell_counts.entry(cell).or_insert(0) += 1;
        }
        DebugSnapshot {
            tick: self.tick(),
            extent: self.grid.extent(),
            cell_counts,
            materialized: self.materialized.len(),
            vegetation_patches: self.vegetation.len(),
            pending: self.scheduler.pending().to_vec(),
            logged_events: self.event_log.len(),
        }
    }

    /// Deterministic hash of cells, vegetation, pending actions and tick.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let mix_coord = |h: &mut u64, c: CellCoord| {
            mix(h, &c.x.to_le_bytes());
            mix(h, &c.y.to_le_bytes());
            mix(h, &c.z.to_le_bytes());
        };
        mix(&mut h, &self.tick().to_le_bytes());
        for (_, cell) in self.grid.iter() {
            mix(&mut h, &[cell as u8]);
        }
        for (coord, tufts) in &self.vegetation {
            mix_coord(&mut h, *coord);
            for t in tufts {
                mix(&mut h, &[t.variant]);
                mix(&mut h, &t.offset.x.to_le_bytes());
                mix(&mut h, &t.offset.y.to_le_bytes());
            }
        }
        for action in self.scheduler.pending() {
            mix(&mut h, &action.due_tick.to_le_bytes());
            mix(&mut h, &[action.kind as u8]);
            mix_coord(&mut h, action.cell);
        }
        h
    }

    fn process_tick(&mut self, tick: u64, due: Vec<ScheduledAction>) {
        self.event_log.push(WorldEvent::Ticked { tick });
        if !due.is_empty() {
            tracing::trace!(tick, due = due.len(), "processing due actions");
        }
        for action in due {
            self.execute(action);
        }
    }

    /// Re-check the premise of a fired action and apply it if it still holds.
    fn execute(&mut self, action: ScheduledAction) {
        let cell = action.cell;
        match action.kind {
            ActionKind::TurfGrowth => {
                if self.grid.get(cell) == CellType::Soil && has_open_sky(&self.grid, cell) {
                    tracing::debug!(%cell, "soil grew into turf");
                    self.place_cell(cell, CellType::Turf);
                } else {
                    tracing::trace!(%cell, "stale turf growth dropped");
                }
            }
            ActionKind::VegetationRespawn => {
                if self.grid.get(cell) == CellType::Turf && self.can_host_vegetation(cell) {
                    self.spawn_vegetation(cell);
                } else {
                    tracing::trace!(%cell, "stale vegetation respawn dropped");
                }
            }
        }
    }

    /// Turf covered by a solid turns back into soil immediately.
    fn smother(&mut self, turf: CellCoord) {
        self.write_cell(turf, CellType::Soil);
        self.clear_vegetation(turf.up());
        self.scheduler.cancel(ActionKind::TurfGrowth, turf);
        self.scheduler.cancel(ActionKind::VegetationRespawn, turf);
        self.refresh_visual(turf, true);
        tracing::debug!(%turf, "turf smothered into soil");
    }

    /// Recompute visuals for `coord` and its neighbors and queue growth for
    /// any soil or bare turf left under open sky.
    fn refresh_neighborhood(&mut self, coord: CellCoord, retyped: bool) {
        self.refresh_visual(coord, retyped);
        for n in coord.neighbors() {
            self.refresh_visual(n, false);
        }
        for c in std::iter::once(coord).chain(coord.neighbors()) {
            self.queue_growth_for(c);
        }
    }

    fn queue_growth_for(&mut self, coord: CellCoord) {
        match self.grid.get(coord) {
            CellType::Turf if self.can_host_vegetation(coord) => {
                self.scheduler.schedule(
                    ActionKind::VegetationRespawn,
                    coord,
                    self.config.delays.vegetation_respawn_ticks,
                );
            }
            CellType::Soil if has_open_sky(&self.grid, coord) => {
                self.scheduler.schedule(
                    ActionKind::TurfGrowth,
                    coord,
                    self.config.delays.soil_to_turf_ticks,
                );
            }
            _ => {}
        }
    }

    /// Open sky above `support`, nothing growing there yet.
    fn can_host_vegetation(&self, support: CellCoord) -> bool {
        has_open_sky(&self.grid, support)
            && self.grid.contains(support.up())
            && !self.vegetation.contains_key(&support.up())
    }

    /// Report a materialization flip. A `retyped` cell that stays visible is
    /// reported too, since its visual has to be rebuilt for the new type.
    fn refresh_visual(&mut self, coord: CellCoord, retyped: bool) {
        if !self.grid.contains(coord) {
            return;
        }
        let now = is_exposed(&self.grid, coord);
        let was = self.materialized.contains(&coord);
        if now == was && !(retyped && now) {
            return;
        }
        if now {
            self.materialized.insert(coord);
        } else {
            self.materialized.remove(&coord);
        }
        tracing::trace!(%coord, materialized = now, "visual changed");
        self.event_log.push(WorldEvent::VisualChanged {
            coord,
            materialized: now,
        });
    }

    fn write_cell(&mut self, coord: CellCoord, cell: CellType) {
        let old = self.grid.get(coord);
        if self.grid.set(coord, cell) && old != cell {
            self.event_log.push(WorldEvent::CellChanged {
                coord,
                old,
                new: cell,
            });
        }
    }

    fn clear_vegetation(&mut self, coord: CellCoord) {
        if self.vegetation.remove(&coord).is_some() {
            tracing::debug!(%coord, "vegetation cleared");
            self.event_log.push(WorldEvent::VegetationCleared { coord });
        }
    }

    fn spawn_vegetation(&mut self, support: CellCoord) -> bool {
        let tufts = self.policy.spawn(support, &mut self.rng);
        if tufts.is_empty() {
            return false;
        }
        let coord = support.up();
        tracing::debug!(%coord, tufts = tufts.len(), "vegetation spawned");
        self.vegetation.insert(coord, tufts.clone());
        self.event_log
            .push(WorldEvent::VegetationSpawned { coord, tufts });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CascadeDelays, VegetationConfig};
    use rand::Rng;

    const ORIGIN: CellCoord = CellCoord::new(0, 0, 0);
    const ABOVE: CellCoord = CellCoord::new(0, 1, 0);

    fn test_config(extent: [u32; 3]) -> WorldConfig {
        WorldConfig {
            extent,
            tick_interval_secs: 0.1,
            seed: 11,
            delays: CascadeDelays {
                vegetation_respawn_ticks: 5,
                new_turf_vegetation_ticks: 2,
                soil_to_turf_ticks: 4,
            },
            vegetation: VegetationConfig {
                density: 1.0,
                variant_weights: vec![3, 1],
                variant_count: 2,
                max_offset: 0.25,
            },
        }
    }

    fn world_with(extent: [u32; 3], cells: &[(CellCoord, CellType)]) -> World {
        let mut grid = VoxelGrid::new(extent);
        for (c, t) in cells {
            assert!(grid.set(*c, *t));
        }
        World::from_grid(test_config(extent), grid)
    }

    fn assert_vegetation_invariant(world: &World) {
        for coord in world.vegetation().keys() {
            assert_eq!(world.cell_type(*coord), CellType::Empty, "veg at {coord}");
            assert_eq!(world.cell_type(coord.down()), CellType::Turf, "veg at {coord}");
        }
    }

    fn assert_materialized_set_matches(world: &World) {
        for (c, _) in world.grid().iter() {
            assert_eq!(
                world.materialized.contains(&c),
                world.is_materialized(c),
                "tracked visual out of sync at {c}"
            );
        }
    }

    #[test]
    fn out_of_bounds_placement_is_a_noop() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Turf)]);
        world.drain_events();
        let hash = world.state_hash();
        for c in [
            CellCoord::new(-1, 0, 0),
            CellCoord::new(0, 3, 0),
            CellCoord::new(0, 0, 99),
        ] {
            assert_eq!(world.cell_type(c), CellType::Empty);
            for t in CellType::ALL {
                assert!(!world.place_cell(c, t));
            }
            assert_eq!(
                world.try_place_cell(c, CellType::Stone),
                Err(PlaceError::OutOfBounds(c))
            );
        }
        assert_eq!(world.state_hash(), hash);
        assert!(world.events().is_empty());
    }

    #[test]
    fn try_place_reports_unchanged() {
        let mut world = world_with([3, 3, 3], &[]);
        assert_eq!(
            world.try_place_cell(ORIGIN, CellType::Stone),
            Ok(PlaceOutcome::Applied)
        );
        assert_eq!(
            world.try_place_cell(ORIGIN, CellType::Stone),
            Ok(PlaceOutcome::Unchanged)
        );
    }

    #[test]
    fn soil_grows_into_turf_after_delay() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Soil)]);
        assert!(world.schedule_turf_growth(ORIGIN, 3));

        assert_eq!(world.advance(0.2), 2);
        assert_eq!(world.cell_type(ORIGIN), CellType::Soil);

        assert_eq!(world.advance(0.1), 1);
        assert_eq!(world.tick(), 3);
        assert_eq!(world.cell_type(ORIGIN), CellType::Turf);
        assert!(
            world
                .scheduler()
                .is_pending(ActionKind::VegetationRespawn, ORIGIN)
        );
    }

    #[test]
    fn grown_turf_sprouts_vegetation() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Soil)]);
        world.schedule_turf_growth(ORIGIN, 1);
        world.step();
        assert!(!world.has_vegetation(ABOVE));
        for _ in 0..world.config().delays.new_turf_vegetation_ticks {
            world.step();
        }
        let tufts = world.vegetation_at(ABOVE).unwrap();
        assert_eq!(tufts.len(), 1);
        assert!(tufts[0].variant < 2);
        assert_vegetation_invariant(&world);
    }

    #[test]
    fn covering_turf_smothers_it() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Turf)]);
        world.populate_vegetation();
        assert!(world.has_vegetation(ABOVE));
        world.schedule(ActionKind::VegetationRespawn, ORIGIN, 10);
        world.drain_events();

        assert!(world.place_cell(ABOVE, CellType::Stone));

        assert_eq!(world.cell_type(ORIGIN), CellType::Soil);
        assert!(!world.has_vegetation(ABOVE));
        let sched = world.scheduler();
        assert!(!sched.is_pending(ActionKind::VegetationRespawn, ORIGIN));
        assert!(!sched.is_pending(ActionKind::TurfGrowth, ORIGIN));
        assert!(
            world
                .events()
                .contains(&WorldEvent::VegetationCleared { coord: ABOVE })
        );
        assert!(world.events().contains(&WorldEvent::CellChanged {
            coord: ORIGIN,
            old: CellType::Turf,
            new: CellType::Soil,
        }));
    }

    #[test]
    fn smothered_turf_is_redrawn_while_still_visible() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Turf)]);
        world.drain_events();

        world.place_cell(ABOVE, CellType::Stone);

        assert_eq!(world.cell_type(ORIGIN), CellType::Soil);
        assert!(world.is_materialized(ORIGIN));
        assert!(world.events().contains(&WorldEvent::VisualChanged {
            coord: ORIGIN,
            materialized: true,
        }));
    }

    #[test]
    fn retyping_a_visible_cell_redraws_it() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Stone)]);
        world.drain_events();
        world.place_cell(ORIGIN, CellType::Sand);
        let redraws = world
            .events()
            .iter()
            .filter(|e| matches!(e, WorldEvent::VisualChanged { coord, .. } if *coord == ORIGIN))
            .count();
        assert_eq!(redraws, 1);

        world.drain_events();
        world.place_cell(ORIGIN, CellType::Sand);
        assert!(
            !world
                .events()
                .iter()
                .any(|e| matches!(e, WorldEvent::VisualChanged { .. }))
        );
    }

    #[test]
    fn uncovering_soil_schedules_growth() {
        let mut world = world_with(
            [3, 3, 3],
            &[(ORIGIN, CellType::Soil), (ABOVE, CellType::Stone)],
        );
        for _ in 0..7 {
            world.step();
        }
        assert!(world.place_cell(ABOVE, CellType::Empty));
        let action = world
            .scheduler()
            .find(ActionKind::TurfGrowth, ORIGIN)
            .copied()
            .unwrap();
        assert_eq!(
            action.due_tick,
            world.tick() + world.config().delays.soil_to_turf_ticks
        );
    }

    #[test]
    fn covering_soil_cancels_its_growth() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Soil)]);
        world.schedule_turf_growth(ORIGIN, 3);
        world.place_cell(ABOVE, CellType::Planks);
        assert!(!world.scheduler().is_pending(ActionKind::TurfGrowth, ORIGIN));
        for _ in 0..5 {
            world.step();
        }
        assert_eq!(world.cell_type(ORIGIN), CellType::Soil);
    }

    #[test]
    fn neighbor_updates_schedule_one_respawn() {
        let turf = CellCoord::new(1, 0, 1);
        let mut world = world_with([3, 3, 3], &[(turf, CellType::Turf)]);
        world.place_cell(CellCoord::new(0, 0, 1), CellType::Stone);
        world.place_cell(CellCoord::new(2, 0, 1), CellType::Stone);
        let pending: Vec<_> = world
            .scheduler()
            .pending()
            .iter()
            .filter(|a| a.kind == ActionKind::VegetationRespawn && a.cell == turf)
            .collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(
            world.debug_snapshot().pending_of(ActionKind::VegetationRespawn),
            1
        );
    }

    #[test]
    fn stale_respawn_is_dropped() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Turf)]);
        world.schedule(ActionKind::VegetationRespawn, ORIGIN, 1);
        // Bypass the cascade so the premise breaks without a cancel.
        world.grid.set(ORIGIN, CellType::Sand);
        world.step();
        assert!(world.vegetation().is_empty());
    }

    #[test]
    fn removing_vegetated_cell_contents_clears_vegetation() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Turf)]);
        world.populate_vegetation();
        world.place_cell(ORIGIN, CellType::Empty);
        assert!(!world.has_vegetation(ABOVE));
        assert_vegetation_invariant(&world);
    }

    #[test]
    fn replacing_turf_with_turf_reseeds_vegetation() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Turf)]);
        world.populate_vegetation();
        assert!(world.has_vegetation(ABOVE));

        assert_eq!(
            world.try_place_cell(ORIGIN, CellType::Turf),
            Ok(PlaceOutcome::Unchanged)
        );

        assert!(!world.has_vegetation(ABOVE));
        let action = world
            .scheduler()
            .find(ActionKind::VegetationRespawn, ORIGIN)
            .copied()
            .unwrap();
        assert_eq!(
            action.due_tick,
            world.tick() + world.config().delays.new_turf_vegetation_ticks
        );
        assert_vegetation_invariant(&world);
    }

    #[test]
    fn bare_turf_respawns_vegetation() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Turf)]);
        world.populate_vegetation();
        // Clearing the patch itself leaves the turf bare.
        world.place_cell(ABOVE, CellType::Empty);
        assert!(!world.has_vegetation(ABOVE));
        let due = world
            .scheduler()
            .find(ActionKind::VegetationRespawn, ORIGIN)
            .unwrap()
            .due_tick;
        assert_eq!(due, world.config().delays.vegetation_respawn_ticks);
        while world.tick() < due {
            world.step();
        }
        assert!(world.has_vegetation(ABOVE));
    }

    #[test]
    fn advance_catches_up_in_order() {
        let mut world = world_with([2, 2, 2], &[]);
        assert_eq!(world.advance(0.5), 5);
        let ticks: Vec<u64> = world
            .events()
            .iter()
            .filter_map(|e| match e {
                WorldEvent::Ticked { tick } => Some(*tick),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn actions_scheduled_during_a_tick_wait_for_the_next() {
        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Soil)]);
        world.config.delays.new_turf_vegetation_ticks = 0;
        world.schedule_turf_growth(ORIGIN, 1);
        world.step();
        assert_eq!(world.cell_type(ORIGIN), CellType::Turf);
        assert!(!world.has_vegetation(ABOVE));
        world.step();
        assert!(world.has_vegetation(ABOVE));
    }

    #[test]
    fn break_cell_respects_unbreakable() {
        let mut world = world_with(
            [3, 3, 3],
            &[(ORIGIN, CellType::Bedrock), (ABOVE, CellType::Stone)],
        );
        assert_eq!(
            world.break_cell(ORIGIN),
            Err(PlaceError::Unbreakable {
                coord: ORIGIN,
                cell: CellType::Bedrock
            })
        );
        assert_eq!(world.break_cell(ABOVE), Ok(CellType::Stone));
        assert_eq!(
            world.break_cell(ABOVE),
            Err(PlaceError::NothingToBreak(ABOVE))
        );
        assert_eq!(
            world.break_cell(CellCoord::new(9, 9, 9)),
            Err(PlaceError::OutOfBounds(CellCoord::new(9, 9, 9)))
        );
    }

    #[test]
    fn initial_visuals_cover_exposed_cells_only() {
        let mut grid = VoxelGrid::new([3, 3, 3]);
        grid.fill_box(CellCoord::new(0, 0, 0), CellCoord::new(2, 2, 2), CellType::Stone);
        let world = World::from_grid(test_config([3, 3, 3]), grid);
        assert_eq!(world.debug_snapshot().materialized, 26);
        assert!(!world.is_materialized(CellCoord::new(1, 1, 1)));
        assert_materialized_set_matches(&world);
    }

    #[test]
    fn random_edits_keep_invariants() {
        let extent = [5, 4, 5];
        let mut grid = VoxelGrid::new(extent);
        grid.fill_box(CellCoord::new(0, 0, 0), CellCoord::new(4, 0, 4), CellType::Soil);
        grid.fill_box(CellCoord::new(0, 1, 0), CellCoord::new(4, 1, 4), CellType::Turf);
        let mut world = World::from_grid(test_config(extent), grid);
        world.populate_vegetation();

        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let palette = [
            CellType::Empty,
            CellType::Empty,
            CellType::Soil,
            CellType::Turf,
            CellType::Stone,
        ];
        for _ in 0..400 {
            let c = CellCoord::new(
                rng.gen_range(-1..6),
                rng.gen_range(-1..5),
                rng.gen_range(-1..6),
            );
            let t = palette[rng.gen_range(0..palette.len())];
            world.place_cell(c, t);
            if rng.gen_bool(0.3) {
                world.advance(0.1 * rng.gen_range(1..4) as f64);
            }
            assert_vegetation_invariant(&world);
            let snapshot = world.debug_snapshot();
            for kind in [ActionKind::VegetationRespawn, ActionKind::TurfGrowth] {
                let mut cells: Vec<_> = snapshot
                    .pending
                    .iter()
                    .filter(|a| a.kind == kind)
                    .map(|a| a.cell)
                    .collect();
                let before = cells.len();
                cells.sort();
                cells.dedup();
                assert_eq!(cells.len(), before, "duplicate pending {kind:?}");
            }
        }
        assert_materialized_set_matches(&world);
    }

    #[test]
    fn same_seed_same_history() {
        let run = |seed: u64| {
            let mut config = test_config([4, 3, 4]);
            config.seed = seed;
            config.vegetation.density = 2.5;
            let mut world = World::new(config);
            world.place_cell(ORIGIN, CellType::Soil);
            world.place_cell(CellCoord::new(1, 0, 0), CellType::Turf);
            world.place_cell(CellCoord::new(2, 0, 0), CellType::Turf);
            world.advance(3.0);
            world.place_cell(CellCoord::new(1, 1, 0), CellType::Stone);
            world.advance(1.0);
            world.state_hash()
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn dispatch_drains_log_into_observer() {
        #[derive(Default)]
        struct Counter {
            visuals: usize,
            vegetation: usize,
            cells: usize,
        }
        impl WorldObserver for Counter {
            fn on_cell_visual_changed(&mut self, _: CellCoord, _: bool) {
                self.visuals += 1;
            }
            fn on_vegetation_changed(&mut self, _: CellCoord, _: bool, _: Option<u8>) {
                self.vegetation += 1;
            }
            fn on_cell_changed(&mut self, _: CellCoord, _: CellType, _: CellType) {
                self.cells += 1;
            }
        }

        let mut world = world_with([3, 3, 3], &[(ORIGIN, CellType::Turf)]);
        world.populate_vegetation();
        world.place_cell(CellCoord::new(2, 2, 2), CellType::Log);
        let mut counter = Counter::default();
        let n = world.dispatch_events(&mut counter);
        assert!(n > 0);
        assert_eq!(counter.visuals, 2);
        assert_eq!(counter.vegetation, 1);
        assert_eq!(counter.cells, 1);
        assert!(world.events().is_empty());
    }
}
