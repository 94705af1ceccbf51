use std::collections::BTreeMap;

use blockworld_common::{CellCoord, CellType};
use blockworld_kernel::{ActionKind, ScheduledAction, World};

/// World inspector for developer tooling.
///
/// Provides read-only queries against the world state for debugging,
/// profiling, and development UI.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the world state.
    pub fn summary(world: &World) -> WorldSummary {
        let snapshot = world.debug_snapshot();
        WorldSummary {
            tick: snapshot.tick,
            extent: snapshot.extent,
            solid_cells: snapshot
                .cell_counts
                .iter()
                .filter(|(cell, _)| cell.is_solid())
                .map(|(_, n)| n)
                .sum(),
            materialized: snapshot.materialized,
            vegetation_patches: snapshot.vegetation_patches,
            pending_growth: snapshot.pending_of(ActionKind::TurfGrowth),
            pending_respawn: snapshot.pending_of(ActionKind::VegetationRespawn),
            pending_events: snapshot.logged_events,
        }
    }

    /// Everything the kernel knows about one cell. `None` outside the world.
    pub fn inspect_cell(world: &World, coord: CellCoord) -> Option<CellInfo> {
        if !world.grid().contains(coord) {
            return None;
        }
        let pending = world
            .scheduler()
            .pending()
            .iter()
            .filter(|a| a.cell == coord)
            .map(|a| (a.kind, a.due_tick))
            .collect();
        Some(CellInfo {
            coord,
            cell: world.cell_type(coord),
            materialized: world.is_materialized(coord),
            vegetation: world
                .vegetation_at(coord)
                .map(|tufts| tufts.iter().map(|t| t.variant).collect())
                .unwrap_or_default(),
            pending,
        })
    }

    /// Pending actions ordered by due tick, then insertion order.
    pub fn pending_actions(world: &World) -> Vec<ScheduledAction> {
        let mut actions = world.scheduler().pending().to_vec();
        actions.sort_by_key(|a| a.due_tick);
        actions
    }

    /// Cell counts per type, omitting types that do not occur.
    pub fn cell_counts(world: &World) -> BTreeMap<CellType, usize> {
        world.debug_snapshot().cell_counts
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone)]
pub struct WorldSummary {
    pub tick: u64,
    pub extent: [u32; 3],
    pub solid_cells: usize,
    pub materialized: usize,
    pub vegetation_patches: usize,
    pub pending_growth: usize,
    pub pending_respawn: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World: tick={} extent={}x{}x{} solid={} materialized={} vegetation={} pending_growth={} pending_respawn={} pending_events={}",
            self.tick,
            self.extent[0],
            self.extent[1],
            self.extent[2],
            self.solid_cells,
            self.materialized,
            self.vegetation_patches,
            self.pending_growth,
            self.pending_respawn,
            self.pending_events
        )
    }
}

/// Detailed info about a single cell.
#[derive(Debug, Clone)]
pub struct CellInfo {
    pub coord: CellCoord,
    pub cell: CellType,
    pub materialized: bool,
    /// Variant per tuft, when vegetation occupies this cell.
    pub vegetation: Vec<u8>,
    pub pending: Vec<(ActionKind, u64)>,
}

impl std::fmt::Display for CellInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cell {} type={} materialized={}",
            self.coord, self.cell, self.materialized
        )?;
        if !self.vegetation.is_empty() {
            write!(f, " vegetation={:?}", self.vegetation)?;
        }
        for (kind, due) in &self.pending {
            write!(f, " pending={kind:?}@{due}")?;
        }
        Ok(())
    }
}
