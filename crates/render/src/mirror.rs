use std::collections::{BTreeMap, BTreeSet};

use blockworld_common::{CellCoord, CellType};
use blockworld_kernel::WorldObserver;

/// Render-side bookkeeping rebuilt only from world notifications.
///
/// Stands in for the scene graph a real renderer would maintain: one visual
/// per materialized cell and one per vegetation tuft.
#[derive(Debug, Default)]
pub struct VisualMirror {
    visuals: BTreeSet<CellCoord>,
    vegetation: BTreeMap<CellCoord, Vec<u8>>,
    cell_changes: usize,
    last_tick: u64,
}

impl VisualMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_visual(&self, coord: CellCoord) -> bool {
        self.visuals.contains(&coord)
    }

    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    /// Variants shown at `coord`, in spawn order.
    pub fn vegetation_at(&self, coord: CellCoord) -> &[u8] {
        self.vegetation.get(&coord).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn vegetation_count(&self) -> usize {
        self.vegetation.len()
    }

    pub fn cell_changes(&self) -> usize {
        self.cell_changes
    }

    pub fn last_tick(&self) -> u64 {
        self.last_tick
    }
}

impl WorldObserver for VisualMirror {
    fn on_cell_visual_changed(&mut self, coord: CellCoord, now_materialized: bool) {
        if now_materialized {
            self.visuals.insert(coord);
        } else {
            self.visuals.remove(&coord);
        }
    }

    fn on_vegetation_changed(&mut self, coord: CellCoord, present: bool, variant: Option<u8>) {
        match (present, variant) {
            (true, Some(v)) => self.vegetation.entry(coord).or_default().push(v),
            (true, None) => {
                self.vegetation.entry(coord).or_default();
            }
            (false, _) => {
                self.vegetation.remove(&coord);
            }
        }
    }

    fn on_cell_changed(&mut self, coord: CellCoord, old: CellType, new: CellType) {
        tracing::trace!(%coord, %old, %new, "mirror saw cell change");
        self.cell_changes += 1;
    }

    fn on_tick(&mut self, tick: u64) {
        self.last_tick = tick;
    }
}
