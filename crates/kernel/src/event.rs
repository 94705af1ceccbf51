use blockworld_common::{CellCoord, CellType};
use serde::{Deserialize, Serialize};

use crate::vegetation::Tuft;

/// A record of one observable change to the world.
///
/// Every mutation, cascade and fired action appends to the world's event
/// log; render collaborators consume the log through [`WorldObserver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A cell's stored type changed.
    CellChanged {
        coord: CellCoord,
        old: CellType,
        new: CellType,
    },
    /// A cell started or stopped needing a visual.
    VisualChanged {
        coord: CellCoord,
        materialized: bool,
    },
    /// Vegetation appeared in the empty cell at `coord`.
    VegetationSpawned { coord: CellCoord, tufts: Vec<Tuft> },
    /// Vegetation at `coord` was destroyed.
    VegetationCleared { coord: CellCoord },
    /// The scheduler advanced to `tick`.
    Ticked { tick: u64 },
}

/// Callbacks for a render-side collaborator.
///
/// The world never holds observers; it records [`WorldEvent`]s and replays
/// them into an observer on [`crate::World::dispatch_events`].
pub trait WorldObserver {
    fn on_cell_visual_changed(&mut self, coord: CellCoord, now_materialized: bool);

    /// Called once per tuft when vegetation spawns, and once with
    /// `present == false` and no variant when it is cleared.
    fn on_vegetation_changed(&mut self, coord: CellCoord, present: bool, variant: Option<u8>);

    fn on_cell_changed(&mut self, _coord: CellCoord, _old: CellType, _new: CellType) {}

    fn on_tick(&mut self, _tick: u64) {}
}

impl WorldEvent {
    /// Deliver this event to `observer`.
    pub fn dispatch(&self, observer: &mut dyn WorldObserver) {
        match self {
            WorldEvent::CellChanged { coord, old, new } => {
                observer.on_cell_changed(*coord, *old, *new)
            }
            WorldEvent::VisualChanged {
                coord,
                materialized,
            } => observer.on_cell_visual_changed(*coord, *materialized),
            WorldEvent::VegetationSpawned { coord, tufts } => {
                for tuft in tufts {
                    observer.on_vegetation_changed(*coord, true, Some(tuft.variant));
                }
            }
            WorldEvent::VegetationCleared { coord } => {
                observer.on_vegetation_changed(*coord, false, None)
            }
            WorldEvent::Ticked { tick } => observer.on_tick(*tick),
        }
    }
}
