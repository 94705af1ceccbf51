//! World Kernel: authoritative voxel grid, mutation cascades, tick-scheduled
//! growth.
//!
//! # Invariants
//! - All cell mutations flow through [`World::place_cell`].
//! - Vegetation exists only in an empty cell directly above turf.
//! - At most one pending action per `(kind, cell)`.
//! - Deferred actions re-validate their premise when they fire.

pub mod builder;
pub mod config;
pub mod event;
pub mod exposure;
pub mod grid;
pub mod scheduler;
pub mod vegetation;
pub mod world;

pub use builder::FlatWorldBuilder;
pub use config::{
    CascadeDelays, ConfigError, MAX_VEGETATION_VARIANTS, VegetationConfig, WorldConfig,
};
pub use event::{WorldEvent, WorldObserver};
pub use grid::VoxelGrid;
pub use scheduler::{ActionKind, ScheduledAction, TickScheduler};
pub use vegetation::{Tuft, VegetationPolicy};
pub use world::{DebugSnapshot, PlaceError, PlaceOutcome, World};
