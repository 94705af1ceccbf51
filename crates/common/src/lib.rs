//! Shared vocabulary for the blockworld core.
//!
//! Cells have no identity of their own; they are values addressed by
//! [`CellCoord`] and typed by [`CellType`].

mod types;

pub use types::{CellCoord, CellType};
