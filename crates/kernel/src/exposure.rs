//! Visibility classification over a [`VoxelGrid`].

use blockworld_common::CellCoord;

use crate::grid::VoxelGrid;

/// Whether the cell at `coord` has a face worth materializing.
///
/// True iff the cell is non-empty and at least one of its six neighbors is
/// empty or lies outside the grid (out-of-bounds reads as empty).
pub fn is_exposed(grid: &VoxelGrid, coord: CellCoord) -> bool {
    if grid.get(coord).is_empty() {
        return false;
    }
    coord
        .neighbors()
        .into_iter()
        .any(|n| grid.get(n).is_empty())
}

/// Whether the cell directly above `coord` is open air.
///
/// Stricter than [`is_exposed`]: only the vertical neighbor counts. Growth
/// and vegetation rules key off this.
pub fn has_open_sky(grid: &VoxelGrid, coord: CellCoord) -> bool {
    grid.get(coord.up()).is_empty()
}
