use blockworld_common::{CellCoord, CellType};

use crate::config::WorldConfig;
use crate::grid::VoxelGrid;
use crate::world::World;

/// Builds a layered world: bedrock at the bottom, then stone, soil and an
/// optional turf cap, with open air above.
#[derive(Debug, Clone)]
pub struct FlatWorldBuilder {
    config: WorldConfig,
    layers: Vec<(CellType, u32)>,
    vegetation: bool,
}

impl FlatWorldBuilder {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            layers: vec![
                (CellType::Bedrock, 1),
                (CellType::Stone, 2),
                (CellType::Soil, 2),
                (CellType::Turf, 1),
            ],
            vegetation: true,
        }
    }

    /// Replace the layer stack, bottom first. Each entry is a type and a
    /// thickness in cells.
    pub fn layers(mut self, layers: impl IntoIterator<Item = (CellType, u32)>) -> Self {
        self.layers = layers.into_iter().collect();
        self
    }

    /// Whether eligible turf gets vegetation at build time.
    pub fn with_vegetation(mut self, vegetation: bool) -> Self {
        self.vegetation = vegetation;
        self
    }

    /// Height of the layer stack in cells.
    pub fn surface_height(&self) -> u32 {
        self.layers
            .iter()
            .fold(0u32, |acc, (_, h)| acc.saturating_add(*h))
    }

    pub fn build(self) -> World {
        let mut grid = VoxelGrid::new(self.config.extent);
        let [sx, sy, sz] = grid.extent();
        let height = i32::try_from(sy).unwrap_or(i32::MAX);
        let mut y = 0i32;
        for (cell, thickness) in &self.layers {
            // Layers past the top of the grid are dropped.
            let rows = i32::try_from(*thickness)
                .unwrap_or(i32::MAX)
                .min(height - y);
            if rows <= 0 {
                continue;
            }
            let top = y + rows - 1;
            grid.fill_box(
                CellCoord::new(0, y, 0),
                CellCoord::new(sx as i32 - 1, top, sz as i32 - 1),
                *cell,
            );
            y = top + 1;
        }
        tracing::info!(surface = y, extent = ?grid.extent(), "built flat world");

        let mut world = World::from_grid(self.config, grid);
        if self.vegetation {
            world.populate_vegetation();
        }
        world
    }
}
