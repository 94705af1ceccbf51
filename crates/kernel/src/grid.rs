use blockworld_common::{CellCoord, CellType};

/// Dense 3D store of cell types over a fixed bounding box anchored at the
/// origin.
///
/// The grid is allocated once with its final extent and never resized.
/// Reads outside the extent return [`CellType::Empty`]; writes outside the
/// extent are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    extent: [u32; 3],
    cells: Vec<CellType>,
}

impl VoxelGrid {
    /// Create an all-empty grid.
    ///
    /// A zero-length axis is a programmer error and panics here rather than
    /// surfacing later as silently rejected mutations.
    pub fn new(extent: [u32; 3]) -> Self {
        assert!(
            extent.iter().all(|&e| e > 0),
            "grid extent must be positive on every axis, got {extent:?}"
        );
        let len = extent.iter().map(|&e| e as usize).product();
        Self {
            extent,
            cells: vec![CellType::Empty; len],
        }
    }

    pub fn extent(&self) -> [u32; 3] {
        self.extent
    }

    /// Number of addressable cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        self.index(coord).is_some()
    }

    /// The stored type, or `Empty` outside the extent.
    pub fn get(&self, coord: CellCoord) -> CellType {
        self.index(coord)
            .map(|i| self.cells[i])
            .unwrap_or(CellType::Empty)
    }

    /// Store `cell` at `coord`. Returns `false` without mutating when the
    /// coordinate is outside the extent.
    pub fn set(&mut self, coord: CellCoord, cell: CellType) -> bool {
        match self.index(coord) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// Fill the inclusive box `min..=max`, clipped to the extent. Returns the
    /// number of cells written.
    pub fn fill_box(&mut self, min: CellCoord, max: CellCoord, cell: CellType) -> usize {
        let mut written = 0;
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    if self.set(CellCoord::new(x, y, z), cell) {
                        written += 1;
                    }
                }
            }
        }
        written
    }

    /// Iterate every cell as `(coord, type)`, x fastest, then z, then y.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellType)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &cell)| (self.coord_of(i), cell))
    }

    fn index(&self, coord: CellCoord) -> Option<usize> {
        let [sx, sy, sz] = self.extent;
        if coord.x < 0 || coord.y < 0 || coord.z < 0 {
            return None;
        }
        let (x, y, z) = (coord.x as u32, coord.y as u32, coord.z as u32);
        if x >= sx || y >= sy || z >= sz {
            return None;
        }
        Some(x as usize + sx as usize * (z as usize + sz as usize * y as usize))
    }

    fn coord_of(&self, index: usize) -> CellCoord {
        let sx = self.extent[0] as usize;
        let sz = self.extent[2] as usize;
        let x = index % sx;
        let z = (index / sx) % sz;
        let y = index / (sx * sz);
        CellCoord::new(x as i32, y as i32, z as i32)
    }
}
