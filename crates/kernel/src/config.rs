//! World configuration: grid extent, tick rate, cascade delays, vegetation
//! tuning. Passed by value into [`crate::World`] constructors; there is no
//! process-wide registry.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse world config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read world config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("grid extent must be positive on every axis, got {0:?}")]
    EmptyExtent([u32; 3]),
    #[error("tick interval must be a positive number of seconds, got {0}")]
    TickInterval(f64),
    #[error("vegetation density must be finite and non-negative, got {0}")]
    Density(f32),
    #[error("vegetation offset must be finite and non-negative, got {0}")]
    Offset(f32),
    #[error("at most {MAX_VEGETATION_VARIANTS} vegetation variants are supported, got {0}")]
    VariantCount(usize),
}

/// Variant indices are reported as `u8`.
pub const MAX_VEGETATION_VARIANTS: usize = u8::MAX as usize + 1;

/// Delays, in ticks, between a triggering mutation and its deferred effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeDelays {
    /// Turf left bare by a neighbor update or a cleared patch.
    pub vegetation_respawn_ticks: u64,
    /// Freshly placed or freshly grown turf.
    pub new_turf_vegetation_ticks: u64,
    /// Soil uncovered to open air.
    pub soil_to_turf_ticks: u64,
}

impl Default for CascadeDelays {
    fn default() -> Self {
        Self {
            vegetation_respawn_ticks: 100,
            new_turf_vegetation_ticks: 40,
            soil_to_turf_ticks: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationConfig {
    /// Expected tufts per eligible turf cell. The integer part is always
    /// spawned; the fractional part is one weighted coin flip.
    pub density: f32,
    /// Relative weight per variant index. Earlier entries are the common ones.
    pub variant_weights: Vec<u32>,
    /// Number of variants the render side can show. Weights past this count
    /// are ignored.
    pub variant_count: usize,
    /// Maximum planar offset of a tuft from the cell center, per axis.
    pub max_offset: f32,
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            density: 1.35,
            variant_weights: vec![6, 3, 1],
            variant_count: 3,
            max_offset: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid size in cells along x, y, z.
    pub extent: [u32; 3],
    pub tick_interval_secs: f64,
    /// Seed for the vegetation random source.
    pub seed: u64,
    pub delays: CascadeDelays,
    pub vegetation: VegetationConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            extent: [32, 16, 32],
            tick_interval_secs: 0.05,
            seed: 0,
            delays: CascadeDelays::default(),
            vegetation: VegetationConfig::default(),
        }
    }
}

impl WorldConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extent.contains(&0) {
            return Err(ConfigError::EmptyExtent(self.extent));
        }
        if !(self.tick_interval_secs.is_finite() && self.tick_interval_secs > 0.0) {
            return Err(ConfigError::TickInterval(self.tick_interval_secs));
        }
        let density = self.vegetation.density;
        if !(density.is_finite() && density >= 0.0) {
            return Err(ConfigError::Density(density));
        }
        let offset = self.vegetation.max_offset;
        if !(offset.is_finite() && offset >= 0.0) {
            return Err(ConfigError::Offset(offset));
        }
        if self.vegetation.variant_count > MAX_VEGETATION_VARIANTS {
            return Err(ConfigError::VariantCount(self.vegetation.variant_count));
        }
        Ok(())
    }

    /// Builder-style override of the grid extent.
    pub fn with_extent(mut self, extent: [u32; 3]) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
