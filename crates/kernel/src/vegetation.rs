use blockworld_common::CellCoord;
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_VEGETATION_VARIANTS, VegetationConfig};

/// One vegetation instance inside a patch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuft {
    pub variant: u8,
    /// Planar offset from the cell center, in cell units.
    pub offset: Vec2,
}

/// Weighted-random choice of how much vegetation grows on a turf cell and
/// which variants it uses.
#[derive(Debug, Clone)]
pub struct VegetationPolicy {
    density: f32,
    /// Weights clipped to the configured variant count and to what a `u8`
    /// index can name.
    weights: Vec<u32>,
    max_offset: f32,
}

impl VegetationPolicy {
    pub fn new(config: &VegetationConfig) -> Self {
        let usable = config
            .variant_count
            .min(config.variant_weights.len())
            .min(MAX_VEGETATION_VARIANTS);
        Self {
            density: config.density.max(0.0),
            weights: config.variant_weights[..usable].to_vec(),
            max_offset: config.max_offset.max(0.0),
        }
    }

    /// Number of variants that can actually be drawn.
    pub fn variant_count(&self) -> usize {
        self.weights.len()
    }

    fn total_weight(&self) -> u64 {
        self.weights.iter().map(|&w| w as u64).sum()
    }

    /// Draw the tufts for the empty cell above `support`.
    ///
    /// Returns an empty list when the density resolves to zero or no variant
    /// carries weight. The result depends only on the configuration and the
    /// state of `rng`.
    pub fn spawn<R: Rng + ?Sized>(&self, support: CellCoord, rng: &mut R) -> Vec<Tuft> {
        let total = self.total_weight();
        if total == 0 {
            return Vec::new();
        }
        let count = self.cluster_size(rng);
        let tufts: Vec<Tuft> = (0..count)
            .map(|_| Tuft {
                variant: self.pick_variant(total, rng),
                offset: self.pick_offset(rng),
            })
            .collect();
        tracing::trace!(%support, count = tufts.len(), "vegetation drawn");
        tufts
    }

    fn cluster_size<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let whole = self.density.floor();
        let fraction = (self.density - whole) as f64;
        let mut count = whole as usize;
        if fraction > 0.0 && rng.gen_bool(fraction.min(1.0)) {
            count += 1;
        }
        count
    }

    fn pick_variant<R: Rng + ?Sized>(&self, total: u64, rng: &mut R) -> u8 {
        let mut roll = rng.gen_range(0..total);
        for (index, &w) in self.weights.iter().enumerate() {
            let w = w as u64;
            if roll < w {
                return u8::try_from(index).unwrap_or(u8::MAX);
            }
            roll -= w;
        }
        // Unreachable while roll < total.
        u8::try_from(self.weights.len() - 1).unwrap_or(u8::MAX)
    }

    fn pick_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        if self.max_offset == 0.0 {
            return Vec2::ZERO;
        }
        let m = self.max_offset;
        Vec2::new(rng.gen_range(-m..=m), rng.gen_range(-m..=m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SUPPORT: CellCoord = CellCoord::new(0, 0, 0);

    fn policy(density: f32, weights: Vec<u32>, variant_count: usize) -> VegetationPolicy {
        VegetationPolicy::new(&VegetationConfig {
            density,
            variant_weights: weights,
            variant_count,
            max_offset: 0.3,
        })
    }

    #[test]
    fn integer_density_is_deterministic_in_size() {
        let p = policy(2.0, vec![1, 1], 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(p.spawn(SUPPORT, &mut rng).len(), 2);
        }
    }

    #[test]
    fn fractional_density_adds_at_most_one() {
        let p = policy(1.5, vec![1], 1);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let sizes: Vec<usize> = (0..400).map(|_| p.spawn(SUPPORT, &mut rng).len()).collect();
        assert!(sizes.iter().all(|&n| n == 1 || n == 2));
        let twos = sizes.iter().filter(|&&n| n == 2).count();
        assert!((120..280).contains(&twos), "twos = {twos}");
    }

    #[test]
    fn zero_density_spawns_nothing() {
        let p = policy(0.0, vec![5, 1], 2);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(p.spawn(SUPPORT, &mut rng).is_empty());
    }

    #[test]
    fn no_variants_spawns_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert!(policy(3.0, vec![], 0).spawn(SUPPORT, &mut rng).is_empty());
        assert!(policy(3.0, vec![4, 2], 0).spawn(SUPPORT, &mut rng).is_empty());
        assert!(policy(3.0, vec![0, 0], 2).spawn(SUPPORT, &mut rng).is_empty());
    }

    #[test]
    fn weights_past_variant_count_are_ignored() {
        let p = policy(4.0, vec![1, 1, 1000], 2);
        assert_eq!(p.variant_count(), 2);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..100 {
            assert!(p.spawn(SUPPORT, &mut rng).iter().all(|t| t.variant < 2));
        }
    }

    #[test]
    fn variants_beyond_u8_range_are_never_drawn() {
        let mut weights = vec![0; 300];
        weights[257] = 1;
        let p = policy(1.0, weights.clone(), 300);
        assert_eq!(p.variant_count(), MAX_VEGETATION_VARIANTS);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        assert!(p.spawn(SUPPORT, &mut rng).is_empty());

        weights[255] = 1;
        let p = policy(1.0, weights, 300);
        for _ in 0..20 {
            let tufts = p.spawn(SUPPORT, &mut rng);
            assert_eq!(tufts.len(), 1);
            assert_eq!(tufts[0].variant, 255);
        }
    }

    #[test]
    fn heavier_weights_are_drawn_more_often() {
        let p = policy(1.0, vec![8, 1], 2);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut counts = [0usize; 2];
        for _ in 0..900 {
            for t in p.spawn(SUPPORT, &mut rng) {
                counts[t.variant as usize] += 1;
            }
        }
        assert!(counts[0] > counts[1] * 4, "counts = {counts:?}");
    }

    #[test]
    fn offsets_stay_within_bounds() {
        let p = policy(3.0, vec![1], 1);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            for t in p.spawn(SUPPORT, &mut rng) {
                assert!(t.offset.x.abs() <= 0.3 && t.offset.y.abs() <= 0.3);
            }
        }
    }

    #[test]
    fn same_seed_same_tufts() {
        let p = policy(2.5, vec![3, 2, 1], 3);
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(p.spawn(SUPPORT, &mut a), p.spawn(SUPPORT, &mut b));
        }
    }
}
