//! Voxel-column terrain for the block-world walker.
//!
//! The terrain is a grid of columns; column `(ix, iz)` covers the square
//! `[origin.x + ix * block, origin.x + (ix + 1) * block)` on X (likewise on Z)
//! and is solid from below up to `origin.y + height * block`.
//! Only the top faces collide: the bottom sphere of the capsule rests on the
//! highest column under its footprint.
//!
//! [`VoxelTerrain::generate`] builds the block world's heightmap from four
//! octaves of seeded Perlin noise:
//!
//! ```text
//! h(x, z) = Σ  noise(x / q, z / q, s) * q     for q = 2, 8, 32, 128
//! column  = trunc(h * 0.15)
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use super::detection::WorldCollider;
use crate::noise::Perlin;
use crate::types::{Capsule, Contact, Vec3};

/// Octave scales summed by [`VoxelTerrain::generate`]
const OCTAVES: usize = 4;
const FIRST_OCTAVE_SCALE: f64 = 2.0;
const OCTAVE_GROWTH: f64 = 4.0;
/// Noise units per block of column height
const HEIGHT_SCALE: f64 = 0.15;

#[derive(Debug, Error, PartialEq)]
pub enum TerrainError {
    #[error("expected {expected} column heights, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("block size must be positive, got {0}")]
    BlockSize(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoxelTerrain {
    origin: Vec3,
    width: usize,
    depth: usize,
    block_size: f64,
    /// Row-major by Z: index = ix + iz * width
    heights: Vec<i32>,
}

impl VoxelTerrain {
    pub fn new(
        origin: Vec3,
        width: usize,
        depth: usize,
        block_size: f64,
        heights: Vec<i32>,
    ) -> Result<Self, TerrainError> {
        if block_size <= 0.0 || !block_size.is_finite() {
            return Err(TerrainError::BlockSize(block_size));
        }
        let expected = width * depth;
        if heights.len() != expected {
            return Err(TerrainError::SizeMismatch {
                expected,
                actual: heights.len(),
            });
        }
        Ok(Self {
            origin,
            width,
            depth,
            block_size,
            heights,
        })
    }

    /// A terrain where every column has the same height.
    pub fn flat(origin: Vec3, width: usize, depth: usize, block_size: f64, height: i32) -> Result<Self, TerrainError> {
        Self::new(origin, width, depth, block_size, vec![height; width * depth])
    }

    /// Procedural hills: seeded Perlin octaves, truncated to whole blocks.
    pub fn generate(
        origin: Vec3,
        width: usize,
        depth: usize,
        block_size: f64,
        seed: u64,
    ) -> Result<Self, TerrainError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let noise = Perlin::from_rng(&mut rng);
        let slice = rng.random::<f64>() * 100.0;

        let mut field = vec![0.0; width * depth];
        let mut scale = FIRST_OCTAVE_SCALE;
        for _ in 0..OCTAVES {
            for (i, h) in field.iter_mut().enumerate() {
                let (x, z) = ((i % width) as f64, (i / width) as f64);
                *h += noise.sample(x / scale, z / scale, slice) * scale;
            }
            scale *= OCTAVE_GROWTH;
        }

        let heights = field.into_iter().map(|h| (h * HEIGHT_SCALE) as i32).collect();
        Self::new(origin, width, depth, block_size, heights)
    }

    fn column_index(&self, x: f64, z: f64) -> Option<(usize, usize)> {
        let fx = ((x - self.origin.x) / self.block_size).floor();
        let fz = ((z - self.origin.z) / self.block_size).floor();
        if fx < 0.0 || fz < 0.0 {
            return None;
        }
        let (ix, iz) = (fx as usize, fz as usize);
        if ix >= self.width || iz >= self.depth {
            return None;
        }
        Some((ix, iz))
    }

    fn column_top(&self, ix: usize, iz: usize) -> f64 {
        self.origin.y + self.heights[ix + iz * self.width] as f64 * self.block_size
    }

    /// Height of the terrain surface at `(x, z)`, if inside the grid.
    pub fn surface_height(&self, x: f64, z: f64) -> Option<f64> {
        self.column_index(x, z)
            .map(|(ix, iz)| self.column_top(ix, iz))
    }

    /// Highest column top under the square footprint centered on `(x, z)`.
    fn highest_under(&self, x: f64, z: f64, half_extent: f64) -> Option<f64> {
        let mut best: Option<f64> = None;
        for &(cx, cz) in &[
            (x, z),
            (x - half_extent, z - half_extent),
            (x + half_extent, z - half_extent),
            (x - half_extent, z + half_extent),
            (x + half_extent, z + half_extent),
        ] {
            if let Some(top) = self.surface_height(cx, cz) {
                best = Some(best.map_or(top, |b: f64| b.max(top)));
            }
        }
        best
    }
}

impl WorldCollider for VoxelTerrain {
    fn capsule_intersect(&self, capsule: &Capsule) -> Option<Contact> {
        let bottom = capsule.start;
        // Footprint smaller than the radius so side-by-side steps stay walkable
        let top = self.highest_under(bottom.x, bottom.z, capsule.radius * 0.5)?;

        let depth = top + capsule.radius - bottom.y;
        if depth <= 0.0 {
            return None;
        }

        Some(Contact {
            normal: Vec3::UP,
            depth,
        })
    }
}
