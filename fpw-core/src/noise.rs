//! Seeded 3D gradient noise for procedural terrain.
//!
//! Classic "improved" Perlin noise: a shuffled 256-entry permutation
//! (doubled to avoid wrapping), quintic fade curves and twelve edge
//! gradients. The permutation comes from a seeded ChaCha stream, so a seed
//! always produces the same field.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded gradient noise field.
#[derive(Debug, Clone)]
pub struct Perlin {
    perm: [u8; 512],
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn grad(hash: u8, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}

impl Perlin {
    pub fn new(seed: u64) -> Self {
        Self::from_rng(&mut ChaCha8Rng::seed_from_u64(seed))
    }

    /// Shuffle the permutation with an existing generator.
    pub fn from_rng(rng: &mut ChaCha8Rng) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(rng);

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    fn p(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    /// Noise value at `(x, y, z)`, roughly within `[-1, 1]`. Zero at every
    /// integer lattice point.
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let (fx, fy, fz) = (x.floor(), y.floor(), z.floor());
        let xi = (fx as i64 & 255) as usize;
        let yi = (fy as i64 & 255) as usize;
        let zi = (fz as i64 & 255) as usize;
        let (x, y, z) = (x - fx, y - fy, z - fz);
        let (u, v, w) = (fade(x), fade(y), fade(z));

        let a = self.p(xi) + yi;
        let aa = self.p(a) + zi;
        let ab = self.p(a + 1) + zi;
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b) + zi;
        let bb = self.p(b + 1) + zi;

        let g = |i: usize, dx: f64, dy: f64, dz: f64| grad(self.perm[i], dx, dy, dz);

        lerp(
            w,
            lerp(
                v,
                lerp(u, g(aa, x, y, z), g(ba, x - 1.0, y, z)),
                lerp(u, g(ab, x, y - 1.0, z), g(bb, x - 1.0, y - 1.0, z)),
            ),
            lerp(
                v,
                lerp(u, g(aa + 1, x, y, z - 1.0), g(ba + 1, x - 1.0, y, z - 1.0)),
                lerp(u, g(ab + 1, x, y - 1.0, z - 1.0), g(bb + 1, x - 1.0, y - 1.0, z - 1.0)),
            ),
        )
    }
}
