//! Seeded simplex noise in two and three dimensions.
//!
//! The generator draws a 256-entry table from a random source once, doubles
//! it to 512 entries so lattice lookups never wrap, and precomputes the
//! gradient index (`perm % 12`) for every entry. After construction it is
//! read-only, so a single instance can be shared by every consumer of a
//! frame.

use rand::{Rng, SeedableRng, rngs::StdRng};

const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

// Skew / unskew factors for the 2D and 3D simplex grids.
const F2: f32 = 0.366_025_42; // 0.5 * (sqrt(3) - 1)
const G2: f32 = 0.211_324_87; // (3 - sqrt(3)) / 6
const F3: f32 = 1.0 / 3.0;
const G3: f32 = 1.0 / 6.0;

/// Deterministic simplex noise generator.
#[derive(Clone, Debug)]
pub struct SimplexNoise {
    perm: [u8; 512],
    perm_mod12: [u8; 512],
}

impl SimplexNoise {
    /// Builds a generator whose table is drawn from `rng`.
    ///
    /// ### Parameters
    /// - `rng` - Random source; 256 bytes are consumed from it.
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut p = [0u8; 256];
        for v in p.iter_mut() {
            *v = rng.random::<u8>();
        }

        let mut perm = [0u8; 512];
        let mut perm_mod12 = [0u8; 512];
        for i in 0..512 {
            perm[i] = p[i & 255];
            perm_mod12[i] = perm[i] % 12;
        }

        Self { perm, perm_mod12 }
    }

    /// Builds a generator from a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(&mut StdRng::seed_from_u64(seed))
    }

    /// The 256 source entries of the lookup table.
    pub fn table(&self) -> &[u8] {
        &self.perm[..256]
    }

    #[inline]
    fn perm(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    #[inline]
    fn grad(&self, i: usize) -> &[f32; 3] {
        &GRAD3[self.perm_mod12[i] as usize]
    }

    /// 2D simplex noise, roughly in `[-1, 1]`.
    pub fn noise2(&self, xin: f32, yin: f32) -> f32 {
        let s = (xin + yin) * F2;
        let i = (xin + s).floor() as i32;
        let j = (yin + s).floor() as i32;
        let t = (i + j) as f32 * G2;
        let x0 = xin - (i as f32 - t);
        let y0 = yin - (j as f32 - t);

        // Lower or upper triangle of the skewed cell.
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f32 + G2;
        let y1 = y0 - j1 as f32 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let g0 = self.grad(ii + self.perm(jj));
        let g1 = self.grad(ii + i1 + self.perm(jj + j1));
        let g2 = self.grad(ii + 1 + self.perm(jj + 1));

        let corner = |g: &[f32; 3], x: f32, y: f32| {
            let t = 0.5 - x * x - y * y;
            if t < 0.0 {
                0.0
            } else {
                let t2 = t * t;
                t2 * t2 * (g[0] * x + g[1] * y)
            }
        };

        70.0 * (corner(g0, x0, y0) + corner(g1, x1, y1) + corner(g2, x2, y2))
    }

    /// 3D simplex noise, roughly in `[-1, 1]`.
    pub fn noise3(&self, xin: f32, yin: f32, zin: f32) -> f32 {
        let s = (xin + yin + zin) * F3;
        let i = (xin + s).floor() as i32;
        let j = (yin + s).floor() as i32;
        let k = (zin + s).floor() as i32;
        let t = (i + j + k) as f32 * G3;
        let x0 = xin - (i as f32 - t);
        let y0 = yin - (j as f32 - t);
        let z0 = zin - (k as f32 - t);

        // Rank the offsets to pick one of the six tetrahedra in the cell.
        let ((i1, j1, k1), (i2, j2, k2)) = if x0 >= y0 {
            if y0 >= z0 {
                ((1, 0, 0), (1, 1, 0))
            } else if x0 >= z0 {
                ((1, 0, 0), (1, 0, 1))
            } else {
                ((0, 0, 1), (1, 0, 1))
            }
        } else if y0 < z0 {
            ((0, 0, 1), (0, 1, 1))
        } else if x0 < z0 {
            ((0, 1, 0), (0, 1, 1))
        } else {
            ((0, 1, 0), (1, 1, 0))
        };

        let x1 = x0 - i1 as f32 + G3;
        let y1 = y0 - j1 as f32 + G3;
        let z1 = z0 - k1 as f32 + G3;
        let x2 = x0 - i2 as f32 + 2.0 * G3;
        let y2 = y0 - j2 as f32 + 2.0 * G3;
        let z2 = z0 - k2 as f32 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;
        let g0 = self.grad(ii + self.perm(jj + self.perm(kk)));
        let g1 = self.grad(ii + i1 + self.perm(jj + j1 + self.perm(kk + k1)));
        let g2 = self.grad(ii + i2 + self.perm(jj + j2 + self.perm(kk + k2)));
        let g3 = self.grad(ii + 1 + self.perm(jj + 1 + self.perm(kk + 1)));

        let corner = |g: &[f32; 3], x: f32, y: f32, z: f32| {
            let t = 0.6 - x * x - y * y - z * z;
            if t < 0.0 {
                0.0
            } else {
                let t2 = t * t;
                t2 * t2 * (g[0] * x + g[1] * y + g[2] * z)
            }
        };

        32.0 * (corner(g0, x0, y0, z0)
            + corner(g1, x1, y1, z1)
            + corner(g2, x2, y2, z2)
            + corner(g3, x3, y3, z3))
    }
}

impl Default for SimplexNoise {
    /// A generator seeded from the operating system's entropy source.
    fn default() -> Self {
        Self::new(&mut StdRng::from_os_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_same_values() {
        let a = SimplexNoise::from_seed(7);
        let b = SimplexNoise::from_seed(7);

        for i in 0..200 {
            let x = i as f32 * 0.37;
            let y = i as f32 * -1.13;
            let z = i as f32 * 0.05;
            assert_eq!(a.noise3(x, y, z), b.noise3(x, y, z));
            assert_eq!(a.noise2(x, y), b.noise2(x, y));
        }
    }

    #[test]
    fn values_stay_in_unit_range() {
        let noise = SimplexNoise::from_seed(42);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..50_000 {
            let x = rng.random_range(-500.0..500.0);
            let y = rng.random_range(-500.0..500.0);
            let z = rng.random_range(-50.0..50.0);

            let n3 = noise.noise3(x, y, z);
            let n2 = noise.noise2(x, y);
            assert!((-1.0..=1.0).contains(&n3), "noise3({x}, {y}, {z}) = {n3}");
            assert!((-1.0..=1.0).contains(&n2), "noise2({x}, {y}) = {n2}");
        }
    }

    #[test]
    fn different_seeds_draw_different_tables() {
        let tables: Vec<Vec<u8>> = (0..32)
            .map(|seed| SimplexNoise::from_seed(seed).table().to_vec())
            .collect();

        for a in 0..tables.len() {
            for b in (a + 1)..tables.len() {
                assert_ne!(tables[a], tables[b], "seeds {a} and {b} collided");
            }
        }
    }

    #[test]
    fn noise_is_continuous() {
        let noise = SimplexNoise::from_seed(3);
        let eps = 1e-3;

        for i in 0..500 {
            let x = i as f32 * 0.123;
            let y = i as f32 * 0.071;
            let z = 0.5;
            let d = (noise.noise3(x, y, z) - noise.noise3(x + eps, y, z)).abs();
            assert!(d < 0.05, "jump of {d} at ({x}, {y})");
        }
    }

    #[test]
    fn lattice_origin_is_zero() {
        // Every corner contribution vanishes at integer lattice points.
        let noise = SimplexNoise::from_seed(11);
        assert_eq!(noise.noise3(0.0, 0.0, 0.0), 0.0);
        assert_eq!(noise.noise2(0.0, 0.0), 0.0);
    }
}
