//! Improved Perlin gradient noise.

use noise::NoiseFn;

use super::PermutationTable;

/// 3D gradient noise over a borrowed [`PermutationTable`].
///
/// Output lies in roughly `[-1, 1]` and is exactly 0 on integer lattice points.
#[derive(Clone, Copy, Debug)]
pub struct GradientNoise<'a> {
    table: &'a PermutationTable,
}

impl<'a> GradientNoise<'a> {
    /// Sample through `table`.
    #[must_use]
    pub fn new(table: &'a PermutationTable) -> Self {
        Self { table }
    }
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product of the offset with one of the twelve cube-edge gradients
/// (sixteen slots, four repeated) picked by the low four hash bits.
#[inline]
fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

impl NoiseFn<f64, 3> for GradientNoise<'_> {
    fn get(&self, point: [f64; 3]) -> f64 {
        let p = self.table;
        let [x, y, z] = point;
        let (fx, fy, fz) = (x.floor(), y.floor(), z.floor());
        let xi = (fx as i64 & 0xff) as usize;
        let yi = (fy as i64 & 0xff) as usize;
        let zi = (fz as i64 & 0xff) as usize;
        let (x, y, z) = (x - fx, y - fy, z - fz);
        let (u, v, w) = (fade(x), fade(y), fade(z));

        let a = (p.get(xi) + yi) & 0xff;
        let aa = (p.get(a) + zi) & 0xff;
        let ab = (p.get(a + 1) + zi) & 0xff;
        let b = (p.get(xi + 1) + yi) & 0xff;
        let ba = (p.get(b) + zi) & 0xff;
        let bb = (p.get(b + 1) + zi) & 0xff;

        lerp(
            w,
            lerp(
                v,
                lerp(u, grad(p.get(aa), x, y, z), grad(p.get(ba), x - 1.0, y, z)),
                lerp(
                    u,
                    grad(p.get(ab), x, y - 1.0, z),
                    grad(p.get(bb), x - 1.0, y - 1.0, z),
                ),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(p.get(aa + 1), x, y, z - 1.0),
                    grad(p.get(ba + 1), x - 1.0, y, z - 1.0),
                ),
                lerp(
                    u,
                    grad(p.get(ab + 1), x, y - 1.0, z - 1.0),
                    grad(p.get(bb + 1), x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_on_lattice_points() {
        let table = PermutationTable::reference();
        let noise = GradientNoise::new(&table);
        for p in [[0.0, 0.0, 0.0], [3.0, -7.0, 12.0], [-255.0, 256.0, 1.0]] {
            assert!(noise.get(p).abs() < 1e-12, "noise at lattice point {p:?} must be 0");
        }
    }

    #[test]
    fn test_reference_values() {
        let table = PermutationTable::reference();
        let noise = GradientNoise::new(&table);
        let centre = noise.get([0.5, 0.5, 0.5]);
        assert!((centre - -0.25).abs() < 1e-12, "got {centre}");
        let off = noise.get([1.3, 2.7, -0.4]);
        assert!((off - -0.110_223_782_469_271_37).abs() < 1e-9, "got {off}");
    }

    #[test]
    fn test_bounded_and_varying() {
        let table = PermutationTable::reference();
        let noise = GradientNoise::new(&table);
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for i in 0..40 {
            for j in 0..40 {
                for k in 0..10 {
                    let v = noise.get([i as f64 * 0.173, j as f64 * 0.219 - 3.0, k as f64 * 0.31]);
                    min = min.min(v);
                    max = max.max(v);
                }
            }
        }
        assert!(min >= -1.0 && max <= 1.0, "range [{min}, {max}] escapes [-1, 1]");
        assert!(max - min > 0.5, "noise should vary across the sample grid");
    }

    #[test]
    fn test_continuous_across_cell_boundary() {
        let table = PermutationTable::reference();
        let noise = GradientNoise::new(&table);
        let eps = 1e-7;
        let below = noise.get([2.0 - eps, 0.3, 0.6]);
        let above = noise.get([2.0 + eps, 0.3, 0.6]);
        assert!((below - above).abs() < 1e-5, "jump at x = 2: {below} vs {above}");
    }
}
