//! F1 cellular (Worley) noise with one jittered feature point per lattice cell.

use noise::NoiseFn;

use super::PermutationTable;

/// 3D cellular noise over a borrowed [`PermutationTable`].
///
/// [`sample`](Self::sample) yields two channels: the distance to the nearest
/// feature point, and a `[0, 1]` value identifying the cell that point lives
/// in. As a [`NoiseFn`] it yields the distance channel.
#[derive(Clone, Copy, Debug)]
pub struct CellularNoise<'a> {
    table: &'a PermutationTable,
}

impl<'a> CellularNoise<'a> {
    /// Sample through `table`.
    #[must_use]
    pub fn new(table: &'a PermutationTable) -> Self {
        Self { table }
    }

    fn cell_hash(&self, x: i64, y: i64, z: i64) -> usize {
        let t = self.table;
        t.get(t.get(t.get((x & 0xff) as usize) + (y & 0xff) as usize) + (z & 0xff) as usize)
    }

    fn jitter(&self, hash: usize, axis: usize) -> f64 {
        self.table.get(hash + axis * 85) as f64 / 256.0
    }

    /// `(nearest feature distance, nearest cell value)`.
    #[must_use]
    pub fn sample(&self, point: [f64; 3]) -> (f64, f64) {
        let base = point.map(|c| c.floor() as i64);
        let mut best_sq = f64::INFINITY;
        let mut best_hash = 0usize;

        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let cell = [base[0] + dx, base[1] + dy, base[2] + dz];
                    let hash = self.cell_hash(cell[0], cell[1], cell[2]);
                    let mut dist_sq = 0.0;
                    for axis in 0..3 {
                        let feature = cell[axis] as f64 + self.jitter(hash, axis);
                        let d = feature - point[axis];
                        dist_sq += d * d;
                    }
                    if dist_sq < best_sq {
                        best_sq = dist_sq;
                        best_hash = hash;
                    }
                }
            }
        }

        (best_sq.sqrt(), best_hash as f64 / 255.0)
    }
}

impl NoiseFn<f64, 3> for CellularNoise<'_> {
    fn get(&self, point: [f64; 3]) -> f64 {
        self.sample(point).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_in_range() {
        let table = PermutationTable::reference();
        let noise = CellularNoise::new(&table);
        for i in 0..500 {
            let p = [i as f64 * 0.37, (i % 17) as f64 * 0.53, -(i as f64) * 0.11];
            let (dist, cell) = noise.sample(p);
            // Every point is within one cell diagonal of its own cell's feature.
            assert!((0.0..=3f64.sqrt()).contains(&dist), "distance {dist} at {p:?}");
            assert!((0.0..=1.0).contains(&cell), "cell value {cell} at {p:?}");
        }
    }

    #[test]
    fn test_cell_value_is_piecewise_constant() {
        let table = PermutationTable::reference();
        let noise = CellularNoise::new(&table);
        let (_, a) = noise.sample([4.2, 1.1, 7.9]);
        let (_, b) = noise.sample([4.2 + 1e-6, 1.1, 7.9]);
        assert_eq!(a, b, "tiny moves inside one region must keep the cell value");
    }

    #[test]
    fn test_noise_fn_returns_distance_channel() {
        let table = PermutationTable::reference();
        let noise = CellularNoise::new(&table);
        let p = [0.25, 9.5, -3.75];
        assert_eq!(noise.get(p), noise.sample(p).0);
    }

    #[test]
    fn test_distance_vanishes_at_feature_point() {
        let table = PermutationTable::reference();
        let noise = CellularNoise::new(&table);
        let hash = noise.cell_hash(2, 3, 4);
        let feature = [
            2.0 + noise.jitter(hash, 0),
            3.0 + noise.jitter(hash, 1),
            4.0 + noise.jitter(hash, 2),
        ];
        let (dist, _) = noise.sample(feature);
        assert!(dist < 1e-12, "distance at a feature point was {dist}");
    }
}
