//! Fixed-capacity biome table and weight classification.

use rand::Rng;

use super::{BiomeAssignmentSettings, BiomeEntry, BiomeRange};

/// Number of regular biome slots.
pub const MAX_BIOMES: usize = 12;

/// Errors raised while building a [`BiomeTable`] from authored content.
#[derive(Debug, thiserror::Error)]
pub enum BiomeTableError {
    /// More regular biomes than there are slots.
    #[error("{0} biomes configured, at most {MAX_BIOMES} are supported")]
    TooManyBiomes(usize),

    /// A range whose minimum is not strictly below its maximum.
    #[error("biome '{biome}' has an empty or inverted {axis} range [{min}, {max}]")]
    InvertedRange {
        /// Biome name.
        biome: String,
        /// `"temperate"` or `"fertility"`.
        axis: &'static str,
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },

    /// A noise layer with no octaves.
    #[error("biome '{biome}' layer {layer} has zero octaves")]
    ZeroOctaves {
        /// Biome name.
        biome: String,
        /// Layer name.
        layer: &'static str,
    },

    /// A bounded setting outside its bounds.
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Setting name.
        field: &'static str,
        /// Configured value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

/// Unnormalized per-slot blend weights.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BiomeWeights(pub [f64; MAX_BIOMES]);

impl BiomeWeights {
    /// Sum over all slots.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// `(slot, weight)` for every slot with positive weight.
    pub fn active(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.0.iter().copied().enumerate().filter(|&(_, w)| w > 0.0)
    }
}

/// Up to [`MAX_BIOMES`] regular biomes, the ocean biome, and the assignment
/// settings. Unused slots hold [`BiomeEntry::padding`].
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeTable {
    slots: Vec<BiomeEntry>,
    active: usize,
    ocean: BiomeEntry,
    assignment: BiomeAssignmentSettings,
}

impl BiomeTable {
    /// Validate and pack the table.
    ///
    /// # Errors
    ///
    /// Fails on more than [`MAX_BIOMES`] regular biomes, on any empty or
    /// inverted range, on a zero-octave layer, or on out-of-range assignment
    /// settings.
    pub fn new(
        regular: Vec<BiomeEntry>,
        ocean: BiomeEntry,
        assignment: BiomeAssignmentSettings,
    ) -> Result<Self, BiomeTableError> {
        if regular.len() > MAX_BIOMES {
            return Err(BiomeTableError::TooManyBiomes(regular.len()));
        }
        for entry in &regular {
            check_range(entry, "temperate", entry.temperate)?;
            check_range(entry, "fertility", entry.fertility)?;
        }
        for entry in regular.iter().chain(std::iter::once(&ocean)) {
            check_octaves(entry)?;
        }
        assignment.validate()?;

        let active = regular.len();
        let mut slots = regular;
        slots.resize_with(MAX_BIOMES, BiomeEntry::padding);
        Ok(Self {
            slots,
            active,
            ocean,
            assignment,
        })
    }

    /// Weight of every slot at the given channel values.
    ///
    /// A slot is weighted only if both values fall inside its closed ranges;
    /// the weight is the clamped length of the two quartic bumps.
    #[must_use]
    pub fn classify(&self, temperate: f64, fertility: f64) -> BiomeWeights {
        let mut weights = [0.0; MAX_BIOMES];
        for (weight, entry) in weights.iter_mut().zip(&self.slots) {
            if entry.temperate.contains(temperate) && entry.fertility.contains(fertility) {
                let t = entry.temperate.dim(temperate);
                let f = entry.fertility.dim(fertility);
                *weight = t.hypot(f).clamp(0.0, 1.0);
            }
        }
        BiomeWeights(weights)
    }

    /// The configured regular biomes, without padding.
    #[must_use]
    pub fn regular(&self) -> &[BiomeEntry] {
        &self.slots[..self.active]
    }

    /// All [`MAX_BIOMES`] slots, padding included.
    #[must_use]
    pub fn slots(&self) -> &[BiomeEntry] {
        &self.slots
    }

    /// The ocean biome.
    #[must_use]
    pub fn ocean(&self) -> &BiomeEntry {
        &self.ocean
    }

    /// Assignment settings.
    #[must_use]
    pub fn assignment(&self) -> &BiomeAssignmentSettings {
        &self.assignment
    }

    /// Redraw every biome's displacement layers, ocean included.
    pub fn randomize_displacement<R: Rng>(&mut self, rng: &mut R) {
        for entry in &mut self.slots[..self.active] {
            entry.randomize_displacement(rng);
        }
        self.ocean.randomize_displacement(rng);
    }

    /// Redraw the temperate and fertility channels.
    pub fn randomize_assignment<R: Rng>(&mut self, rng: &mut R) {
        self.assignment.randomize(rng);
    }
}

fn check_range(
    entry: &BiomeEntry,
    axis: &'static str,
    range: BiomeRange,
) -> Result<(), BiomeTableError> {
    // `!(a < b)` also rejects NaN bounds.
    if !(range.min < range.max) {
        return Err(BiomeTableError::InvertedRange {
            biome: entry.name.clone(),
            axis,
            min: range.min,
            max: range.max,
        });
    }
    Ok(())
}

fn check_octaves(entry: &BiomeEntry) -> Result<(), BiomeTableError> {
    let layers = [
        ("terrain_height", &entry.terrain_height),
        ("terrain_detail", &entry.terrain_detail),
        ("mountain_height", &entry.mountain_height),
        ("mountain_detail", &entry.mountain_detail),
    ];
    for (layer, settings) in layers {
        if settings.octaves == 0 {
            return Err(BiomeTableError::ZeroOctaves {
                biome: entry.name.clone(),
                layer,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn biome(name: &str, t: (f64, f64), f: (f64, f64)) -> BiomeEntry {
        BiomeEntry {
            name: name.to_string(),
            temperate: BiomeRange::new(t.0, t.1),
            fertility: BiomeRange::new(f.0, f.1),
            ..Default::default()
        }
    }

    fn table(regular: Vec<BiomeEntry>) -> BiomeTable {
        BiomeTable::new(regular, BiomeEntry::default(), Default::default()).unwrap()
    }

    #[test]
    fn test_full_weight_at_midpoint() {
        let t = table(vec![biome("plains", (0.0, 1.0), (0.0, 1.0))]);
        let w = t.classify(0.5, 0.5);
        assert_eq!(w.0[0], 1.0, "midpoint weight must be 1");
        assert!(w.0[1..].iter().all(|&x| x == 0.0), "padding slots stay empty");
    }

    #[test]
    fn test_outside_range_has_no_weight() {
        let t = table(vec![biome("desert", (0.6, 0.9), (0.0, 0.3))]);
        assert_eq!(t.classify(0.5, 0.1).0[0], 0.0);
        assert_eq!(t.classify(0.7, 0.31).0[0], 0.0);
    }

    #[test]
    fn test_edge_of_one_axis_keeps_other_axis_weight() {
        let t = table(vec![biome("forest", (0.0, 1.0), (0.0, 1.0))]);
        let w = t.classify(0.0, 0.5).0[0];
        assert!((w - 1.0).abs() < 1e-12, "length of (0, 1) is 1, got {w}");
        let corner = t.classify(0.0, 0.0).0[0];
        assert!(corner.abs() < 1e-12, "both axes at an edge gives 0, got {corner}");
    }

    #[test]
    fn test_overlapping_biomes_both_weighted() {
        let t = table(vec![
            biome("a", (0.0, 0.6), (0.0, 1.0)),
            biome("b", (0.4, 1.0), (0.0, 1.0)),
        ]);
        let w = t.classify(0.5, 0.5);
        assert!(w.0[0] > 0.0 && w.0[1] > 0.0, "overlap must weight both: {w:?}");
        assert!(w.total() > 1.0, "weights are not normalized");
        assert_eq!(w.active().count(), 2);
    }

    #[test]
    fn test_rejects_thirteen_biomes() {
        let many = (0..13).map(|i| biome(&format!("b{i}"), (0.0, 1.0), (0.0, 1.0))).collect();
        let err = BiomeTable::new(many, BiomeEntry::default(), Default::default()).unwrap_err();
        assert!(matches!(err, BiomeTableError::TooManyBiomes(13)));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = BiomeTable::new(
            vec![biome("upside_down", (0.8, 0.2), (0.0, 1.0))],
            BiomeEntry::default(),
            Default::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("upside_down"), "message: {err}");
    }

    #[test]
    fn test_rejects_zero_octave_ocean() {
        let mut ocean = BiomeEntry::default();
        ocean.terrain_detail.octaves = 0;
        let err = BiomeTable::new(Vec::new(), ocean, Default::default()).unwrap_err();
        assert!(matches!(err, BiomeTableError::ZeroOctaves { layer: "terrain_detail", .. }));
    }

    #[test]
    fn test_padding_fills_to_capacity() {
        let t = table(vec![biome("only", (0.0, 1.0), (0.0, 1.0))]);
        assert_eq!(t.slots().len(), MAX_BIOMES);
        assert_eq!(t.regular().len(), 1);
        assert_eq!(t.slots()[5], BiomeEntry::padding());
    }

    #[test]
    fn test_randomize_displacement_leaves_padding() {
        let mut t = table(vec![biome("only", (0.0, 1.0), (0.0, 1.0))]);
        let before = t.clone();
        t.randomize_displacement(&mut ChaCha8Rng::seed_from_u64(1));
        assert_ne!(t.regular()[0].terrain_height, before.regular()[0].terrain_height);
        assert_ne!(t.ocean().terrain_height, before.ocean().terrain_height);
        assert_eq!(t.slots()[1], BiomeEntry::padding());
    }
}
