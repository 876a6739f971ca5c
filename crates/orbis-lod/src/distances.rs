//! Per-depth split distances.

use crate::LodError;

/// Split thresholds indexed by detail level.
///
/// A node at depth `d` splits when the viewer is within `distances[d]` of
/// one of its potential children. Depths past the end of the table never
/// split.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailDistances {
    distances: Vec<f64>,
}

impl DetailDistances {
    /// Validate a threshold table. Infinity is allowed and forces a split.
    ///
    /// # Errors
    ///
    /// Fails on an empty table or on any NaN or negative threshold.
    pub fn new(distances: Vec<f64>) -> Result<Self, LodError> {
        if distances.is_empty() {
            return Err(LodError::EmptyDistances);
        }
        if let Some((index, &value)) = distances
            .iter()
            .enumerate()
            .find(|&(_, &d)| d.is_nan() || d < 0.0)
        {
            return Err(LodError::InvalidDistance { index, value });
        }
        Ok(Self { distances })
    }

    /// `{∞, 210, 100, 40}`: faces always split once, then refine toward
    /// the viewer.
    #[must_use]
    pub fn default_planet() -> Self {
        Self {
            distances: vec![f64::INFINITY, 210.0, 100.0, 40.0],
        }
    }

    /// Number of depths with a threshold.
    #[must_use]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Always `false`; construction rejects empty tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Threshold for `depth`, if any.
    #[must_use]
    pub fn threshold(&self, depth: u8) -> Option<f64> {
        self.distances.get(usize::from(depth)).copied()
    }

    /// `true` if a node at `depth` whose nearest potential child is
    /// `distance` away should be split. Ties split.
    #[must_use]
    pub fn should_split(&self, depth: u8, distance: f64) -> bool {
        self.threshold(depth).is_some_and(|t| distance <= t)
    }

    /// The raw table.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.distances
    }
}

impl Default for DetailDistances {
    fn default() -> Self {
        Self::default_planet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_table() {
        assert_eq!(DetailDistances::new(vec![]), Err(LodError::EmptyDistances));
    }

    #[test]
    fn test_rejects_nan_and_negative() {
        assert!(matches!(
            DetailDistances::new(vec![10.0, f64::NAN]),
            Err(LodError::InvalidDistance { index: 1, .. })
        ));
        assert_eq!(
            DetailDistances::new(vec![10.0, 5.0, -1.0]),
            Err(LodError::InvalidDistance {
                index: 2,
                value: -1.0
            })
        );
    }

    #[test]
    fn test_threshold_ties_split() {
        let d = DetailDistances::new(vec![100.0, 50.0]).unwrap();
        assert!(d.should_split(0, 100.0));
        assert!(!d.should_split(0, 100.000_001));
        assert!(d.should_split(1, 0.0));
        assert!(!d.should_split(2, 0.0), "depths past the table never split");
    }

    #[test]
    fn test_infinite_threshold_always_splits() {
        let d = DetailDistances::default_planet();
        assert!(d.should_split(0, f64::MAX));
        assert!(d.should_split(0, f64::INFINITY));
        assert_eq!(d.len(), 4);
        assert_eq!(d.threshold(3), Some(40.0));
    }
}
