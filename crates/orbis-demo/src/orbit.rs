//! The viewer path: a circular orbit tilted against the cube axes so it
//! crosses several faces and their shared edges.

use std::f64::consts::TAU;

use glam::DVec3;

/// A circle of fixed radius around the planet center.
#[derive(Clone, Copy, Debug)]
pub struct Orbit {
    radius: f64,
    period: u32,
    u: DVec3,
    v: DVec3,
}

impl Orbit {
    /// An orbit of `radius` completing one lap every `period` ticks.
    /// A zero period stays put.
    pub fn new(radius: f64, period: u32) -> Self {
        Self {
            radius,
            period,
            u: DVec3::X,
            v: DVec3::new(0.0, 0.6, 0.8),
        }
    }

    /// Viewer position at `tick`.
    pub fn position(&self, tick: u32) -> DVec3 {
        let angle = if self.period == 0 {
            0.0
        } else {
            TAU * f64::from(tick % self.period) / f64::from(self.period)
        };
        (self.u * angle.cos() + self.v * angle.sin()) * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_keeps_radius() {
        let orbit = Orbit::new(530.0, 37);
        for tick in 0..100 {
            let r = orbit.position(tick).length();
            assert!((r - 530.0).abs() < 1e-9, "tick {tick} at radius {r}");
        }
    }

    #[test]
    fn test_orbit_starts_on_x_and_wraps() {
        let orbit = Orbit::new(10.0, 8);
        assert!(orbit.position(0).abs_diff_eq(DVec3::new(10.0, 0.0, 0.0), 1e-12));
        assert!(orbit.position(4).abs_diff_eq(DVec3::new(-10.0, 0.0, 0.0), 1e-9));
        assert!(orbit.position(8).abs_diff_eq(orbit.position(0), 1e-12));
    }

    #[test]
    fn test_zero_period_is_stationary() {
        let orbit = Orbit::new(5.0, 0);
        assert_eq!(orbit.position(0), orbit.position(17));
    }
}
