//! Procedural tracks for headless runs.

use rally_core::{Footprint, Result, TrackConfig, Vec2};
use rally_world::{Track, TrackBuilder};

/// Elliptical circuit centered on the bitmap with a corridor wide enough
/// for a car, plus a frame around the edge.
pub struct OvalCircuit {
    pub center: Vec2,
    pub outer: (f64, f64),
    pub inner: (f64, f64),
}

impl OvalCircuit {
    pub fn for_config(config: &TrackConfig) -> Self {
        let w = config.width as f64;
        let h = config.height as f64;
        Self {
            center: Vec2::new(w / 2.0, h / 2.0),
            outer: (w * 0.47, h * 0.44),
            inner: (w * 0.33, h * 0.24),
        }
    }

    pub fn build(&self, config: &TrackConfig) -> Result<Track> {
        TrackBuilder::new(config)
            .ring(self.center, self.outer, self.inner)
            .border(2)
            .build()
    }

    /// Top-left footprint position that puts the car center on the middle
    /// of the bottom straight, facing right.
    pub fn spawn(&self, footprint: &Footprint) -> Vec2 {
        let mid_line = self.center.y + (self.outer.1 + self.inner.1) / 2.0;
        Vec2::new(
            self.center.x - footprint.half_width(),
            mid_line - footprint.half_height(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rally_core::Pixel;

    #[test]
    fn test_spawn_is_inside_corridor() {
        let config = TrackConfig::default();
        let oval = OvalCircuit::for_config(&config);
        let track = oval.build(&config).unwrap();
        let footprint = Footprint::new(55.0, 55.0);
        let spawn = oval.spawn(&footprint);

        let center = spawn.add(footprint.half_width(), footprint.half_height());
        assert!(!track.is_boundary_at(center));
        for offset in [30.0, 150.0, 210.0, 330.0] {
            assert!(!track.is_boundary_at(center.project(offset, footprint.half_width())));
        }
        // spawn must survive the per-axis clamp
        assert!(spawn.y <= config.height as f64 - 120.0);
    }

    #[test]
    fn test_oval_has_walls_inside_and_out() {
        let config = TrackConfig::default();
        let track = OvalCircuit::for_config(&config).build(&config).unwrap();
        assert!(track.is_boundary(Pixel::new(640, 360)));
        assert!(track.is_boundary(Pixel::new(1, 1)));
    }
}
