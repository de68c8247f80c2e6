//! Distance sensors cast by ray marching against the track.

use crate::track::Track;
use rally_core::{Pixel, SensorConfig, Vec2};
use serde::{Deserialize, Serialize};

/// One ray result: where it stopped and how far that is from the car center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub hit_point: Vec2,
    pub distance: f64,
}

/// Fixed set of rays at angles relative to the car heading
#[derive(Debug, Clone)]
pub struct SensorArray {
    angles: Vec<f64>,
    max_range: f64,
}

impl SensorArray {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            angles: config.angles.clone(),
            max_range: config.max_range,
        }
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// Cast every ray from `center`, one reading per angle in angle order
    pub fn scan(&self, track: &Track, center: Vec2, heading_degrees: f64) -> Vec<SensorReading> {
        self.angles
            .iter()
            .map(|&offset| self.cast(track, center, heading_degrees + offset))
            .collect()
    }

    /// March one ray in unit steps until it leaves the track, hits a
    /// boundary pixel or reaches the maximum range.
    ///
    /// Rays that run off the map report the center with the maximum range.
    pub fn cast(&self, track: &Track, center: Vec2, direction_degrees: f64) -> SensorReading {
        let probe = |length: f64| -> Pixel { center.project(direction_degrees, length).to_pixel() };

        let mut length = 0.0;
        let mut point = probe(length);
        while track.contains(point) && !track.is_boundary(point) && length < self.max_range {
            length += 1.0;
            point = probe(length);
        }

        if track.contains(point) {
            let hit_point = point.to_vec2();
            SensorReading {
                hit_point,
                distance: center.distance(&hit_point).trunc().min(self.max_range),
            }
        } else {
            SensorReading {
                hit_point: center,
                distance: self.max_range,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackBuilder;
    use rally_core::TrackConfig;

    fn config(width: i32, height: i32) -> TrackConfig {
        TrackConfig {
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn test_open_track_reports_max_range() {
        let track = Track::open(&config(1000, 1000)).unwrap();
        let sensors = SensorArray::new(&SensorConfig::default());
        let readings = sensors.scan(&track, Vec2::new(500.5, 500.5), 0.0);

        assert_eq!(readings.len(), 7);
        for reading in &readings {
            // diagonal probes lose up to a pixel to truncation
            assert!(reading.distance >= 298.0 && reading.distance <= 300.0);
        }
        // forward ray stops 300 steps to the right, on pixel (800, 500);
        // sqrt(299.5^2 + 0.5^2) truncates to 299
        assert_eq!(readings[3].hit_point, Vec2::new(800.0, 500.0));
        assert_eq!(readings[3].distance, 299.0);
    }

    #[test]
    fn test_ray_stops_on_boundary() {
        let track = TrackBuilder::new(&config(200, 200))
            .rect(Pixel::new(150, 0), Pixel::new(160, 200))
            .build()
            .unwrap();
        let sensors = SensorArray::new(&SensorConfig::default());

        let reading = sensors.cast(&track, Vec2::new(100.0, 100.0), 0.0);
        assert_eq!(reading.hit_point.x, 150.0);
        assert_eq!(reading.distance, 50.0);
    }

    #[test]
    fn test_ray_off_map_reports_sentinel() {
        let track = Track::open(&config(120, 120)).unwrap();
        let sensors = SensorArray::new(&SensorConfig::default());
        let center = Vec2::new(60.0, 60.0);

        // heading 180 points left; the map edge is 60 steps away
        let reading = sensors.cast(&track, center, 180.0);
        assert_eq!(reading.hit_point, center);
        assert_eq!(reading.distance, 300.0);
    }

    #[test]
    fn test_center_on_boundary_reads_zero() {
        let track = TrackBuilder::new(&config(50, 50))
            .wall(Pixel::new(20, 20))
            .build()
            .unwrap();
        let sensors = SensorArray::new(&SensorConfig::default());
        let reading = sensors.cast(&track, Vec2::new(20.4, 20.4), 45.0);
        assert_eq!(reading.distance, 0.0);
    }

    #[test]
    fn test_distance_is_truncated() {
        let track = TrackBuilder::new(&config(200, 200))
            .rect(Pixel::new(150, 0), Pixel::new(160, 200))
            .build()
            .unwrap();
        let sensors = SensorArray::new(&SensorConfig::default());

        let reading = sensors.cast(&track, Vec2::new(99.5, 100.5), 0.0);
        // hit at (150, 100): sqrt(50.5^2 + 0.5^2) = 50.50..
        assert_eq!(reading.distance, 50.0);
    }
}
