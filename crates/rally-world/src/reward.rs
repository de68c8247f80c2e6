//! Per-tick reward shaping.

use crate::sensor::SensorReading;
use rally_core::{Footprint, RewardConfig};

/// Maps travelled distance and sensor proximity to a scalar reward
#[derive(Debug, Clone)]
pub struct RewardFunction {
    proximity_threshold: f64,
    proximity_penalty: f64,
}

impl RewardFunction {
    pub fn new(config: &RewardConfig) -> Self {
        Self {
            proximity_threshold: config.proximity_threshold,
            proximity_penalty: config.proximity_penalty,
        }
    }

    /// Distance in half car widths, minus a penalty for every sensor that
    /// reads closer than the proximity threshold. Unbounded below.
    pub fn evaluate(
        &self,
        distance_travelled: f64,
        footprint: &Footprint,
        readings: &[SensorReading],
    ) -> f64 {
        let close = readings
            .iter()
            .filter(|r| r.distance < self.proximity_threshold)
            .count();
        distance_travelled / footprint.half_width() - close as f64 * self.proximity_penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rally_core::Vec2;

    fn reading(distance: f64) -> SensorReading {
        SensorReading {
            hit_point: Vec2::default(),
            distance,
        }
    }

    #[test]
    fn test_distance_reward() {
        let reward = RewardFunction::new(&RewardConfig::default());
        let footprint = Footprint::new(55.0, 55.0);
        let value = reward.evaluate(55.0, &footprint, &[reading(300.0); 7]);
        assert!((value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_proximity_penalty() {
        let reward = RewardFunction::new(&RewardConfig::default());
        let footprint = Footprint::new(55.0, 55.0);
        let readings = [reading(19.0), reading(20.0), reading(0.0), reading(300.0)];
        // two readings are under 20
        let value = reward.evaluate(0.0, &footprint, &readings);
        assert_eq!(value, -10.0);
    }

    #[test]
    fn test_no_readings_no_penalty() {
        let reward = RewardFunction::new(&RewardConfig::default());
        let value = reward.evaluate(27.5, &Footprint::new(55.0, 10.0), &[]);
        assert!((value - 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_monotone_in_distance(
            a in 0f64..1e6,
            b in 0f64..1e6,
            distances in proptest::collection::vec(0f64..300.0, 7),
        ) {
            let reward = RewardFunction::new(&RewardConfig::default());
            let footprint = Footprint::new(55.0, 55.0);
            let readings: Vec<SensorReading> = distances.into_iter().map(reading).collect();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                reward.evaluate(lo, &footprint, &readings)
                    <= reward.evaluate(hi, &footprint, &readings)
            );
        }
    }
}
