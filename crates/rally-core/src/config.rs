//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::{Footprint, Rgb, Vec2};
use serde::{Deserialize, Serialize};

/// Track bitmap parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Width of the track bitmap in pixels
    pub width: i32,
    /// Height of the track bitmap in pixels
    pub height: i32,
    /// Pixel color that marks impassable terrain
    pub boundary_color: Rgb,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            boundary_color: Rgb(100, 125, 49),
        }
    }
}

/// How the car position is kept inside the playable region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClampMode {
    /// x is bounded by the track width, y by the track height
    PerAxis,
    /// Both axes are bounded by the track width (legacy behavior)
    LegacyWidthBound,
}

/// Car kinematics parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarConfig {
    pub footprint: Footprint,
    /// Top-left corner of the footprint at spawn
    pub spawn_position: Vec2,
    pub spawn_heading: f64,
    /// Speed latched in on the first update
    pub default_speed: f64,
    /// Degrees per turn action
    pub turn_step: f64,
    /// Speed change per brake/accelerate action
    pub speed_step: f64,
    /// Braking never takes the speed below this
    pub min_brake_speed: f64,
    /// Distance kept from the top/left edges
    pub margin_min: f64,
    /// Distance kept from the bottom/right edges
    pub margin_max: f64,
    pub clamp_mode: ClampMode,
    /// Keep at most this many path points (None keeps all)
    pub path_history_cap: Option<usize>,
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            footprint: Footprint::new(55.0, 55.0),
            spawn_position: Vec2::new(654.0, 660.0),
            spawn_heading: 0.0,
            default_speed: 20.0,
            turn_step: 10.0,
            speed_step: 2.0,
            min_brake_speed: 12.0,
            margin_min: 20.0,
            margin_max: 120.0,
            clamp_mode: ClampMode::PerAxis,
            path_history_cap: None,
        }
    }
}

/// Distance sensor parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Ray angles relative to the heading, in degrees
    pub angles: Vec<f64>,
    /// Rays stop after this many unit steps
    pub max_range: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            angles: vec![-135.0, -90.0, -45.0, 0.0, 45.0, 90.0, 135.0],
            max_range: 300.0,
        }
    }
}

/// Stuck detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StuckConfig {
    /// Number of recent positions compared
    pub window: usize,
    /// Mean displacement below which a sample counts as idle
    pub min_mean_displacement: f64,
    /// Consecutive idle evaluations tolerated before the car is stuck
    pub max_stuck_frames: u32,
    /// Score removed when a car is retired as stuck
    pub penalty: f64,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            window: 5,
            min_mean_displacement: 2.0,
            max_stuck_frames: 60,
            penalty: 10.0,
        }
    }
}

/// Reward shaping parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Sensor distance below which a reading is penalized
    pub proximity_threshold: f64,
    /// Penalty per close reading
    pub proximity_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 20.0,
            proximity_penalty: 5.0,
        }
    }
}

/// Observation vector scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationConfig {
    /// Sensor distances are divided by this and floored
    pub distance_scale: f64,
    /// Speed is divided by this
    pub speed_scale: f64,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            distance_scale: 30.0,
            speed_scale: 100.0,
        }
    }
}

/// Everything one episode needs besides the track and the policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Tick budget (20 seconds at 60 ticks per second)
    pub max_ticks: u64,
    pub car: CarConfig,
    pub sensor: SensorConfig,
    pub stuck: StuckConfig,
    pub reward: RewardConfig,
    pub observation: ObservationConfig,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_ticks: 60 * 20,
            car: CarConfig::default(),
            sensor: SensorConfig::default(),
            stuck: StuckConfig::default(),
            reward: RewardConfig::default(),
            observation: ObservationConfig::default(),
        }
    }
}

impl EpisodeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_ticks == 0 {
            return Err(Error::InvalidConfig("max_ticks must be positive".to_string()));
        }
        if self.car.footprint.width <= 0.0 || self.car.footprint.height <= 0.0 {
            return Err(Error::InvalidConfig(
                "footprint dimensions must be positive".to_string(),
            ));
        }
        if self.car.default_speed <= 0.0 {
            return Err(Error::InvalidConfig("default_speed must be positive".to_string()));
        }
        if self.sensor.angles.is_empty() {
            return Err(Error::InvalidConfig("at least one sensor angle is required".to_string()));
        }
        if self.sensor.max_range <= 0.0 {
            return Err(Error::InvalidConfig("sensor max_range must be positive".to_string()));
        }
        if self.stuck.window < 2 {
            return Err(Error::InvalidConfig("stuck window needs at least two samples".to_string()));
        }
        if self.observation.distance_scale <= 0.0 || self.observation.speed_scale <= 0.0 {
            return Err(Error::InvalidConfig("observation scales must be positive".to_string()));
        }
        Ok(())
    }
}

/// Built-in driver used by the headless runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Steer toward open space with per-car noise
    Heuristic,
    /// Uniformly random actions
    Random,
}

/// Headless runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Number of cars per episode
    pub population: usize,
    pub policy: PolicyKind,
    /// Amplitude of the noise added to heuristic outputs
    pub policy_noise: f64,
    /// Number of episodes to run back to back
    pub episodes: u32,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    pub track: TrackConfig,
    pub episode: EpisodeConfig,
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(Error::InvalidConfig("population must be positive".to_string()));
        }
        if self.track.width <= 0 || self.track.height <= 0 {
            return Err(Error::InvalidConfig("track dimensions must be positive".to_string()));
        }
        if !self.policy_noise.is_finite() || self.policy_noise < 0.0 {
            return Err(Error::InvalidConfig("policy noise must be non-negative".to_string()));
        }
        self.episode.validate()
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            population: 30,
            policy: PolicyKind::Heuristic,
            policy_noise: 0.3,
            episodes: 1,
            seed: 0,
            json_logs: false,
            track: TrackConfig::default(),
            episode: EpisodeConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let track = TrackConfig::default();
        assert_eq!(track.width, 1280);
        assert_eq!(track.height, 720);
        assert_eq!(track.boundary_color, Rgb(100, 125, 49));

        let episode = EpisodeConfig::default();
        assert_eq!(episode.max_ticks, 1200);
        assert_eq!(episode.sensor.angles.len(), 7);
        assert_eq!(episode.stuck.max_stuck_frames, 60);
        assert_eq!(episode.car.clamp_mode, ClampMode::PerAxis);
        assert!(episode.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_tick_budget() {
        let config = EpisodeConfig {
            max_ticks: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_runner_config_validation() {
        assert!(RunnerConfig::default().validate().is_ok());

        let config = RunnerConfig {
            population: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_sensor_set() {
        let mut config = EpisodeConfig::default();
        config.sensor.angles.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_episode_config_serialization() {
        let config = EpisodeConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: EpisodeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.max_ticks, deserialized.max_ticks);
        assert_eq!(config.sensor.angles, deserialized.sensor.angles);
        assert_eq!(config.car.clamp_mode, deserialized.car.clamp_mode);
    }

    #[test]
    fn test_partial_runner_config_uses_defaults() {
        let config: RunnerConfig =
            serde_json::from_str(r#"{"population": 4, "episode": {"max_ticks": 50}}"#).unwrap();
        assert_eq!(config.population, 4);
        assert_eq!(config.episode.max_ticks, 50);
        assert_eq!(config.policy, PolicyKind::Heuristic);
        assert_eq!(config.episode.sensor.max_range, 300.0);
        assert!(config.validate().is_ok());
    }
}
