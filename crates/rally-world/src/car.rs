//! Car state, kinematics and collision.

use crate::sensor::{SensorArray, SensorReading};
use crate::stuck::StuckDetector;
use crate::track::Track;
use rally_core::{
    heading_unit, Action, AgentId, CarConfig, ClampMode, DeathCause, Footprint, Pixel, Pose,
    StuckConfig, Vec2,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Corner directions relative to the heading, in degrees
const CORNER_OFFSETS: [f64; 4] = [30.0, 150.0, 210.0, 330.0];

/// A car on the track
#[derive(Debug, Clone)]
pub struct Car {
    pub id: AgentId,
    config: CarConfig,
    pose: Pose,
    speed_initialized: bool,
    center: Vec2,
    corners: [Vec2; 4],
    readings: Vec<SensorReading>,
    stuck: StuckDetector,
    distance: f64,
    time: u64,
    ticks_stuck: u64,
    alive: bool,
    death_cause: Option<DeathCause>,
    path: VecDeque<Pixel>,
}

impl Car {
    pub fn new(id: AgentId, config: &CarConfig, stuck_config: &StuckConfig) -> Self {
        let pose = Pose::new(config.spawn_position, config.spawn_heading, 0.0);
        let center = pose
            .position
            .add(config.footprint.half_width(), config.footprint.half_height());

        Self {
            id,
            config: config.clone(),
            pose,
            speed_initialized: false,
            center,
            corners: corners_around(center, pose.heading_degrees, &config.footprint),
            readings: Vec::new(),
            stuck: StuckDetector::new(stuck_config),
            distance: 0.0,
            time: 0,
            ticks_stuck: 0,
            alive: true,
            death_cause: None,
            path: VecDeque::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn death_cause(&self) -> Option<DeathCause> {
        self.death_cause
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn speed(&self) -> f64 {
        self.pose.speed
    }

    pub fn footprint(&self) -> &Footprint {
        &self.config.footprint
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn corners(&self) -> &[Vec2; 4] {
        &self.corners
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Number of updates driven. Dead cars never update, so this is also
    /// the number of ticks the car was alive.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn ticks_alive(&self) -> u64 {
        self.time
    }

    /// Number of stuck evaluations that found the car idle
    pub fn ticks_stuck(&self) -> u64 {
        self.ticks_stuck
    }

    pub fn stuck_frames(&self) -> u32 {
        self.stuck.stuck_frames()
    }

    pub fn path(&self) -> impl Iterator<Item = &Pixel> + '_ {
        self.path.iter()
    }

    /// Apply a driving decision. Dead cars ignore it.
    pub fn apply(&mut self, action: Action) {
        if !self.alive {
            return;
        }

        match action {
            Action::TurnLeft => self.pose.heading_degrees += self.config.turn_step,
            Action::TurnRight => self.pose.heading_degrees -= self.config.turn_step,
            Action::Brake => {
                if self.pose.speed - self.config.speed_step >= self.config.min_brake_speed {
                    self.pose.speed -= self.config.speed_step;
                }
            }
            Action::Accelerate => self.pose.speed += self.config.speed_step,
        }
    }

    /// Advance one tick: move, clamp, rebuild the footprint, check for a
    /// crash, refresh the sensors and record the path.
    pub fn update(&mut self, track: &Track, sensors: &SensorArray) {
        if !self.alive {
            return;
        }

        if !self.speed_initialized {
            self.pose.speed = self.config.default_speed;
            self.speed_initialized = true;
        }

        let (ux, uy) = heading_unit(self.pose.heading_degrees);
        let (x_max, y_max) = self.clamp_bounds(track);
        let moved = self.pose.position.add(ux * self.pose.speed, uy * self.pose.speed);
        self.pose.position = Vec2::new(
            clamp_axis(moved.x, self.config.margin_min, x_max),
            clamp_axis(moved.y, self.config.margin_min, y_max),
        );

        self.distance += self.pose.speed;
        self.time += 1;

        let footprint = self.config.footprint;
        self.center = self
            .pose
            .position
            .trunc()
            .add(footprint.half_width(), footprint.half_height());
        self.corners = corners_around(self.center, self.pose.heading_degrees, &footprint);

        if self.collides(track) {
            self.retire(DeathCause::Collision);
        }

        self.readings = sensors.scan(track, self.center, self.pose.heading_degrees);

        self.path.push_back(self.center.to_pixel());
        if let Some(cap) = self.config.path_history_cap {
            while self.path.len() > cap {
                self.path.pop_front();
            }
        }
    }

    /// Whether any footprint corner sits on a boundary pixel
    pub fn collides(&self, track: &Track) -> bool {
        self.corners.iter().any(|corner| track.is_boundary_at(*corner))
    }

    /// Feed the stuck detector with the current position
    pub fn check_stuck(&mut self) -> bool {
        let stuck = self.stuck.observe(self.pose.position);
        if self.stuck.stuck_frames() > 0 {
            self.ticks_stuck += 1;
        }
        stuck
    }

    /// Take the car out of the episode. The first cause sticks.
    pub fn retire(&mut self, cause: DeathCause) {
        if self.alive {
            self.alive = false;
            self.death_cause = Some(cause);
        }
    }

    fn clamp_bounds(&self, track: &Track) -> (f64, f64) {
        let (width, height) = track.dimensions();
        let x_max = width as f64 - self.config.margin_max;
        let y_max = match self.config.clamp_mode {
            ClampMode::PerAxis => height as f64 - self.config.margin_max,
            ClampMode::LegacyWidthBound => width as f64 - self.config.margin_max,
        };
        (x_max, y_max)
    }
}

/// Lower bound first, then upper bound; never panics on an inverted range
fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Footprint approximated as four points at half the car width from the
/// center, rotated with the heading.
fn corners_around(center: Vec2, heading_degrees: f64, footprint: &Footprint) -> [Vec2; 4] {
    CORNER_OFFSETS.map(|offset| center.project(heading_degrees + offset, footprint.half_width()))
}

/// Serializable view of a car for renderers and reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarSnapshot {
    pub id: AgentId,
    pub pose: Pose,
    pub center: Vec2,
    pub corners: [Vec2; 4],
    pub readings: Vec<SensorReading>,
    pub distance: f64,
    pub time: u64,
    pub alive: bool,
    pub death_cause: Option<DeathCause>,
}

impl From<&Car> for CarSnapshot {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id,
            pose: car.pose,
            center: car.center,
            corners: car.corners,
            readings: car.readings.clone(),
            distance: car.distance,
            time: car.time,
            alive: car.alive,
            death_cause: car.death_cause,
        }
    }
}
