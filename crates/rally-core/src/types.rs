//! Core type definitions for the simulation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a car within an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub usize);

impl AgentId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "car-{}", self.0)
    }
}

/// Integer pixel coordinate on the track bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

impl Pixel {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x as f64, self.y as f64)
    }
}

/// 8-bit RGB color of a track pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Continuous 2D point in screen space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Drop the fractional part of both axes (truncation toward zero)
    pub fn trunc(&self) -> Self {
        Self {
            x: self.x.trunc(),
            y: self.y.trunc(),
        }
    }

    /// Pixel under this point, truncating toward zero
    pub fn to_pixel(&self) -> Pixel {
        Pixel::new(self.x as i32, self.y as i32)
    }

    /// Point at `length` from `self` along a screen heading.
    ///
    /// Headings grow counterclockwise on screen (math angle `360 - heading` with y down).
    pub fn project(&self, heading_degrees: f64, length: f64) -> Self {
        let (dx, dy) = heading_unit(heading_degrees);
        Self {
            x: self.x + dx * length,
            y: self.y + dy * length,
        }
    }
}

/// Unit displacement for a screen heading
pub fn heading_unit(heading_degrees: f64) -> (f64, f64) {
    let radians = (360.0 - heading_degrees).to_radians();
    (radians.cos(), radians.sin())
}

/// Position, heading and forward speed of a car
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    /// Degrees, increasing counterclockwise on screen
    pub heading_degrees: f64,
    /// Distance units per tick
    pub speed: f64,
}

impl Pose {
    pub fn new(position: Vec2, heading_degrees: f64, speed: f64) -> Self {
        Self {
            position,
            heading_degrees,
            speed,
        }
    }
}

/// Rectangular extent of a car
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: f64,
    pub height: f64,
}

impl Footprint {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }
}

/// Discrete driving decision, indexed in policy output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    TurnLeft,
    TurnRight,
    Brake,
    Accelerate,
}

impl Action {
    pub const COUNT: usize = 4;

    pub fn all() -> [Action; Self::COUNT] {
        [
            Action::TurnLeft,
            Action::TurnRight,
            Action::Brake,
            Action::Accelerate,
        ]
    }

    pub fn from_index(index: usize) -> Result<Self> {
        Self::all()
            .get(index)
            .copied()
            .ok_or(Error::InvalidAction(index))
    }

    pub fn index(&self) -> usize {
        match self {
            Action::TurnLeft => 0,
            Action::TurnRight => 1,
            Action::Brake => 2,
            Action::Accelerate => 3,
        }
    }
}

/// Why a car left the race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Collision,
    Stuck,
}
