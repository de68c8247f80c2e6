//! Trend-based detection of cars that stopped making progress.

use rally_core::{StuckConfig, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Sliding window of recent positions plus a count of consecutive idle evaluations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StuckDetector {
    window: usize,
    min_mean_displacement: f64,
    max_stuck_frames: u32,
    history: VecDeque<Vec2>,
    stuck_frames: u32,
}

impl StuckDetector {
    pub fn new(config: &StuckConfig) -> Self {
        Self {
            window: config.window,
            min_mean_displacement: config.min_mean_displacement,
            max_stuck_frames: config.max_stuck_frames,
            history: VecDeque::with_capacity(config.window),
            stuck_frames: 0,
        }
    }

    /// Feed the current position and report whether the car is stuck.
    ///
    /// Until the window is full the position is recorded and the answer is
    /// always no. Once full, every call evaluates the held window, then
    /// slides it forward by one sample.
    pub fn observe(&mut self, position: Vec2) -> bool {
        if self.history.len() < self.window {
            self.history.push_back(position);
            return false;
        }

        let mean = self.mean_displacement();
        self.history.pop_front();
        self.history.push_back(position);

        if mean < self.min_mean_displacement {
            self.stuck_frames += 1;
        } else {
            self.stuck_frames = 0;
        }

        self.is_stuck()
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck_frames > self.max_stuck_frames
    }

    pub fn stuck_frames(&self) -> u32 {
        self.stuck_frames
    }

    pub fn history(&self) -> impl Iterator<Item = &Vec2> + '_ {
        self.history.iter()
    }

    /// Sum of consecutive step lengths divided by the sample count
    fn mean_displacement(&self) -> f64 {
        let total: f64 = self
            .history
            .iter()
            .zip(self.history.iter().skip(1))
            .map(|(a, b)| a.distance(b))
            .sum();
        total / self.history.len() as f64
    }
}
