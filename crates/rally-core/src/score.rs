//! Score bookkeeping and score statistics.

use crate::AgentId;
use serde::{Deserialize, Serialize};

/// Receives per-tick score deltas for each car.
///
/// The episode never owns scores; whoever drives it (an evolutionary loop,
/// a test, the runner) supplies the storage.
pub trait Scoreboard {
    fn credit(&mut self, agent: AgentId, delta: f64);

    fn score(&self, agent: AgentId) -> f64;
}

impl Scoreboard for Vec<f64> {
    fn credit(&mut self, agent: AgentId, delta: f64) {
        if agent.index() >= self.len() {
            self.resize(agent.index() + 1, 0.0);
        }
        self[agent.index()] += delta;
    }

    fn score(&self, agent: AgentId) -> f64 {
        self.get(agent.index()).copied().unwrap_or(0.0)
    }
}

/// Dense score storage, one slot per car
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreSheet {
    scores: Vec<f64>,
}

impl ScoreSheet {
    pub fn new(population: usize) -> Self {
        Self {
            scores: vec![0.0; population],
        }
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn reset(&mut self) {
        self.scores.iter_mut().for_each(|s| *s = 0.0);
    }

    /// Car with the highest score (first one on ties)
    pub fn leader(&self) -> Option<(AgentId, f64)> {
        self.scores
            .iter()
            .enumerate()
            .fold(None, |best: Option<(AgentId, f64)>, (i, &s)| match best {
                Some((_, b)) if b >= s => best,
                _ => Some((AgentId(i), s)),
            })
    }

    pub fn stats(&self) -> ScoreStats {
        ScoreStats::from_scores(&self.scores)
    }
}

impl Scoreboard for ScoreSheet {
    fn credit(&mut self, agent: AgentId, delta: f64) {
        self.scores.credit(agent, delta);
    }

    fn score(&self, agent: AgentId) -> f64 {
        self.scores.score(agent)
    }
}

/// Distribution of final scores over a population
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub max: f64,
    pub mean: f64,
    pub min: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl ScoreStats {
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        Self {
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            std_dev: variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_scoreboard_grows_on_demand() {
        let mut scores: Vec<f64> = Vec::new();
        scores.credit(AgentId(2), 1.5);
        assert_eq!(scores.len(), 3);
        assert_eq!(scores.score(AgentId(2)), 1.5);
        assert_eq!(scores.score(AgentId(9)), 0.0);
    }

    #[test]
    fn test_score_sheet_leader() {
        let mut sheet = ScoreSheet::new(3);
        sheet.credit(AgentId(0), 4.0);
        sheet.credit(AgentId(1), 7.0);
        sheet.credit(AgentId(2), 7.0);
        assert_eq!(sheet.leader(), Some((AgentId(1), 7.0)));

        sheet.reset();
        assert!(sheet.scores().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_score_stats() {
        let stats = ScoreStats::from_scores(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.min, 2.0);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_stats_empty() {
        assert_eq!(ScoreStats::from_scores(&[]), ScoreStats::default());
    }
}
