//! The seam between the simulation and whatever decides how cars drive.

use crate::car::Car;
use rally_core::{Action, AgentId, ObservationConfig};
use serde::{Deserialize, Serialize};

/// Number of sensor slots in an observation
pub const SENSOR_SLOTS: usize = 7;

/// Fixed-arity input handed to a policy: seven scaled sensor distances
/// followed by the scaled speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f64; SENSOR_SLOTS + 1]);

impl Observation {
    /// Sensor distances are divided by the distance scale and floored; slots
    /// without a reading stay at zero and readings past the seventh are dropped.
    pub fn from_car(car: &Car, config: &ObservationConfig) -> Self {
        let mut values = [0.0; SENSOR_SLOTS + 1];
        for (slot, reading) in values.iter_mut().zip(car.readings().iter().take(SENSOR_SLOTS)) {
            *slot = (reading.distance / config.distance_scale).floor();
        }
        values[SENSOR_SLOTS] = car.speed() / config.speed_scale;
        Self(values)
    }

    pub fn sensors(&self) -> &[f64] {
        &self.0[..SENSOR_SLOTS]
    }

    pub fn speed(&self) -> f64 {
        self.0[SENSOR_SLOTS]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Decides an action index in `0..4` for one car from its observation.
///
/// Indices outside that range are rejected by the episode for that car only.
pub trait Policy {
    fn decide(&mut self, agent: AgentId, observation: &Observation) -> usize;
}

impl<F> Policy for F
where
    F: FnMut(AgentId, &Observation) -> usize,
{
    fn decide(&mut self, agent: AgentId, observation: &Observation) -> usize {
        self(agent, observation)
    }
}

/// Index of the largest output, lowest index on ties. NaN never wins.
pub fn argmax(outputs: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in outputs.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if b >= value => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

/// Outputs normalised by their sum; a non-positive sum falls back to a
/// uniform distribution.
pub fn decision_probabilities(outputs: &[f64]) -> Vec<f64> {
    if outputs.is_empty() {
        return Vec::new();
    }
    let total: f64 = outputs.iter().sum();
    if total > 0.0 {
        outputs.iter().map(|o| o / total).collect()
    } else {
        vec![1.0 / outputs.len() as f64; outputs.len()]
    }
}

/// Wraps a function producing one score per action and picks the arg-max
pub struct OutputPolicy<F> {
    outputs: F,
}

impl<F> OutputPolicy<F>
where
    F: FnMut(AgentId, &Observation) -> Vec<f64>,
{
    pub fn new(outputs: F) -> Self {
        Self { outputs }
    }
}

impl<F> Policy for OutputPolicy<F>
where
    F: FnMut(AgentId, &Observation) -> Vec<f64>,
{
    fn decide(&mut self, agent: AgentId, observation: &Observation) -> usize {
        let outputs = (self.outputs)(agent, observation);
        tracing::trace!(
            agent = %agent,
            outputs = ?outputs,
            probabilities = ?decision_probabilities(&outputs),
            "Policy outputs"
        );
        // an empty output vector has no valid action; report one past the end
        argmax(&outputs).unwrap_or(Action::COUNT)
    }
}

/// Always picks the same action
#[derive(Debug, Clone, Copy)]
pub struct ConstantPolicy(pub Action);

impl Policy for ConstantPolicy {
    fn decide(&mut self, _agent: AgentId, _observation: &Observation) -> usize {
        self.0.index()
    }
}

/// Cycles through the actions in index order, one step per decision
#[derive(Debug, Clone, Default)]
pub struct RoundRobinPolicy {
    next: usize,
}

impl Policy for RoundRobinPolicy {
    fn decide(&mut self, _agent: AgentId, _observation: &Observation) -> usize {
        let choice = self.next;
        self.next = (self.next + 1) % Action::COUNT;
        choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorArray;
    use crate::track::Track;
    use rally_core::{CarConfig, SensorConfig, StuckConfig, TrackConfig};

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.9, 0.9, 0.1]), Some(1));
        assert_eq!(argmax(&[1.0, 1.0, 1.0, 1.0]), Some(0));
        assert_eq!(argmax(&[f64::NAN, -1.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_decision_probabilities() {
        assert_eq!(decision_probabilities(&[1.0, 3.0]), vec![0.25, 0.75]);
        assert_eq!(decision_probabilities(&[0.0; 4]), vec![0.25; 4]);
        assert_eq!(decision_probabilities(&[-1.0, 0.5]), vec![0.5, 0.5]);
        assert!(decision_probabilities(&[]).is_empty());
    }

    #[test]
    fn test_observation_before_first_update() {
        let car = rally_car();
        let obs = Observation::from_car(&car, &ObservationConfig::default());
        assert_eq!(obs.sensors(), &[0.0; SENSOR_SLOTS]);
        assert_eq!(obs.speed(), 0.0);
    }

    #[test]
    fn test_observation_scaling() {
        let track = Track::open(&TrackConfig {
            width: 2000,
            height: 2000,
            ..Default::default()
        })
        .unwrap();
        let mut car = rally_car();
        car.update(&track, &SensorArray::new(&SensorConfig::default()));

        let obs = Observation::from_car(&car, &ObservationConfig::default());
        assert_eq!(obs.as_slice().len(), 8);
        // center (701.5, 687.5), forward ray ends on pixel (1001, 687): 299 / 30 floors to 9
        assert_eq!(obs.sensors()[3], 9.0);
        assert!((obs.speed() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_output_policy_uses_argmax() {
        let mut policy = OutputPolicy::new(|_, _: &Observation| vec![0.1, 0.2, 0.7, 0.7]);
        let obs = Observation([0.0; SENSOR_SLOTS + 1]);
        assert_eq!(policy.decide(AgentId(0), &obs), 2);

        let mut empty = OutputPolicy::new(|_, _: &Observation| Vec::new());
        assert_eq!(empty.decide(AgentId(0), &obs), Action::COUNT);
    }

    #[test]
    fn test_round_robin() {
        let mut policy = RoundRobinPolicy::default();
        let obs = Observation([0.0; SENSOR_SLOTS + 1]);
        let picks: Vec<usize> = (0..6).map(|_| policy.decide(AgentId(0), &obs)).collect();
        assert_eq!(picks, vec![0, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn test_closure_policy() {
        let mut policy = |agent: AgentId, _: &Observation| agent.index() % 4;
        let obs = Observation([0.0; SENSOR_SLOTS + 1]);
        assert_eq!(policy.decide(AgentId(6), &obs), 2);
    }

    fn rally_car() -> Car {
        Car::new(AgentId(0), &CarConfig::default(), &StuckConfig::default())
    }
}
