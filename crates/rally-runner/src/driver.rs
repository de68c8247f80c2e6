//! Built-in policies and the blocking episode loop used by the runner.

use rally_core::{Action, AgentId, PolicyKind, RunnerConfig, ScoreSheet};
use rally_world::policy::{argmax, SENSOR_SLOTS};
use rally_world::{Episode, EpisodeSummary, Observation, Policy, Track};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Steers toward whichever side sees more open track, brakes when the road
/// ahead closes in. Noise keeps a population from driving in lockstep.
pub struct HeuristicPolicy {
    rng: ChaCha8Rng,
    noise: f64,
}

impl HeuristicPolicy {
    pub fn new(seed: u64, noise: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            noise,
        }
    }

    /// One score per action, in action index order
    pub fn outputs(&mut self, observation: &Observation) -> [f64; Action::COUNT] {
        let sensors = observation.sensors();
        let half = SENSOR_SLOTS / 2;
        let left: f64 = sensors[half + 1..].iter().sum();
        let right: f64 = sensors[..half].iter().sum();
        let ahead = sensors[half];

        let mut outputs = [
            (left - right) / 10.0,
            (right - left) / 10.0,
            (3.0 - ahead) / 3.0 + observation.speed(),
            ahead / 10.0,
        ];
        if self.noise > 0.0 {
            for output in outputs.iter_mut() {
                *output += self.rng.gen_range(-self.noise..self.noise);
            }
        }
        outputs
    }
}

impl Policy for HeuristicPolicy {
    fn decide(&mut self, _agent: AgentId, observation: &Observation) -> usize {
        let outputs = self.outputs(observation);
        argmax(&outputs).unwrap_or(Action::Accelerate.index())
    }
}

/// Uniformly random actions
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn decide(&mut self, _agent: AgentId, _observation: &Observation) -> usize {
        self.rng.gen_range(0..Action::COUNT)
    }
}

pub fn build_policy(config: &RunnerConfig, seed: u64) -> Box<dyn Policy + Send> {
    match config.policy {
        PolicyKind::Heuristic => Box::new(HeuristicPolicy::new(seed, config.policy_noise)),
        PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
    }
}

/// One line of runner output
#[derive(Debug, Serialize)]
pub struct EpisodeReport {
    pub episode: u32,
    pub seed: u64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub leader: Option<(AgentId, f64)>,
    pub summary: EpisodeSummary,
}

/// Run one episode to completion on the calling thread
#[instrument(skip(config, track, cancel), fields(population = config.population))]
pub fn run_episode(
    config: &RunnerConfig,
    track: Arc<Track>,
    episode_index: u32,
    cancel: &CancellationToken,
) -> rally_core::Result<EpisodeReport> {
    let seed = config.seed.wrapping_add(episode_index as u64);
    let started_at = chrono::Utc::now();

    let mut episode = Episode::new(track, config.population, config.episode.clone())?;
    let mut policy = build_policy(config, seed);
    let mut scores = ScoreSheet::new(config.population);

    let summary = episode.run_until_cancelled(policy.as_mut(), &mut scores, &mut (), cancel);

    let leader = scores.leader();
    if let Some((agent, score)) = leader {
        info!(
            event = "episode_leader",
            episode = episode_index,
            agent = %agent,
            score = format!("{:.2}", score),
            "Best car this episode"
        );
    }

    Ok(EpisodeReport {
        episode: episode_index,
        seed,
        started_at,
        finished_at: chrono::Utc::now(),
        leader,
        summary,
    })
}
