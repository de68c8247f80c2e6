//! Tick orchestration for one episode.

use crate::car::{Car, CarSnapshot};
use crate::observer::EpisodeObserver;
use crate::policy::{Observation, Policy};
use crate::reward::RewardFunction;
use crate::sensor::SensorArray;
use crate::track::Track;
use rally_core::{Action, AgentId, DeathCause, EpisodeConfig, Result, ScoreStats, Scoreboard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, event, info, instrument, warn, Level};

/// What the core reports for one car after one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentTickReport {
    pub agent: AgentId,
    pub is_alive: bool,
    /// Score change applied this tick
    pub reward_delta: f64,
    /// The car was retired as stuck this tick
    pub is_stuck_terminal: bool,
}

/// Why an episode stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    AllDead,
    TickBudget,
    Cancelled,
}

/// One population of cars racing on a shared track
pub struct Episode {
    track: Arc<Track>,
    cars: Vec<Car>,
    sensors: SensorArray,
    reward: RewardFunction,
    config: EpisodeConfig,
    tick: u64,
    termination: Option<Termination>,
    invalid_actions: u64,
}

impl Episode {
    pub fn new(track: Arc<Track>, population: usize, config: EpisodeConfig) -> Result<Self> {
        config.validate()?;

        let cars = (0..population)
            .map(|i| Car::new(AgentId(i), &config.car, &config.stuck))
            .collect();

        Ok(Self {
            track,
            cars,
            sensors: SensorArray::new(&config.sensor),
            reward: RewardFunction::new(&config.reward),
            config,
            tick: 0,
            termination: None,
            invalid_actions: 0,
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn car(&self, agent: AgentId) -> Option<&Car> {
        self.cars.get(agent.index())
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn alive_count(&self) -> usize {
        self.cars.iter().filter(|c| c.is_alive()).count()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn is_finished(&self) -> bool {
        self.termination.is_some()
    }

    /// Action indices rejected so far
    pub fn invalid_actions(&self) -> u64 {
        self.invalid_actions
    }

    pub fn snapshot(&self) -> Vec<CarSnapshot> {
        self.cars.iter().map(CarSnapshot::from).collect()
    }

    /// Run one synchronized tick across all live cars.
    ///
    /// Returns one report per car that was alive when the tick started, or
    /// an empty vector once the episode has finished.
    pub fn step<P, S, O>(
        &mut self,
        policy: &mut P,
        scores: &mut S,
        observer: &mut O,
    ) -> Vec<AgentTickReport>
    where
        P: Policy + ?Sized,
        S: Scoreboard + ?Sized,
        O: EpisodeObserver + ?Sized,
    {
        if self.termination.is_some() {
            return Vec::new();
        }
        if self.alive_count() == 0 {
            self.termination = Some(Termination::AllDead);
            return Vec::new();
        }

        // Decide for every car first, then move them all
        for car in self.cars.iter_mut().filter(|c| c.is_alive()) {
            let observation = Observation::from_car(car, &self.config.observation);
            let choice = policy.decide(car.id, &observation);
            match Action::from_index(choice) {
                Ok(action) => car.apply(action),
                Err(e) => {
                    self.invalid_actions += 1;
                    warn!(
                        agent = %car.id,
                        tick = self.tick,
                        error = %e,
                        "Rejected policy decision"
                    );
                }
            }
        }

        let mut reports = Vec::new();
        for car in self.cars.iter_mut().filter(|c| c.is_alive()) {
            car.update(&self.track, &self.sensors);
            if let Some(cause) = car.death_cause() {
                observer.on_agent_died(self.tick, car, cause);
                debug!(
                    event = "car_death",
                    agent = %car.id,
                    tick = self.tick,
                    cause = ?cause,
                    distance = car.distance(),
                    "Car crashed"
                );
            }

            // A car that crashed this tick still goes through scoring
            let is_stuck_terminal = car.check_stuck();
            let reward_delta = if is_stuck_terminal {
                let was_alive = car.is_alive();
                car.retire(DeathCause::Stuck);
                if was_alive {
                    observer.on_agent_died(self.tick, car, DeathCause::Stuck);
                    debug!(
                        event = "car_death",
                        agent = %car.id,
                        tick = self.tick,
                        cause = ?DeathCause::Stuck,
                        stuck_frames = car.stuck_frames(),
                        "Car stuck"
                    );
                }
                -self.config.stuck.penalty
            } else {
                self.reward
                    .evaluate(car.distance(), car.footprint(), car.readings())
            };
            scores.credit(car.id, reward_delta);

            reports.push(AgentTickReport {
                agent: car.id,
                is_alive: car.is_alive(),
                reward_delta,
                is_stuck_terminal,
            });
        }

        self.tick += 1;
        observer.on_tick(self.tick, &reports, &self.cars);

        if self.tick >= self.config.max_ticks {
            self.termination = Some(Termination::TickBudget);
        } else if self.alive_count() == 0 {
            self.termination = Some(Termination::AllDead);
        }

        reports
    }

    /// Step until the episode finishes
    pub fn run<P, S, O>(
        &mut self,
        policy: &mut P,
        scores: &mut S,
        observer: &mut O,
    ) -> EpisodeSummary
    where
        P: Policy + ?Sized,
        S: Scoreboard + ?Sized,
        O: EpisodeObserver + ?Sized,
    {
        self.run_until_cancelled(policy, scores, observer, &CancellationToken::new())
    }

    /// Step until the episode finishes or `cancel` fires. Cancellation is
    /// only observed between ticks.
    #[instrument(skip_all, fields(population = self.cars.len(), max_ticks = self.config.max_ticks))]
    pub fn run_until_cancelled<P, S, O>(
        &mut self,
        policy: &mut P,
        scores: &mut S,
        observer: &mut O,
        cancel: &CancellationToken,
    ) -> EpisodeSummary
    where
        P: Policy + ?Sized,
        S: Scoreboard + ?Sized,
        O: EpisodeObserver + ?Sized,
    {
        info!("Starting episode with {} cars", self.cars.len());

        while !self.is_finished() {
            if cancel.is_cancelled() {
                self.termination = Some(Termination::Cancelled);
                warn!(tick = self.tick, "Episode cancelled");
                break;
            }

            self.step(policy, scores, observer);

            if self.tick % 100 == 0 && self.tick > 0 {
                debug!(
                    "Tick {}/{}: {} cars alive",
                    self.tick,
                    self.config.max_ticks,
                    self.alive_count()
                );
            }
        }

        let summary = self.summary(&*scores);
        self.emit_episode_summary(&summary);
        observer.on_episode_end(&summary);
        summary
    }

    /// Statistics over the current state of the population
    pub fn summary<S: Scoreboard + ?Sized>(&self, scores: &S) -> EpisodeSummary {
        let population = self.cars.len();
        let n = population.max(1) as f64;
        let final_scores: Vec<f64> = self.cars.iter().map(|c| scores.score(c.id)).collect();
        let cause_count = |cause| {
            self.cars
                .iter()
                .filter(|c| c.death_cause() == Some(cause))
                .count()
        };

        EpisodeSummary {
            ticks: self.tick,
            termination: self.termination,
            population,
            alive: self.alive_count(),
            dead: population - self.alive_count(),
            collisions: cause_count(DeathCause::Collision),
            stuck: cause_count(DeathCause::Stuck),
            invalid_actions: self.invalid_actions,
            total_distance: self.cars.iter().map(|c| c.distance()).sum(),
            mean_speed: self.cars.iter().map(|c| c.speed()).sum::<f64>() / n,
            mean_ticks_alive: self.cars.iter().map(|c| c.ticks_alive() as f64).sum::<f64>()
                / n,
            mean_ticks_stuck: self.cars.iter().map(|c| c.ticks_stuck() as f64).sum::<f64>()
                / n,
            scores: ScoreStats::from_scores(&final_scores),
        }
    }

    fn emit_episode_summary(&self, summary: &EpisodeSummary) {
        info!(
            event = "episode_summary",
            ticks = summary.ticks,
            termination = ?summary.termination,
            population = summary.population,
            alive = summary.alive,
            collisions = summary.collisions,
            stuck = summary.stuck,
            invalid_actions = summary.invalid_actions,
            total_distance = summary.total_distance,
            mean_speed = format!("{:.2}", summary.mean_speed),
            max_score = format!("{:.2}", summary.scores.max),
            mean_score = format!("{:.2}", summary.scores.mean),
            "Episode complete"
        );

        event!(
            Level::INFO,
            histogram_name = "episode_duration",
            histogram_value = summary.ticks,
            "Episode duration histogram"
        );

        event!(
            Level::INFO,
            gauge_name = "dead_cars",
            gauge_value = summary.dead,
            "Dead cars gauge"
        );
    }
}

/// End-of-episode statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub ticks: u64,
    pub termination: Option<Termination>,
    pub population: usize,
    pub alive: usize,
    pub dead: usize,
    pub collisions: usize,
    pub stuck: usize,
    pub invalid_actions: u64,
    pub total_distance: f64,
    pub mean_speed: f64,
    pub mean_ticks_alive: f64,
    pub mean_ticks_stuck: f64,
    pub scores: ScoreStats,
}

impl EpisodeSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
