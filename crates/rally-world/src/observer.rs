//! Read-only hooks for whoever watches an episode (renderers, statistics, tests).

use crate::car::Car;
use crate::episode::{AgentTickReport, EpisodeSummary};
use rally_core::{AgentId, DeathCause};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

/// Callbacks fired by the episode at tick boundaries. All methods default to no-ops.
pub trait EpisodeObserver {
    fn on_tick(&mut self, _tick: u64, _reports: &[AgentTickReport], _cars: &[Car]) {}

    fn on_agent_died(&mut self, _tick: u64, _car: &Car, _cause: DeathCause) {}

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) {}
}

/// Null observer
impl EpisodeObserver for () {}

/// Owned form of the observer callbacks, for message passing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EpisodeEvent {
    TickCompleted { tick: u64, alive: usize },
    AgentDied { tick: u64, agent: AgentId, cause: DeathCause },
    EpisodeEnded(EpisodeSummary),
}

impl EpisodeEvent {
    fn tick_completed(tick: u64, reports: &[AgentTickReport]) -> Self {
        EpisodeEvent::TickCompleted {
            tick,
            alive: reports.iter().filter(|r| r.is_alive).count(),
        }
    }
}

/// Records every event in order
impl EpisodeObserver for Vec<EpisodeEvent> {
    fn on_tick(&mut self, tick: u64, reports: &[AgentTickReport], _cars: &[Car]) {
        self.push(EpisodeEvent::tick_completed(tick, reports));
    }

    fn on_agent_died(&mut self, tick: u64, car: &Car, cause: DeathCause) {
        self.push(EpisodeEvent::AgentDied {
            tick,
            agent: car.id,
            cause,
        });
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        self.push(EpisodeEvent::EpisodeEnded(summary.clone()));
    }
}

/// Forwards events over a channel; a closed receiver is ignored
impl EpisodeObserver for Sender<EpisodeEvent> {
    fn on_tick(&mut self, tick: u64, reports: &[AgentTickReport], _cars: &[Car]) {
        let _ = self.send(EpisodeEvent::tick_completed(tick, reports));
    }

    fn on_agent_died(&mut self, tick: u64, car: &Car, cause: DeathCause) {
        let _ = self.send(EpisodeEvent::AgentDied {
            tick,
            agent: car.id,
            cause,
        });
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        let _ = self.send(EpisodeEvent::EpisodeEnded(summary.clone()));
    }
}
