//! Track simulation engine.
//!
//! Cars drive over a bitmap track under the control of an external policy.
//! Each tick the engine moves them, casts their distance sensors, checks
//! for crashes and stuck cars, and scores them.

pub mod track;
pub mod sensor;
pub mod car;
pub mod stuck;
pub mod reward;
pub mod policy;
pub mod observer;
pub mod episode;

pub use track::{Track, TrackBuilder};
pub use sensor::{SensorArray, SensorReading};
pub use car::{Car, CarSnapshot};
pub use stuck::StuckDetector;
pub use reward::RewardFunction;
pub use policy::{Observation, Policy};
pub use observer::{EpisodeEvent, EpisodeObserver};
pub use episode::{AgentTickReport, Episode, EpisodeSummary, Termination};
