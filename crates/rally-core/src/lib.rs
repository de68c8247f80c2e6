//! Core types and utilities for the rally track simulation.

pub mod types;
pub mod config;
pub mod error;
pub mod score;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use score::*;
