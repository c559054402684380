//! Core reinforcement learning traits and types for procedural content
//! generation
//!
//! This crate provides the abstractions shared by PCGRL environments:
//! spaces, rewards, the async environment contract and episode tracking.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod environment;
pub mod error;
pub mod observation;
pub mod reward;

// Re-export core traits and types
pub use action::{Action, ActionSpace, MultiDiscreteAction, MultiDiscreteSpace};
pub use environment::{Environment, EnvironmentConfig, Episode, Step, StepInfo, TrackedEnvironment};
pub use error::{PcgError, Result};
pub use observation::{GridObservation, GridObservationSpace, Observation, ObservationSpace};
pub use reward::{range_reward, Reward};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, Environment, Observation, ObservationSpace, Result, Reward, Step,
        StepInfo,
    };
}
