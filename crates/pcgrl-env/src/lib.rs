//! Procedural content generation environments for reinforcement learning
//!
//! This crate provides:
//! - Tile grids and the graph helpers used to score them
//! - The [`Problem`] contract and the binary layout problem
//! - A wide-representation level-editing environment
//! - A registry for creating environments by name

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod binary;
pub mod config;
pub mod env;
pub mod grid;
pub mod helper;
pub mod problem;
pub mod registry;
#[cfg(feature = "visualization")]
pub mod render;

// Re-export the main types
pub use binary::{BinaryProblem, BinaryStats, RewardWeights};
pub use config::{EnvConfig, RenderMode};
pub use env::PcgrlEnv;
pub use grid::{Coord, Tile, TileMap};
pub use problem::{GraphicsMode, Problem, ProblemBase, ProblemConfig};
pub use registry::{list_envs, make_env, make_env_from_config, register_env, BoxedEnv, EnvRegistry};
#[cfg(feature = "visualization")]
pub use render::TileSet;

// Re-export core types
pub use pcgrl_core::{
    Environment, EnvironmentConfig, Episode, GridObservation, MultiDiscreteAction, PcgError,
    Reward, Step, StepInfo, TrackedEnvironment,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{make_env, BinaryProblem, EnvConfig, PcgrlEnv, Problem, Tile};
    pub use pcgrl_core::prelude::*;
}
