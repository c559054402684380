//! Environment configuration files

use std::path::Path;

use pcgrl_core::{EnvironmentConfig, PcgError, Result};
use serde::{Deserialize, Serialize};

use crate::problem::ProblemConfig;

/// Share of the interior an episode may change before it is cut off
pub const DEFAULT_CHANGE_PERCENTAGE: f64 = 0.2;

fn default_problem() -> String {
    "binary".to_string()
}

fn default_change_percentage() -> f64 {
    DEFAULT_CHANGE_PERCENTAGE
}

/// What [`Environment::render`](pcgrl_core::Environment::render) produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// ASCII map in the log
    #[default]
    Human,
    /// Sprite image; assets are loaded when the environment is built
    RgbArray,
}

impl std::str::FromStr for RenderMode {
    type Err = PcgError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "human" => Ok(Self::Human),
            "rgb_array" => Ok(Self::RgbArray),
            other => Err(PcgError::Config(format!("unknown render mode: {other}"))),
        }
    }
}

/// Everything needed to build a PCGRL environment.
///
/// ```toml
/// problem = "binary"
/// change_percentage = 0.2
/// seed = 42
/// max_steps = 500
/// render_mode = "human"
///
/// [problem_config]
/// render_path = true
/// rewards = { connectivity = 50.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Registered problem name
    #[serde(default = "default_problem")]
    pub problem: String,
    /// Fraction of interior tiles that may change per episode
    #[serde(default = "default_change_percentage")]
    pub change_percentage: f64,
    /// Random seed, entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Hard cap on steps per episode, below the change-derived limit
    #[serde(default)]
    pub max_steps: Option<usize>,
    /// What rendering produces
    #[serde(default)]
    pub render_mode: RenderMode,
    /// Options forwarded to the problem
    #[serde(default)]
    pub problem_config: ProblemConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            problem: default_problem(),
            change_percentage: DEFAULT_CHANGE_PERCENTAGE,
            seed: None,
            max_steps: None,
            render_mode: RenderMode::default(),
            problem_config: ProblemConfig::default(),
        }
    }
}

impl EnvConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Build from a generic environment config.
    ///
    /// `change_percentage` and the problem options are read from `params`.
    pub fn from_environment_config(config: &EnvironmentConfig) -> Result<Self> {
        let change_percentage = match config.params.get("change_percentage") {
            Some(value) => value.as_f64().ok_or_else(|| {
                PcgError::Config(format!("change_percentage must be a number, got {value}"))
            })?,
            None => DEFAULT_CHANGE_PERCENTAGE,
        };
        let problem = match config.params.get("problem") {
            Some(value) => value
                .as_str()
                .ok_or_else(|| PcgError::Config(format!("problem must be a string, got {value}")))?
                .to_string(),
            None => default_problem(),
        };

        let env_config = Self {
            problem,
            change_percentage,
            seed: config.seed,
            max_steps: config.max_steps,
            render_mode: config.render_mode.as_deref().map_or(Ok(RenderMode::Human), str::parse)?,
            problem_config: ProblemConfig::from_params(&config.params)?,
        };
        env_config.validate()?;
        Ok(env_config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.change_percentage > 0.0 && self.change_percentage <= 1.0) {
            return Err(PcgError::Config(format!(
                "change_percentage must be in (0, 1], got {}",
                self.change_percentage
            )));
        }
        if self.max_steps == Some(0) {
            return Err(PcgError::Config("max_steps must be at least 1".to_string()));
        }
        if cfg!(not(feature = "visualization")) && self.render_mode == RenderMode::RgbArray {
            return Err(PcgError::Config(
                "rgb_array rendering needs the visualization feature".to_string(),
            ));
        }
        Ok(())
    }
}
