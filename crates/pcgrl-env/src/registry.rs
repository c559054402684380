//! Registry for creating PCGRL environments by problem name

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use pcgrl_core::{Environment, EnvironmentConfig, GridObservation, MultiDiscreteAction, PcgError};

use crate::binary::BinaryProblem;
use crate::config::EnvConfig;
use crate::env::PcgrlEnv;

/// Any PCGRL environment, boxed
pub type BoxedEnv = Box<dyn Environment<Observation = GridObservation, Action = MultiDiscreteAction>>;

type EnvConstructor = Box<dyn Fn(&EnvConfig) -> pcgrl_core::Result<BoxedEnv> + Send + Sync>;

lazy_static::lazy_static! {
    static ref REGISTRY: Arc<Mutex<EnvRegistry>> = Arc::new(Mutex::new(EnvRegistry::new()));
}

/// Problem name to environment constructor table
pub struct EnvRegistry {
    envs: HashMap<String, EnvConstructor>,
}

impl EnvRegistry {
    /// Create a registry holding the built-in problems
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            envs: HashMap::new(),
        };
        registry.register("binary", |config| {
            Ok(Box::new(PcgrlEnv::new(BinaryProblem::new(), config)?) as BoxedEnv)
        });
        registry
    }

    /// Register a problem, replacing any previous one of that name
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&EnvConfig) -> pcgrl_core::Result<BoxedEnv> + Send + Sync + 'static,
    {
        self.envs.insert(name.into(), Box::new(constructor));
    }

    /// Create the environment named by `config.problem`
    pub fn make(&self, config: &EnvConfig) -> pcgrl_core::Result<BoxedEnv> {
        let constructor = self
            .envs
            .get(&config.problem)
            .ok_or_else(|| PcgError::UnknownProblem(config.problem.clone()))?;
        tracing::debug!(problem = %config.problem, "making environment");
        constructor(config)
    }

    /// List registered problems, sorted
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.envs.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn global() -> pcgrl_core::Result<MutexGuard<'static, EnvRegistry>> {
    REGISTRY
        .lock()
        .map_err(|_| PcgError::Environment("environment registry lock poisoned".to_string()))
}

/// Register a problem globally
pub fn register_env<F>(name: impl Into<String>, constructor: F) -> pcgrl_core::Result<()>
where
    F: Fn(&EnvConfig) -> pcgrl_core::Result<BoxedEnv> + Send + Sync + 'static,
{
    global()?.register(name, constructor);
    Ok(())
}

/// Create an environment from a full configuration
pub fn make_env_from_config(config: &EnvConfig) -> pcgrl_core::Result<BoxedEnv> {
    global()?.make(config)
}

/// Create the `name` environment, reading options from `config.params`
pub fn make_env(name: &str, config: &EnvironmentConfig) -> pcgrl_core::Result<BoxedEnv> {
    let mut env_config = EnvConfig::from_environment_config(config)?;
    env_config.problem = name.to_string();
    make_env_from_config(&env_config)
}

/// List all registered problems
pub fn list_envs() -> pcgrl_core::Result<Vec<String>> {
    Ok(global()?.list())
}
