//! Environment traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Action, ActionSpace, Observation, ObservationSpace, Reward};

/// Result of a single environment step
#[derive(Debug, Clone)]
pub struct Step<O> {
    /// Observation from the environment
    pub observation: O,
    /// Reward signal
    pub reward: Reward,
    /// Whether the episode is done
    pub done: bool,
    /// Whether the episode was truncated (e.g., change or time limit)
    pub truncated: bool,
    /// Additional info from the environment
    pub info: StepInfo,
}

/// Additional information from a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Custom fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl StepInfo {
    /// Set a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Look up a field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for StepInfo {
    fn from(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { fields }
    }
}

/// Episode information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Episode ID
    pub id: String,
    /// Total reward
    pub total_reward: f64,
    /// Number of steps
    pub steps: usize,
    /// Whether episode was truncated
    pub truncated: bool,
    /// Start time
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// End time
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Configuration for environments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Random seed
    pub seed: Option<u64>,
    /// Maximum episode steps
    pub max_steps: Option<usize>,
    /// Render mode
    pub render_mode: Option<String>,
    /// Additional parameters
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Core environment trait
#[async_trait]
pub trait Environment: Send + Sync {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: Action;

    /// Get the observation space
    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>>;

    /// Get the action space
    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>>;

    /// Reset the environment
    async fn reset(&mut self) -> crate::Result<(Self::Observation, StepInfo)>;

    /// Take a step in the environment
    async fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation>>;

    /// Render the environment (optional)
    async fn render(&self) -> crate::Result<()> {
        Ok(())
    }

    /// Close the environment
    async fn close(&mut self) -> crate::Result<()> {
        Ok(())
    }

    /// Get current episode info
    fn episode_info(&self) -> Option<Episode> {
        None
    }
}

/// Wrapper for environments that tracks episodes
pub struct TrackedEnvironment<E> {
    /// Inner environment
    pub env: E,
    /// Current episode
    pub episode: Option<Episode>,
    /// Step counter
    pub step_count: usize,
}

impl<E> TrackedEnvironment<E> {
    /// Create a new tracked environment
    pub fn new(env: E) -> Self {
        Self {
            env,
            episode: None,
            step_count: 0,
        }
    }
}

#[async_trait]
impl<E> Environment for TrackedEnvironment<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type Action = E::Action;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        self.env.observation_space()
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        self.env.action_space()
    }

    async fn reset(&mut self) -> crate::Result<(Self::Observation, StepInfo)> {
        // End current episode if exists
        if let Some(ref mut episode) = self.episode {
            if episode.end_time.is_none() {
                episode.end_time = Some(chrono::Utc::now());
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(episode = %id, "starting episode");
        self.episode = Some(Episode {
            id,
            total_reward: 0.0,
            steps: 0,
            truncated: false,
            start_time: chrono::Utc::now(),
            end_time: None,
        });
        self.step_count = 0;

        self.env.reset().await
    }

    async fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation>> {
        let step = self.env.step(action).await?;

        self.step_count += 1;
        if let Some(ref mut episode) = self.episode {
            episode.total_reward += step.reward.0;
            episode.steps = self.step_count;

            if step.done || step.truncated {
                episode.truncated = step.truncated;
                episode.end_time = Some(chrono::Utc::now());
            }
        }

        Ok(step)
    }

    async fn render(&self) -> crate::Result<()> {
        self.env.render().await
    }

    async fn close(&mut self) -> crate::Result<()> {
        self.env.close().await
    }

    fn episode_info(&self) -> Option<Episode> {
        self.episode.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridObservation, GridObservationSpace, MultiDiscreteAction, MultiDiscreteSpace};

    /// Counts up to three, rewarding the chosen value.
    struct CountingEnv {
        count: usize,
    }

    impl CountingEnv {
        fn observation(&self) -> GridObservation {
            GridObservation { data: vec![self.count as f64], rows: 1, cols: 1 }
        }
    }

    #[async_trait]
    impl Environment for CountingEnv {
        type Observation = GridObservation;
        type Action = MultiDiscreteAction;

        fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
            Box::new(GridObservationSpace::new(1, 1, 4).unwrap())
        }

        fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
            Box::new(MultiDiscreteSpace::new(vec![2]).unwrap())
        }

        async fn reset(&mut self) -> crate::Result<(Self::Observation, StepInfo)> {
            self.count = 0;
            Ok((self.observation(), StepInfo::default()))
        }

        async fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation>> {
            self.count += 1;
            let mut info = StepInfo::default();
            info.insert("count", self.count);
            Ok(Step {
                observation: self.observation(),
                reward: Reward(action.0[0] as f64),
                done: self.count >= 3,
                truncated: false,
                info,
            })
        }
    }

    #[tokio::test]
    async fn test_tracked_environment_accumulates_episode() {
        let mut env = TrackedEnvironment::new(CountingEnv { count: 0 });
        env.reset().await.unwrap();

        let mut last = None;
        for _ in 0..3 {
            last = Some(env.step(MultiDiscreteAction(vec![1])).await.unwrap());
        }
        let last = last.unwrap();
        assert!(last.done);
        assert_eq!(last.info.get("count"), Some(&serde_json::json!(3)));

        let episode = env.episode_info().unwrap();
        assert_eq!(episode.steps, 3);
        assert!((episode.total_reward - 3.0).abs() < f64::EPSILON);
        assert!(episode.end_time.is_some());
        assert!(!episode.truncated);
    }

    #[tokio::test]
    async fn test_reset_starts_a_fresh_episode() {
        let mut env = TrackedEnvironment::new(CountingEnv { count: 0 });
        env.reset().await.unwrap();
        env.step(MultiDiscreteAction(vec![1])).await.unwrap();
        let first = env.episode_info().unwrap().id;

        env.reset().await.unwrap();
        let second = env.episode_info().unwrap();
        assert_ne!(first, second.id);
        assert_eq!(second.steps, 0);
        assert_eq!(env.step_count, 0);
    }

    #[test]
    fn test_environment_config_flattens_params() {
        let config: EnvironmentConfig =
            serde_json::from_str(r#"{"seed": 3, "render_path": true}"#).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.params.get("render_path"), Some(&serde_json::json!(true)));
    }
}
