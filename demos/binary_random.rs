//! Example: random edits on the binary level problem

use pcgrl_core::{ActionSpace, Environment, TrackedEnvironment};
use pcgrl_env::{BinaryProblem, EnvConfig, PcgrlEnv};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging, RUST_LOG=pcgrl_env=debug for per-step output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EnvConfig::from_file(path)?,
        None => EnvConfig { seed: Some(42), ..Default::default() },
    };
    let env = PcgrlEnv::new(BinaryProblem::new(), &config)?;
    let mut env = TrackedEnvironment::new(env);

    let action_space = env.action_space();
    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or_default());

    let num_episodes = 5;
    let mut episode_rewards = Vec::new();

    for episode in 0..num_episodes {
        let (_observation, info) = env.reset().await?;
        println!("Episode {} start: {:?}", episode + 1, info.fields);

        let mut total_reward = 0.0;
        loop {
            let action = action_space.sample(&mut rng);
            let step = env.step(action).await?;
            total_reward += step.reward.0;

            if step.done || step.truncated {
                println!(
                    "Episode {}: Total Reward = {:.2}, Steps = {}, Solved = {}, Final = {:?}",
                    episode + 1,
                    total_reward,
                    env.step_count,
                    !step.truncated,
                    step.info.fields
                );
                break;
            }
        }
        env.render().await?;
        episode_rewards.push(total_reward);
    }

    let avg_reward: f64 = episode_rewards.iter().sum::<f64>() / episode_rewards.len() as f64;
    println!("\nAverage Reward over {} episodes: {:.2}", num_episodes, avg_reward);

    env.close().await?;
    Ok(())
}
