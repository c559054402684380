//! Level-editing environment with the "wide" representation
//!
//! The agent picks any interior cell and a tile to write there each step.

use async_trait::async_trait;
use pcgrl_core::{
    ActionSpace, Environment, EnvironmentConfig, GridObservation, GridObservationSpace,
    MultiDiscreteAction, MultiDiscreteSpace, ObservationSpace, PcgError, Result, Reward, Step,
    StepInfo,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::binary::BinaryProblem;
use crate::config::{EnvConfig, RenderMode};
use crate::grid::{bordered, random_map, to_observation, Coord, Tile, TileMap};
use crate::problem::Problem;

/// Endpoint draws before giving up on a reset
const MAX_HOLE_ATTEMPTS: usize = 64;

/// PCGRL environment driving a [`Problem`]
pub struct PcgrlEnv<P: Problem> {
    problem: P,
    rng: StdRng,
    change_percentage: f64,
    max_steps: Option<usize>,
    render_mode: RenderMode,
    max_changes: usize,
    max_iterations: usize,
    changes: usize,
    iterations: usize,
    map: TileMap,
    stats: Option<P::Stats>,
}

impl PcgrlEnv<BinaryProblem> {
    /// Binary environment configured from generic parameters
    pub fn binary(config: &EnvironmentConfig) -> Result<Self> {
        Self::new(BinaryProblem::new(), &EnvConfig::from_environment_config(config)?)
    }
}

impl<P: Problem> PcgrlEnv<P> {
    /// Configure `problem` and size the episode limits
    pub fn new(mut problem: P, config: &EnvConfig) -> Result<Self> {
        problem.adjust_param(&config.problem_config)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        #[cfg(feature = "visualization")]
        if config.render_mode == RenderMode::RgbArray {
            problem.base_mut().ensure_assets_loaded()?;
        }

        let base = problem.base();
        let map = TileMap::from_elem((base.height + 2, base.width + 2), base.border_tile);
        let mut env = Self {
            problem,
            rng,
            change_percentage: config.change_percentage,
            max_steps: config.max_steps,
            render_mode: config.render_mode,
            max_changes: 0,
            max_iterations: 0,
            changes: 0,
            iterations: 0,
            map,
            stats: None,
        };
        env.size_budgets();

        tracing::info!(
            width = env.problem.base().width,
            height = env.problem.base().height,
            max_changes = env.max_changes,
            max_iterations = env.max_iterations,
            render_mode = ?env.render_mode,
            "created pcgrl environment"
        );
        Ok(env)
    }

    /// Derive the change and step budgets from the current level size.
    ///
    /// `max_steps` caps the step budget.
    fn size_budgets(&mut self) {
        let base = self.problem.base();
        let area = base.width * base.height;
        self.max_changes = ((self.change_percentage * area as f64) as usize).max(1);
        let max_iterations = self.max_changes * area;
        self.max_iterations = self.max_steps.map_or(max_iterations, |cap| cap.min(max_iterations));
    }

    fn expected_dim(&self) -> (usize, usize) {
        let base = self.problem.base();
        (base.height + 2, base.width + 2)
    }

    /// The problem being solved
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// The problem being solved, mutably
    pub fn problem_mut(&mut self) -> &mut P {
        &mut self.problem
    }

    /// Current bordered map
    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// Statistics of the current map
    pub fn stats(&self) -> Option<&P::Stats> {
        self.stats.as_ref()
    }

    /// Tiles changed this episode
    pub fn changes(&self) -> usize {
        self.changes
    }

    /// Steps taken this episode
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Change budget per episode
    pub fn max_changes(&self) -> usize {
        self.max_changes
    }

    /// Step budget per episode
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn generate_holes(&mut self) -> Result<(Coord, Coord)> {
        let mut attempt = 1;
        loop {
            match self.problem.gen_holes(&mut self.rng) {
                Err(err) if err.is_retryable() && attempt < MAX_HOLE_ATTEMPTS => {
                    tracing::debug!(attempt, %err, "redrawing openings");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Replace the interior, keeping the current openings.
    ///
    /// Counters are left alone; the statistics are recomputed.
    pub fn load_interior(&mut self, interior: &TileMap) -> Result<&P::Stats> {
        let base = self.problem.base();
        if interior.dim() != (base.height, base.width) {
            return Err(PcgError::DimensionMismatch {
                expected: base.height * base.width,
                actual: interior.len(),
            });
        }
        let (start, end) = self
            .problem
            .holes()
            .ok_or_else(|| PcgError::Environment("reset the environment first".to_string()))?;
        self.map = bordered(interior, base.border_tile, &[start, end]);
        let stats = self.problem.get_stats(&self.map)?;
        Ok(self.stats.insert(stats))
    }

    fn step_info(&self, new_stats: &P::Stats, old_stats: &P::Stats) -> StepInfo {
        let mut info = StepInfo::from(self.problem.get_debug_info(new_stats, old_stats));
        info.insert("iterations", self.iterations);
        info.insert("changes", self.changes);
        info.insert("max_iterations", self.max_iterations);
        info.insert("max_changes", self.max_changes);
        info
    }

    /// ASCII picture of the map, `.` empty and `#` solid
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.map.len() + self.map.nrows());
        for row in self.map.rows() {
            out.extend(row.iter().map(|t| match t {
                Tile::Empty => '.',
                Tile::Solid => '#',
            }));
            out.push('\n');
        }
        out
    }

    /// Image of the map with the problem's path overlay
    #[cfg(feature = "visualization")]
    pub fn render_image(&mut self) -> Result<image::RgbaImage> {
        self.problem.render(&self.map)
    }

    #[cfg(feature = "visualization")]
    fn render_frame(&self) -> Result<()> {
        let tiles = self
            .problem
            .base()
            .tile_set()
            .ok_or_else(|| PcgError::Environment("sprites are not loaded".to_string()))?;
        let frame = tiles.compose(&self.map, self.problem.path_coords())?;
        tracing::info!(width = frame.width(), height = frame.height(), "rendered frame");
        Ok(())
    }

    #[cfg(not(feature = "visualization"))]
    fn render_frame(&self) -> Result<()> {
        Err(PcgError::Config("rgb_array rendering needs the visualization feature".to_string()))
    }
}

#[async_trait]
impl<P> Environment for PcgrlEnv<P>
where
    P: Problem + 'static,
{
    type Observation = GridObservation;
    type Action = MultiDiscreteAction;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        let (rows, cols) = self.map.dim();
        Box::new(GridObservationSpace {
            rows,
            cols,
            n_values: self.problem.tile_types().len(),
        })
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        let base = self.problem.base();
        Box::new(MultiDiscreteSpace {
            nvec: vec![base.width, base.height, self.problem.tile_types().len()],
        })
    }

    async fn reset(&mut self) -> Result<(Self::Observation, StepInfo)> {
        // The problem may have been resized since the last episode.
        self.size_budgets();
        let base = self.problem.base();
        let interior = random_map(&mut self.rng, base.height, base.width, &base.probs)?;
        let (start, end) = self.generate_holes()?;
        self.map = bordered(&interior, self.problem.base().border_tile, &[start, end]);

        let stats = self.problem.get_stats(&self.map)?;
        self.problem.reset(stats.clone(), &mut self.rng);
        self.changes = 0;
        self.iterations = 0;

        let info = self.step_info(&stats, &stats);
        tracing::info!(?start, ?end, info = ?info.fields, "reset episode");
        self.stats = Some(stats);
        Ok((to_observation(&self.map), info))
    }

    async fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation>> {
        if !self.action_space().contains(&action) {
            return Err(PcgError::InvalidAction(format!("{:?} is outside the level", action.0)));
        }
        let old_stats = self
            .stats
            .clone()
            .ok_or_else(|| PcgError::Environment("reset the environment first".to_string()))?;
        let expected = self.expected_dim();
        if self.map.dim() != expected {
            return Err(PcgError::DimensionMismatch {
                expected: expected.0 * expected.1,
                actual: self.map.len(),
            });
        }

        let (x, y) = (action.0[0], action.0[1]);
        let tile = self.problem.tile_types()[action.0[2]];
        let cell = (y + 1, x + 1);

        self.iterations += 1;
        let (new_stats, reward) = if self.map[cell] == tile {
            (old_stats.clone(), Reward::default())
        } else {
            self.map[cell] = tile;
            self.changes += 1;
            let new_stats = self.problem.get_stats(&self.map)?;
            let reward = self.problem.get_reward(&new_stats, &old_stats);
            (new_stats, reward)
        };

        let solved = self.problem.get_episode_over(&new_stats, &old_stats);
        let exhausted = self.changes >= self.max_changes || self.iterations >= self.max_iterations;
        let info = self.step_info(&new_stats, &old_stats);
        tracing::debug!(
            ?cell,
            %tile,
            reward = reward.value(),
            solved,
            exhausted,
            "step"
        );
        self.stats = Some(new_stats);

        Ok(Step {
            observation: to_observation(&self.map),
            reward,
            done: solved || exhausted,
            truncated: exhausted && !solved,
            info,
        })
    }

    async fn render(&self) -> Result<()> {
        match self.render_mode {
            RenderMode::Human => tracing::info!(
                changes = self.changes,
                iterations = self.iterations,
                "\n{}",
                self.to_ascii()
            ),
            RenderMode::RgbArray => self.render_frame()?,
        }
        Ok(())
    }
}
