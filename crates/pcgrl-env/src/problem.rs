//! Problem contract shared by every level-generation task
//!
//! A problem owns the level dimensions and initial tile distribution, turns
//! maps into statistics and statistics into rewards. Environments drive it
//! once per step; they never look inside the statistics themselves.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::path::PathBuf;

use pcgrl_core::{PcgError, Result, Reward};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::grid::{Coord, Tile, TileMap};

#[cfg(feature = "visualization")]
use crate::render::TileSet;

/// Probability sums may drift this far from one
const PROB_TOLERANCE: f64 = 1e-6;

/// Which sprite set to render with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsMode {
    /// Plain binary sprites
    #[default]
    Binary,
    /// GVGAI (oryx) sprites
    Gvgai,
}

/// Options accepted by [`Problem::adjust_param`].
///
/// Every field is optional; absent fields keep their current value.
/// Unrecognised keys are ignored when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemConfig {
    /// Interior width
    pub width: Option<usize>,
    /// Interior height
    pub height: Option<usize>,
    /// Initial fill probability per tile name
    pub probs: Option<BTreeMap<String, f64>>,
    /// Alias of `render_path`
    pub render: Option<bool>,
    /// Track the path for rendering
    pub render_path: Option<bool>,
    /// Stored for compatibility, does not affect reward
    pub target_path: Option<u32>,
    /// Redraw the fill probabilities every episode
    pub random_probs: Option<bool>,
    /// Partial reward weight overrides keyed by stat name
    pub rewards: Option<HashMap<String, f64>>,
    /// Sprite set
    pub graphics: Option<GraphicsMode>,
    /// Directory holding the sprite sets
    pub asset_dir: Option<PathBuf>,
}

impl ProblemConfig {
    /// Read the options out of a free-form parameter map
    pub fn from_params(params: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::Value::Object(params.clone()))?)
    }
}

/// State every problem shares: dimensions, tile distribution, rendering.
#[derive(Debug, Clone)]
pub struct ProblemBase {
    /// Interior width in tiles
    pub width: usize,
    /// Interior height in tiles
    pub height: usize,
    /// Initial fill probability per tile
    pub probs: BTreeMap<Tile, f64>,
    /// Tile of the ring around the interior
    pub border_tile: Tile,
    /// Sprite side length in pixels
    pub tile_size: u32,
    /// Sprite set
    pub graphics: GraphicsMode,
    /// Sprite directory, flat colours when absent
    pub asset_dir: Option<PathBuf>,
    #[cfg(feature = "visualization")]
    tile_set: Option<TileSet>,
}

impl ProblemBase {
    /// Create a base for a `width x height` interior
    #[must_use]
    pub fn new(width: usize, height: usize, probs: BTreeMap<Tile, f64>, border_tile: Tile) -> Self {
        Self {
            width,
            height,
            probs,
            border_tile,
            tile_size: 16,
            graphics: GraphicsMode::default(),
            asset_dir: None,
            #[cfg(feature = "visualization")]
            tile_set: None,
        }
    }

    /// Apply the dimension, probability and graphics options of `config`.
    ///
    /// Nothing is changed when any of them is rejected.
    pub fn adjust(&mut self, config: &ProblemConfig) -> Result<()> {
        let width = config.width.unwrap_or(self.width);
        let height = config.height.unwrap_or(self.height);
        if width == 0 || height == 0 {
            return Err(PcgError::Config(format!(
                "level must be at least 1x1, got {width}x{height}"
            )));
        }

        let probs = match &config.probs {
            Some(named) => {
                let mut probs = self.probs.clone();
                for (name, &p) in named {
                    let tile: Tile = name.parse()?;
                    if !(0.0..=1.0).contains(&p) {
                        return Err(PcgError::Config(format!("probability of {name} out of range: {p}")));
                    }
                    probs.insert(tile, p);
                }
                let total: f64 = probs.values().sum();
                if (total - 1.0).abs() > PROB_TOLERANCE {
                    return Err(PcgError::Config(format!("tile probabilities sum to {total}, not 1")));
                }
                probs
            }
            None => self.probs.clone(),
        };

        self.width = width;
        self.height = height;
        self.probs = probs;

        let graphics = config.graphics.unwrap_or(self.graphics);
        let asset_dir = config.asset_dir.clone().or_else(|| self.asset_dir.clone());
        if graphics != self.graphics || asset_dir != self.asset_dir {
            self.graphics = graphics;
            self.asset_dir = asset_dir;
            #[cfg(feature = "visualization")]
            {
                self.tile_set = None;
            }
        }
        Ok(())
    }

    /// Load the sprites once; later calls reuse them.
    ///
    /// Without an asset directory a flat-colour set is used.
    #[cfg(feature = "visualization")]
    pub fn ensure_assets_loaded(&mut self) -> Result<&TileSet> {
        if self.tile_set.is_none() {
            let tiles = match &self.asset_dir {
                Some(dir) => TileSet::load(dir, self.graphics, self.tile_size)?,
                None => TileSet::flat(self.tile_size),
            };
            self.tile_set = Some(tiles);
        }
        self.tile_set
            .as_ref()
            .ok_or_else(|| PcgError::Environment("tile set unavailable".to_string()))
    }

    /// Loaded sprites, if any
    #[cfg(feature = "visualization")]
    #[must_use]
    pub fn tile_set(&self) -> Option<&TileSet> {
        self.tile_set.as_ref()
    }

    /// Whether sprites are currently loaded
    #[cfg(feature = "visualization")]
    #[must_use]
    pub fn assets_loaded(&self) -> bool {
        self.tile_set.is_some()
    }

    /// Compose `map` with `path` drawn on top
    #[cfg(feature = "visualization")]
    pub fn render(&mut self, map: &TileMap, path: &[Coord]) -> Result<image::RgbaImage> {
        self.ensure_assets_loaded()?.compose(map, path)
    }
}

/// A level-generation task: statistics, reward and termination.
pub trait Problem: Send + Sync {
    /// Per-map statistics compared between steps
    type Stats: Clone + Debug + Serialize + Send + Sync;

    /// Tile types a level may contain, in action index order
    fn tile_types(&self) -> &'static [Tile];

    /// Shared state
    fn base(&self) -> &ProblemBase;

    /// Shared state, mutably
    fn base_mut(&mut self) -> &mut ProblemBase;

    /// Reconfigure the problem
    fn adjust_param(&mut self, config: &ProblemConfig) -> Result<()> {
        self.base_mut().adjust(config)
    }

    /// Start a new episode whose initial map produced `start_stats`
    fn reset(&mut self, start_stats: Self::Stats, rng: &mut dyn RngCore);

    /// Choose the entrance and exit openings for the next episode
    fn gen_holes(&mut self, rng: &mut dyn RngCore) -> Result<(Coord, Coord)>;

    /// Current entrance and exit, if generated
    fn holes(&self) -> Option<(Coord, Coord)>;

    /// Compute statistics of the bordered `map`
    fn get_stats(&mut self, map: &TileMap) -> Result<Self::Stats>;

    /// Reward for going from `old_stats` to `new_stats`
    fn get_reward(&self, new_stats: &Self::Stats, old_stats: &Self::Stats) -> Reward;

    /// Whether `new_stats` describe a finished level
    fn get_episode_over(&self, new_stats: &Self::Stats, old_stats: &Self::Stats) -> bool;

    /// Statistics worth logging
    fn get_debug_info(
        &self,
        new_stats: &Self::Stats,
        old_stats: &Self::Stats,
    ) -> serde_json::Map<String, serde_json::Value>;

    /// Full statistics as a JSON object, keyed by their serialized names
    fn stats_as_info(&self, stats: &Self::Stats) -> Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(stats)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(PcgError::Environment(format!("statistics must serialize to an object, got {other}"))),
        }
    }

    /// Path drawn over the level when rendering
    fn path_coords(&self) -> &[Coord] {
        &[]
    }

    /// Render `map` with the cached path
    #[cfg(feature = "visualization")]
    fn render(&mut self, map: &TileMap) -> Result<image::RgbaImage> {
        let path = self.path_coords().to_vec();
        self.base_mut().render(map, &path)
    }
}
