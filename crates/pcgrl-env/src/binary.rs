//! Binary problem: a connected layout with a long path between two holes
//!
//! The level is a grid of `empty` and `solid` tiles behind a solid border.
//! Two openings are cut into the border each episode. The agent is
//! rewarded for joining all floor into one region, for connecting the
//! openings and for lengthening the shortest path between them.

use std::collections::{BTreeMap, HashMap};

use pcgrl_core::{range_reward, PcgError, Result, Reward};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::grid::{border_cells, chebyshev, Coord, Tile, TileMap};
use crate::helper::{
    calc_num_regions, farthest_cell, get_path_coords, get_tile_locations, run_dijkstra, UNREACHABLE,
};
use crate::problem::{Problem, ProblemBase, ProblemConfig};

const PASSABLE: &[Tile] = &[Tile::Empty];

/// Border cells drawn per endpoint attempt
const HOLE_CANDIDATES: usize = 4;

/// Target interval of each statistic for the range reward
const REGIONS_RANGE: (f64, f64) = (1.0, 1.0);
const PATH_LENGTH_RANGE: (f64, f64) = (125.0, 125.0);
const CONNECTIVITY_RANGE: (f64, f64) = (1.0, 1.0);

/// Statistics of a binary level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryStats {
    /// Connected regions of empty tiles
    pub regions: usize,
    /// Start-to-end distance, or the farthest reachable distance when the
    /// openings are disconnected
    #[serde(rename = "path-length")]
    pub path_length: i64,
    /// 1 when the openings are connected
    pub connectivity: u8,
    /// Path drawn when rendering, empty unless path rendering is enabled
    #[serde(rename = "path-coords")]
    pub path_coords: Vec<Coord>,
}

/// Weight of each statistic's reward term
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    #[allow(missing_docs)]
    pub regions: f64,
    #[allow(missing_docs)]
    #[serde(rename = "path-length")]
    pub path_length: f64,
    #[allow(missing_docs)]
    pub connectivity: f64,
}

impl RewardWeights {
    /// Replace the named weights; unknown names are skipped.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, f64>) {
        for (name, &weight) in overrides {
            match name.as_str() {
                "regions" => self.regions = weight,
                "path-length" => self.path_length = weight,
                "connectivity" => self.connectivity = weight,
                other => tracing::debug!(stat = other, "ignoring unknown reward weight"),
            }
        }
    }
}

/// Longest shortest-path a `width x height` interior can hold: a serpentine
/// corridor filling every other row.
#[must_use]
pub fn max_path_length(width: usize, height: usize) -> i64 {
    (width.div_ceil(2) * height + height / 2) as i64
}

/// Pick an exit for `candidates[0]` among the rest.
///
/// The exit is the first candidate not touching the entrance
/// (Chebyshev distance other than 1).
#[must_use]
pub fn pick_endpoints(candidates: &[Coord]) -> Option<(Coord, Coord)> {
    let (&start, rest) = candidates.split_first()?;
    rest.iter()
        .find(|&&c| chebyshev(start, c) != 1)
        .map(|&end| (start, end))
}

/// Connected binary layout with a long entrance-to-exit path
#[derive(Debug, Clone)]
pub struct BinaryProblem {
    base: ProblemBase,
    target_path: u32,
    random_probs: bool,
    max_path_length: i64,
    reward_weights: RewardWeights,
    render_path: bool,
    path_coords: Vec<Coord>,
    path_length: Option<i64>,
    border_idxs: Vec<Coord>,
    start: Option<Coord>,
    end: Option<Coord>,
    start_stats: Option<BinaryStats>,
}

impl Default for BinaryProblem {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryProblem {
    /// 16x16 level starting fully solid
    #[must_use]
    pub fn new() -> Self {
        let (width, height) = (16, 16);
        let probs = BTreeMap::from([(Tile::Empty, 0.0), (Tile::Solid, 1.0)]);
        let max_path_length = max_path_length(width, height);

        Self {
            base: ProblemBase::new(width, height, probs, Tile::Solid),
            target_path: 20,
            random_probs: true,
            max_path_length,
            reward_weights: RewardWeights {
                regions: 0.0,
                path_length: 1.0,
                connectivity: max_path_length as f64,
            },
            render_path: false,
            path_coords: Vec::new(),
            path_length: None,
            border_idxs: border_cells(height, width),
            start: None,
            end: None,
            start_stats: None,
        }
    }

    /// Path length that ends the episode
    #[must_use]
    pub fn max_path_length(&self) -> i64 {
        self.max_path_length
    }

    /// Current reward weights
    #[must_use]
    pub fn reward_weights(&self) -> RewardWeights {
        self.reward_weights
    }

    /// Whether path coordinates are tracked
    #[must_use]
    pub fn render_path(&self) -> bool {
        self.render_path
    }

    /// Legacy path-length goal, kept for configuration compatibility
    #[must_use]
    pub fn target_path(&self) -> u32 {
        self.target_path
    }

    /// Whether the fill probability is redrawn every episode
    #[must_use]
    pub fn random_probs(&self) -> bool {
        self.random_probs
    }

    /// Path length from the last [`Problem::get_stats`] call
    #[must_use]
    pub fn last_path_length(&self) -> Option<i64> {
        self.path_length
    }

    /// Statistics of the episode's initial map
    #[must_use]
    pub fn start_stats(&self) -> Option<&BinaryStats> {
        self.start_stats.as_ref()
    }

    /// Cells eligible as entrance or exit
    #[must_use]
    pub fn border_idxs(&self) -> &[Coord] {
        &self.border_idxs
    }

    /// Place the openings explicitly
    pub fn set_holes(&mut self, start: Coord, end: Coord) -> Result<()> {
        for cell in [start, end] {
            if !self.border_idxs.contains(&cell) {
                return Err(PcgError::Config(format!("{cell:?} is not a border cell")));
            }
        }
        if chebyshev(start, end) <= 1 {
            return Err(PcgError::Config(format!(
                "openings {start:?} and {end:?} must be more than one cell apart"
            )));
        }
        self.start = Some(start);
        self.end = Some(end);
        Ok(())
    }
}

impl Problem for BinaryProblem {
    type Stats = BinaryStats;

    fn tile_types(&self) -> &'static [Tile] {
        &Tile::ALL
    }

    fn base(&self) -> &ProblemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProblemBase {
        &mut self.base
    }

    fn adjust_param(&mut self, config: &ProblemConfig) -> Result<()> {
        let dims = (self.base.width, self.base.height);
        self.base.adjust(config)?;
        self.render_path = config.render.unwrap_or(self.render_path)
            || config.render_path.unwrap_or(self.render_path);
        if dims != (self.base.width, self.base.height) {
            self.max_path_length = max_path_length(self.base.width, self.base.height);
            self.border_idxs = border_cells(self.base.height, self.base.width);
            self.start = None;
            self.end = None;
        }

        if let Some(target) = config.target_path {
            self.target_path = target;
        }
        if let Some(random) = config.random_probs {
            self.random_probs = random;
        }
        if let Some(rewards) = &config.rewards {
            self.reward_weights.apply_overrides(rewards);
        }

        tracing::debug!(
            width = self.base.width,
            height = self.base.height,
            render_path = self.render_path,
            random_probs = self.random_probs,
            weights = ?self.reward_weights,
            "adjusted binary problem"
        );
        Ok(())
    }

    fn reset(&mut self, start_stats: BinaryStats, rng: &mut dyn RngCore) {
        self.start_stats = Some(start_stats);
        if self.random_probs {
            let empty: f64 = rng.gen();
            self.base.probs.insert(Tile::Empty, empty);
            self.base.probs.insert(Tile::Solid, 1.0 - empty);
        }
    }

    fn gen_holes(&mut self, rng: &mut dyn RngCore) -> Result<(Coord, Coord)> {
        let candidates: Vec<Coord> =
            rand::seq::index::sample(rng, self.border_idxs.len(), HOLE_CANDIDATES)
                .iter()
                .map(|i| self.border_idxs[i])
                .collect();

        let (start, end) = pick_endpoints(&candidates).ok_or(PcgError::NoValidEndpoints {
            candidates: HOLE_CANDIDATES - 1,
        })?;
        self.start = Some(start);
        self.end = Some(end);
        Ok((start, end))
    }

    fn holes(&self) -> Option<(Coord, Coord)> {
        self.start.zip(self.end)
    }

    fn get_stats(&mut self, map: &TileMap) -> Result<BinaryStats> {
        let (start, end) = self
            .holes()
            .ok_or_else(|| PcgError::Environment("openings have not been generated".to_string()))?;
        let expected = (self.base.height + 2, self.base.width + 2);
        if map.dim() != expected {
            return Err(PcgError::DimensionMismatch {
                expected: expected.0 * expected.1,
                actual: map.len(),
            });
        }

        let locations = get_tile_locations(map, self.tile_types());
        let (distances, _) = run_dijkstra(start, map, PASSABLE);

        // Disconnected openings score the farthest distance reached instead.
        let (path_length, connectivity, trace_from) = match distances[end] {
            UNREACHABLE => match farthest_cell(&distances) {
                Some((cell, distance)) => (distance, 0, Some(cell)),
                None => (0, 0, None),
            },
            distance => (distance, 1, Some(end)),
        };
        self.path_length = Some(path_length);

        if self.render_path {
            self.path_coords = match trace_from {
                Some(cell) if path_length != 0 => get_path_coords(&distances, cell),
                _ => Vec::new(),
            };
        }

        Ok(BinaryStats {
            regions: calc_num_regions(map, &locations, PASSABLE),
            path_length,
            connectivity,
            path_coords: self.path_coords.clone(),
        })
    }

    fn get_reward(&self, new_stats: &BinaryStats, old_stats: &BinaryStats) -> Reward {
        let term = |new: f64, old: f64, (low, high): (f64, f64)| range_reward(new, old, low, high);
        let weights = &self.reward_weights;

        let regions = term(new_stats.regions as f64, old_stats.regions as f64, REGIONS_RANGE);
        let path_length = term(
            new_stats.path_length as f64,
            old_stats.path_length as f64,
            PATH_LENGTH_RANGE,
        );
        let connectivity = term(
            f64::from(new_stats.connectivity),
            f64::from(old_stats.connectivity),
            CONNECTIVITY_RANGE,
        );

        Reward(
            regions * weights.regions
                + path_length * weights.path_length
                + connectivity * weights.connectivity,
        )
    }

    fn get_episode_over(&self, new_stats: &BinaryStats, _old_stats: &BinaryStats) -> bool {
        new_stats.regions == 1
            && new_stats.path_length == self.max_path_length
            && new_stats.connectivity == 1
    }

    fn get_debug_info(
        &self,
        new_stats: &BinaryStats,
        _old_stats: &BinaryStats,
    ) -> serde_json::Map<String, serde_json::Value> {
        let mut info = serde_json::Map::new();
        info.insert("regions".to_string(), json!(new_stats.regions));
        info.insert("path-length".to_string(), json!(new_stats.path_length));
        info.insert("connectivity".to_string(), json!(new_stats.connectivity));
        info
    }

    fn path_coords(&self) -> &[Coord] {
        &self.path_coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stats(regions: usize, path_length: i64, connectivity: u8) -> BinaryStats {
        BinaryStats { regions, path_length, connectivity, path_coords: Vec::new() }
    }

    #[test]
    fn test_defaults() {
        let problem = BinaryProblem::new();
        assert_eq!(problem.max_path_length(), 136);
        assert_eq!(problem.border_idxs().len(), 64);
        let weights = problem.reward_weights();
        assert_relative_eq!(weights.regions, 0.0);
        assert_relative_eq!(weights.path_length, 1.0);
        assert_relative_eq!(weights.connectivity, 136.0);
        assert_eq!(problem.base().probs[&Tile::Solid], 1.0);
        assert!(problem.holes().is_none());
    }

    #[test]
    fn test_max_path_length_formula() {
        assert_eq!(max_path_length(16, 16), 136);
        assert_eq!(max_path_length(3, 4), 10);
        assert_eq!(max_path_length(1, 1), 1);
    }

    #[test]
    fn test_pick_endpoints_skips_adjacent_candidates() {
        let picked = pick_endpoints(&[(0, 3), (0, 4), (0, 2), (5, 0)]);
        assert_eq!(picked, Some(((0, 3), (5, 0))));
        // Diagonal neighbours count as touching.
        assert_eq!(pick_endpoints(&[(0, 1), (1, 0), (0, 2), (1, 2)]), None);
        assert_eq!(pick_endpoints(&[]), None);
    }

    #[test]
    fn test_gen_holes_stores_endpoints() {
        let mut problem = BinaryProblem::new();
        let mut rng = StdRng::seed_from_u64(11);
        let (start, end) = problem.gen_holes(&mut rng).unwrap();
        assert_eq!(problem.holes(), Some((start, end)));
        assert!(chebyshev(start, end) > 1);
    }

    #[test]
    fn test_set_holes_validates() {
        let mut problem = BinaryProblem::new();
        assert!(problem.set_holes((0, 1), (1, 0)).is_err());
        assert!(problem.set_holes((5, 5), (0, 3)).is_err());
        assert!(problem.set_holes((0, 0), (0, 3)).is_err());
        problem.set_holes((0, 1), (17, 16)).unwrap();
        assert_eq!(problem.holes(), Some(((0, 1), (17, 16))));
    }

    #[test]
    fn test_adjust_param_overrides_known_rewards_only() {
        let mut problem = BinaryProblem::new();
        let config = ProblemConfig {
            rewards: Some(HashMap::from([
                ("regions".to_string(), 2.0),
                ("enemies".to_string(), 9.0),
            ])),
            render: Some(true),
            random_probs: Some(false),
            target_path: Some(48),
            ..Default::default()
        };
        problem.adjust_param(&config).unwrap();
        let weights = problem.reward_weights();
        assert_relative_eq!(weights.regions, 2.0);
        assert_relative_eq!(weights.path_length, 1.0);
        assert_relative_eq!(weights.connectivity, 136.0);
        assert!(problem.render_path());
        assert!(!problem.random_probs());
        assert_eq!(problem.target_path(), 48);

        // Path rendering stays on once enabled.
        problem.adjust_param(&ProblemConfig::default()).unwrap();
        assert!(problem.render_path());
    }

    #[test]
    fn test_adjust_param_resizes_border() {
        let mut problem = BinaryProblem::new();
        problem.set_holes((0, 1), (17, 16)).unwrap();
        let config = ProblemConfig { width: Some(4), height: Some(6), ..Default::default() };
        problem.adjust_param(&config).unwrap();
        assert_eq!(problem.border_idxs().len(), 20);
        assert_eq!(problem.max_path_length(), 15);
        assert!(problem.holes().is_none());
    }

    #[test]
    fn test_reset_randomizes_probabilities() {
        let mut problem = BinaryProblem::new();
        let mut rng = StdRng::seed_from_u64(5);
        problem.reset(stats(0, 0, 0), &mut rng);
        let probs = &problem.base().probs;
        assert!((0.0..1.0).contains(&probs[&Tile::Empty]));
        assert_relative_eq!(probs[&Tile::Empty] + probs[&Tile::Solid], 1.0);
        assert_eq!(problem.start_stats(), Some(&stats(0, 0, 0)));
    }

    #[test]
    fn test_reset_keeps_fixed_probabilities() {
        let mut problem = BinaryProblem::new();
        problem
            .adjust_param(&ProblemConfig { random_probs: Some(false), ..Default::default() })
            .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        problem.reset(stats(0, 0, 0), &mut rng);
        assert_eq!(problem.base().probs[&Tile::Empty], 0.0);
        assert_eq!(problem.base().probs[&Tile::Solid], 1.0);
    }

    #[test]
    fn test_get_stats_requires_holes() {
        let mut problem = BinaryProblem::new();
        let map = TileMap::from_elem((18, 18), Tile::Solid);
        assert!(matches!(problem.get_stats(&map), Err(PcgError::Environment(_))));
    }

    #[test]
    fn test_get_stats_rejects_wrong_dimensions() {
        let mut problem = BinaryProblem::new();
        problem.set_holes((0, 1), (17, 16)).unwrap();
        let map = TileMap::from_elem((16, 16), Tile::Solid);
        assert!(matches!(
            problem.get_stats(&map),
            Err(PcgError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_reward_weights_each_term() {
        let problem = BinaryProblem::new();
        // Connecting is worth the longest possible path.
        let reward = problem.get_reward(&stats(1, 10, 1), &stats(1, 10, 0));
        assert_relative_eq!(reward.value(), 136.0);
        // Path growth counts one-for-one; regions are ignored by default.
        let reward = problem.get_reward(&stats(3, 14, 0), &stats(1, 10, 0));
        assert_relative_eq!(reward.value(), 4.0);
    }

    #[test]
    fn test_reward_of_unchanged_stats_is_zero() {
        let problem = BinaryProblem::new();
        for s in [stats(0, 0, 0), stats(1, 136, 1), stats(4, 200, 0)] {
            assert_relative_eq!(problem.get_reward(&s, &s).value(), 0.0);
        }
    }

    #[test]
    fn test_episode_over_needs_every_condition() {
        let problem = BinaryProblem::new();
        let old = stats(0, 0, 0);
        assert!(problem.get_episode_over(&stats(1, 136, 1), &old));
        assert!(!problem.get_episode_over(&stats(2, 136, 1), &old));
        assert!(!problem.get_episode_over(&stats(1, 135, 1), &old));
        assert!(!problem.get_episode_over(&stats(1, 136, 0), &old));
    }

    #[test]
    fn test_debug_info_fields() {
        let problem = BinaryProblem::new();
        let info = problem.get_debug_info(&stats(2, 30, 1), &stats(0, 0, 0));
        assert_eq!(info.len(), 3);
        assert_eq!(info["regions"], json!(2));
        assert_eq!(info["path-length"], json!(30));
        assert_eq!(info["connectivity"], json!(1));
    }

    #[test]
    fn test_stats_as_info_uses_serialized_names() {
        let problem = BinaryProblem::new();
        let mut s = stats(1, 12, 1);
        s.path_coords = vec![(0, 1), (1, 1)];
        let info = problem.stats_as_info(&s).unwrap();
        assert_eq!(info["path-length"], json!(12));
        assert_eq!(info["path-coords"], json!([[0, 1], [1, 1]]));
    }

    #[test]
    fn test_rejected_adjust_leaves_path_rendering_off() {
        let mut problem = BinaryProblem::new();
        let config = ProblemConfig { render: Some(true), width: Some(0), ..Default::default() };
        assert!(matches!(problem.adjust_param(&config), Err(PcgError::Config(_))));
        assert!(!problem.render_path());
        assert_eq!(problem.base().width, 16);
    }
}
