//! Tile grids, border rings and random map initialization

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use pcgrl_core::{GridObservation, PcgError, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Grid cell position as `(row, col)`
pub type Coord = (usize, usize);

/// Level grid indexed `[row, col]`
pub type TileMap = Array2<Tile>;

/// Tile kinds of a binary level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tile {
    /// Walkable floor
    Empty,
    /// Wall
    Solid,
}

impl Tile {
    /// All tiles, in observation index order
    pub const ALL: [Tile; 2] = [Tile::Empty, Tile::Solid];

    /// Lowercase tile name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Tile::Empty => "empty",
            Tile::Solid => "solid",
        }
    }

    /// Position of this tile in [`Tile::ALL`]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Tile::Empty => 0,
            Tile::Solid => 1,
        }
    }

    /// Tile for an action or observation index
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tile {
    type Err = PcgError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "empty" => Ok(Tile::Empty),
            "solid" => Ok(Tile::Solid),
            other => Err(PcgError::Config(format!("unknown tile type: {other}"))),
        }
    }
}

/// Chebyshev (king-move) distance between two cells
#[must_use]
pub fn chebyshev(a: Coord, b: Coord) -> usize {
    a.0.abs_diff(b.0).max(a.1.abs_diff(b.1))
}

/// Cells of the one-cell ring around a `height x width` interior, corners
/// excluded, in row-major order of the bordered grid.
#[must_use]
pub fn border_cells(height: usize, width: usize) -> Vec<Coord> {
    let (rows, cols) = (height + 2, width + 2);
    let mut cells = Vec::with_capacity(2 * (height + width));
    for r in 0..rows {
        for c in 0..cols {
            let on_row_edge = (r == 0 || r == rows - 1) && (1..cols - 1).contains(&c);
            let on_col_edge = (c == 0 || c == cols - 1) && (1..rows - 1).contains(&r);
            if on_row_edge || on_col_edge {
                cells.push((r, c));
            }
        }
    }
    cells
}

/// Surround `interior` with a ring of `border` and open the given holes.
///
/// Hole coordinates are in bordered-grid space.
#[must_use]
pub fn bordered(interior: &TileMap, border: Tile, holes: &[Coord]) -> TileMap {
    let (height, width) = interior.dim();
    let mut map = Array2::from_elem((height + 2, width + 2), border);
    map.slice_mut(ndarray::s![1..=height, 1..=width]).assign(interior);
    for &(r, c) in holes {
        if let Some(cell) = map.get_mut((r, c)) {
            *cell = Tile::Empty;
        }
    }
    map
}

/// Sample a `height x width` map, each cell drawn from `probs`.
pub fn random_map(
    rng: &mut dyn RngCore,
    height: usize,
    width: usize,
    probs: &BTreeMap<Tile, f64>,
) -> Result<TileMap> {
    let tiles: Vec<Tile> = probs.keys().copied().collect();
    let dist = WeightedIndex::new(probs.values().copied())
        .map_err(|e| PcgError::Config(format!("invalid tile probabilities: {e}")))?;
    Ok(Array2::from_shape_fn((height, width), |_| tiles[dist.sample(rng)]))
}

/// Observation of a map as tile indices
#[must_use]
pub fn to_observation(map: &TileMap) -> GridObservation {
    let (rows, cols) = map.dim();
    GridObservation {
        data: map.iter().map(|t| t.index() as f64).collect(),
        rows,
        cols,
    }
}

/// Parse an ASCII level, `.` for empty and `#` for solid
pub fn parse_map(text: &str) -> Result<TileMap> {
    let rows: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let cols = rows.first().map_or(0, |r| r.chars().count());
    let mut cells = Vec::with_capacity(rows.len() * cols);
    for row in &rows {
        if row.chars().count() != cols {
            return Err(PcgError::DimensionMismatch {
                expected: cols,
                actual: row.chars().count(),
            });
        }
        for ch in row.chars() {
            cells.push(match ch {
                '.' => Tile::Empty,
                '#' => Tile::Solid,
                other => return Err(PcgError::Config(format!("unknown map glyph: {other:?}"))),
            });
        }
    }
    Array2::from_shape_vec((rows.len(), cols), cells)
        .map_err(|e| PcgError::Environment(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_border_ring_skips_corners() {
        let cells = border_cells(16, 16);
        assert_eq!(cells.len(), 64);
        for corner in [(0, 0), (0, 17), (17, 0), (17, 17)] {
            assert!(!cells.contains(&corner));
        }
        assert!(cells.contains(&(0, 1)));
        assert!(cells.contains(&(16, 17)));
    }

    #[test]
    fn test_bordered_opens_holes() {
        let interior = Array2::from_elem((3, 4), Tile::Solid);
        let map = bordered(&interior, Tile::Solid, &[(0, 2), (4, 3)]);
        assert_eq!(map.dim(), (5, 6));
        assert_eq!(map[(0, 2)], Tile::Empty);
        assert_eq!(map[(4, 3)], Tile::Empty);
        assert_eq!(map.iter().filter(|&&t| t == Tile::Empty).count(), 2);
    }

    #[test]
    fn test_random_map_respects_certain_probabilities() {
        let mut rng = StdRng::seed_from_u64(9);
        let probs = BTreeMap::from([(Tile::Empty, 0.0), (Tile::Solid, 1.0)]);
        let map = random_map(&mut rng, 16, 16, &probs).unwrap();
        assert!(map.iter().all(|&t| t == Tile::Solid));
    }

    #[test]
    fn test_random_map_rejects_zero_weights() {
        let mut rng = StdRng::seed_from_u64(9);
        let probs = BTreeMap::from([(Tile::Empty, 0.0), (Tile::Solid, 0.0)]);
        assert!(random_map(&mut rng, 2, 2, &probs).is_err());
    }

    #[test]
    fn test_chebyshev() {
        assert_eq!(chebyshev((0, 1), (1, 0)), 1);
        assert_eq!(chebyshev((0, 1), (0, 3)), 2);
        assert_eq!(chebyshev((5, 5), (5, 5)), 0);
    }

    #[test]
    fn test_parse_map_and_observation() {
        let map = parse_map("#.#\n...\n").unwrap();
        assert_eq!(map.dim(), (2, 3));
        assert_eq!(map[(0, 1)], Tile::Empty);
        let obs = to_observation(&map);
        assert_eq!(obs.data, vec![1.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        assert!(parse_map("##\n#\n").is_err());
    }

    #[test]
    fn test_tile_names_round_trip() {
        for tile in Tile::ALL {
            assert_eq!(tile.name().parse::<Tile>().unwrap(), tile);
            assert_eq!(Tile::from_index(tile.index()), Some(tile));
        }
        assert!("lava".parse::<Tile>().is_err());
    }
}
