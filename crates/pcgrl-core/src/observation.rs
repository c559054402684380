//! Observation representations and observation spaces

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for observations from an environment
pub trait Observation: Clone + Debug + Send + Sync {
    /// Convert observation to a feature vector
    fn to_vec(&self) -> Vec<f64>;

    /// Get the shape of the observation
    fn shape(&self) -> Vec<usize>;
}

/// Trait for defining observation spaces
pub trait ObservationSpace: Send + Sync {
    /// The type of observations in this space
    type Observation: Observation;

    /// Sample a random observation from the space
    fn sample(&self, rng: &mut dyn RngCore) -> Self::Observation;

    /// Check if an observation is valid within this space
    fn contains(&self, obs: &Self::Observation) -> bool;

    /// Get the shape of observations in this space
    fn shape(&self) -> Vec<usize>;
}

/// Grid observation: one categorical value per cell, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridObservation {
    /// Cell values (flattened, row-major)
    pub data: Vec<f64>,
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
}

impl GridObservation {
    /// Value at `(row, col)`
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }
}

impl Observation for GridObservation {
    fn to_vec(&self) -> Vec<f64> {
        self.data.clone()
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.rows, self.cols]
    }
}

/// Space of `rows x cols` grids holding integers in `0..n_values`
#[derive(Debug, Clone)]
pub struct GridObservationSpace {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Number of distinct cell values
    pub n_values: usize,
}

impl GridObservationSpace {
    /// Create a new grid observation space
    pub fn new(rows: usize, cols: usize, n_values: usize) -> crate::Result<Self> {
        if n_values == 0 {
            return Err(crate::PcgError::Config(
                "grid observation space needs at least one value".to_string(),
            ));
        }
        Ok(Self { rows, cols, n_values })
    }
}

impl ObservationSpace for GridObservationSpace {
    type Observation = GridObservation;

    fn sample(&self, rng: &mut dyn RngCore) -> Self::Observation {
        let data = (0..self.rows * self.cols)
            .map(|_| rng.gen_range(0..self.n_values) as f64)
            .collect();

        GridObservation {
            data,
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn contains(&self, obs: &Self::Observation) -> bool {
        obs.rows == self.rows
            && obs.cols == self.cols
            && obs.data.len() == self.rows * self.cols
            && obs
                .data
                .iter()
                .all(|&v| v >= 0.0 && v < self.n_values as f64 && v.fract() == 0.0)
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.rows, self.cols]
    }
}
