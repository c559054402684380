//! Action representations and action spaces

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for actions in an RL environment
pub trait Action: Clone + Debug + Send + Sync {
    /// Convert action to a vector representation
    fn to_vec(&self) -> Vec<f64>;
}

/// Trait for defining action spaces
pub trait ActionSpace: Send + Sync {
    /// The type of actions in this space
    type Action: Action;

    /// Sample a random action from the space
    fn sample(&self, rng: &mut dyn RngCore) -> Self::Action;

    /// Check if an action is valid within this space
    fn contains(&self, action: &Self::Action) -> bool;

    /// Get the dimensionality of the action space
    fn dim(&self) -> Option<usize>;
}

/// One choice per sub-space, e.g. `[x, y, tile]` for a wide level editor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultiDiscreteAction(pub Vec<usize>);

impl Action for MultiDiscreteAction {
    fn to_vec(&self) -> Vec<f64> {
        self.0.iter().map(|&v| v as f64).collect()
    }
}

/// Product of discrete spaces, each `0..nvec[i]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiDiscreteSpace {
    /// Number of choices along each dimension
    pub nvec: Vec<usize>,
}

impl MultiDiscreteSpace {
    /// Create a new multi-discrete space
    pub fn new(nvec: Vec<usize>) -> crate::Result<Self> {
        if nvec.iter().any(|&n| n == 0) {
            return Err(crate::PcgError::Config(format!(
                "every dimension needs at least one choice, got {nvec:?}"
            )));
        }
        Ok(Self { nvec })
    }
}

impl ActionSpace for MultiDiscreteSpace {
    type Action = MultiDiscreteAction;

    fn sample(&self, rng: &mut dyn RngCore) -> Self::Action {
        MultiDiscreteAction(self.nvec.iter().map(|&n| rng.gen_range(0..n)).collect())
    }

    fn contains(&self, action: &Self::Action) -> bool {
        action.0.len() == self.nvec.len() && action.0.iter().zip(&self.nvec).all(|(a, n)| a < n)
    }

    fn dim(&self) -> Option<usize> {
        Some(self.nvec.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_samples_are_contained() {
        let space = MultiDiscreteSpace::new(vec![16, 16, 2]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let action = space.sample(&mut rng);
            assert!(space.contains(&action));
        }
        assert_eq!(space.dim(), Some(3));
    }

    #[test]
    fn test_contains_rejects_bad_actions() {
        let space = MultiDiscreteSpace::new(vec![4, 4, 2]).unwrap();
        assert!(!space.contains(&MultiDiscreteAction(vec![4, 0, 0])));
        assert!(!space.contains(&MultiDiscreteAction(vec![0, 0])));
        assert!(space.contains(&MultiDiscreteAction(vec![3, 3, 1])));
    }

    #[test]
    fn test_empty_dimension_rejected() {
        assert!(MultiDiscreteSpace::new(vec![4, 0]).is_err());
    }

    #[test]
    fn test_to_vec() {
        assert_eq!(MultiDiscreteAction(vec![1, 2, 0]).to_vec(), vec![1.0, 2.0, 0.0]);
    }
}
