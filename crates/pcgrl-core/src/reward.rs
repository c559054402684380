//! Reward signals and delta-reward helpers

use serde::{Deserialize, Serialize};

/// Reward signal from the environment
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Reward(pub f64);

impl Reward {
    /// Create a new reward
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the reward value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Reward> for f64 {
    fn from(reward: Reward) -> Self {
        reward.0
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::Mul<f64> for Reward {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

impl std::iter::Sum for Reward {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, r| acc + r)
    }
}

/// Reward for moving a statistic from `old` to `new` relative to the target
/// interval `[low, high]`.
///
/// Progress toward the interval is positive, moving away is negative, and
/// movement inside the interval is worth nothing. Overshooting from below
/// the interval to above it is charged for the excess on both sides.
#[must_use]
pub fn range_reward(new: f64, old: f64, low: f64, high: f64) -> f64 {
    let inside = |v: f64| v >= low && v <= high;
    if inside(new) && inside(old) {
        return 0.0;
    }
    if old <= high && new <= high {
        return new.min(low) - old.min(low);
    }
    if old >= low && new >= low {
        return old.max(high) - new.max(high);
    }
    if new > high && old < low {
        return high - new + old - low;
    }
    // new < low && old > high
    high - old + new - low
}
