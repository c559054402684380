//! Error types for the PCGRL core library

use std::path::PathBuf;

use thiserror::Error;

/// Core error type for PCGRL operations
#[derive(Error, Debug)]
pub enum PcgError {
    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Invalid action
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// None of the sampled border cells could serve as an exit.
    ///
    /// Drawing again usually succeeds.
    #[error("No valid endpoint pair among {candidates} sampled border cells")]
    NoValidEndpoints { candidates: usize },

    /// Problem name not present in the registry
    #[error("Unknown problem: {0}")]
    UnknownProblem(String),

    /// A sprite could not be loaded
    #[error("Failed to load asset {path}: {reason}")]
    Asset { path: PathBuf, reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PcgError {
    /// Whether repeating the failed operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoValidEndpoints { .. })
    }
}

/// Result type alias for PCGRL operations
pub type Result<T> = std::result::Result<T, PcgError>;
