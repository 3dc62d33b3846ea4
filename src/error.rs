//! Simulation error types.
//!
//! # Error Classification
//!
//! - **Invalid input**: a caller broke a precondition (empty population, no
//!   topics, mismatched vector dimensions). These propagate out of the
//!   generation, interaction and analysis entry points.
//! - **Degenerate configuration**: handled by documented fallbacks inside the
//!   engine and logged with `tracing::warn!`, never surfaced as an error.
//! - **Strategy failure**: a user-supplied topic strategy reported a problem.
//!   The topic generator absorbs it and falls back to the standard path.

use thiserror::Error;

/// Opinion-dynamics engine errors.
#[derive(Error, Debug)]
pub enum SimError {
    /// A precondition on the input data was violated.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two vectors (or a vector and the configured dimension) disagree in length.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected vector length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// The agent population is empty.
    #[error("Agent population is empty")]
    EmptyPopulation,

    /// The topic set is empty.
    #[error("Topic set is empty")]
    NoTopics,

    /// A node index does not address an agent in the matrix.
    #[error("Node {node} out of range for {len} agents")]
    NodeOutOfRange {
        /// Requested node index.
        node: usize,
        /// Number of agents in the matrix.
        len: usize,
    },

    /// A user-supplied topic generation strategy failed.
    #[error("Topic strategy error: {0}")]
    Strategy(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, SimError>;

impl From<toml::de::Error> for SimError {
    fn from(err: toml::de::Error) -> Self {
        SimError::Config(err.to_string())
    }
}

impl SimError {
    /// Build a [`SimError::DimensionMismatch`].
    pub fn dimension(expected: usize, actual: usize) -> Self {
        SimError::DimensionMismatch { expected, actual }
    }
}
