//! # Error Types for Weave
//!
//! Unified error handling across the weave crates.
//!
//! Configuration errors abort setup; contract errors point at a defect in the
//! code driving a query session, not at user input.

use thiserror::Error;

/// Main error type for weave operations
#[derive(Error, Debug)]
pub enum WeaveError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Per-layer size list does not match the substrate depth
    #[error("Configuration error: {key} lists {actual} layer sizes but depth is {depth}")]
    LayerCount {
        key: &'static str,
        actual: usize,
        depth: usize,
    },

    /// Custom neuron position table has the wrong number of entries
    #[error("Configuration error: {source_name} gives {actual} neuron positions for layer {layer}, expected {expected}")]
    PositionCount {
        layer: usize,
        expected: usize,
        actual: usize,
        source_name: &'static str,
    },

    /// A layer was left for the dimension provider, which could not size it
    #[error("Configuration error: dimensions of layer {0} are externally determined but no provider supplies them")]
    UndeterminedLayer(usize),

    /// Caller-contract violation
    #[error("Contract violation: {0}")]
    Contract(String),

    /// Pattern network transcription or activation error
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for weave operations
pub type WeaveResult<T> = Result<T, WeaveError>;

impl WeaveError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a contract error
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    /// Create a transcription error
    pub fn transcription(msg: impl Into<String>) -> Self {
        Self::Transcription(msg.into())
    }

    /// True for every variant raised while resolving configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::LayerCount { .. }
                | Self::PositionCount { .. }
                | Self::UndeterminedLayer(_)
        )
    }
}

impl From<serde_json::Error> for WeaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
