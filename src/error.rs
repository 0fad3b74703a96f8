//! Error types for the layout pipeline

use thiserror::Error;

/// Failure raised while measuring or laying out text.
///
/// Degenerate geometry and a missing measurement backend are not errors; they
/// are handled by forced progress and heuristic metrics. What remains are
/// values that make layout meaningless.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("page geometry contains a non-finite value")]
    NonFiniteGeometry,

    #[error("line height must be positive and finite, got {0}px")]
    InvalidLineHeight(f32),

    #[error("text measurement returned {width} for a run of {len} bytes")]
    NonFiniteMeasurement { width: f32, len: usize },
}

/// Failure parsing a host-provided configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}
