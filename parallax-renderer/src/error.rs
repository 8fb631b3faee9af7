//! Renderer error types.

use parallax_core::CalibrationError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while driving the camera rig.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// The focus distance after dolly zoom is not positive.
    #[error("Focus distance must be positive, got {0}")]
    InvalidFocusDistance(f64),

    /// The host has no camera for a view index.
    #[error("View {index} out of range for {capacity} cameras")]
    ViewOutOfRange {
        /// Requested view index.
        index: usize,
        /// Number of cameras the host owns.
        capacity: usize,
    },

    /// The rig configuration is unusable.
    #[error("Invalid rig configuration: {0}")]
    InvalidConfig(String),

    /// Calibration could not be turned into rig parameters.
    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),
}
