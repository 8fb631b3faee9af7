//! Error types for display calibration.

use thiserror::Error;

/// Result type for calibration operations.
pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// Errors raised while deriving rig parameters from display calibration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// The basic working distance is zero.
    #[error("Working distance must be positive, got {0} mm")]
    InvalidWorkingDistance(u32),

    /// The native view count is zero.
    #[error("Native view count must be positive")]
    NoNativeViews,

    /// Horizontal or vertical resolution is zero.
    #[error("Invalid resolution: {width}x{height}")]
    InvalidResolution {
        /// Horizontal resolution in pixels.
        width: u32,
        /// Vertical resolution in pixels.
        height: u32,
    },

    /// Physical size is zero, negative or not finite.
    #[error("Invalid physical size: {0} inch")]
    InvalidPhysicalSize(f64),

    /// Aperture angle outside `(0, 180)` degrees.
    #[error("Invalid aperture angle: {0} degrees")]
    InvalidApertureAngle(f64),
}
