//! Simulator error types.

use std::path::PathBuf;

use parallax_renderer::RenderError;
use thiserror::Error;

/// Errors raised by the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// Camera rig or host failure.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// The calibration file could not be read.
    #[error("Failed to read calibration {path}: {source}")]
    CalibrationIo {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The calibration file is not valid calibration JSON.
    #[error("Failed to parse calibration {path}: {source}")]
    CalibrationParse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A requested index map preset does not exist.
    #[error("Unknown index map: {0}")]
    UnknownIndexMap(String),

    /// Writing a frame report failed.
    #[error("Failed to write frame report: {0}")]
    Report(#[from] std::io::Error),

    /// Serializing a frame report failed.
    #[error("Failed to serialize frame report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for simulator operations.
pub type SimResult<T> = std::result::Result<T, SimError>;
