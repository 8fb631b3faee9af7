//! Moving-average smoothing of head positions.
//!
//! Sits between the tracking provider and the [`HeadTracker`](crate::HeadTracker).
//! Each world axis has its own kernel size; a kernel of zero passes that axis
//! through untouched.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::sample::HeadSample;

/// Kernel sizes of the position filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Samples averaged on the X axis.
    pub kernel_x: usize,
    /// Samples averaged on the Y axis.
    pub kernel_y: usize,
    /// Samples averaged on the Z axis.
    pub kernel_z: usize,
}

impl FilterConfig {
    /// A filter that leaves every axis untouched.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            kernel_x: 0,
            kernel_y: 0,
            kernel_z: 0,
        }
    }

    /// Whether any axis is filtered.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.kernel_x > 0 || self.kernel_y > 0 || self.kernel_z > 0
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kernel_x: 5,
            kernel_y: 5,
            kernel_z: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct AxisWindow {
    kernel: usize,
    values: VecDeque<f64>,
}

impl AxisWindow {
    fn new(kernel: usize) -> Self {
        Self {
            kernel,
            values: VecDeque::with_capacity(kernel),
        }
    }

    #[allow(clippy::cast_precision_loss)] // window length is at most the kernel size
    fn push(&mut self, value: f64) -> f64 {
        if self.kernel == 0 {
            return value;
        }
        if self.values.len() == self.kernel {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Per-axis moving-average filter over detected head samples.
///
/// An undetected sample clears the history so the next detection starts
/// fresh instead of averaging against a stale position.
#[derive(Debug, Clone)]
pub struct PositionFilter {
    config: FilterConfig,
    x: AxisWindow,
    y: AxisWindow,
    z: AxisWindow,
}

impl PositionFilter {
    /// Create a filter with default kernels.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FilterConfig::default())
    }

    /// Create a filter with custom kernels.
    #[must_use]
    pub fn with_config(config: FilterConfig) -> Self {
        Self {
            x: AxisWindow::new(config.kernel_x),
            y: AxisWindow::new(config.kernel_y),
            z: AxisWindow::new(config.kernel_z),
            config,
        }
    }

    /// The kernel configuration.
    #[must_use]
    pub const fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Number of samples currently held on the X axis.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.x.values.len()
    }

    /// Filter one sample.
    pub fn apply(&mut self, sample: HeadSample) -> HeadSample {
        if !sample.detected {
            self.reset();
            return sample;
        }

        HeadSample {
            world_x: self.x.push(sample.world_x),
            world_y: self.y.push(sample.world_y),
            world_z: self.z.push(sample.world_z),
            ..sample
        }
    }

    /// Drop all history.
    pub fn reset(&mut self) {
        self.x.clear();
        self.y.clear();
        self.z.clear();
    }
}

impl Default for PositionFilter {
    fn default() -> Self {
        Self::new()
    }
}
