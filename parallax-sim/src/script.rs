//! Scripted head motion standing in for a real tracking camera.
//!
//! The head sways sideways on a sine, bobs vertically at twice the rate and
//! drops out of view for a fixed time at the end of every dropout period.
//! Readings are produced in the tracker's millimeter frame and converted with
//! [`HeadSample::from_tracker_millimeters`].

use std::f64::consts::TAU;
use std::time::Duration;

use parallax_core::HeadSample;
use serde::{Deserialize, Serialize};

/// Width of the simulated tracking camera image in pixels.
const IMAGE_WIDTH: f64 = 640.0;
/// Height of the simulated tracking camera image in pixels.
const IMAGE_HEIGHT: f64 = 480.0;
/// Millimeters of head travel per image pixel.
const MILLIMETERS_PER_PIXEL: f64 = 1.5;

/// Shape of the scripted head motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Peak sideways displacement in millimeters.
    pub sway_amplitude_mm: f64,
    /// Duration of one full sway.
    pub sway_period: Duration,
    /// Head distance from the display in millimeters.
    pub distance_mm: f64,
    /// Time between the starts of two dropouts. Zero disables dropouts.
    pub dropout_every: Duration,
    /// How long the head stays undetected in each period.
    pub dropout_length: Duration,
    /// Scene units per real-world meter.
    pub scene_scale: f64,
    /// Extra scale on the lateral head motion.
    pub head_tracking_scale: f64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            sway_amplitude_mm: 120.0,
            sway_period: Duration::from_secs(4),
            distance_mm: 700.0,
            dropout_every: Duration::from_secs(6),
            dropout_length: Duration::from_secs(1),
            scene_scale: 1.0,
            head_tracking_scale: 1.0,
        }
    }
}

/// Deterministic head trajectory sampled by elapsed time.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHead {
    config: ScriptConfig,
}

impl ScriptedHead {
    /// Create a scripted head.
    #[must_use]
    pub const fn new(config: ScriptConfig) -> Self {
        Self { config }
    }

    /// Get the script configuration.
    #[must_use]
    pub const fn config(&self) -> &ScriptConfig {
        &self.config
    }

    /// Whether the head is out of view at `elapsed`.
    #[must_use]
    pub fn is_dropped_out(&self, elapsed: Duration) -> bool {
        let every = self.config.dropout_every.as_secs_f64();
        let length = self.config.dropout_length.as_secs_f64();
        if every <= 0.0 || length <= 0.0 {
            return false;
        }
        let phase = elapsed.as_secs_f64() % every;
        phase >= every - length
    }

    /// Raw tracker reading at `elapsed`, in millimeters.
    #[must_use]
    pub fn reading_mm(&self, elapsed: Duration) -> [f64; 3] {
        let period = self.config.sway_period.as_secs_f64();
        let phase = if period > 0.0 {
            TAU * elapsed.as_secs_f64() / period
        } else {
            0.0
        };
        let amplitude = self.config.sway_amplitude_mm;
        [
            amplitude * phase.sin(),
            amplitude * 0.25 * (2.0 * phase).sin(),
            self.config.distance_mm,
        ]
    }

    /// Head sample at `elapsed`.
    #[must_use]
    pub fn sample_at(&self, elapsed: Duration) -> HeadSample {
        let reading = self.reading_mm(elapsed);
        let detected = !self.is_dropped_out(elapsed);
        let sample = HeadSample::from_tracker_millimeters(
            detected,
            reading,
            self.config.scene_scale,
            self.config.head_tracking_scale,
        );
        if !detected {
            return sample;
        }

        let [x_mm, y_mm, _] = reading;
        let pixel_x = (IMAGE_WIDTH / 2.0 + x_mm / MILLIMETERS_PER_PIXEL).clamp(0.0, IMAGE_WIDTH);
        let pixel_y = (IMAGE_HEIGHT / 2.0 - y_mm / MILLIMETERS_PER_PIXEL).clamp(0.0, IMAGE_HEIGHT);
        // clamped to the image size above
        #[allow(clippy::cast_possible_truncation)]
        let (pixel_x, pixel_y) = (pixel_x.round() as i32, pixel_y.round() as i32);
        sample.with_image_position(pixel_x, pixel_y)
    }
}
