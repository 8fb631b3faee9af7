//! Head-position samples and the latest-sample slot.
//!
//! The tracking provider runs on its own thread and publishes into a
//! [`SampleSlot`]. The frame loop reads one consistent snapshot per frame with
//! [`SampleSlot::latest`]; nothing in the core ever registers a callback.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::spatial::Vec3;

const MILLIMETERS_PER_METER: f64 = 1000.0;

/// One head-position sample from the tracking provider.
///
/// World coordinates are in meters relative to the display center, with the
/// viewer on the negative Z side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadSample {
    /// Whether a head was detected in this sample.
    pub detected: bool,
    /// Whether `image_x` / `image_y` hold a valid camera-image position.
    pub image_valid: bool,
    /// Horizontal position in the tracking camera image, in pixels.
    pub image_x: i32,
    /// Vertical position in the tracking camera image, in pixels.
    pub image_y: i32,
    /// World X position in meters.
    pub world_x: f64,
    /// World Y position in meters.
    pub world_y: f64,
    /// World Z position in meters.
    pub world_z: f64,
}

impl HeadSample {
    /// A detected head at the given world position (no image position).
    #[must_use]
    pub const fn detected_at(world_x: f64, world_y: f64, world_z: f64) -> Self {
        Self {
            detected: true,
            image_valid: false,
            image_x: 0,
            image_y: 0,
            world_x,
            world_y,
            world_z,
        }
    }

    /// No head detected; the position rests at the centered pose.
    #[must_use]
    pub fn not_detected(focus_distance: f64) -> Self {
        Self {
            detected: false,
            image_valid: false,
            image_x: 0,
            image_y: 0,
            world_x: 0.0,
            world_y: 0.0,
            world_z: -focus_distance,
        }
    }

    /// Convert a raw tracker reading in millimeters to scene meters.
    ///
    /// The tracker's X and Z axes point the other way than the display's.
    /// X and Y are scaled by `scene_scale * head_tracking_scale`, Z by
    /// `scene_scale` alone so head tracking strength never changes depth.
    #[must_use]
    pub fn from_tracker_millimeters(
        detected: bool,
        [x_mm, y_mm, z_mm]: [f64; 3],
        scene_scale: f64,
        head_tracking_scale: f64,
    ) -> Self {
        let lateral = scene_scale * head_tracking_scale;
        Self {
            detected,
            image_valid: false,
            image_x: 0,
            image_y: 0,
            world_x: -x_mm / MILLIMETERS_PER_METER * lateral,
            world_y: y_mm / MILLIMETERS_PER_METER * lateral,
            world_z: -z_mm / MILLIMETERS_PER_METER * scene_scale,
        }
    }

    /// Attach a camera-image position to this sample.
    #[must_use]
    pub fn with_image_position(mut self, x: i32, y: i32) -> Self {
        self.image_valid = true;
        self.image_x = x;
        self.image_y = y;
        self
    }

    /// World position as a vector.
    #[must_use]
    pub const fn world_position(&self) -> Vec3 {
        Vec3::new(self.world_x, self.world_y, self.world_z)
    }
}

impl Default for HeadSample {
    fn default() -> Self {
        Self::not_detected(crate::calibration::DEFAULT_FOCUS_DISTANCE)
    }
}

/// Thread-safe holder of the most recent head sample.
///
/// Cloning yields another handle to the same slot, so the provider thread and
/// the frame loop can each own one.
///
/// ```
/// use parallax_core::{HeadSample, SampleSlot};
///
/// let slot = SampleSlot::new();
/// let writer = slot.clone();
/// writer.publish(HeadSample::detected_at(0.1, 0.0, -0.7));
///
/// assert!(slot.latest().detected);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SampleSlot {
    latest: Arc<RwLock<HeadSample>>,
}

impl SampleSlot {
    /// Create a slot holding an undetected default sample.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot holding `sample`.
    #[must_use]
    pub fn with_sample(sample: HeadSample) -> Self {
        Self {
            latest: Arc::new(RwLock::new(sample)),
        }
    }

    /// Replace the stored sample.
    pub fn publish(&self, sample: HeadSample) {
        let mut latest = self
            .latest
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *latest = sample;
    }

    /// Snapshot of the most recent sample.
    #[must_use]
    pub fn latest(&self) -> HeadSample {
        *self
            .latest
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
