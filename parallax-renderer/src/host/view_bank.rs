//! In-memory rendering host.
//!
//! Holds a main lens and a fixed bank of view cameras without drawing
//! anything. Used by the simulator and by tests to observe exactly what the
//! rig hands to a host.

use parallax_core::{Mat4, RigMode, Vec3};
use serde::{Deserialize, Serialize};

use crate::{RenderError, RenderResult};

use super::{RenderHost, ViewPose};

/// Main camera lens shared by every view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    /// Vertical field of view in degrees.
    pub field_of_view_degrees: f64,
    /// Width over height of one view.
    pub aspect: f64,
    /// Near clip plane distance.
    pub near_clip: f64,
    /// Far clip plane distance.
    pub far_clip: f64,
}

impl Lens {
    /// Perspective projection of this lens.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective(
            self.field_of_view_degrees.to_radians(),
            self.aspect,
            self.near_clip,
            self.far_clip,
        )
    }
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            field_of_view_degrees: 16.0,
            aspect: 16.0 / 9.0,
            near_clip: 0.1,
            far_clip: 100.0,
        }
    }
}

/// State of one view camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewCamera {
    /// Field of view copied from the lens.
    pub field_of_view_degrees: f64,
    /// Near clip plane copied from the lens.
    pub near_clip: f64,
    /// Far clip plane copied from the lens.
    pub far_clip: f64,
    /// Lateral offset from the rig center.
    pub local_offset: f64,
    /// Current projection matrix.
    pub projection: Mat4,
    /// Whether the camera renders this frame.
    pub active: bool,
}

impl ViewCamera {
    fn idle(lens: &Lens) -> Self {
        Self {
            field_of_view_degrees: lens.field_of_view_degrees,
            near_clip: lens.near_clip,
            far_clip: lens.far_clip,
            local_offset: 0.0,
            projection: lens.projection(),
            active: false,
        }
    }
}

/// A bank of view cameras that records every pose it receives.
#[derive(Debug, Clone)]
pub struct ViewBank {
    lens: Lens,
    rig_position: Vec3,
    cameras: Vec<ViewCamera>,
    poses_applied: u64,
}

impl ViewBank {
    /// Create a bank with the maximum number of cameras and a default lens.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lens(Lens::default(), RigMode::MAX_VIEWS)
    }

    /// Create a bank with `capacity` cameras.
    #[must_use]
    pub fn with_lens(lens: Lens, capacity: usize) -> Self {
        Self {
            lens,
            rig_position: Vec3::zero(),
            cameras: vec![ViewCamera::idle(&lens); capacity],
            poses_applied: 0,
        }
    }

    /// The main lens.
    #[must_use]
    pub const fn lens(&self) -> &Lens {
        &self.lens
    }

    /// Current rig center.
    #[must_use]
    pub const fn rig_position(&self) -> Vec3 {
        self.rig_position
    }

    /// All cameras, active or not.
    #[must_use]
    pub fn cameras(&self) -> &[ViewCamera] {
        &self.cameras
    }

    /// Camera at `index`.
    #[must_use]
    pub fn camera(&self, index: usize) -> Option<&ViewCamera> {
        self.cameras.get(index)
    }

    /// Number of active cameras.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.cameras.iter().filter(|camera| camera.active).count()
    }

    /// Total poses applied since creation.
    #[must_use]
    pub const fn poses_applied(&self) -> u64 {
        self.poses_applied
    }
}

impl Default for ViewBank {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderHost for ViewBank {
    fn view_capacity(&self) -> usize {
        self.cameras.len()
    }

    fn set_field_of_view(&mut self, field_of_view_degrees: f64) {
        self.lens.field_of_view_degrees = field_of_view_degrees;
    }

    fn base_projection(&self) -> Mat4 {
        self.lens.projection()
    }

    fn set_rig_position(&mut self, position: Vec3) {
        self.rig_position = position;
    }

    fn apply_view(&mut self, pose: &ViewPose) -> RenderResult<()> {
        let capacity = self.cameras.len();
        let camera = self
            .cameras
            .get_mut(pose.index)
            .ok_or(RenderError::ViewOutOfRange {
                index: pose.index,
                capacity,
            })?;

        camera.field_of_view_degrees = self.lens.field_of_view_degrees;
        camera.near_clip = self.lens.near_clip;
        camera.far_clip = self.lens.far_clip;
        camera.local_offset = pose.lateral_offset;
        camera.projection = pose.projection;
        camera.active = true;
        self.poses_applied += 1;

        tracing::trace!(
            "View {} offset {:.5} at fov {:.3}",
            pose.index,
            pose.lateral_offset,
            camera.field_of_view_degrees
        );
        Ok(())
    }

    fn set_active_views(&mut self, count: usize) {
        for (index, camera) in self.cameras.iter_mut().enumerate() {
            camera.active = index < count;
        }
    }
}
