//! Rendering host seam.
//!
//! The rig computes geometry; a host owns the actual cameras. Engines adapt
//! their camera objects by implementing [`RenderHost`].

pub mod view_bank;

pub use view_bank::{Lens, ViewBank, ViewCamera};

use parallax_core::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::RenderResult;

/// Geometry computed for one view camera in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPose {
    /// View index within the rig.
    pub index: usize,
    /// Lateral offset from the rig center in meters.
    pub lateral_offset: f64,
    /// Sheared projection matrix.
    pub projection: Mat4,
}

/// Trait for rendering hosts that own the view cameras.
pub trait RenderHost {
    /// Number of view cameras the host owns.
    fn view_capacity(&self) -> usize;

    /// Set the main camera's vertical field of view in degrees. Every view
    /// camera copies it.
    fn set_field_of_view(&mut self, field_of_view_degrees: f64);

    /// Unsheared projection of the main camera.
    fn base_projection(&self) -> Mat4;

    /// Move the rig center.
    fn set_rig_position(&mut self, position: Vec3);

    /// Apply the pose for one view camera.
    ///
    /// # Errors
    ///
    /// Returns an error if the host has no camera for `pose.index`.
    fn apply_view(&mut self, pose: &ViewPose) -> RenderResult<()>;

    /// Enable the first `count` view cameras and disable the rest.
    fn set_active_views(&mut self, count: usize);
}
