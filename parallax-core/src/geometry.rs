//! Per-view camera geometry for multi-view rigs.
//!
//! A bank of N pinhole cameras emulates parallax from one moving viewer: each
//! camera is moved sideways by its view offset and its projection is sheared
//! so that all frusta meet on the focus plane.
//!
//! ```text
//!   focus plane ───────┬───────────────┬───────
//!                     ╱ ╲             ╱ ╲
//!                    ╱   ╲  sheared  ╱   ╲
//!                   ╱     ╲ frusta  ╱     ╲
//!                  ●       ●       ●       ●   cameras
//!                -1.5s   -0.5s   +0.5s   +1.5s  (4 views, mirror = true)
//! ```

use crate::spatial::Mat4;

/// Smallest dolly zoom factor (fully zoomed in to the focus plane).
pub const MIN_DOLLY_ZOOM: f64 = 0.001;

/// Largest dolly zoom factor (fully zoomed out).
pub const MAX_DOLLY_ZOOM: f64 = 3.0;

/// Lateral offset of camera `view_index` in a rig of `total_views` cameras.
///
/// Views straddle the center line symmetrically: an odd rig has a camera
/// exactly on the center, an even rig places the two middle cameras half a
/// separation to either side. With `mirror == false` the sign is flipped so
/// that view 0 lands on the positive side.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)] // view counts are tiny
pub fn view_offset(view_index: usize, total_views: usize, separation: f64, mirror: bool) -> f64 {
    let even = total_views % 2 == 0;

    let mut centered = view_index as i64 - (total_views / 2) as i64;
    if even && centered >= 0 {
        centered += 1;
    }

    let mut offset = centered as f64 * separation;

    if even {
        let correction = separation / 2.0;
        if centered > 0 {
            offset -= correction;
        } else {
            offset += correction;
        }
    }

    let flip = if mirror { 1.0 } else { -1.0 };
    flip * offset
}

/// The asymmetric-frustum shear for one view, applied to `base`.
///
/// The shear moves clip-space X/Y proportionally to depth so the view's
/// frustum stays centered on the focus plane point in front of the rig:
/// `[0,2] = -(local_offset + head_x) / focus_distance` and
/// `[1,2] = -head_y / focus_distance`. Returns `base * shear`.
///
/// # Panics
///
/// Panics if `focus_distance` is not strictly positive.
#[must_use]
pub fn projection_shear(
    local_offset: f64,
    head_x: f64,
    head_y: f64,
    focus_distance: f64,
    base: &Mat4,
) -> Mat4 {
    assert!(
        focus_distance > 0.0,
        "focus distance must be positive, got {focus_distance}"
    );

    let horizontal = -(local_offset + head_x) / focus_distance;
    let vertical = -head_y / focus_distance;

    let mut shear = Mat4::identity();
    shear.set(0, 2, horizontal);
    shear.set(1, 2, vertical);

    base.mul(&shear)
}

/// Dolly zoom: keeps framing on the focus plane constant while the camera
/// distance changes.
///
/// A factor of 1 is no dolly, values towards [`MIN_DOLLY_ZOOM`] zoom into the
/// focus plane, values towards [`MAX_DOLLY_ZOOM`] zoom out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DollyZoom {
    factor: f64,
}

impl DollyZoom {
    /// Create a dolly zoom, clamping `factor` to the supported range.
    #[must_use]
    pub fn new(factor: f64) -> Self {
        let clamped = if factor.is_nan() {
            1.0
        } else {
            factor.clamp(MIN_DOLLY_ZOOM, MAX_DOLLY_ZOOM)
        };
        if (clamped - factor).abs() > f64::EPSILON {
            tracing::warn!(
                "Dolly zoom factor {} outside [{}, {}], using {}",
                factor,
                MIN_DOLLY_ZOOM,
                MAX_DOLLY_ZOOM,
                clamped
            );
        }
        Self { factor: clamped }
    }

    /// The dolly zoom factor.
    #[must_use]
    pub const fn factor(&self) -> f64 {
        self.factor
    }

    /// Effective focus distance for a base focus distance `d`.
    ///
    /// Computed as `d - (d - d * factor)` in two steps; existing calibrations
    /// depend on this exact rounding.
    #[must_use]
    pub fn focus_distance(&self, base_focus_distance: f64) -> f64 {
        let dolly_offset = base_focus_distance - base_focus_distance * self.factor;
        base_focus_distance - dolly_offset
    }

    /// Vertical field of view in degrees that keeps `half_width_at_start`
    /// framed at `focus_distance`.
    #[must_use]
    pub fn field_of_view_degrees(half_width_at_start: f64, focus_distance: f64) -> f64 {
        (2.0 * (half_width_at_start / focus_distance).atan()).to_degrees()
    }
}

impl Default for DollyZoom {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

/// Half the frame height visible on the focus plane for a field of view in
/// degrees.
#[must_use]
pub fn half_width_at_focus(field_of_view_degrees: f64, focus_distance: f64) -> f64 {
    (field_of_view_degrees.to_radians() / 2.0).tan() * focus_distance
}
