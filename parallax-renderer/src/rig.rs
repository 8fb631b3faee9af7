//! # Camera Rig
//!
//! Per-frame orchestration of the multi-view camera rig.
//!
//! Each frame the rig:
//!
//! 1. feeds the latest head sample through the optional position filter and
//!    the head tracker (diorama mode only),
//! 2. derives the focus distance from the target depth and applies the dolly
//!    zoom to it,
//! 3. sets the host's field of view so framing on the focus plane is kept,
//! 4. computes the offset and sheared projection for every view and hands
//!    them to the host.
//!
//! ```text
//!   HeadSample ─▶ PositionFilter ─▶ HeadTracker ─▶ RigTarget
//!                                                    │
//!          RenderHost ◀── ViewPose × N ◀── view_offset + projection_shear
//! ```

use std::time::{Duration, Instant};

use parallax_core::{
    projection_shear, view_offset, Calibration, DollyZoom, FilterConfig, HeadSample, HeadTracker,
    PositionFilter, RigParameters, RigTarget, TrackingConfig, TrackingState, Vec3,
};
use serde::{Deserialize, Serialize};

pub use parallax_core::RigMode;

use crate::host::{RenderHost, ViewPose};
use crate::{RenderError, RenderResult};

/// Largest supported view offset scale.
pub const MAX_VIEW_OFFSET_SCALE: f64 = 5.0;

/// Configuration of the camera rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigConfig {
    /// How the rig is driven.
    pub mode: RigMode,
    /// Number of cameras (1 to [`RigMode::MAX_VIEWS`]).
    pub view_count: usize,
    /// Flip the view order horizontally.
    pub mirror_views: bool,
    /// Scene units per real-world meter.
    pub scene_scale_factor: f64,
    /// Extra scale on the view separation only.
    pub view_offset_scale: f64,
    /// Dolly zoom factor, clamped to the supported range.
    pub dolly_zoom: f64,
    /// Head tracker timing.
    pub tracking: TrackingConfig,
    /// Head position smoothing.
    pub filter: FilterConfig,
}

impl RigConfig {
    /// Defaults for `mode`.
    #[must_use]
    pub fn for_mode(mode: RigMode) -> Self {
        Self {
            mode,
            view_count: mode.default_view_count(),
            ..Self::default()
        }
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> RenderResult<()> {
        if self.view_count == 0 || self.view_count > RigMode::MAX_VIEWS {
            return Err(RenderError::InvalidConfig(format!(
                "view count {} outside 1..={}",
                self.view_count,
                RigMode::MAX_VIEWS
            )));
        }
        if !self.scene_scale_factor.is_finite() || self.scene_scale_factor <= 0.0 {
            return Err(RenderError::InvalidConfig(format!(
                "scene scale factor {} must be positive",
                self.scene_scale_factor
            )));
        }
        if !(0.0..=MAX_VIEW_OFFSET_SCALE).contains(&self.view_offset_scale) {
            return Err(RenderError::InvalidConfig(format!(
                "view offset scale {} outside 0..={}",
                self.view_offset_scale, MAX_VIEW_OFFSET_SCALE
            )));
        }
        Ok(())
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            mode: RigMode::Diorama,
            view_count: RigMode::Diorama.default_view_count(),
            mirror_views: false,
            scene_scale_factor: 1.0,
            view_offset_scale: 1.0,
            dolly_zoom: 1.0,
            tracking: TrackingConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

/// What the rig did in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Tracker state after the update (`None` in multiview mode).
    pub state: Option<TrackingState>,
    /// Rig target used for this frame.
    pub target: RigTarget,
    /// Focus distance after dolly zoom.
    pub focus_distance: f64,
    /// Field of view handed to the host.
    pub field_of_view_degrees: f64,
    /// Lateral offset of each view.
    pub offsets: Vec<f64>,
    /// Time spent in the update in milliseconds.
    pub update_time_ms: f64,
}

/// Rig update statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigStats {
    /// Total frames updated.
    pub frames: u64,
    /// Total view poses handed to the host.
    pub views_updated: u64,
    /// Average update time in milliseconds.
    pub avg_update_time_ms: f64,
    /// Peak update time in milliseconds.
    pub peak_update_time_ms: f64,
}

impl RigStats {
    /// Record one frame.
    pub fn update(&mut self, view_count: usize, update_time_ms: f64) {
        self.frames += 1;
        self.views_updated += view_count as u64;

        // Update average (exponential moving average)
        let alpha = 0.1;
        self.avg_update_time_ms =
            alpha * update_time_ms + (1.0 - alpha) * self.avg_update_time_ms;

        if update_time_ms > self.peak_update_time_ms {
            self.peak_update_time_ms = update_time_ms;
        }
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Drives a [`RenderHost`] from head samples, one frame at a time.
#[derive(Debug)]
pub struct CameraRig {
    config: RigConfig,
    parameters: RigParameters,
    dolly: DollyZoom,
    tracker: HeadTracker,
    filter: Option<PositionFilter>,
    stats: RigStats,
}

impl CameraRig {
    /// Create a rig with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the default configuration is invalid for the
    /// given parameters.
    pub fn new(parameters: RigParameters) -> RenderResult<Self> {
        Self::with_config(parameters, RigConfig::default())
    }

    /// Create a rig with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] if `config` is invalid.
    pub fn with_config(parameters: RigParameters, config: RigConfig) -> RenderResult<Self> {
        config.validate()?;

        let filter = config
            .filter
            .is_enabled()
            .then(|| PositionFilter::with_config(config.filter));
        let focus = parameters.focus_distance * config.scene_scale_factor;
        let tracker = HeadTracker::with_config(focus, config.tracking.clone());

        tracing::debug!(
            "Camera rig: {} mode, {} views, focus {:.3} m, separation {:.4} m",
            config.mode,
            config.view_count,
            parameters.focus_distance,
            parameters.view_separation
        );

        Ok(Self {
            dolly: DollyZoom::new(config.dolly_zoom),
            config,
            parameters,
            tracker,
            filter,
            stats: RigStats::default(),
        })
    }

    /// Create a rig from display calibration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Calibration`] if the calibration is invalid or
    /// [`RenderError::InvalidConfig`] if `config` is invalid.
    pub fn from_calibration(calibration: &Calibration, config: RigConfig) -> RenderResult<Self> {
        let parameters = calibration.rig_parameters(config.mode)?;
        Self::with_config(parameters, config)
    }

    /// Create a rig from display calibration, falling back to default
    /// parameters if there is none or it is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] if `config` is invalid.
    pub fn from_calibration_or_fallback(
        calibration: Option<&Calibration>,
        config: RigConfig,
    ) -> RenderResult<Self> {
        let parameters = RigParameters::from_calibration_or_fallback(calibration, config.mode);
        Self::with_config(parameters, config)
    }

    /// Get the rig configuration.
    #[must_use]
    pub const fn config(&self) -> &RigConfig {
        &self.config
    }

    /// Get the rig parameters.
    #[must_use]
    pub const fn parameters(&self) -> &RigParameters {
        &self.parameters
    }

    /// Get the rig statistics.
    #[must_use]
    pub const fn stats(&self) -> &RigStats {
        &self.stats
    }

    /// Reset the rig statistics.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Current head tracker state.
    #[must_use]
    pub const fn tracking_state(&self) -> TrackingState {
        self.tracker.state()
    }

    /// Focus distance scaled to scene units.
    #[must_use]
    pub fn scaled_focus_distance(&self) -> f64 {
        self.parameters.focus_distance * self.config.scene_scale_factor
    }

    /// View separation scaled to scene units and by the view offset scale.
    #[must_use]
    pub fn scaled_view_separation(&self) -> f64 {
        self.parameters.view_separation
            * self.config.scene_scale_factor
            * self.config.view_offset_scale
    }

    /// Half frame height on the focus plane at setup, in scene units.
    #[must_use]
    pub fn scaled_half_width(&self) -> f64 {
        self.parameters.half_width_at_start() * self.config.scene_scale_factor
    }

    /// Focus distance at the centered pose after dolly zoom.
    #[must_use]
    pub fn scaled_focus_distance_with_dolly(&self) -> f64 {
        self.dolly.focus_distance(self.scaled_focus_distance())
    }

    /// Change the dolly zoom factor (clamped).
    pub fn set_dolly_zoom(&mut self, factor: f64) {
        self.dolly = DollyZoom::new(factor);
        self.config.dolly_zoom = self.dolly.factor();
    }

    /// Flip the view order.
    pub fn set_mirror_views(&mut self, mirror: bool) {
        self.config.mirror_views = mirror;
    }

    /// Change the number of cameras.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] if `count` is outside
    /// `1..=RigMode::MAX_VIEWS`; the rig is left unchanged.
    pub fn set_view_count(&mut self, count: usize) -> RenderResult<()> {
        let config = RigConfig {
            view_count: count,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Advance one frame and push the resulting poses to `host`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidFocusDistance`] if the target depth
    /// leaves no positive focus distance, or any error from the host.
    pub fn update<H: RenderHost>(
        &mut self,
        sample: &HeadSample,
        dt: Duration,
        host: &mut H,
    ) -> RenderResult<FrameReport> {
        let start = Instant::now();

        let focus = self.scaled_focus_distance();
        let separation = self.scaled_view_separation();

        let (state, target) = match self.config.mode {
            RigMode::Diorama => {
                let sample = match self.filter.as_mut() {
                    Some(filter) => filter.apply(*sample),
                    None => *sample,
                };
                let target = self.tracker.update(&sample, dt, separation, focus);
                (Some(self.tracker.state()), target)
            }
            RigMode::Multiview => (
                None,
                RigTarget {
                    position: Vec3::centered(focus),
                    view_separation: separation,
                },
            ),
        };

        let current_focus = -target.position.z;
        let focus_with_dolly = self.dolly.focus_distance(current_focus);
        if focus_with_dolly.is_nan() || focus_with_dolly <= 0.0 {
            tracing::warn!(
                "Rejecting frame: focus distance {} with dolly zoom {}",
                focus_with_dolly,
                self.dolly.factor()
            );
            return Err(RenderError::InvalidFocusDistance(focus_with_dolly));
        }

        let field_of_view =
            DollyZoom::field_of_view_degrees(self.scaled_half_width(), focus_with_dolly);
        host.set_field_of_view(field_of_view);
        host.set_rig_position(Vec3::new(
            target.position.x,
            target.position.y,
            -current_focus,
        ));

        let base = host.base_projection();
        let view_count = self.config.view_count;
        let mut offsets = Vec::with_capacity(view_count);

        for index in 0..view_count {
            let lateral_offset = view_offset(
                index,
                view_count,
                target.view_separation,
                self.config.mirror_views,
            );
            let projection = projection_shear(
                lateral_offset,
                target.position.x,
                target.position.y,
                focus_with_dolly,
                &base,
            );
            host.apply_view(&ViewPose {
                index,
                lateral_offset,
                projection,
            })?;
            offsets.push(lateral_offset);
        }
        host.set_active_views(view_count);

        let update_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.stats.update(view_count, update_time_ms);

        Ok(FrameReport {
            frame: self.stats.frames,
            state,
            target,
            focus_distance: focus_with_dolly,
            field_of_view_degrees: field_of_view,
            offsets,
            update_time_ms,
        })
    }
}
