//! # Display Calibration
//!
//! Static per-display numerics and the rig parameters derived from them.
//!
//! Calibration values arrive already parsed; this module only validates them
//! and turns them into a focus distance, a view separation and a base field
//! of view. All derivations happen once at setup, never per frame.
//!
//! ```text
//!          physical width
//!   ├───────────────────────┤   display
//!    ╲                     ╱
//!     ╲      h-fov        ╱     working distance
//!      ╲                 ╱
//!       ╲_______________╱
//!         ● viewer (0, 0, -d)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CalibrationError, CalibrationResult};
use crate::geometry::half_width_at_focus;

/// Focus distance in meters used when no calibration is available.
pub const DEFAULT_FOCUS_DISTANCE: f64 = 0.7;

/// Vertical field of view in degrees used when no calibration is available.
pub const DEFAULT_FIELD_OF_VIEW: f64 = 16.0;

/// Interocular distance in meters used for the two-view diorama rig.
pub const DIORAMA_VIEW_SEPARATION: f64 = 0.065;

/// View separation in meters for a multiview rig without calibration.
pub const MULTIVIEW_FALLBACK_SEPARATION: f64 = 0.031;

/// Aperture angle in degrees assumed when the calibration omits it.
pub const DEFAULT_APERTURE_ANGLE: f64 = 14.0;

const MILLIMETERS_PER_METER: f64 = 1000.0;
const METERS_PER_INCH: f64 = 0.0254;

/// How the camera rig is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigMode {
    /// Head-tracked stereo: the rig follows the viewer's head.
    #[default]
    Diorama,
    /// Fixed centered rig with one camera per native view.
    Multiview,
}

impl RigMode {
    /// Largest number of cameras any rig may drive.
    pub const MAX_VIEWS: usize = 19;

    /// Number of cameras a rig in this mode drives by default.
    #[must_use]
    pub const fn default_view_count(self) -> usize {
        match self {
            Self::Diorama => 2,
            Self::Multiview => 16,
        }
    }

    /// Whether head samples move the rig in this mode.
    #[must_use]
    pub const fn is_head_tracked(self) -> bool {
        matches!(self, Self::Diorama)
    }
}

impl std::fmt::Display for RigMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Diorama => write!(f, "diorama"),
            Self::Multiview => write!(f, "multiview"),
        }
    }
}

/// Calibration numerics for one lenticular display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Number of physical parallax slots of the panel.
    pub native_view_count: u32,
    /// Lens angle ratio numerator.
    pub angle_ratio_numerator: u32,
    /// Lens angle ratio denominator (the lens width in sub-pixels).
    pub angle_ratio_denominator: u32,
    /// `1` when the lenses lean left; any other value leans right.
    pub left_lens_orientation: i32,
    /// Whether sub-pixels are laid out BGR instead of RGB.
    pub bgr_pixel_layout: bool,
    /// Default black border width.
    pub black_border: u32,
    /// Default black space width.
    pub black_space: u32,
    /// Designed viewing distance in millimeters.
    pub basic_working_distance_mm: u32,
    /// Opening angle of one viewing zone in degrees.
    #[serde(default = "default_aperture_angle")]
    pub aperture_angle_degrees: f64,
    /// Physical panel width in inches.
    pub physical_size_inch: f64,
    /// Horizontal resolution in pixels.
    pub horizontal_resolution: u32,
    /// Vertical resolution in pixels.
    pub vertical_resolution: u32,
}

fn default_aperture_angle() -> f64 {
    DEFAULT_APERTURE_ANGLE
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            native_view_count: 7,
            angle_ratio_numerator: 4,
            angle_ratio_denominator: 5,
            left_lens_orientation: 1,
            bgr_pixel_layout: false,
            black_border: 0,
            black_space: 0,
            basic_working_distance_mm: 700,
            aperture_angle_degrees: DEFAULT_APERTURE_ANGLE,
            physical_size_inch: 15.6,
            horizontal_resolution: 3840,
            vertical_resolution: 2160,
        }
    }
}

impl Calibration {
    /// Check that every value used by the derivations is usable.
    ///
    /// # Errors
    ///
    /// Returns a [`CalibrationError`] naming the first invalid value.
    pub fn validate(&self) -> CalibrationResult<()> {
        if self.basic_working_distance_mm == 0 {
            return Err(CalibrationError::InvalidWorkingDistance(
                self.basic_working_distance_mm,
            ));
        }
        if self.native_view_count == 0 {
            return Err(CalibrationError::NoNativeViews);
        }
        if self.horizontal_resolution == 0 || self.vertical_resolution == 0 {
            return Err(CalibrationError::InvalidResolution {
                width: self.horizontal_resolution,
                height: self.vertical_resolution,
            });
        }
        if !self.physical_size_inch.is_finite() || self.physical_size_inch <= 0.0 {
            return Err(CalibrationError::InvalidPhysicalSize(self.physical_size_inch));
        }
        let aperture = self.aperture_angle_degrees;
        if aperture.is_nan() || aperture <= 0.0 || aperture >= 180.0 {
            return Err(CalibrationError::InvalidApertureAngle(
                self.aperture_angle_degrees,
            ));
        }
        Ok(())
    }

    /// Working distance in meters, which is also the rig's focus distance.
    #[must_use]
    pub fn focus_distance(&self) -> f64 {
        f64::from(self.basic_working_distance_mm) / MILLIMETERS_PER_METER
    }

    /// Display aspect ratio (width over height).
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.horizontal_resolution) / f64::from(self.vertical_resolution)
    }

    /// Horizontal field of view in degrees that exactly spans the panel from
    /// the working distance.
    #[must_use]
    pub fn horizontal_field_of_view(&self) -> f64 {
        let width = self.physical_size_inch * METERS_PER_INCH;
        (2.0 * (width / 2.0 / self.focus_distance()).atan()).to_degrees()
    }

    /// Vertical field of view in degrees for the panel's aspect ratio.
    #[must_use]
    pub fn vertical_field_of_view(&self) -> f64 {
        let horizontal = self.horizontal_field_of_view().to_radians();
        (2.0 * ((horizontal / 2.0).tan() / self.aspect_ratio()).atan()).to_degrees()
    }

    /// Distance between neighboring multiview cameras: the viewing zone
    /// width at the working distance divided over the native views.
    #[must_use]
    pub fn multiview_separation(&self) -> f64 {
        let half_zone =
            (self.aperture_angle_degrees.to_radians() / 2.0).tan() * self.focus_distance();
        half_zone * 2.0 / f64::from(self.native_view_count)
    }

    /// Lens angle counter signed by the lens orientation.
    #[must_use]
    pub fn lens_angle_counter(&self) -> i64 {
        let sign = if self.left_lens_orientation == 1 { 1 } else { -1 };
        sign * i64::from(self.angle_ratio_numerator)
    }

    /// Number of high-quality sub-views across one lens.
    #[must_use]
    pub fn hq_view_count(&self) -> u32 {
        self.native_view_count
            .saturating_mul(self.angle_ratio_denominator)
    }

    /// Derive the rig parameters for `mode`.
    ///
    /// # Errors
    ///
    /// Returns a [`CalibrationError`] if [`Calibration::validate`] fails.
    pub fn rig_parameters(&self, mode: RigMode) -> CalibrationResult<RigParameters> {
        self.validate()?;

        let view_separation = match mode {
            RigMode::Diorama => DIORAMA_VIEW_SEPARATION,
            RigMode::Multiview => self.multiview_separation(),
        };

        Ok(RigParameters {
            field_of_view_degrees: self.vertical_field_of_view(),
            focus_distance: self.focus_distance(),
            view_separation,
        })
    }
}

/// Rig parameters derived once at setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigParameters {
    /// Base vertical field of view in degrees.
    pub field_of_view_degrees: f64,
    /// Distance from the rig to the focus plane in meters.
    pub focus_distance: f64,
    /// Distance between neighboring cameras in meters.
    pub view_separation: f64,
}

impl RigParameters {
    /// Parameters used when no calibration is available.
    #[must_use]
    pub fn fallback(mode: RigMode) -> Self {
        let view_separation = match mode {
            RigMode::Diorama => DIORAMA_VIEW_SEPARATION,
            RigMode::Multiview => MULTIVIEW_FALLBACK_SEPARATION,
        };
        Self {
            field_of_view_degrees: DEFAULT_FIELD_OF_VIEW,
            focus_distance: DEFAULT_FOCUS_DISTANCE,
            view_separation,
        }
    }

    /// Derive from `calibration`, falling back to [`RigParameters::fallback`]
    /// when there is none or it is invalid.
    #[must_use]
    pub fn from_calibration_or_fallback(calibration: Option<&Calibration>, mode: RigMode) -> Self {
        let Some(calibration) = calibration else {
            tracing::warn!("No calibration set, using default rig parameters");
            return Self::fallback(mode);
        };

        match calibration.rig_parameters(mode) {
            Ok(parameters) => parameters,
            Err(e) => {
                tracing::warn!("Invalid calibration ({}), using default rig parameters", e);
                Self::fallback(mode)
            }
        }
    }

    /// Half the frame height visible on the focus plane at setup.
    #[must_use]
    pub fn half_width_at_start(&self) -> f64 {
        half_width_at_focus(self.field_of_view_degrees, self.focus_distance)
    }
}

impl Default for RigParameters {
    fn default() -> Self {
        Self::fallback(RigMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn panel() -> Calibration {
        Calibration {
            native_view_count: 8,
            basic_working_distance_mm: 650,
            physical_size_inch: 15.6,
            horizontal_resolution: 3840,
            vertical_resolution: 2160,
            ..Calibration::default()
        }
    }

    #[test]
    fn test_defaults_match_reference_display() {
        let c = Calibration::default();
        assert_eq!(c.native_view_count, 7);
        assert_eq!((c.angle_ratio_numerator, c.angle_ratio_denominator), (4, 5));
        assert_eq!(c.left_lens_orientation, 1);
        assert!(!c.bgr_pixel_layout);
        assert_eq!((c.black_border, c.black_space), (0, 0));
        assert!(approx_eq(c.aperture_angle_degrees, 14.0));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_focus_distance_from_working_distance() {
        assert!(approx_eq(panel().focus_distance(), 0.65));
    }

    #[test]
    fn test_field_of_view_derivation() {
        let c = panel();
        let width: f64 = 15.6 * 0.0254;
        let horizontal = (2.0 * (width / 2.0 / 0.65).atan()).to_degrees();
        assert!(approx_eq(c.horizontal_field_of_view(), horizontal));

        let aspect: f64 = 3840.0 / 2160.0;
        let vertical = (2.0 * ((horizontal.to_radians() / 2.0).tan() / aspect).atan()).to_degrees();
        assert!(approx_eq(c.vertical_field_of_view(), vertical));
        assert!(c.vertical_field_of_view() < c.horizontal_field_of_view());
    }

    #[test]
    fn test_multiview_separation() {
        let c = panel();
        let expected = 2.0 * (14.0_f64.to_radians() / 2.0).tan() * 0.65 / 8.0;
        assert!(approx_eq(c.multiview_separation(), expected));
    }

    #[test]
    fn test_rig_parameters_per_mode() {
        let c = panel();
        let diorama = c.rig_parameters(RigMode::Diorama).expect("valid calibration");
        let multiview = c.rig_parameters(RigMode::Multiview).expect("valid calibration");

        assert!(approx_eq(diorama.view_separation, DIORAMA_VIEW_SEPARATION));
        assert!(approx_eq(multiview.view_separation, c.multiview_separation()));
        assert!(approx_eq(diorama.focus_distance, 0.65));
        assert!(approx_eq(diorama.field_of_view_degrees, multiview.field_of_view_degrees));
    }

    #[test]
    fn test_validation_errors() {
        let zero_distance = Calibration {
            basic_working_distance_mm: 0,
            ..panel()
        };
        assert_eq!(
            zero_distance.validate(),
            Err(CalibrationError::InvalidWorkingDistance(0))
        );

        let no_views = Calibration {
            native_view_count: 0,
            ..panel()
        };
        assert_eq!(no_views.validate(), Err(CalibrationError::NoNativeViews));

        let no_height = Calibration {
            vertical_resolution: 0,
            ..panel()
        };
        assert!(matches!(
            no_height.validate(),
            Err(CalibrationError::InvalidResolution { width: 3840, height: 0 })
        ));

        let bad_aperture = Calibration {
            aperture_angle_degrees: 180.0,
            ..panel()
        };
        assert!(bad_aperture.rig_parameters(RigMode::Multiview).is_err());
    }

    #[test]
    fn test_fallback_parameters() {
        let diorama = RigParameters::fallback(RigMode::Diorama);
        assert!(approx_eq(diorama.field_of_view_degrees, 16.0));
        assert!(approx_eq(diorama.focus_distance, 0.7));
        assert!(approx_eq(diorama.view_separation, 0.065));

        let multiview = RigParameters::fallback(RigMode::Multiview);
        assert!(approx_eq(multiview.view_separation, 0.031));
    }

    #[test]
    fn test_fallback_on_missing_or_invalid_calibration() {
        let missing = RigParameters::from_calibration_or_fallback(None, RigMode::Multiview);
        assert_eq!(missing, RigParameters::fallback(RigMode::Multiview));

        let invalid = Calibration {
            native_view_count: 0,
            ..panel()
        };
        let params = RigParameters::from_calibration_or_fallback(Some(&invalid), RigMode::Diorama);
        assert_eq!(params, RigParameters::fallback(RigMode::Diorama));
    }

    #[test]
    fn test_lens_angle_counter_sign() {
        let left = Calibration::default();
        assert_eq!(left.lens_angle_counter(), 4);

        let right = Calibration {
            left_lens_orientation: 0,
            ..Calibration::default()
        };
        assert_eq!(right.lens_angle_counter(), -4);
    }

    #[test]
    fn test_hq_view_count() {
        assert_eq!(Calibration::default().hq_view_count(), 35);
    }

    #[test]
    fn test_rig_mode_defaults() {
        assert_eq!(RigMode::Diorama.default_view_count(), 2);
        assert_eq!(RigMode::Multiview.default_view_count(), 16);
        assert!(RigMode::Diorama.is_head_tracked());
        assert!(!RigMode::Multiview.is_head_tracked());
        assert_eq!(RigMode::Multiview.to_string(), "multiview");
    }

    #[test]
    fn test_half_width_at_start() {
        let params = RigParameters::fallback(RigMode::Diorama);
        let expected = (16.0_f64.to_radians() / 2.0).tan() * 0.7;
        assert!(approx_eq(params.half_width_at_start(), expected));
    }

    #[test]
    fn test_aperture_defaults_when_missing() {
        let json = r#"{
            "native_view_count": 7,
            "angle_ratio_numerator": 4,
            "angle_ratio_denominator": 5,
            "left_lens_orientation": 1,
            "bgr_pixel_layout": false,
            "black_border": 0,
            "black_space": 0,
            "basic_working_distance_mm": 700,
            "physical_size_inch": 15.6,
            "horizontal_resolution": 3840,
            "vertical_resolution": 2160
        }"#;
        let c: Calibration = serde_json::from_str(json).expect("calibration should parse");
        assert!(approx_eq(c.aperture_angle_degrees, DEFAULT_APERTURE_ANGLE));
    }
}
