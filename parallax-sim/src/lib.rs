//! # Parallax Simulator
//!
//! Headless host for the parallax camera rig.
//!
//! A scripted head stands in for the tracking camera and publishes samples
//! from a background task. The frame loop reads the latest sample each frame,
//! drives the rig against an in-memory [`ViewBank`] and can emit one JSON
//! [`FrameReport`](parallax_renderer::FrameReport) per frame.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p parallax-sim -- --mode diorama --frames 600 --json
//! ```
//!
//! ## With a display calibration:
//!
//! ```bash
//! cargo run -p parallax-sim -- --mode multiview --calibration display.json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `SimConfig` - Rig, script and loop configuration
//! - `ScriptedHead` / `spawn_tracker` - Stand-in tracking provider
//! - `Simulation` - Frame loop over `CameraRig` and `ViewBank`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod error;
mod provider;
mod script;
mod simulation;

pub use error::{SimError, SimResult};
pub use provider::{spawn_tracker, TrackerHandle};
pub use script::{ScriptConfig, ScriptedHead};
pub use simulation::{SimSummary, Simulation};

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use parallax_core::index_map::DEFAULT_MAP_SLOTS;
use parallax_core::{
    Calibration, FilterConfig, IndexMap, IndexMapCache, IndexMapGenerator, IndexMapSettings,
    SampleSlot,
};
use parallax_renderer::{CameraRig, RigConfig, RigMode, ViewBank};

/// Rig mode selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Head-tracked stereo rig.
    Diorama,
    /// Fixed multi-view rig.
    Multiview,
}

impl From<ModeArg> for RigMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Diorama => Self::Diorama,
            ModeArg::Multiview => Self::Multiview,
        }
    }
}

/// Command-line arguments for parallax-sim.
#[derive(Debug, Clone, Parser)]
#[command(name = "parallax-sim")]
#[command(about = "Drive the parallax camera rig from a scripted head tracker")]
#[command(version)]
pub struct CliArgs {
    /// Rig mode
    #[arg(long, value_enum, default_value = "diorama", env = "PARALLAX_MODE")]
    pub mode: ModeArg,

    /// Number of view cameras (defaults to the mode's view count)
    #[arg(long)]
    pub views: Option<usize>,

    /// Display calibration JSON file
    #[arg(long, env = "PARALLAX_CALIBRATION")]
    pub calibration: Option<PathBuf>,

    /// Named index map preset instead of a generated map
    #[arg(long)]
    pub index_map: Option<String>,

    /// Frames per second of the render loop
    #[arg(long, default_value = "60")]
    pub fps: u32,

    /// Samples per second of the tracking provider
    #[arg(long, default_value = "30")]
    pub tracker_hz: u32,

    /// Frames to render (0 runs until interrupted)
    #[arg(long, default_value = "600")]
    pub frames: u64,

    /// Write one JSON frame report per frame to stdout
    #[arg(long)]
    pub json: bool,

    /// Flip the view order
    #[arg(long)]
    pub mirror: bool,

    /// Dolly zoom factor
    #[arg(long, default_value = "1.0")]
    pub dolly: f64,

    /// Scene units per real-world meter
    #[arg(long, default_value = "1.0")]
    pub scene_scale: f64,

    /// Extra scale on the view separation
    #[arg(long, default_value = "1.0")]
    pub view_offset_scale: f64,

    /// Extra scale on lateral head motion
    #[arg(long, default_value = "1.0")]
    pub head_tracking_scale: f64,

    /// Disable head position smoothing
    #[arg(long)]
    pub no_filter: bool,

    /// Peak sideways head sway in millimeters
    #[arg(long, default_value = "120")]
    pub sway_mm: f64,

    /// Head distance from the display in millimeters
    #[arg(long, default_value = "700")]
    pub distance_mm: f64,

    /// Seconds between head dropouts (0 disables dropouts)
    #[arg(long, default_value = "6")]
    pub dropout_every: f64,

    /// Seconds the head stays out of view per dropout
    #[arg(long, default_value = "1")]
    pub dropout_secs: f64,
}

/// Simulator configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Camera rig configuration.
    pub rig: RigConfig,
    /// Scripted head motion.
    pub script: ScriptConfig,
    /// Display calibration file.
    pub calibration_path: Option<PathBuf>,
    /// Named index map preset.
    pub index_map: Option<String>,
    /// Frames per second of the render loop.
    pub fps: u32,
    /// Samples per second of the tracking provider.
    pub tracker_hz: u32,
    /// Frames to render, `None` for no limit.
    pub frames: Option<u64>,
    /// Emit JSON frame reports.
    pub json_reports: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimConfig {
    /// Create a simulator configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rig: RigConfig::default(),
            script: ScriptConfig::default(),
            calibration_path: None,
            index_map: None,
            fps: 60,
            tracker_hz: 30,
            frames: Some(600),
            json_reports: false,
        }
    }

    /// Time between two rendered frames.
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

impl From<CliArgs> for SimConfig {
    fn from(args: CliArgs) -> Self {
        let mode = RigMode::from(args.mode);
        let mut rig = RigConfig {
            mirror_views: args.mirror,
            scene_scale_factor: args.scene_scale,
            view_offset_scale: args.view_offset_scale,
            dolly_zoom: args.dolly,
            ..RigConfig::for_mode(mode)
        };
        if let Some(views) = args.views {
            rig.view_count = views;
        }
        if args.no_filter {
            rig.filter = FilterConfig::disabled();
        }

        let script = ScriptConfig {
            sway_amplitude_mm: args.sway_mm,
            distance_mm: args.distance_mm,
            dropout_every: Duration::try_from_secs_f64(args.dropout_every).unwrap_or_default(),
            dropout_length: Duration::try_from_secs_f64(args.dropout_secs).unwrap_or_default(),
            scene_scale: args.scene_scale,
            head_tracking_scale: args.head_tracking_scale,
            ..ScriptConfig::default()
        };

        Self {
            rig,
            script,
            calibration_path: args.calibration,
            index_map: args.index_map,
            fps: args.fps,
            tracker_hz: args.tracker_hz,
            frames: (args.frames > 0).then_some(args.frames),
            json_reports: args.json,
        }
    }
}

/// Read a display calibration from a JSON file.
///
/// # Errors
///
/// Returns [`SimError::CalibrationIo`] if the file cannot be read or
/// [`SimError::CalibrationParse`] if it is not calibration JSON.
pub fn load_calibration(path: &Path) -> SimResult<Calibration> {
    let text = std::fs::read_to_string(path).map_err(|source| SimError::CalibrationIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SimError::CalibrationParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Pick the index map for the display.
///
/// A named preset is looked up among the default maps; otherwise a map is
/// generated for `content_views` over the default slot count.
///
/// # Errors
///
/// Returns [`SimError::UnknownIndexMap`] if `preset` names no default map.
pub fn select_index_map(preset: Option<&str>, content_views: usize) -> SimResult<IndexMap> {
    let mut generator =
        IndexMapGenerator::with_cache(IndexMapSettings::default(), IndexMapCache::with_defaults());

    match preset {
        Some(name) => generator
            .get(name)
            .cloned()
            .ok_or_else(|| SimError::UnknownIndexMap(name.to_string())),
        None => Ok(generator
            .generate_named("display", DEFAULT_MAP_SLOTS, content_views, 1.0, false, false)
            .clone()),
    }
}

/// Build the camera rig for `config`.
///
/// With a calibration file the rig is derived from it strictly; without one
/// the default rig parameters for the mode are used.
///
/// # Errors
///
/// Returns an error if the calibration cannot be loaded or is invalid, or the
/// rig configuration is invalid.
pub fn build_rig(config: &SimConfig) -> SimResult<CameraRig> {
    let rig = match &config.calibration_path {
        Some(path) => {
            let calibration = load_calibration(path)?;
            tracing::info!(
                "Loaded calibration: {} native views, working distance {} mm",
                calibration.native_view_count,
                calibration.basic_working_distance_mm
            );
            CameraRig::from_calibration(&calibration, config.rig.clone())?
        }
        None => CameraRig::from_calibration_or_fallback(None, config.rig.clone())?,
    };
    Ok(rig)
}

/// Create the simulation and its sample slot for `config`.
///
/// # Errors
///
/// Returns an error if the rig cannot be built.
pub fn build_simulation(config: &SimConfig) -> SimResult<(Simulation, SampleSlot)> {
    let rig = build_rig(config)?;
    let slot = SampleSlot::new();
    let simulation = Simulation::new(rig, ViewBank::new(), slot.clone(), config.frame_period());
    Ok((simulation, slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_core::ViewSlot;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["parallax-sim"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn test_cli_defaults() {
        let config = SimConfig::from(args(&[]));
        assert_eq!(config.rig.mode, RigMode::Diorama);
        assert_eq!(config.rig.view_count, 2);
        assert_eq!(config.fps, 60);
        assert_eq!(config.frames, Some(600));
        assert!(!config.json_reports);
        assert_eq!(config.script.dropout_every, Duration::from_secs(6));
    }

    #[test]
    fn test_cli_multiview_overrides() {
        let config = SimConfig::from(args(&[
            "--mode",
            "multiview",
            "--views",
            "8",
            "--mirror",
            "--frames",
            "0",
            "--no-filter",
            "--dropout-every",
            "0",
        ]));
        assert_eq!(config.rig.mode, RigMode::Multiview);
        assert_eq!(config.rig.view_count, 8);
        assert!(config.rig.mirror_views);
        assert_eq!(config.frames, None);
        assert!(!config.rig.filter.is_enabled());
        assert_eq!(config.script.dropout_every, Duration::ZERO);
    }

    #[test]
    fn test_multiview_default_view_count() {
        let config = SimConfig::from(args(&["--mode", "multiview"]));
        assert_eq!(config.rig.view_count, 16);
    }

    #[test]
    fn test_negative_dropout_disables() {
        let config = SimConfig::from(args(&["--dropout-secs=-1"]));
        assert_eq!(config.script.dropout_length, Duration::ZERO);
    }

    #[test]
    fn test_frame_period() {
        let config = SimConfig {
            fps: 50,
            ..SimConfig::default()
        };
        assert_eq!(config.frame_period(), Duration::from_millis(20));
    }

    #[test]
    fn test_select_generated_index_map() {
        let map = select_index_map(None, 2).expect("generated map");
        assert_eq!(map.len(), DEFAULT_MAP_SLOTS);
        assert!(map.slots().contains(&ViewSlot::View(0)));
        assert!(map.slots().contains(&ViewSlot::View(1)));
    }

    #[test]
    fn test_select_preset_index_map() {
        let map = select_index_map(Some("S1D"), 2).expect("preset exists");
        assert!(!map.is_empty());

        let err = select_index_map(Some("nope"), 2).unwrap_err();
        assert!(matches!(err, SimError::UnknownIndexMap(name) if name == "nope"));
    }

    #[test]
    fn test_load_calibration_missing_file() {
        let err = load_calibration(Path::new("/nonexistent/calibration.json")).unwrap_err();
        assert!(matches!(err, SimError::CalibrationIo { .. }));
    }

    #[test]
    fn test_build_rig_with_calibration_file() {
        let path = std::env::temp_dir().join(format!(
            "parallax-sim-calibration-{}.json",
            std::process::id()
        ));
        let calibration = Calibration {
            basic_working_distance_mm: 600,
            ..Calibration::default()
        };
        std::fs::write(
            &path,
            serde_json::to_string(&calibration).expect("serialize calibration"),
        )
        .expect("write calibration");

        let config = SimConfig {
            calibration_path: Some(path.clone()),
            ..SimConfig::default()
        };
        let rig = build_rig(&config).expect("rig from calibration");
        std::fs::remove_file(&path).ok();

        assert!((rig.parameters().focus_distance - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_build_rig_rejects_bad_config() {
        let mut config = SimConfig::default();
        config.rig.view_count = 40;
        assert!(matches!(build_rig(&config), Err(SimError::Render(_))));
    }
}
