//! # Parallax Core
//!
//! Geometry, head tracking and view index maps for lenticular multi-view
//! displays. Everything here is synchronous, allocation-light and driven by
//! the caller's frame clock.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                parallax-core                │
//! ├─────────────────────────────────────────────┤
//! │  Head Tracking    │  View Geometry          │
//! │  - SampleSlot     │  - View offsets         │
//! │  - PositionFilter │  - Projection shear     │
//! │  - HeadTracker    │  - Dolly zoom           │
//! ├─────────────────────────────────────────────┤
//! │  Calibration      │  Index Maps             │
//! │  - Rig parameters │  - Generator            │
//! │  - Fallbacks      │  - Named map cache      │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod calibration;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod index_map;
pub mod sample;
pub mod spatial;
pub mod tracking;

pub use calibration::{Calibration, RigMode, RigParameters, DEFAULT_FOCUS_DISTANCE};
pub use error::{CalibrationError, CalibrationResult};
pub use filter::{FilterConfig, PositionFilter};
pub use geometry::{
    half_width_at_focus, projection_shear, view_offset, DollyZoom, MAX_DOLLY_ZOOM, MIN_DOLLY_ZOOM,
};
pub use index_map::{
    IndexMap, IndexMapCache, IndexMapGenerator, IndexMapSettings, ViewSlot, BLANK_VIEW,
};
pub use sample::{HeadSample, SampleSlot};
pub use spatial::{Mat4, Vec3};
pub use tracking::{HeadTracker, RigTarget, TrackingConfig, TrackingState};

/// Parallax core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
