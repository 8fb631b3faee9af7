//! # Parallax Renderer
//!
//! Drives the view cameras of a rendering host from head samples.
//!
//! ## Rig Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 CameraRig                   │
//! ├──────────────┬──────────────┬───────────────┤
//! │ HeadTracker  │ Dolly zoom   │ Offset/shear  │
//! │ (diorama)    │ + field of   │ per view      │
//! │              │ view         │               │
//! ├──────────────┴──────────────┴───────────────┤
//! │           RenderHost (ViewBank, ...)        │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod host;
pub mod rig;

pub use error::{RenderError, RenderResult};
pub use host::{Lens, RenderHost, ViewBank, ViewCamera, ViewPose};
pub use rig::{CameraRig, FrameReport, RigConfig, RigMode, RigStats};
