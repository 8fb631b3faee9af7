//! Frame loop driving the camera rig against an in-memory host.

use std::io::Write;
use std::time::Duration;

use parallax_core::{SampleSlot, TrackingState};
use parallax_renderer::{CameraRig, FrameReport, RenderError, RigStats, ViewBank};
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};

use crate::SimResult;

/// Totals for a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct SimSummary {
    /// Frames rendered.
    pub frames: u64,
    /// Frames dropped because the rig had no valid focus distance.
    pub rejected_frames: u64,
    /// Number of tracking state changes observed.
    pub state_changes: u64,
    /// Tracking state after the last frame (`None` in multiview mode).
    pub final_state: Option<TrackingState>,
    /// Rig statistics at the end of the run.
    pub stats: RigStats,
}

/// A camera rig, its host and the sample slot it reads from.
#[derive(Debug)]
pub struct Simulation {
    rig: CameraRig,
    host: ViewBank,
    slot: SampleSlot,
    frame_period: Duration,
    last_state: Option<TrackingState>,
    state_changes: u64,
    rejected_frames: u64,
}

impl Simulation {
    /// Create a simulation rendering one frame every `frame_period`.
    #[must_use]
    pub fn new(rig: CameraRig, host: ViewBank, slot: SampleSlot, frame_period: Duration) -> Self {
        Self {
            rig,
            host,
            slot,
            frame_period,
            last_state: None,
            state_changes: 0,
            rejected_frames: 0,
        }
    }

    /// The camera rig.
    #[must_use]
    pub const fn rig(&self) -> &CameraRig {
        &self.rig
    }

    /// The host receiving view poses.
    #[must_use]
    pub const fn host(&self) -> &ViewBank {
        &self.host
    }

    /// Render one frame from the latest sample.
    ///
    /// Returns `None` when the rig rejects the frame for lack of a valid
    /// focus distance.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::Render`] for any other rig or host error.
    pub fn step(&mut self, dt: Duration) -> SimResult<Option<FrameReport>> {
        let sample = self.slot.latest();
        let report = match self.rig.update(&sample, dt, &mut self.host) {
            Ok(report) => report,
            Err(RenderError::InvalidFocusDistance(focus)) => {
                tracing::warn!("Skipping frame with focus distance {}", focus);
                self.rejected_frames += 1;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if report.state != self.last_state {
            if let (Some(from), Some(to)) = (self.last_state, report.state) {
                tracing::info!("Tracking state {} -> {}", from, to);
                self.state_changes += 1;
            }
            self.last_state = report.state;
        }

        tracing::trace!(
            "Frame {}: focus {:.4}, fov {:.3}",
            report.frame,
            report.focus_distance,
            report.field_of_view_degrees
        );
        Ok(Some(report))
    }

    /// Run `frames` frames at the frame rate, or forever when `None`.
    ///
    /// When `reports` is given, one JSON frame report is written per line.
    ///
    /// # Errors
    ///
    /// Returns an error if a frame fails or a report cannot be written.
    pub async fn run<W: Write>(
        &mut self,
        frames: Option<u64>,
        mut reports: Option<W>,
    ) -> SimResult<SimSummary> {
        let mut ticker = tokio::time::interval(self.frame_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut rendered = 0_u64;
        let mut last_tick: Option<Instant> = None;

        loop {
            if frames.is_some_and(|limit| rendered >= limit) {
                break;
            }
            let now = ticker.tick().await;
            let dt = last_tick.map_or(self.frame_period, |last| now - last);
            last_tick = Some(now);

            if let Some(report) = self.step(dt)? {
                if let Some(out) = reports.as_mut() {
                    serde_json::to_writer(&mut *out, &report)?;
                    writeln!(out)?;
                }
            }
            rendered += 1;
        }

        if let Some(out) = reports.as_mut() {
            out.flush()?;
        }

        Ok(self.summary(rendered))
    }

    /// Summary of the run so far.
    #[must_use]
    pub fn summary(&self, frames: u64) -> SimSummary {
        SimSummary {
            frames,
            rejected_frames: self.rejected_frames,
            state_changes: self.state_changes,
            final_state: self.last_state,
            stats: self.rig.stats().clone(),
        }
    }
}
