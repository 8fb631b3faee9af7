//! # Head Tracking
//!
//! Turns a stream of head samples into a smoothed rig target.
//!
//! Tracking can drop out for a frame or two at a time. Instead of snapping the
//! rig back to the center, the tracker holds the last known pose for a grace
//! period and then eases towards the centered pose. When the head is found
//! again it eases back out towards the live head position.
//!
//! ```text
//!               detected                  not detected
//!   ┌──────────┐ ───────▶ ┌──────────┐ ──────────────▶ ┌─────────────────┐
//!   │   Lost   │          │Transition│                 │ LostGracePeriod │
//!   └──────────┘          │ToTracking│ ◀── detected ── │  (holds pose)   │
//!        ▲                └──────────┘    ┌────────┐   └─────────────────┘
//!        │ done               │ done      │Tracking│◀──── detected ─┘ │
//!   ┌──────────┐              └─────────▶ └────────┘                  │
//!   │Transition│ ◀───────────────── timeout ──────────────────────────┘
//!   │  ToLost  │ ──── detected ───▶ TransitionToTracking
//!   └──────────┘
//! ```
//!
//! The tracker depends only on the delta time it is handed, so it is fully
//! deterministic under test.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sample::HeadSample;
use crate::spatial::{lerp, Vec3};

/// The five states of the head tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    /// Following the live head position.
    Tracking,
    /// Resting at the centered pose with zero separation.
    Lost,
    /// Head just lost; holding the last known pose.
    LostGracePeriod,
    /// Easing from the last known pose to the centered pose.
    TransitionToLost,
    /// Easing from the centered pose to the live head position.
    TransitionToTracking,
}

impl TrackingState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Tracking,
        Self::Lost,
        Self::LostGracePeriod,
        Self::TransitionToLost,
        Self::TransitionToTracking,
    ];

    /// Next state for a sample.
    ///
    /// `grace_expired` only matters in [`TrackingState::LostGracePeriod`].
    /// Completing a transition is not sample-driven and is handled by
    /// [`HeadTracker::update`].
    #[must_use]
    pub const fn on_sample(self, detected: bool, grace_expired: bool) -> Self {
        match (self, detected) {
            (Self::Tracking | Self::LostGracePeriod, true) => Self::Tracking,
            (Self::Tracking, false) => Self::LostGracePeriod,
            (Self::LostGracePeriod, false) => {
                if grace_expired {
                    Self::TransitionToLost
                } else {
                    Self::LostGracePeriod
                }
            }
            (Self::Lost | Self::TransitionToLost | Self::TransitionToTracking, true) => {
                Self::TransitionToTracking
            }
            (Self::Lost, false) => Self::Lost,
            (Self::TransitionToLost, false) => Self::TransitionToLost,
            (Self::TransitionToTracking, false) => Self::TransitionToTracking,
        }
    }

    /// Whether this state eases between two poses.
    #[must_use]
    pub const fn is_transition(self) -> bool {
        matches!(self, Self::TransitionToLost | Self::TransitionToTracking)
    }
}

impl std::fmt::Display for TrackingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Tracking => "tracking",
            Self::Lost => "lost",
            Self::LostGracePeriod => "lost_grace_period",
            Self::TransitionToLost => "transition_to_lost",
            Self::TransitionToTracking => "transition_to_tracking",
        };
        f.write_str(name)
    }
}

/// Timing configuration for the head tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// How long the last known pose is held after the head is lost.
    pub head_lost_timeout: Duration,
    /// Duration of both eased transitions.
    pub transition_duration: Duration,
    /// A transition completes once its progress is within this of 1.
    pub completion_tolerance: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            head_lost_timeout: Duration::from_secs(3),
            transition_duration: Duration::from_millis(500),
            completion_tolerance: 0.01,
        }
    }
}

/// Where the rig should be this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigTarget {
    /// Position of the rig center.
    pub position: Vec3,
    /// Distance between neighboring cameras.
    pub view_separation: f64,
}

impl RigTarget {
    /// The centered pose at `focus_distance` with zero separation.
    #[must_use]
    pub fn centered(focus_distance: f64) -> Self {
        Self {
            position: Vec3::centered(focus_distance),
            view_separation: 0.0,
        }
    }

    /// Linear interpolation of position and separation independently.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            position: self.position.lerp(&other.position, t),
            view_separation: lerp(self.view_separation, other.view_separation, t),
        }
    }
}

/// Head-tracking state machine.
///
/// Call [`HeadTracker::update`] exactly once per rendered frame.
#[derive(Debug, Clone)]
pub struct HeadTracker {
    config: TrackingConfig,
    state: TrackingState,
    grace_elapsed: Duration,
    transition_elapsed: Duration,
    last_known: RigTarget,
    target: RigTarget,
}

impl HeadTracker {
    /// Create a tracker in [`TrackingState::Lost`] with default timing.
    #[must_use]
    pub fn new(focus_distance: f64) -> Self {
        Self::with_config(focus_distance, TrackingConfig::default())
    }

    /// Create a tracker in [`TrackingState::Lost`] with custom timing.
    #[must_use]
    pub fn with_config(focus_distance: f64, config: TrackingConfig) -> Self {
        let centered = RigTarget::centered(focus_distance);
        Self {
            config,
            state: TrackingState::Lost,
            grace_elapsed: Duration::ZERO,
            transition_elapsed: Duration::ZERO,
            last_known: centered,
            target: centered,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TrackingState {
        self.state
    }

    /// Timing configuration.
    #[must_use]
    pub const fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Target produced by the most recent update.
    #[must_use]
    pub const fn target(&self) -> RigTarget {
        self.target
    }

    /// Pose captured during the most recent tracked frame.
    #[must_use]
    pub const fn last_known(&self) -> RigTarget {
        self.last_known
    }

    /// Time spent in the current grace period (zero outside of it).
    #[must_use]
    pub const fn grace_elapsed(&self) -> Duration {
        self.grace_elapsed
    }

    /// Time spent in the current transition (zero outside of one).
    #[must_use]
    pub const fn transition_elapsed(&self) -> Duration {
        self.transition_elapsed
    }

    /// Advance by one frame and return the rig target.
    ///
    /// `view_separation` is the separation to use while tracking and
    /// `focus_distance` places the centered pose.
    pub fn update(
        &mut self,
        sample: &HeadSample,
        dt: Duration,
        view_separation: f64,
        focus_distance: f64,
    ) -> RigTarget {
        let grace_expired = self.grace_elapsed >= self.config.head_lost_timeout;
        let next = self.state.on_sample(sample.detected, grace_expired);
        let entered = next != self.state;
        if entered {
            self.enter(next);
        }

        let centered = RigTarget::centered(focus_distance);
        let live = RigTarget {
            position: sample.world_position(),
            view_separation,
        };

        self.target = match self.state {
            TrackingState::Tracking => {
                self.last_known = live;
                live
            }
            TrackingState::Lost => centered,
            TrackingState::LostGracePeriod => {
                if !entered {
                    self.grace_elapsed += dt;
                }
                self.last_known
            }
            TrackingState::TransitionToLost => {
                let t = self.advance_transition(dt);
                if self.is_complete(t) {
                    self.enter(TrackingState::Lost);
                    centered
                } else {
                    self.last_known.lerp(&centered, t)
                }
            }
            TrackingState::TransitionToTracking => {
                let goal = if sample.detected {
                    live
                } else {
                    RigTarget {
                        position: self.last_known.position,
                        view_separation,
                    }
                };
                let t = self.advance_transition(dt);
                if self.is_complete(t) {
                    self.enter(TrackingState::Tracking);
                    self.last_known = goal;
                    goal
                } else {
                    centered.lerp(&goal, t)
                }
            }
        };

        tracing::trace!(
            "Head tracker {} target ({:.4}, {:.4}, {:.4}) separation {:.4}",
            self.state,
            self.target.position.x,
            self.target.position.y,
            self.target.position.z,
            self.target.view_separation
        );

        self.target
    }

    /// Return to [`TrackingState::Lost`] at the centered pose.
    pub fn reset(&mut self, focus_distance: f64) {
        *self = Self::with_config(focus_distance, self.config.clone());
    }

    fn enter(&mut self, state: TrackingState) {
        tracing::debug!("Head tracking {} -> {}", self.state, state);
        self.state = state;
        self.grace_elapsed = Duration::ZERO;
        self.transition_elapsed = Duration::ZERO;
    }

    fn advance_transition(&mut self, dt: Duration) -> f64 {
        self.transition_elapsed += dt;
        let duration = self.config.transition_duration.as_secs_f64();
        if duration <= 0.0 {
            return 1.0;
        }
        (self.transition_elapsed.as_secs_f64() / duration).min(1.0)
    }

    fn is_complete(&self, t: f64) -> bool {
        t + self.config.completion_tolerance >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOCUS: f64 = 0.7;
    const SEPARATION: f64 = 0.065;
    const FRAME: Duration = Duration::from_millis(100);
    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn head(x: f64) -> HeadSample {
        HeadSample::detected_at(x, 0.0, -FOCUS)
    }

    fn no_head() -> HeadSample {
        HeadSample::not_detected(FOCUS)
    }

    fn step(tracker: &mut HeadTracker, sample: &HeadSample) -> RigTarget {
        tracker.update(sample, FRAME, SEPARATION, FOCUS)
    }

    /// A tracker that has settled into `Tracking` at `x`.
    fn tracking_at(x: f64) -> HeadTracker {
        let mut tracker = HeadTracker::new(FOCUS);
        for _ in 0..10 {
            step(&mut tracker, &head(x));
        }
        assert_eq!(tracker.state(), TrackingState::Tracking);
        tracker
    }

    #[test]
    fn test_initial_state_is_lost_and_centered() {
        let tracker = HeadTracker::new(FOCUS);
        assert_eq!(tracker.state(), TrackingState::Lost);
        assert_eq!(tracker.target(), RigTarget::centered(FOCUS));
    }

    #[test]
    fn test_lost_stays_centered_without_head() {
        let mut tracker = HeadTracker::new(FOCUS);
        for _ in 0..50 {
            let target = step(&mut tracker, &no_head());
            assert_eq!(target, RigTarget::centered(FOCUS));
        }
        assert_eq!(tracker.state(), TrackingState::Lost);
    }

    #[test]
    fn test_transition_table_covers_every_pair() {
        for state in TrackingState::ALL {
            for detected in [false, true] {
                for grace_expired in [false, true] {
                    let next = state.on_sample(detected, grace_expired);
                    assert!(TrackingState::ALL.contains(&next));
                }
            }
        }
    }

    #[test]
    fn test_transition_table_entries() {
        use TrackingState as S;

        assert_eq!(S::Tracking.on_sample(true, false), S::Tracking);
        assert_eq!(S::Tracking.on_sample(false, false), S::LostGracePeriod);
        assert_eq!(S::LostGracePeriod.on_sample(true, true), S::Tracking);
        assert_eq!(S::LostGracePeriod.on_sample(false, false), S::LostGracePeriod);
        assert_eq!(S::LostGracePeriod.on_sample(false, true), S::TransitionToLost);
        assert_eq!(S::TransitionToLost.on_sample(true, false), S::TransitionToTracking);
        assert_eq!(S::TransitionToLost.on_sample(false, false), S::TransitionToLost);
        assert_eq!(S::Lost.on_sample(true, false), S::TransitionToTracking);
        assert_eq!(S::Lost.on_sample(false, true), S::Lost);
        assert_eq!(S::TransitionToTracking.on_sample(false, false), S::TransitionToTracking);
        assert_eq!(S::TransitionToTracking.on_sample(true, false), S::TransitionToTracking);
    }

    #[test]
    fn test_reacquire_from_lost() {
        let mut tracker = HeadTracker::new(FOCUS);
        let sample = HeadSample::detected_at(0.1, 0.0, -0.7);

        let first = step(&mut tracker, &sample);
        assert_eq!(tracker.state(), TrackingState::TransitionToTracking);
        assert!(first.position.x > 0.0 && first.position.x < 0.1);

        // 0.5 s transition at 100 ms per frame
        for _ in 0..4 {
            step(&mut tracker, &sample);
        }
        assert_eq!(tracker.state(), TrackingState::Tracking);

        let target = tracker.target();
        assert!(approx_eq(target.position.x, 0.1));
        assert!(approx_eq(target.position.y, 0.0));
        assert!(approx_eq(target.position.z, -0.7));
        assert!(approx_eq(target.view_separation, SEPARATION));
    }

    #[test]
    fn test_transition_to_tracking_follows_live_head() {
        let mut tracker = HeadTracker::new(FOCUS);
        step(&mut tracker, &head(0.1));
        step(&mut tracker, &head(0.1));
        // progress 0.6, head moved to 0.2
        let target = step(&mut tracker, &head(0.2));
        assert!(approx_eq(target.position.x, 0.2 * 0.6));
        assert!(approx_eq(target.view_separation, SEPARATION * 0.6));
    }

    #[test]
    fn test_transition_to_tracking_uses_last_known_when_head_drops() {
        let mut tracker = HeadTracker::new(FOCUS);
        step(&mut tracker, &head(0.1));
        let target = step(&mut tracker, &no_head());
        assert_eq!(tracker.state(), TrackingState::TransitionToTracking);
        // last known is still the centered pose captured at construction
        assert!(approx_eq(target.position.x, 0.0));
        assert!(approx_eq(target.view_separation, SEPARATION * 0.4));
    }

    #[test]
    fn test_tracking_updates_last_known() {
        let mut tracker = tracking_at(0.05);
        step(&mut tracker, &head(0.08));
        assert!(approx_eq(tracker.last_known().position.x, 0.08));
        assert!(approx_eq(tracker.last_known().view_separation, SEPARATION));
    }

    #[test]
    fn test_grace_period_holds_last_known_pose() {
        let mut tracker = tracking_at(0.05);
        let target = step(&mut tracker, &no_head());
        assert_eq!(tracker.state(), TrackingState::LostGracePeriod);
        assert!(approx_eq(target.position.x, 0.05));
        assert!(approx_eq(target.view_separation, SEPARATION));
    }

    #[test]
    fn test_grace_period_boundary() {
        let config = TrackingConfig {
            head_lost_timeout: Duration::from_secs(1),
            ..TrackingConfig::default()
        };
        let mut tracker = HeadTracker::with_config(FOCUS, config);
        for _ in 0..10 {
            step(&mut tracker, &head(0.05));
        }
        assert_eq!(tracker.state(), TrackingState::Tracking);

        // entering the grace period
        step(&mut tracker, &no_head());
        assert_eq!(tracker.grace_elapsed(), Duration::ZERO);

        // nine frames: 900 ms, just under the timeout
        for _ in 0..9 {
            step(&mut tracker, &no_head());
        }
        assert_eq!(tracker.state(), TrackingState::LostGracePeriod);
        assert_eq!(tracker.grace_elapsed(), Duration::from_millis(900));

        // tenth frame reaches the timeout
        step(&mut tracker, &no_head());
        assert_eq!(tracker.state(), TrackingState::LostGracePeriod);
        assert_eq!(tracker.grace_elapsed(), Duration::from_secs(1));

        // next update leaves the grace period
        step(&mut tracker, &no_head());
        assert_eq!(tracker.state(), TrackingState::TransitionToLost);
        assert_eq!(tracker.grace_elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_head_returns_during_grace_period() {
        let mut tracker = tracking_at(0.05);
        step(&mut tracker, &no_head());
        step(&mut tracker, &no_head());

        let target = step(&mut tracker, &head(0.07));
        assert_eq!(tracker.state(), TrackingState::Tracking);
        assert!(approx_eq(target.position.x, 0.07));
        assert_eq!(tracker.grace_elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_transition_to_lost_completes_at_center() {
        let config = TrackingConfig {
            head_lost_timeout: Duration::ZERO,
            ..TrackingConfig::default()
        };
        let mut tracker = HeadTracker::with_config(FOCUS, config);
        for _ in 0..10 {
            step(&mut tracker, &head(0.1));
        }

        step(&mut tracker, &no_head()); // grace period
        let first = step(&mut tracker, &no_head()); // timeout expired
        assert_eq!(tracker.state(), TrackingState::TransitionToLost);
        assert!(approx_eq(first.position.x, 0.1 * 0.8));
        assert!(approx_eq(first.view_separation, SEPARATION * 0.8));

        for _ in 0..4 {
            step(&mut tracker, &no_head());
        }
        assert_eq!(tracker.state(), TrackingState::Lost);

        let target = tracker.target();
        assert!(approx_eq(target.position.x, 0.0));
        assert!(approx_eq(target.position.y, 0.0));
        assert!(approx_eq(target.position.z, -FOCUS));
        assert!(approx_eq(target.view_separation, 0.0));
    }

    #[test]
    fn test_head_returns_during_transition_to_lost() {
        let config = TrackingConfig {
            head_lost_timeout: Duration::ZERO,
            ..TrackingConfig::default()
        };
        let mut tracker = HeadTracker::with_config(FOCUS, config);
        for _ in 0..10 {
            step(&mut tracker, &head(0.1));
        }
        step(&mut tracker, &no_head());
        step(&mut tracker, &no_head());
        step(&mut tracker, &no_head());
        assert_eq!(tracker.state(), TrackingState::TransitionToLost);

        step(&mut tracker, &head(0.1));
        assert_eq!(tracker.state(), TrackingState::TransitionToTracking);
        assert_eq!(tracker.transition_elapsed(), FRAME);
    }

    #[test]
    fn test_completion_tolerance() {
        let config = TrackingConfig {
            transition_duration: Duration::from_millis(1000),
            completion_tolerance: 0.25,
            ..TrackingConfig::default()
        };
        let mut tracker = HeadTracker::with_config(FOCUS, config);
        let sample = head(0.1);

        // progress 0.1 .. 0.7 stays in transition, 0.8 is within tolerance
        for _ in 0..7 {
            step(&mut tracker, &sample);
            assert_eq!(tracker.state(), TrackingState::TransitionToTracking);
        }
        let target = step(&mut tracker, &sample);
        assert_eq!(tracker.state(), TrackingState::Tracking);
        assert!(approx_eq(target.position.x, 0.1));
    }

    #[test]
    fn test_zero_transition_duration_completes_immediately() {
        let config = TrackingConfig {
            transition_duration: Duration::ZERO,
            ..TrackingConfig::default()
        };
        let mut tracker = HeadTracker::with_config(FOCUS, config);
        let target = step(&mut tracker, &head(0.1));
        assert_eq!(tracker.state(), TrackingState::Tracking);
        assert!(approx_eq(target.position.x, 0.1));
    }

    #[test]
    fn test_timers_are_mutually_exclusive() {
        let mut tracker = HeadTracker::new(FOCUS);
        let script = [true, true, false, false, true, false, false, false, true, true];
        for _ in 0..20 {
            for detected in script {
                let sample = if detected { head(0.03) } else { no_head() };
                step(&mut tracker, &sample);
                if tracker.state() != TrackingState::LostGracePeriod {
                    assert_eq!(tracker.grace_elapsed(), Duration::ZERO);
                }
                if !tracker.state().is_transition() {
                    assert_eq!(tracker.transition_elapsed(), Duration::ZERO);
                }
            }
        }
    }

    #[test]
    fn test_reset_returns_to_lost() {
        let mut tracker = tracking_at(0.1);
        tracker.reset(0.5);
        assert_eq!(tracker.state(), TrackingState::Lost);
        assert_eq!(tracker.target(), RigTarget::centered(0.5));
    }

    #[test]
    fn test_state_display_is_snake_case() {
        assert_eq!(TrackingState::LostGracePeriod.to_string(), "lost_grace_period");
        assert_eq!(
            serde_json::to_value(TrackingState::TransitionToTracking).expect("serialize"),
            "transition_to_tracking"
        );
    }
}
