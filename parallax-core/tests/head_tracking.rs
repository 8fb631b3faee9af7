//! Integration tests for the head tracking pipeline.
//!
//! These tests drive samples through the slot, the position filter and the
//! state machine the way a frame loop does, one snapshot per frame.

use std::thread;
use std::time::Duration;

use parallax_core::{
    FilterConfig, HeadSample, HeadTracker, PositionFilter, RigTarget, SampleSlot, TrackingConfig,
    TrackingState,
};

const FOCUS: f64 = 0.7;
const SEPARATION: f64 = 0.065;
const FRAME: Duration = Duration::from_millis(20);

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// Integration Tests: slot -> tracker
// ============================================================================

#[test]
fn integration_reacquire_reaches_head_position() {
    let slot = SampleSlot::new();
    let mut tracker = HeadTracker::new(FOCUS);

    slot.publish(HeadSample::detected_at(0.1, 0.0, -0.7));

    tracker.update(&slot.latest(), FRAME, SEPARATION, FOCUS);
    assert_eq!(tracker.state(), TrackingState::TransitionToTracking);

    // 500 ms of further frames
    for _ in 0..25 {
        tracker.update(&slot.latest(), FRAME, SEPARATION, FOCUS);
    }
    assert_eq!(tracker.state(), TrackingState::Tracking);

    let target = tracker.target();
    assert!(approx_eq(target.position.x, 0.1));
    assert!(approx_eq(target.position.y, 0.0));
    assert!(approx_eq(target.position.z, -0.7));
    assert!(approx_eq(target.view_separation, SEPARATION));
}

#[test]
fn integration_full_loss_cycle() {
    let config = TrackingConfig {
        head_lost_timeout: Duration::from_millis(200),
        transition_duration: Duration::from_millis(200),
        completion_tolerance: 0.01,
    };
    let mut tracker = HeadTracker::with_config(FOCUS, config);
    let head = HeadSample::detected_at(0.05, -0.02, -0.6);
    let nothing = HeadSample::not_detected(FOCUS);

    let mut states = vec![tracker.state()];
    let mut record = |tracker: &HeadTracker| {
        if states.last() != Some(&tracker.state()) {
            states.push(tracker.state());
        }
    };

    for _ in 0..20 {
        tracker.update(&head, FRAME, SEPARATION, FOCUS);
        record(&tracker);
    }
    for _ in 0..40 {
        tracker.update(&nothing, FRAME, SEPARATION, FOCUS);
        record(&tracker);
    }

    assert_eq!(
        states,
        vec![
            TrackingState::Lost,
            TrackingState::TransitionToTracking,
            TrackingState::Tracking,
            TrackingState::LostGracePeriod,
            TrackingState::TransitionToLost,
            TrackingState::Lost,
        ]
    );
    assert_eq!(tracker.target(), RigTarget::centered(FOCUS));
}

#[test]
fn integration_targets_stay_between_poses() {
    let mut tracker = HeadTracker::new(FOCUS);
    let head = HeadSample::detected_at(0.2, 0.1, -0.5);

    for _ in 0..30 {
        let target = tracker.update(&head, FRAME, SEPARATION, FOCUS);
        assert!((0.0..=0.2 + 1e-12).contains(&target.position.x));
        assert!((0.0..=0.1 + 1e-12).contains(&target.position.y));
        assert!(target.position.z <= -0.5 + 1e-12 && target.position.z >= -FOCUS - 1e-12);
        assert!((0.0..=SEPARATION + 1e-12).contains(&target.view_separation));
    }
}

#[test]
fn integration_publisher_thread_feeds_frame_loop() {
    let slot = SampleSlot::new();
    let writer = slot.clone();

    let publisher = thread::spawn(move || {
        for i in 0..200 {
            let x = f64::from(i % 10) * 0.01;
            writer.publish(HeadSample::detected_at(x, 0.0, -FOCUS));
        }
    });

    let mut tracker = HeadTracker::new(FOCUS);
    for _ in 0..100 {
        let sample = slot.latest();
        let target = tracker.update(&sample, FRAME, SEPARATION, FOCUS);
        assert!(target.position.x.is_finite());
    }
    publisher.join().expect("publisher thread should finish");
}

// ============================================================================
// Integration Tests: filter -> tracker
// ============================================================================

#[test]
fn integration_filtered_jitter_is_smoothed() {
    let mut filter = PositionFilter::with_config(FilterConfig {
        kernel_x: 4,
        kernel_y: 4,
        kernel_z: 4,
    });
    let mut tracker = HeadTracker::with_config(
        FOCUS,
        TrackingConfig {
            transition_duration: Duration::ZERO,
            ..TrackingConfig::default()
        },
    );

    let mut last = 0.0;
    for i in 0..40 {
        let jitter = if i % 2 == 0 { 0.01 } else { -0.01 };
        let sample = filter.apply(HeadSample::detected_at(0.1 + jitter, 0.0, -FOCUS));
        last = tracker.update(&sample, FRAME, SEPARATION, FOCUS).position.x;
    }

    // a full window of alternating jitter averages out
    assert!(approx_eq(last, 0.1));
    assert_eq!(tracker.state(), TrackingState::Tracking);
}
