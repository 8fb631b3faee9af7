//! Background tracking provider.
//!
//! Publishes the scripted head into a [`SampleSlot`] at the tracker rate from
//! its own tokio task, the way a camera SDK thread would.

use std::time::Duration;

use parallax_core::SampleSlot;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::script::ScriptedHead;

/// Handle to a running tracking provider.
#[derive(Debug)]
pub struct TrackerHandle {
    task: JoinHandle<u64>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TrackerHandle {
    /// Stop the provider and wait for it.
    ///
    /// Returns the number of samples published, or zero if the task
    /// panicked.
    pub async fn shutdown(mut self) -> u64 {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(published) => published,
            Err(e) => {
                tracing::warn!("Tracking provider task failed: {}", e);
                0
            }
        }
    }
}

/// Spawn a task that publishes `head` into `slot` `rate_hz` times a second.
///
/// A rate of zero is treated as one sample per second.
#[must_use]
pub fn spawn_tracker(slot: SampleSlot, head: ScriptedHead, rate_hz: u32) -> TrackerHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let period = Duration::from_secs(1) / rate_hz.max(1);

    let task = tokio::spawn(async move {
        let start = Instant::now();
        let mut ticker = tokio::time::interval(period);
        let mut published = 0_u64;
        let mut was_detected = None;

        tracing::debug!("Tracking provider started at {:?} per sample", period);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    tracing::debug!("Tracking provider received shutdown signal");
                    break;
                }

                _ = ticker.tick() => {
                    let sample = head.sample_at(start.elapsed());
                    if was_detected != Some(sample.detected) {
                        tracing::debug!(
                            "Head {}",
                            if sample.detected { "detected" } else { "lost" }
                        );
                        was_detected = Some(sample.detected);
                    }
                    slot.publish(sample);
                    published += 1;
                }
            }
        }

        published
    });

    TrackerHandle {
        task,
        shutdown_tx: Some(shutdown_tx),
    }
}
