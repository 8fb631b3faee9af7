//! # Parallax Simulator
//!
//! Runs the camera rig headless against a scripted head tracker.

use std::io::{self, Write};

use clap::Parser;
use parallax_sim::{
    build_simulation, select_index_map, spawn_tracker, CliArgs, ScriptedHead, SimConfig,
    SimSummary,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing; `RUST_LOG_FORMAT=json` switches to JSON output.
///
/// Logs go to stderr so frame reports on stdout stay machine readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("parallax_sim=debug,parallax_renderer=debug,parallax_core=info")
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting parallax simulator v{}", parallax_core::VERSION);

    // Parse CLI arguments
    let args = CliArgs::parse();
    let config = SimConfig::from(args);

    tracing::info!(
        "Rig config: {} mode, {} views at {} fps, tracker at {} Hz",
        config.rig.mode,
        config.rig.view_count,
        config.fps,
        config.tracker_hz
    );

    let index_map = select_index_map(config.index_map.as_deref(), config.rig.view_count)?;
    tracing::info!(
        "Index map: {} slots, {} blank",
        index_map.len(),
        index_map.blank_count()
    );
    tracing::debug!("Index map table: {:?}", index_map.to_raw());

    let (mut simulation, slot) = build_simulation(&config)?;
    let tracker = spawn_tracker(
        slot,
        ScriptedHead::new(config.script.clone()),
        config.tracker_hz,
    );

    let reports = config.json_reports.then(|| io::stdout().lock());
    let outcome = tokio::select! {
        result = simulation.run(config.frames, reports) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping");
            None
        }
    };

    let published = tracker.shutdown().await;
    tracing::debug!("Tracking provider published {} samples", published);

    let summary = match outcome {
        Some(result) => result?,
        None => simulation.summary(simulation.rig().stats().frames),
    };
    log_summary(&summary)?;

    tracing::info!("Parallax simulator exited");
    Ok(())
}

fn log_summary(summary: &SimSummary) -> anyhow::Result<()> {
    tracing::info!(
        "Rendered {} frames ({} rejected), {} tracking state changes, avg update {:.3} ms, peak {:.3} ms",
        summary.frames,
        summary.rejected_frames,
        summary.state_changes,
        summary.stats.avg_update_time_ms,
        summary.stats.peak_update_time_ms
    );

    let mut stderr = io::stderr().lock();
    serde_json::to_writer_pretty(&mut stderr, summary)?;
    writeln!(stderr)?;
    Ok(())
}
