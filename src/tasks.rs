//! The two long-running task loops.
//!
//! The capture/match task and the services task run on independent schedules
//! and share no mutable state; neither loop ever blocks on the other. The
//! only cross-task coupling is the process-wide restart collaborator, which
//! either loop may trigger and which terminates the whole process.

use std::time::{Duration, Instant};
use tracing::info;

use crate::network::NetworkSupervisor;
use crate::pipeline::RecognitionPipeline;

/// Capture/match loop: strictly sequential, one frame fully processed and
/// released before the next capture begins.
pub async fn run_capture_loop(mut pipeline: RecognitionPipeline, idle: Duration) {
    info!("capture task started");
    loop {
        // the recognized-face trigger (relay, chime) is a consumer concern;
        // the pipeline logs every outcome itself
        let _ = pipeline.process_next().await;
        tokio::time::sleep(idle).await;
    }
}

/// Services loop: periodic supervisor ticks against the real clock.
pub async fn run_services_loop(mut supervisor: NetworkSupervisor, tick: Duration) {
    info!("services task started");
    supervisor.start().await;
    let mut ticker = tokio::time::interval(tick);
    loop {
        ticker.tick().await;
        supervisor.tick(Instant::now()).await;
    }
}
