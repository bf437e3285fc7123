//! The cooperative progress-polling loop.
//!
//! One poller task exists per run, spawned by the controller on backend
//! acceptance and cancelled through its [`CancellationToken`]. Only one
//! fetch is ever outstanding: the loop awaits each request before the
//! next tick, and missed ticks are skipped rather than queued.

use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use jobdeck_core::types::RunId;

use crate::controller::ControllerInner;

/// Poll the backend for progress until cancelled or exhausted.
///
/// Tick failures are logged and counted; `poll_failure_threshold`
/// consecutive failures abort the run via
/// [`ControllerInner::polling_exhausted`]. Any success resets the
/// counter. A snapshot whose fetch was in flight when the token was
/// cancelled is discarded rather than applied.
pub(crate) async fn run(inner: Arc<ControllerInner>, run_id: RunId, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(inner.config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let threshold = inner.config.poll_failure_threshold;
    let mut consecutive_failures: u32 = 0;

    tracing::info!(
        run_id = %run_id,
        interval_ms = inner.config.poll_interval.as_millis() as u64,
        "Progress poller started",
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(run_id = %run_id, "Progress poller cancelled");
                break;
            }
            _ = ticker.tick() => {
                match inner.backend.fetch_progress().await {
                    Ok(snapshot) => {
                        consecutive_failures = 0;
                        if cancel.is_cancelled() {
                            tracing::debug!(
                                run_id = %run_id,
                                "Dropping in-flight snapshot after cancellation",
                            );
                            break;
                        }
                        inner.apply_snapshot(run_id, snapshot).await;
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        tracing::warn!(
                            run_id = %run_id,
                            error = %e,
                            consecutive_failures,
                            "Progress poll failed",
                        );
                        if consecutive_failures >= threshold {
                            inner.polling_exhausted(run_id, consecutive_failures).await;
                            break;
                        }
                    }
                }
            }
        }
    }

    tracing::debug!(run_id = %run_id, "Progress poller exited");
}
