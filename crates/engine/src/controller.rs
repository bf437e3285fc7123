//! The execution controller: single point of truth for run lifecycle.
//!
//! [`RunController`] validates lifecycle preconditions, submits the
//! queue to the execution backend, spawns the progress poller for the
//! duration of a run, and applies reconciled snapshots back into local
//! state. Every failure path resolves to a settled state (`Idle`, via a
//! transient `Error`) before it is surfaced; the controller is never
//! left straddling two states.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use jobdeck_client::{labels, ExecutionBackend, ProgressSnapshot, QueuedJob};
use jobdeck_core::history::{HistoryEntry, HistoryJobRecord, RunOutcome};
use jobdeck_core::queue::JobQueue;
use jobdeck_core::types::{RunId, Timestamp};
use jobdeck_events::{EngineEvent, EventBus, Severity};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::history::HistoryArchive;
use crate::poller;
use crate::reconciler;
use crate::state::{self, ControllerState};

/// Bookkeeping for the run currently in flight.
pub(crate) struct ActiveRun {
    pub(crate) run_id: RunId,
    /// The denominator recorded at run start.
    pub(crate) total: u32,
    pub(crate) started_at: Timestamp,
    started_instant: Instant,
    /// Cancelling this token stops the poller; cancellation is
    /// idempotent and observable.
    pub(crate) cancel: CancellationToken,
    poller: Option<JoinHandle<()>>,
}

/// Shared engine state. The poller task holds a clone of this `Arc`.
pub(crate) struct ControllerInner {
    pub(crate) backend: Arc<dyn ExecutionBackend>,
    pub(crate) bus: Arc<EventBus>,
    pub(crate) archive: Arc<HistoryArchive>,
    pub(crate) config: EngineConfig,
    queue: Arc<RwLock<JobQueue>>,
    state: RwLock<ControllerState>,
    snapshot: RwLock<ProgressSnapshot>,
    active: RwLock<Option<ActiveRun>>,
}

/// Cheaply-cloneable handle to the execution engine.
///
/// Constructed once per application session and passed by reference to
/// consumers; there is no global instance.
#[derive(Clone)]
pub struct RunController {
    inner: Arc<ControllerInner>,
}

impl RunController {
    pub fn new(
        backend: Arc<dyn ExecutionBackend>,
        bus: Arc<EventBus>,
        config: EngineConfig,
    ) -> Self {
        let archive = Arc::new(HistoryArchive::new(Arc::clone(&backend)));
        Self {
            inner: Arc::new(ControllerInner {
                backend,
                bus,
                archive,
                config,
                queue: Arc::new(RwLock::new(JobQueue::new())),
                state: RwLock::new(ControllerState::Idle),
                snapshot: RwLock::new(ProgressSnapshot::idle()),
                active: RwLock::new(None),
            }),
        }
    }

    // -- read-only observers -------------------------------------------------

    /// The session queue. Operator mutation goes through
    /// [`JobQueue`]'s own methods and is rejected while a run is active.
    pub fn queue(&self) -> Arc<RwLock<JobQueue>> {
        Arc::clone(&self.inner.queue)
    }

    /// The archive of finished runs.
    pub fn archive(&self) -> Arc<HistoryArchive> {
        Arc::clone(&self.inner.archive)
    }

    pub async fn state(&self) -> ControllerState {
        *self.inner.state.read().await
    }

    pub async fn snapshot(&self) -> ProgressSnapshot {
        self.inner.snapshot.read().await.clone()
    }

    // -- lifecycle -----------------------------------------------------------

    /// Submit the queue and begin a run.
    ///
    /// Valid only from `Idle` with a non-empty queue. On backend
    /// acceptance the controller is `Running` and the poller is live;
    /// on rejection or transport failure the error is surfaced and the
    /// controller settles back to `Idle` without starting the poller.
    pub async fn start(&self) -> Result<RunId, EngineError> {
        let total = {
            let mut state = self.inner.state.write().await;
            if *state != ControllerState::Idle {
                return Err(EngineError::AlreadyRunning(*state));
            }
            let mut queue = self.inner.queue.write().await;
            let total = queue.total_runs();
            if total == 0 {
                return Err(EngineError::EmptyQueue);
            }
            // Lock the queue in the same critical section that leaves
            // idle, so no mutation can slip in while starting.
            *state = ControllerState::Starting;
            queue.set_locked(true);
            total
        };

        *self.inner.snapshot.write().await = ProgressSnapshot::preparing(total);

        let run_id = RunId::new_v4();
        let payload: Vec<QueuedJob> = {
            let queue = self.inner.queue.read().await;
            queue.jobs().iter().map(QueuedJob::from).collect()
        };

        tracing::info!(
            run_id = %run_id,
            jobs = payload.len(),
            total_runs = total,
            "Submitting queue to execution backend",
        );

        let reply = match self.inner.backend.submit(&payload).await {
            Ok(reply) => reply,
            Err(e) => {
                return self
                    .inner
                    .fail_start(run_id, EngineError::Transport(e.to_string()))
                    .await;
            }
        };

        if !reply.accepted {
            let detail = reply
                .message
                .unwrap_or_else(|| "queue rejected by backend".to_string());
            return self
                .inner
                .fail_start(run_id, EngineError::SubmitRejected(detail))
                .await;
        }

        self.inner
            .transition(ControllerState::Running, "submit accepted")
            .await;
        self.inner.queue.write().await.apply_progress(0);

        let cancel = CancellationToken::new();
        let run = ActiveRun {
            run_id,
            total,
            started_at: Utc::now(),
            started_instant: Instant::now(),
            cancel: cancel.clone(),
            poller: None,
        };
        *self.inner.active.write().await = Some(run);

        self.inner.bus.publish(EngineEvent::RunStarted {
            run_id,
            total_runs: total,
        });

        let handle = tokio::spawn(poller::run(Arc::clone(&self.inner), run_id, cancel));
        if let Some(active) = self.inner.active.write().await.as_mut() {
            active.poller = Some(handle);
        }

        Ok(run_id)
    }

    /// Stop the active run.
    ///
    /// Best-effort towards the backend: local state settles to `Idle`
    /// whether or not the stop request is acknowledged, and the poller
    /// issues no further polls once this returns. Calling `stop()` when
    /// already idle is a no-op.
    pub async fn stop(&self) -> Result<(), EngineError> {
        {
            let mut state = self.inner.state.write().await;
            match *state {
                ControllerState::Running => *state = ControllerState::Stopping,
                ControllerState::Idle => {
                    tracing::debug!("stop() while idle is a no-op");
                    return Ok(());
                }
                other => {
                    return Err(EngineError::InvalidState {
                        operation: "stop",
                        state: other,
                    });
                }
            }
        }

        let (run_id, cancel) = {
            let active = self.inner.active.read().await;
            match active.as_ref() {
                Some(run) => (run.run_id, run.cancel.clone()),
                None => {
                    // The run terminated in the gap before we took the
                    // state lock; just settle.
                    tracing::warn!("stop() found no active run; settling to idle");
                    *self.inner.state.write().await = ControllerState::Idle;
                    return Ok(());
                }
            }
        };

        // Cancel the poller before anything slow: no further tick may
        // reach the reconciler once stopping has begun.
        cancel.cancel();
        tracing::info!(run_id = %run_id, "Stopping run");

        match self.inner.backend.stop().await {
            Ok(reply) if !reply.acknowledged => {
                tracing::warn!(run_id = %run_id, "Backend did not acknowledge stop");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(run_id = %run_id, error = %e, "Stop request failed; settling locally");
                self.inner.notify(
                    Severity::Warning,
                    format!("Stop request to backend failed: {e}"),
                );
            }
        }

        self.inner
            .finish_run(run_id, RunOutcome::Stopped, None)
            .await;
        Ok(())
    }

    /// Ask the backend to suspend the active run.
    ///
    /// The controller stays `Running`: suspension is a backend-internal
    /// condition, not a queue-ownership change. The status label is
    /// updated optimistically and corrected by the next poll.
    pub async fn pause(&self) -> Result<(), EngineError> {
        self.forward_suspension("pause", labels::PAUSED).await
    }

    /// Ask the backend to resume a suspended run.
    pub async fn resume(&self) -> Result<(), EngineError> {
        self.forward_suspension("resume", labels::RUNNING).await
    }

    /// Cancel any active run and wait briefly for the poller to exit.
    ///
    /// For application shutdown only: no history entry is recorded and
    /// no stop request is sent.
    pub async fn shutdown(&self) {
        let run = self.inner.active.write().await.take();
        if let Some(run) = run {
            tracing::info!(run_id = %run.run_id, "Shutting down with a run in flight");
            run.cancel.cancel();
            if let Some(handle) = run.poller {
                let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
            }
            self.inner.queue.write().await.set_locked(false);
            *self.inner.state.write().await = ControllerState::Idle;
        }
    }

    // -- private helpers -----------------------------------------------------

    async fn forward_suspension(
        &self,
        operation: &'static str,
        optimistic_label: &str,
    ) -> Result<(), EngineError> {
        {
            let state = self.inner.state.read().await;
            if *state != ControllerState::Running {
                return Err(EngineError::InvalidState {
                    operation,
                    state: *state,
                });
            }
        }

        // Optimistic: the next poll overwrites with backend truth.
        self.inner.snapshot.write().await.status_label = optimistic_label.to_string();

        let result = match operation {
            "pause" => self.inner.backend.pause().await,
            _ => self.inner.backend.resume().await,
        };

        match result {
            Ok(reply) if reply.acknowledged => {
                tracing::info!(operation, "Backend acknowledged");
            }
            Ok(_) => {
                tracing::warn!(operation, "Backend did not acknowledge");
                self.inner.notify(
                    Severity::Warning,
                    format!("Backend did not acknowledge {operation}"),
                );
            }
            Err(e) => {
                tracing::warn!(operation, error = %e, "Request failed");
                self.inner
                    .notify(Severity::Warning, format!("{operation} failed: {e}"));
            }
        }
        Ok(())
    }
}

impl ControllerInner {
    /// Log + publish an operator notification.
    pub(crate) fn notify(&self, severity: Severity, message: String) {
        self.bus.publish(EngineEvent::Notice { severity, message });
    }

    /// Change state, asserting the transition table in debug builds.
    pub(crate) async fn transition(&self, to: ControllerState, reason: &'static str) {
        let mut state = self.state.write().await;
        debug_assert!(
            state::can_transition(*state, to),
            "invalid controller transition {} -> {to}",
            *state,
        );
        tracing::debug!(from = %*state, to = %to, reason, "Controller state change");
        *state = to;
    }

    /// Apply a polled snapshot. Called only by the poller.
    ///
    /// Snapshots for a run that is no longer current (finished, stopped,
    /// or superseded) are discarded rather than applied.
    pub(crate) async fn apply_snapshot(&self, run_id: RunId, incoming: ProgressSnapshot) {
        let total = {
            let active = self.active.read().await;
            match active.as_ref() {
                Some(run) if run.run_id == run_id && !run.cancel.is_cancelled() => run.total,
                _ => {
                    tracing::debug!(run_id = %run_id, "Discarding snapshot for finished run");
                    return;
                }
            }
        };
        if *self.state.read().await != ControllerState::Running {
            tracing::debug!(run_id = %run_id, "Discarding snapshot outside running state");
            return;
        }

        let merged = {
            let mut snapshot = self.snapshot.write().await;
            let merged = reconciler::reconcile(&snapshot, &incoming, total);
            if merged.conflict {
                tracing::warn!(
                    run_id = %run_id,
                    reported_total = incoming.total,
                    expected_total = total,
                    "Snapshot total disagrees with run total; keeping local denominator",
                );
            }
            if merged.regressed {
                tracing::warn!(
                    run_id = %run_id,
                    reported_current = incoming.current,
                    local_current = snapshot.current,
                    "Snapshot current regressed; clamped to local value",
                );
            }
            *snapshot = merged.snapshot.clone();
            merged
        };

        if merged.terminal.is_none() {
            self.queue.write().await.apply_progress(merged.snapshot.current);
        }

        self.bus.publish(EngineEvent::ProgressUpdated {
            run_id,
            current: merged.snapshot.current,
            total: merged.snapshot.total,
            status_label: merged.snapshot.status_label.clone(),
        });

        if let Some(outcome) = merged.terminal {
            tracing::info!(
                run_id = %run_id,
                outcome = outcome.as_str(),
                current = merged.snapshot.current,
                "Terminal snapshot reconciled",
            );
            self.finish_run(run_id, outcome, None).await;
        }
    }

    /// Force the run into `Error` after the poller gave up.
    pub(crate) async fn polling_exhausted(&self, run_id: RunId, failures: u32) {
        if *self.state.read().await != ControllerState::Running {
            return;
        }
        let err = EngineError::PollingExhausted { failures };
        tracing::error!(run_id = %run_id, failures, "Progress polling exhausted");
        self.notify(Severity::Error, err.to_string());
        self.finish_run(run_id, RunOutcome::Failed, Some(err.to_string()))
            .await;
    }

    /// Terminate the current run exactly once: freeze the snapshot,
    /// resolve job statuses, capture history, unlock the queue, and
    /// settle the controller state.
    pub(crate) async fn finish_run(&self, run_id: RunId, outcome: RunOutcome, note: Option<String>) {
        let run = {
            let mut active = self.active.write().await;
            match active.take() {
                Some(run) if run.run_id == run_id => run,
                other => {
                    *active = other;
                    tracing::debug!(run_id = %run_id, "Stale run termination ignored");
                    return;
                }
            }
        };
        run.cancel.cancel();

        let final_snapshot = {
            let mut snapshot = self.snapshot.write().await;
            snapshot.status_label = match outcome {
                RunOutcome::Completed => labels::COMPLETED.to_string(),
                RunOutcome::Failed => labels::FAILED.to_string(),
                RunOutcome::Stopped => labels::STOPPED.to_string(),
            };
            snapshot.is_running = false;
            snapshot.clone()
        };

        let job_records: Vec<HistoryJobRecord> = {
            let mut queue = self.queue.write().await;
            match outcome {
                RunOutcome::Completed => queue.mark_all_completed(),
                RunOutcome::Failed => queue.mark_active_failed(),
                RunOutcome::Stopped => queue.reset_active(),
            }
            queue.set_locked(false);
            queue.jobs().iter().map(HistoryJobRecord::from).collect()
        };

        let entry = HistoryEntry {
            run_id,
            jobs: job_records,
            outcome,
            completed_runs: final_snapshot.current,
            total_runs: run.total,
            detail: serde_json::json!({
                "status_label": final_snapshot.status_label,
                "note": note,
            }),
            started_at: run.started_at,
            created_at: Utc::now(),
            duration_ms: run.started_instant.elapsed().as_millis() as i64,
        };
        self.archive.append(entry).await;
        if let Err(e) = self.archive.refresh().await {
            tracing::warn!(run_id = %run_id, error = %e, "History refresh after run failed");
        }

        match outcome {
            RunOutcome::Completed => {
                self.transition(ControllerState::Idle, "run completed").await;
                self.bus.publish(EngineEvent::RunCompleted {
                    run_id,
                    completed_runs: final_snapshot.current,
                });
                tracing::info!(
                    run_id = %run_id,
                    completed_runs = final_snapshot.current,
                    "Run completed",
                );
            }
            RunOutcome::Failed => {
                let error = note.unwrap_or_else(|| "backend reported failure".to_string());
                self.transition(ControllerState::Error, "run failed").await;
                self.bus.publish(EngineEvent::RunFailed {
                    run_id,
                    error: error.clone(),
                });
                self.notify(Severity::Error, format!("Run failed: {error}"));
                tracing::warn!(run_id = %run_id, error = %error, "Run failed");
                self.transition(ControllerState::Idle, "error surfaced").await;
            }
            RunOutcome::Stopped => {
                self.transition(ControllerState::Idle, "run stopped").await;
                self.bus.publish(EngineEvent::RunStopped { run_id });
                tracing::info!(run_id = %run_id, "Run stopped");
            }
        }
    }

    /// Resolve a failed submission: surface the error, unlock the
    /// queue, and settle back to `Idle`. The poller was never started.
    async fn fail_start(&self, run_id: RunId, err: EngineError) -> Result<RunId, EngineError> {
        tracing::warn!(run_id = %run_id, error = %err, "Queue submission failed");

        self.transition(ControllerState::Error, "submit failed").await;
        {
            let mut snapshot = self.snapshot.write().await;
            snapshot.status_label = labels::FAILED.to_string();
            snapshot.is_running = false;
        }
        self.queue.write().await.set_locked(false);
        self.notify(Severity::Error, err.to_string());
        self.transition(ControllerState::Idle, "error surfaced").await;

        Err(err)
    }
}
