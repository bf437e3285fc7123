//! Shared test support: a scriptable execution-backend double and
//! helpers for driving the controller in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use jobdeck_client::{
    AckReply, BackendApiError, ClearReply, ExecutionBackend, ProgressSnapshot, QueuedJob,
    SubmitReply,
};
use jobdeck_core::history::{HistoryEntry, RunOutcome};
use jobdeck_core::job::{JobCategory, JobDraft};
use jobdeck_core::types::RunId;
use jobdeck_engine::{ControllerState, EngineConfig, RunController};
use jobdeck_events::EventBus;

/// One scripted reply to a progress poll.
#[derive(Debug, Clone)]
pub enum PollReply {
    Snapshot(ProgressSnapshot),
    Transport,
}

/// Scriptable in-memory stand-in for the execution backend.
///
/// Progress polls consume the script front-to-back; the final entry
/// repeats forever so a run can be held in any state indefinitely.
pub struct FakeBackend {
    pub accept_submit: AtomicBool,
    pub reject_message: Mutex<Option<String>>,
    pub submit_transport_error: AtomicBool,
    pub ack_stop: AtomicBool,
    pub ack_pause: AtomicBool,
    pub ack_resume: AtomicBool,
    pub clear_success: AtomicBool,
    /// Delay applied to every progress fetch, for in-flight races.
    pub poll_delay_ms: AtomicU64,
    pub poll_script: Mutex<VecDeque<PollReply>>,
    pub remote_history: Mutex<Vec<HistoryEntry>>,

    pub submitted: Mutex<Vec<Vec<QueuedJob>>>,
    pub poll_calls: AtomicU32,
    pub stop_calls: AtomicU32,
    pub pause_calls: AtomicU32,
    pub resume_calls: AtomicU32,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            accept_submit: AtomicBool::new(true),
            reject_message: Mutex::new(None),
            submit_transport_error: AtomicBool::new(false),
            ack_stop: AtomicBool::new(true),
            ack_pause: AtomicBool::new(true),
            ack_resume: AtomicBool::new(true),
            clear_success: AtomicBool::new(true),
            poll_delay_ms: AtomicU64::new(0),
            poll_script: Mutex::new(VecDeque::new()),
            remote_history: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            poll_calls: AtomicU32::new(0),
            stop_calls: AtomicU32::new(0),
            pause_calls: AtomicU32::new(0),
            resume_calls: AtomicU32::new(0),
        })
    }

    pub async fn script_polls(&self, replies: Vec<PollReply>) {
        *self.poll_script.lock().await = replies.into();
    }

    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }

    fn transport_error() -> BackendApiError {
        BackendApiError::Api {
            status: 503,
            body: "backend unreachable".to_string(),
        }
    }
}

#[async_trait]
impl ExecutionBackend for FakeBackend {
    async fn submit(&self, jobs: &[QueuedJob]) -> Result<SubmitReply, BackendApiError> {
        self.submitted.lock().await.push(jobs.to_vec());
        if self.submit_transport_error.load(Ordering::SeqCst) {
            return Err(Self::transport_error());
        }
        Ok(SubmitReply {
            accepted: self.accept_submit.load(Ordering::SeqCst),
            message: self.reject_message.lock().await.clone(),
        })
    }

    async fn stop(&self) -> Result<AckReply, BackendApiError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AckReply {
            acknowledged: self.ack_stop.load(Ordering::SeqCst),
        })
    }

    async fn pause(&self) -> Result<AckReply, BackendApiError> {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AckReply {
            acknowledged: self.ack_pause.load(Ordering::SeqCst),
        })
    }

    async fn resume(&self) -> Result<AckReply, BackendApiError> {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AckReply {
            acknowledged: self.ack_resume.load(Ordering::SeqCst),
        })
    }

    async fn fetch_progress(&self) -> Result<ProgressSnapshot, BackendApiError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.poll_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let mut script = self.poll_script.lock().await;
        let reply = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };

        match reply {
            Some(PollReply::Snapshot(snapshot)) => Ok(snapshot),
            Some(PollReply::Transport) | None => Err(Self::transport_error()),
        }
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, BackendApiError> {
        Ok(self.remote_history.lock().await.clone())
    }

    async fn clear_history(&self) -> Result<ClearReply, BackendApiError> {
        Ok(ClearReply {
            success: self.clear_success.load(Ordering::SeqCst),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Controller wired to the fake backend with a fast poll interval.
pub fn make_controller(backend: &Arc<FakeBackend>) -> (RunController, Arc<EventBus>) {
    init_tracing();
    let bus = Arc::new(EventBus::default());
    let config = EngineConfig {
        poll_interval: Duration::from_millis(20),
        poll_failure_threshold: 5,
    };
    let controller = RunController::new(
        Arc::clone(backend) as Arc<dyn ExecutionBackend>,
        Arc::clone(&bus),
        config,
    );
    (controller, bus)
}

pub fn draft(name: &str, run_count: u32) -> JobDraft {
    JobDraft {
        name: name.into(),
        category: JobCategory::Commission,
        sub_category: None,
        level: None,
        routine_ref: None,
        run_count,
        params: serde_json::Value::Object(Default::default()),
    }
}

pub fn running(current: u32, total: u32) -> ProgressSnapshot {
    ProgressSnapshot {
        current,
        total,
        status_label: "running".to_string(),
        is_running: true,
    }
}

pub fn finished(current: u32, total: u32, status_label: &str) -> ProgressSnapshot {
    ProgressSnapshot {
        current,
        total,
        status_label: status_label.to_string(),
        is_running: false,
    }
}

pub fn history_entry(outcome: RunOutcome) -> HistoryEntry {
    HistoryEntry {
        run_id: RunId::new_v4(),
        jobs: vec![],
        outcome,
        completed_runs: 1,
        total_runs: 1,
        detail: serde_json::json!({}),
        started_at: chrono::Utc::now(),
        created_at: chrono::Utc::now(),
        duration_ms: 10,
    }
}

pub async fn wait_for_state(controller: &RunController, want: ControllerState) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while controller.state().await != want {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for controller state {want}",
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub async fn wait_for_polls(backend: &FakeBackend, at_least: u32) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while backend.poll_calls() < at_least {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {at_least} polls",
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
