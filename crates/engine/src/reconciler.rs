//! Merging polled progress snapshots into local state.
//!
//! [`reconcile`] is a pure function; the controller owns the side
//! effects of applying its result (snapshot replacement, job status
//! updates, terminal handling).

use jobdeck_client::{labels, ProgressSnapshot};
use jobdeck_core::history::RunOutcome;

/// Result of merging an incoming snapshot into the local one.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// The merged snapshot to install.
    pub snapshot: ProgressSnapshot,
    /// The incoming `total` disagreed with the total recorded at run
    /// start; the local denominator was kept.
    pub conflict: bool,
    /// The incoming `current` regressed and was clamped to the local
    /// value.
    pub regressed: bool,
    /// `Some` when the incoming snapshot ends the run.
    pub terminal: Option<RunOutcome>,
}

/// Merge a backend-reported snapshot into the local snapshot.
///
/// The backend is authoritative for `status_label` and `is_running`.
/// `current` is applied monotonically: a regression is clamped to the
/// locally-held value rather than moving the progress bar backwards.
/// `total` always stays at the value recorded at run start; a differing
/// incoming `total` is flagged as a conflict but does not corrupt the
/// denominator.
pub fn reconcile(
    local: &ProgressSnapshot,
    incoming: &ProgressSnapshot,
    expected_total: u32,
) -> Reconciled {
    let conflict = incoming.total != expected_total;
    let regressed = incoming.current < local.current;

    let snapshot = ProgressSnapshot {
        current: incoming.current.max(local.current),
        total: expected_total,
        status_label: incoming.status_label.clone(),
        is_running: incoming.is_running,
    };

    let terminal = snapshot.is_terminal().then(|| outcome_of(&snapshot));

    Reconciled {
        snapshot,
        conflict,
        regressed,
        terminal,
    }
}

/// Map a terminal snapshot to a run outcome: an explicit `failed` label
/// is a failure, anything else that ended is a success.
fn outcome_of(snapshot: &ProgressSnapshot) -> RunOutcome {
    if snapshot.status_label == labels::FAILED {
        RunOutcome::Failed
    } else {
        RunOutcome::Completed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
