//! The operator-facing job queue.
//!
//! [`JobQueue`] is an ordered, session-local collection of [`Job`]s.
//! Insertion order is execution order; the only reordering supported is
//! an explicit move-up/move-down. While a run is active the controller
//! locks the queue and every operator mutation is rejected with
//! [`QueueError::Locked`].

use crate::error::QueueError;
use crate::job::{Job, JobDraft, JobStatus};
use crate::types::JobId;

/// Partial update applied to an existing job.
///
/// `name` is intentionally absent: the label is immutable after
/// creation. Fields left `None` are unchanged.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub run_count: Option<u32>,
    pub level: Option<Option<String>>,
    pub routine_ref: Option<Option<String>>,
    pub params: Option<serde_json::Value>,
}

/// Ordered, mutable collection of jobs plus the lock flag driven by the
/// execution controller.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Vec<Job>,
    locked: bool,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // -- reads --------------------------------------------------------------

    /// Jobs in execution order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Sum of `run_count` over all jobs: the denominator for overall
    /// run progress.
    pub fn total_runs(&self) -> u32 {
        self.jobs.iter().map(|j| j.run_count).sum()
    }

    /// Whether operator mutation is currently rejected.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    // -- operator mutations (rejected while locked) -------------------------

    /// Assign an id to the draft and append it to the queue.
    pub fn add(&mut self, draft: JobDraft) -> Result<Job, QueueError> {
        self.ensure_unlocked()?;
        if draft.run_count == 0 {
            return Err(QueueError::Validation(
                "run_count must be at least 1".to_string(),
            ));
        }
        let job = Job::from_draft(draft);
        self.jobs.push(job.clone());
        Ok(job)
    }

    /// Remove a job, returning it.
    pub fn remove(&mut self, id: JobId) -> Result<Job, QueueError> {
        self.ensure_unlocked()?;
        let index = self.index_of(id)?;
        Ok(self.jobs.remove(index))
    }

    /// Apply a partial update to a job's mutable run parameters.
    pub fn update(&mut self, id: JobId, changes: JobUpdate) -> Result<&Job, QueueError> {
        self.ensure_unlocked()?;
        if let Some(run_count) = changes.run_count {
            if run_count == 0 {
                return Err(QueueError::Validation(
                    "run_count must be at least 1".to_string(),
                ));
            }
        }
        let index = self.index_of(id)?;
        let job = &mut self.jobs[index];
        if let Some(run_count) = changes.run_count {
            job.run_count = run_count;
        }
        if let Some(level) = changes.level {
            job.level = level;
        }
        if let Some(routine_ref) = changes.routine_ref {
            job.routine_ref = routine_ref;
        }
        if let Some(params) = changes.params {
            job.params = params;
        }
        Ok(&self.jobs[index])
    }

    /// Swap a job with its predecessor. Already-first is a no-op.
    pub fn move_up(&mut self, id: JobId) -> Result<(), QueueError> {
        self.ensure_unlocked()?;
        let index = self.index_of(id)?;
        if index > 0 {
            self.jobs.swap(index, index - 1);
        }
        Ok(())
    }

    /// Swap a job with its successor. Already-last is a no-op.
    pub fn move_down(&mut self, id: JobId) -> Result<(), QueueError> {
        self.ensure_unlocked()?;
        let index = self.index_of(id)?;
        if index + 1 < self.jobs.len() {
            self.jobs.swap(index, index + 1);
        }
        Ok(())
    }

    /// Remove every job.
    pub fn clear(&mut self) -> Result<(), QueueError> {
        self.ensure_unlocked()?;
        self.jobs.clear();
        Ok(())
    }

    // -- controller-facing mutations (bypass the lock) -----------------------
    //
    // The execution controller owns these; operator code must never call
    // them. They intentionally ignore the lock flag because they are how
    // run state is written back while the queue is locked.

    /// Lock or unlock operator mutation. Driven by the controller on run
    /// start and termination.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Derive per-job statuses from the count of completed runs.
    ///
    /// Jobs whose cumulative `run_count` is fully covered are
    /// `Completed`; the job the counter currently falls into is
    /// `Active`; the rest are `Pending`. With `completed_runs` equal to
    /// `total_runs()` every job is `Completed`.
    pub fn apply_progress(&mut self, completed_runs: u32) {
        let mut remaining = completed_runs;
        let mut active_seen = false;
        for job in &mut self.jobs {
            if !active_seen && remaining >= job.run_count {
                job.status = JobStatus::Completed;
                remaining -= job.run_count;
            } else if !active_seen {
                job.status = JobStatus::Active;
                active_seen = true;
            } else {
                job.status = JobStatus::Pending;
            }
        }
    }

    /// Mark every job `Completed` (successful run termination).
    pub fn mark_all_completed(&mut self) {
        for job in &mut self.jobs {
            job.status = JobStatus::Completed;
        }
    }

    /// Mark the in-flight job `Failed`, leaving the rest untouched.
    pub fn mark_active_failed(&mut self) {
        for job in &mut self.jobs {
            if job.status == JobStatus::Active {
                job.status = JobStatus::Failed;
            }
        }
    }

    /// Return the in-flight job to `Pending` (operator stop).
    pub fn reset_active(&mut self) {
        for job in &mut self.jobs {
            if job.status == JobStatus::Active {
                job.status = JobStatus::Pending;
            }
        }
    }

    // -- private helpers -----------------------------------------------------

    fn ensure_unlocked(&self) -> Result<(), QueueError> {
        if self.locked {
            return Err(QueueError::Locked);
        }
        Ok(())
    }

    fn index_of(&self, id: JobId) -> Result<usize, QueueError> {
        self.jobs
            .iter()
            .position(|j| j.id == id)
            .ok_or(QueueError::NotFound(id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobCategory;

    fn draft(name: &str, run_count: u32) -> JobDraft {
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

    // -- add / total_runs ----------------------------------------------------

    #[test]
    fn add_appends_in_order_and_recomputes_total_runs() {
        let mut queue = JobQueue::new();
        queue.add(draft("a", 2)).unwrap();
        queue.add(draft("b", 3)).unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.jobs()[0].name, "a");
        assert_eq!(queue.total_runs(), 5);

        let b = queue.jobs()[1].id;
        queue.remove(b).unwrap();
        assert_eq!(queue.total_runs(), 2);
    }

    #[test]
    fn add_rejects_zero_run_count() {
        let mut queue = JobQueue::new();
        assert!(matches!(
            queue.add(draft("a", 0)),
            Err(QueueError::Validation(_))
        ));
        assert!(queue.is_empty());
    }

    // -- lock behaviour ------------------------------------------------------

    #[test]
    fn every_mutation_is_rejected_while_locked() {
        let mut queue = JobQueue::new();
        let job = queue.add(draft("a", 1)).unwrap();
        queue.set_locked(true);

        assert!(matches!(queue.add(draft("b", 1)), Err(QueueError::Locked)));
        assert!(matches!(queue.remove(job.id), Err(QueueError::Locked)));
        assert!(matches!(
            queue.update(job.id, JobUpdate::default()),
            Err(QueueError::Locked)
        ));
        assert!(matches!(queue.move_up(job.id), Err(QueueError::Locked)));
        assert!(matches!(queue.move_down(job.id), Err(QueueError::Locked)));
        assert!(matches!(queue.clear(), Err(QueueError::Locked)));

        queue.set_locked(false);
        assert!(queue.add(draft("b", 1)).is_ok());
    }

    // -- update --------------------------------------------------------------

    #[test]
    fn update_changes_only_requested_fields() {
        let mut queue = JobQueue::new();
        let job = queue.add(draft("a", 1)).unwrap();

        let updated = queue
            .update(
                job.id,
                JobUpdate {
                    run_count: Some(4),
                    level: Some(Some("hard".into())),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.run_count, 4);
        assert_eq!(updated.level.as_deref(), Some("hard"));
        assert_eq!(updated.name, "a");
        assert_eq!(queue.total_runs(), 4);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let mut queue = JobQueue::new();
        let err = queue.update(JobId::new_v4(), JobUpdate::default());
        assert!(matches!(err, Err(QueueError::NotFound(_))));
    }

    #[test]
    fn update_rejects_zero_run_count_without_mutating() {
        let mut queue = JobQueue::new();
        let job = queue.add(draft("a", 2)).unwrap();

        let err = queue.update(
            job.id,
            JobUpdate {
                run_count: Some(0),
                ..Default::default()
            },
        );

        assert!(matches!(err, Err(QueueError::Validation(_))));
        assert_eq!(queue.get(job.id).unwrap().run_count, 2);
    }

    // -- reordering ----------------------------------------------------------

    #[test]
    fn move_up_and_down_swap_neighbours() {
        let mut queue = JobQueue::new();
        queue.add(draft("a", 1)).unwrap();
        let b = queue.add(draft("b", 1)).unwrap();

        queue.move_up(b.id).unwrap();
        assert_eq!(queue.jobs()[0].name, "b");

        queue.move_down(b.id).unwrap();
        assert_eq!(queue.jobs()[0].name, "a");
    }

    #[test]
    fn move_at_boundary_is_a_noop() {
        let mut queue = JobQueue::new();
        let a = queue.add(draft("a", 1)).unwrap();
        let b = queue.add(draft("b", 1)).unwrap();

        queue.move_up(a.id).unwrap();
        queue.move_down(b.id).unwrap();

        assert_eq!(queue.jobs()[0].name, "a");
        assert_eq!(queue.jobs()[1].name, "b");
    }

    // -- status derivation ---------------------------------------------------

    #[test]
    fn apply_progress_marks_at_most_one_job_active() {
        let mut queue = JobQueue::new();
        queue.add(draft("a", 2)).unwrap();
        queue.add(draft("b", 3)).unwrap();
        queue.add(draft("c", 1)).unwrap();

        for completed in 0..=queue.total_runs() {
            queue.apply_progress(completed);
            let active = queue
                .jobs()
                .iter()
                .filter(|j| j.status == JobStatus::Active)
                .count();
            assert!(active <= 1, "completed={completed} left {active} active jobs");
        }
    }

    #[test]
    fn apply_progress_walks_the_run_count_prefix() {
        let mut queue = JobQueue::new();
        queue.add(draft("a", 2)).unwrap();
        queue.add(draft("b", 3)).unwrap();

        queue.apply_progress(0);
        assert_eq!(queue.jobs()[0].status, JobStatus::Active);
        assert_eq!(queue.jobs()[1].status, JobStatus::Pending);

        queue.apply_progress(2);
        assert_eq!(queue.jobs()[0].status, JobStatus::Completed);
        assert_eq!(queue.jobs()[1].status, JobStatus::Active);

        queue.apply_progress(5);
        assert_eq!(queue.jobs()[0].status, JobStatus::Completed);
        assert_eq!(queue.jobs()[1].status, JobStatus::Completed);
    }

    #[test]
    fn terminal_markers_resolve_the_active_job() {
        let mut queue = JobQueue::new();
        queue.add(draft("a", 1)).unwrap();
        queue.add(draft("b", 1)).unwrap();
        queue.apply_progress(1);

        let mut failed = JobQueue::new();
        failed.add(draft("a", 1)).unwrap();
        failed.add(draft("b", 1)).unwrap();
        failed.apply_progress(1);
        failed.mark_active_failed();
        assert_eq!(failed.jobs()[0].status, JobStatus::Completed);
        assert_eq!(failed.jobs()[1].status, JobStatus::Failed);

        queue.reset_active();
        assert_eq!(queue.jobs()[1].status, JobStatus::Pending);

        queue.mark_all_completed();
        assert!(queue
            .jobs()
            .iter()
            .all(|j| j.status == JobStatus::Completed));
    }
}
