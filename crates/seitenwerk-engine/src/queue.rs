// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// FIFO conversion queue with a single background worker.
//
// The interactive thread enqueues jobs and watches the event channel; the
// worker pops one job at a time, runs it through the `JobRunner`, and
// reports status. Cancellation discards everything still queued after the
// current job reaches a terminal state; a cancelled job never reports
// `Done`. The queue state is guarded by one Mutex/Condvar pair.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::types::{
    CancelToken, ConversionJob, ConversionSettings, JobEvent, JobEventKind, JobId, JobStatus,
    Operation,
};
use tracing::{error, info, warn};

use crate::dispatch::JobRunner;

/// Handle to the queue. Enqueue/cancel from any thread; dropping the
/// handle stops the worker once the queue has drained.
pub struct JobQueue {
    shared: Arc<QueueShared>,
    worker: Option<thread::JoinHandle<()>>,
}

struct QueueShared {
    state: Mutex<QueueState>,
    signal: Condvar,
    cancel: CancelToken,
}

struct QueueState {
    pending: VecDeque<ConversionJob>,
    finished: Vec<ConversionJob>,
    closing: bool,
}

impl JobQueue {
    /// Start the worker thread. `make_runner` is invoked on the worker
    /// thread itself so runners needing thread affinity (PDFium) are
    /// created in the right place; if it fails, every job is reported as
    /// failed with that error.
    pub fn start<R, F>(make_runner: F) -> (Self, Receiver<JobEvent>)
    where
        R: JobRunner + 'static,
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        let (events, receiver) = channel();
        let shared = Arc::new(QueueShared {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                finished: Vec::new(),
                closing: false,
            }),
            signal: Condvar::new(),
            cancel: CancelToken::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("seitenwerk-worker".into())
            .spawn(move || worker_loop(worker_shared, make_runner, events))
            .expect("failed to spawn queue worker");

        (
            Self {
                shared,
                worker: Some(worker),
            },
            receiver,
        )
    }

    /// Append a job to the back of the queue. Jobs run in submission order.
    pub fn enqueue(&self, operation: Operation, settings: ConversionSettings) -> JobId {
        let job = ConversionJob::new(operation, settings);
        let id = job.id;
        {
            let mut state = self.shared.state.lock().expect("queue lock poisoned");
            state.pending.push_back(job);
        }
        self.shared.signal.notify_all();
        info!(job_id = %id, "job enqueued");
        id
    }

    /// Stop processing after the current job reaches a terminal state and
    /// discard everything still queued. The queue keeps accepting new jobs
    /// afterwards.
    pub fn cancel(&self) {
        self.shared.cancel.cancel();
        self.shared.signal.notify_all();
        info!("cancellation requested");
    }

    /// Number of jobs waiting to run.
    pub fn pending_count(&self) -> usize {
        let state = self.shared.state.lock().expect("queue lock poisoned");
        state.pending.len()
    }

    /// Snapshot of all jobs that reached a terminal state, in completion
    /// order.
    pub fn finished_jobs(&self) -> Vec<ConversionJob> {
        let state = self.shared.state.lock().expect("queue lock poisoned");
        state.finished.clone()
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().expect("queue lock poisoned");
            state.closing = true;
        }
        self.shared.signal.notify_all();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            error!("queue worker panicked");
        }
    }
}

fn worker_loop<R, F>(shared: Arc<QueueShared>, make_runner: F, events: Sender<JobEvent>)
where
    R: JobRunner + 'static,
    F: FnOnce() -> Result<R>,
{
    let mut runner = match make_runner() {
        Ok(runner) => Some(runner),
        Err(err) => {
            error!(error = %err, "conversion runner unavailable");
            None
        }
    };

    loop {
        let mut job = {
            let mut state = shared.state.lock().expect("queue lock poisoned");
            loop {
                if shared.cancel.is_cancelled() {
                    discard_pending(&mut state, &events);
                    shared.cancel.reset();
                }
                if let Some(job) = state.pending.pop_front() {
                    break job;
                }
                if state.closing {
                    return;
                }
                state = shared.signal.wait(state).expect("queue lock poisoned");
            }
        };

        job.status = JobStatus::Running;
        let job_id = job.id;
        let _ = events.send(JobEvent {
            job_id,
            kind: JobEventKind::Started,
        });
        info!(job_id = %job_id, operation = %job.operation.label(), "job started");

        let mut progress = |percent: u8| {
            let _ = events.send(JobEvent {
                job_id,
                kind: JobEventKind::Progress(percent.min(100)),
            });
        };

        let outcome = match runner.as_mut() {
            Some(runner) => runner.run(&job, &shared.cancel, &mut progress),
            None => Err(SeitenwerkError::Render(
                "conversion engine unavailable".into(),
            )),
        };

        let (status, message) = match outcome {
            Ok(report) => (JobStatus::Done, report.message),
            Err(SeitenwerkError::Cancelled) => {
                (JobStatus::Cancelled, "Cancelled by user.".to_string())
            }
            Err(err) => (JobStatus::Failed, err.to_string()),
        };

        match status {
            JobStatus::Done => info!(job_id = %job_id, %message, "job finished"),
            JobStatus::Cancelled => info!(job_id = %job_id, "job cancelled"),
            _ => warn!(job_id = %job_id, %message, "job failed"),
        }

        job.status = status;
        job.message = Some(message.clone());
        // Record before notifying so a listener reacting to the event sees
        // the job in `finished_jobs()`.
        {
            let mut state = shared.state.lock().expect("queue lock poisoned");
            state.finished.push(job);
        }
        let _ = events.send(JobEvent {
            job_id,
            kind: JobEventKind::Finished { status, message },
        });
    }
}

/// Mark everything still queued as cancelled. Called with the state lock
/// held.
fn discard_pending(state: &mut QueueState, events: &Sender<JobEvent>) {
    while let Some(mut job) = state.pending.pop_front() {
        info!(job_id = %job.id, "queued job discarded");
        job.status = JobStatus::Cancelled;
        job.message = Some("Cancelled by user.".to_string());
        let job_id = job.id;
        state.finished.push(job);
        let _ = events.send(JobEvent {
            job_id,
            kind: JobEventKind::Finished {
                status: JobStatus::Cancelled,
                message: "Cancelled by user.".to_string(),
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::OpReport;
    use std::sync::mpsc;
    use std::time::Duration;

    /// Runner that blocks until the test releases a permit, observing the
    /// cancel token while it waits.
    struct GatedRunner {
        gate: mpsc::Receiver<()>,
    }

    impl JobRunner for GatedRunner {
        fn run(
            &mut self,
            job: &ConversionJob,
            cancel: &CancelToken,
            progress: &mut dyn FnMut(u8),
        ) -> Result<OpReport> {
            progress(50);
            loop {
                if cancel.is_cancelled() {
                    return Err(SeitenwerkError::Cancelled);
                }
                match self.gate.recv_timeout(Duration::from_millis(5)) {
                    Ok(()) => return Ok(OpReport::new(job.operation.label())),
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        return Ok(OpReport::new(job.operation.label()));
                    }
                }
            }
        }
    }

    /// Runner that finishes immediately, failing inputs whose file name
    /// contains `bad`.
    struct InstantRunner;

    impl JobRunner for InstantRunner {
        fn run(
            &mut self,
            job: &ConversionJob,
            _cancel: &CancelToken,
            progress: &mut dyn FnMut(u8),
        ) -> Result<OpReport> {
            let label = job.operation.label();
            if label.contains("bad") {
                Err(SeitenwerkError::Pdf(format!("cannot read {label}")))
            } else {
                progress(100);
                Ok(OpReport::new(label))
            }
        }
    }

    fn split_op(name: &str) -> Operation {
        Operation::Split {
            input: name.into(),
            output_dir: "out".into(),
        }
    }

    fn wait_for_finished(events: &Receiver<JobEvent>) -> (JobId, JobStatus, String) {
        let deadline = Duration::from_secs(5);
        loop {
            let event = events.recv_timeout(deadline).expect("event before timeout");
            if let JobEventKind::Finished { status, message } = event.kind {
                return (event.job_id, status, message);
            }
        }
    }

    #[test]
    fn jobs_run_in_submission_order() {
        let (queue, events) = JobQueue::start(|| Ok(InstantRunner));

        let first = queue.enqueue(split_op("one.pdf"), ConversionSettings::default());
        let second = queue.enqueue(split_op("two.pdf"), ConversionSettings::default());
        let third = queue.enqueue(split_op("three.pdf"), ConversionSettings::default());

        let mut order = Vec::new();
        for _ in 0..3 {
            let (id, status, _) = wait_for_finished(&events);
            assert_eq!(status, JobStatus::Done);
            order.push(id);
        }
        assert_eq!(order, vec![first, second, third]);
    }

    #[test]
    fn failed_job_is_recorded_and_the_loop_proceeds() {
        let (queue, events) = JobQueue::start(|| Ok(InstantRunner));

        queue.enqueue(split_op("bad.pdf"), ConversionSettings::default());
        queue.enqueue(split_op("good.pdf"), ConversionSettings::default());

        let (_, first_status, first_message) = wait_for_finished(&events);
        assert_eq!(first_status, JobStatus::Failed);
        assert!(first_message.contains("bad.pdf"));

        let (_, second_status, _) = wait_for_finished(&events);
        assert_eq!(second_status, JobStatus::Done);

        let finished = queue.finished_jobs();
        assert_eq!(finished.len(), 2);
        assert_eq!(finished[0].status, JobStatus::Failed);
        assert_eq!(finished[1].status, JobStatus::Done);
    }

    #[test]
    fn cancel_after_first_job_discards_the_rest() {
        let (release, gate) = mpsc::channel();
        let (queue, events) = JobQueue::start(move || Ok(GatedRunner { gate }));

        for name in ["a.pdf", "b.pdf", "c.pdf", "d.pdf"] {
            queue.enqueue(split_op(name), ConversionSettings::default());
        }

        // Let exactly the first job complete.
        release.send(()).expect("release first job");
        let (_, first_status, _) = wait_for_finished(&events);
        assert_eq!(first_status, JobStatus::Done);

        queue.cancel();

        // The remaining three finish as Cancelled (whether they were
        // discarded while queued or stopped cooperatively mid-run).
        for _ in 0..3 {
            let (_, status, _) = wait_for_finished(&events);
            assert_eq!(status, JobStatus::Cancelled);
        }

        let finished = queue.finished_jobs();
        assert_eq!(finished.len(), 4);
        let done = finished
            .iter()
            .filter(|job| job.status == JobStatus::Done)
            .count();
        let cancelled = finished
            .iter()
            .filter(|job| job.status == JobStatus::Cancelled)
            .count();
        assert_eq!(done, 1);
        assert_eq!(cancelled, 3);
    }

    #[test]
    fn queue_accepts_new_jobs_after_a_cancel() {
        let (queue, events) = JobQueue::start(|| Ok(InstantRunner));

        queue.cancel();
        queue.enqueue(split_op("after.pdf"), ConversionSettings::default());

        // The cancel flag is consumed before or while the new job is
        // picked up; either way the job must reach a terminal state.
        let (_, status, _) = wait_for_finished(&events);
        assert!(status.is_terminal());
    }

    #[test]
    fn started_and_progress_events_precede_finish() {
        let (queue, events) = JobQueue::start(|| Ok(InstantRunner));
        queue.enqueue(split_op("solo.pdf"), ConversionSettings::default());

        let deadline = Duration::from_secs(5);
        let mut kinds = Vec::new();
        loop {
            let event = events.recv_timeout(deadline).expect("event");
            let finished = matches!(event.kind, JobEventKind::Finished { .. });
            kinds.push(event.kind);
            if finished {
                break;
            }
        }

        assert!(matches!(kinds.first(), Some(JobEventKind::Started)));
        assert!(
            kinds
                .iter()
                .any(|kind| matches!(kind, JobEventKind::Progress(100)))
        );
        assert!(matches!(kinds.last(), Some(JobEventKind::Finished { .. })));
    }

    #[test]
    fn runner_factory_failure_fails_jobs_instead_of_panicking() {
        let (queue, events) = JobQueue::start(|| -> Result<InstantRunner> {
            Err(SeitenwerkError::Render("no engine in test".into()))
        });
        queue.enqueue(split_op("any.pdf"), ConversionSettings::default());

        let (_, status, message) = wait_for_finished(&events);
        assert_eq!(status, JobStatus::Failed);
        assert!(message.contains("unavailable"));
    }
}
