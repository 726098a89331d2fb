use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::report_generator::{ReportGenerator, SHUTDOWN_REASON};
use crate::errors::{GenerationError, JobError};
use crate::models::ReportJob;

type Completion = watch::Receiver<Option<ReportJob>>;

/// Handle to a submitted job; resolves once the job is terminal.
#[derive(Debug)]
pub struct JobHandle {
    job_id: Uuid,
    done: Completion,
}

impl JobHandle {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Wait for the terminal job. `None` only if the worker task died
    /// without reporting.
    pub async fn wait(mut self) -> Option<ReportJob> {
        wait_on(&mut self.done).await
    }
}

async fn wait_on(done: &mut Completion) -> Option<ReportJob> {
    done.wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|job| (*job).clone())
}

/// Releases one admission slot on drop
struct AdmissionSlot(Arc<AtomicUsize>);

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Bounded pool running report jobs in the background.
///
/// At most `max_concurrent` jobs execute at once; at most `max_queued` are
/// admitted (waiting plus running). All jobs share one cancellation token, and
/// [`JobRunner::shutdown`] waits for them through a task tracker.
#[derive(Clone)]
pub struct JobRunner {
    generator: Arc<ReportGenerator>,
    permits: Arc<Semaphore>,
    admitted: Arc<AtomicUsize>,
    max_queued: usize,
    cancel: CancellationToken,
    tracker: TaskTracker,
    completions: Arc<RwLock<HashMap<Uuid, Completion>>>,
}

impl JobRunner {
    pub fn new(generator: ReportGenerator, max_concurrent: usize, max_queued: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            generator: Arc::new(generator),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            admitted: Arc::new(AtomicUsize::new(0)),
            max_queued: max_queued.max(max_concurrent),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            completions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Jobs admitted and not yet finished
    pub fn in_flight(&self) -> usize {
        self.admitted.load(Ordering::Acquire)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Admit a pending job for background execution.
    ///
    /// When the runner is full or shutting down the job is marked failed and
    /// persisted before the error is returned.
    pub async fn submit(&self, mut job: ReportJob) -> Result<JobHandle, JobError> {
        if self.cancel.is_cancelled() {
            self.reject(&mut job, GenerationError::Cancelled(SHUTDOWN_REASON.to_string()))
                .await;
            return Err(JobError::ShuttingDown);
        }

        let admitted = self
            .admitted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_queued).then_some(n + 1)
            });
        if admitted.is_err() {
            warn!(job_id = %job.id, limit = self.max_queued, "Job queue is full, rejecting job");
            self.reject(&mut job, GenerationError::Rejected("queue is full".to_string()))
                .await;
            return Err(JobError::QueueFull(self.max_queued));
        }
        let slot = AdmissionSlot(self.admitted.clone());

        let job_id = job.id;
        let (tx, rx) = watch::channel(None);
        self.completions.write().await.insert(job_id, rx.clone());

        let generator = self.generator.clone();
        let permits = self.permits.clone();
        let cancel = self.cancel.clone();
        let completions = self.completions.clone();

        self.tracker.spawn(async move {
            let _slot = slot;
            let finished = tokio::select! {
                permit = permits.acquire_owned() => match permit {
                    Ok(_permit) => generator.generate(job, &cancel).await,
                    Err(_) => {
                        let mut job = job;
                        fail_unstarted(&generator, &mut job).await;
                        job
                    }
                },
                _ = cancel.cancelled() => {
                    let mut job = job;
                    fail_unstarted(&generator, &mut job).await;
                    job
                }
            };

            debug!(job_id = %finished.id, status = %finished.status, "Job finished");
            tx.send_replace(Some(finished));
            completions.write().await.remove(&job_id);
        });

        debug!(job_id = %job_id, in_flight = self.in_flight(), "Job admitted");
        Ok(JobHandle { job_id, done: rx })
    }

    /// Wait for a job admitted by this runner. Jobs that already finished are
    /// read back from the store; unknown jobs yield `None`.
    pub async fn wait_for(&self, job_id: Uuid) -> Option<ReportJob> {
        let pending = self.completions.read().await.get(&job_id).cloned();
        if let Some(mut done) = pending {
            return wait_on(&mut done).await;
        }
        match self.generator.store().get_job(job_id).await {
            Ok(job) if job.is_terminal() => Some(job),
            _ => None,
        }
    }

    /// Stop admitting jobs, cancel in-flight ones and wait up to `grace` for
    /// them to reach a terminal state. Returns whether every job finished.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        info!(in_flight = self.in_flight(), "Shutting down job runner");
        self.cancel.cancel();
        self.tracker.close();

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                info!("All report jobs finished");
                true
            }
            Err(_) => {
                warn!(
                    in_flight = self.in_flight(),
                    "Job runner shutdown grace period of {}s elapsed",
                    grace.as_secs()
                );
                false
            }
        }
    }

    async fn reject(&self, job: &mut ReportJob, cause: GenerationError) {
        let message = cause.to_string();
        if job.fail(message.as_str()).is_ok() {
            if let Err(e) = self.generator.store().save_job(job).await {
                warn!(job_id = %job.id, "Failed to persist rejected job: {}", e);
            }
        }
    }
}

async fn fail_unstarted(generator: &ReportGenerator, job: &mut ReportJob) {
    let message = GenerationError::Cancelled(SHUTDOWN_REASON.to_string()).to_string();
    if job.fail(message.as_str()).is_ok() {
        if let Err(e) = generator.store().save_job(job).await {
            warn!(job_id = %job.id, "Failed to persist cancelled job: {}", e);
        }
    }
}
