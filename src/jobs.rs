// Batch rename job: one progress slot, one background task at a time.
// The progress mutex is never held across I/O or an await point; the watch value
// is only changed while it is held so the two never disagree.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::DeviceError;
use crate::models::{JobState, ProgressSnapshot, RenameRequest, RenameResult};
use crate::service::DeviceService;

#[derive(Debug, Default)]
struct Progress {
    state: JobState,
    current: usize,
    total: usize,
    completed: bool,
    error: Option<String>,
    results: Vec<RenameResult>,
}

impl Progress {
    fn running(total: usize) -> Self {
        Self {
            state: JobState::Running,
            total,
            ..Default::default()
        }
    }

    fn snapshot(&self) -> ProgressSnapshot {
        let percentage = if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64 * 1000.0).round() / 10.0
        };
        let succeeded = self.results.iter().filter(|r| r.success).count();
        ProgressSnapshot {
            state: self.state,
            current: self.current,
            total: self.total,
            percentage,
            completed: self.completed,
            error: self.error.clone(),
            succeeded,
            failed: self.results.len() - succeeded,
            latest_result: self.results.last().cloned(),
        }
    }
}

fn lock(progress: &Mutex<Progress>) -> MutexGuard<'_, Progress> {
    // A panic while holding the guard leaves plain counters behind; keep serving them.
    progress.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the single batch slot. A second submission while one is running is rejected.
pub struct BatchJobManager {
    progress: Arc<Mutex<Progress>>,
    state_tx: watch::Sender<JobState>,
}

impl Default for BatchJobManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchJobManager {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(JobState::Idle);
        Self {
            progress: Arc::new(Mutex::new(Progress::default())),
            state_tx,
        }
    }

    /// Resets the slot and starts renaming in the background. Returns as soon as the task is spawned.
    pub fn submit(
        &self,
        service: Arc<DeviceService>,
        updates: Vec<RenameRequest>,
    ) -> Result<(), DeviceError> {
        if updates.is_empty() {
            return Err(DeviceError::Validation(
                "no devices to update were provided".into(),
            ));
        }
        {
            let mut progress = lock(&self.progress);
            if progress.state.is_running() {
                return Err(DeviceError::BatchInProgress);
            }
            *progress = Progress::running(updates.len());
            self.state_tx.send_replace(JobState::Running);
        }
        info!(total = updates.len(), "batch rename started");

        let progress = self.progress.clone();
        let worker = tokio::spawn(async move {
            service
                .batch_rename(&updates, |current, _total, result| {
                    let mut p = lock(&progress);
                    p.current = current;
                    p.results.push(result.clone());
                })
                .await
        });

        let progress = self.progress.clone();
        let state_tx = self.state_tx.clone();
        tokio::spawn(async move {
            let outcome = worker.await;
            let snapshot = {
                let mut p = lock(&progress);
                p.completed = true;
                match outcome {
                    Ok(Ok(results)) => {
                        p.state = if results.iter().all(|r| r.success) {
                            JobState::Completed
                        } else {
                            JobState::CompletedWithErrors
                        };
                    }
                    Ok(Err(e)) => {
                        p.state = JobState::Failed;
                        p.error = Some(e.to_string());
                    }
                    Err(e) => {
                        p.state = JobState::Failed;
                        p.error = Some(format!("batch worker aborted: {e}"));
                    }
                }
                state_tx.send_replace(p.state);
                p.snapshot()
            };
            match &snapshot.error {
                Some(error) => warn!(error = %error, "batch rename failed"),
                None => info!(
                    succeeded = snapshot.succeeded,
                    failed = snapshot.failed,
                    "batch rename finished"
                ),
            }
        });
        Ok(())
    }

    pub fn poll(&self) -> ProgressSnapshot {
        lock(&self.progress).snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.state_tx.borrow().is_running()
    }

    /// Resolves once no job is running and returns the final state.
    pub async fn wait(&self) -> JobState {
        let mut rx = self.state_tx.subscribe();
        rx.wait_for(|s| !s.is_running())
            .await
            .map(|s| *s)
            .unwrap_or_default()
    }
}
