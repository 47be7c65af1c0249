//! Recurring Work Scheduler
//!
//! Runs named recurring work on the tokio runtime. Names are unique: at most
//! one loop exists per name, so runs under one name never overlap.

use crate::SchedulerError;
use async_trait::async_trait;
use location_model::SampleRunOutcome;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Work that can be run repeatedly by a scheduler
#[async_trait]
pub trait RecurringWork: Send + Sync {
    async fn run(&self) -> SampleRunOutcome;
}

/// What to do when work is scheduled under a name that is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingWorkPolicy {
    /// Cancel the existing work and start the new one
    #[default]
    Replace,
    /// Leave the existing work running and drop the new one
    Keep,
}

/// Result of a schedule request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// No work was registered under the name
    Scheduled,
    /// Earlier work under the name was cancelled
    Replaced,
    /// Earlier work under the name keeps running
    KeptExisting,
}

/// Exponential retry delays after [`SampleRunOutcome::Retry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after the first retry outcome
    pub initial: Duration,
    /// Upper bound for any delay
    pub max: Duration,
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(10),
            max: Duration::from_secs(60),
        }
    }
}

/// Port for registering recurring background work
pub trait WorkScheduler: Send + Sync {
    /// Run `work` now and then every `period`, under a unique `name`
    fn schedule_recurring(
        &self,
        name: &str,
        period: Duration,
        policy: ExistingWorkPolicy,
        work: Arc<dyn RecurringWork>,
    ) -> Result<ScheduleDecision, SchedulerError>;

    /// Cancel the work registered under `name`; returns whether any existed
    fn cancel(&self, name: &str) -> bool;

    /// Whether live work is registered under `name`
    fn is_scheduled(&self, name: &str) -> bool;
}

/// [`WorkScheduler`] that runs one tokio task per name.
///
/// `Success` and `PermanentFailure` wait a full period before the next run;
/// `Retry` re-runs after the backoff delay. Cancelling aborts the task at its
/// next suspension point.
pub struct TokioWorkScheduler {
    backoff: BackoffPolicy,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioWorkScheduler {
    /// Create a new scheduler
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self {
            backoff,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Cancel all registered work
    pub fn shutdown(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for (name, handle) in tasks.drain() {
                debug!("Cancelling work {}", name);
                handle.abort();
            }
        }
        info!("Work scheduler stopped");
    }

    /// Number of live work loops
    pub fn task_count(&self) -> usize {
        self.tasks
            .lock()
            .map(|tasks| tasks.values().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }
}

impl Default for TokioWorkScheduler {
    fn default() -> Self {
        Self::new(BackoffPolicy::default())
    }
}

impl Drop for TokioWorkScheduler {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for (_, handle) in tasks.drain() {
                handle.abort();
            }
        }
    }
}

impl WorkScheduler for TokioWorkScheduler {
    fn schedule_recurring(
        &self,
        name: &str,
        period: Duration,
        policy: ExistingWorkPolicy,
        work: Arc<dyn RecurringWork>,
    ) -> Result<ScheduleDecision, SchedulerError> {
        if name.is_empty() {
            return Err(SchedulerError::EmptyName);
        }
        if period.is_zero() {
            return Err(SchedulerError::InvalidPeriod);
        }
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let mut tasks = self.tasks.lock().map_err(|_| SchedulerError::Poisoned)?;

        let decision = match tasks.get(name) {
            Some(existing) if !existing.is_finished() => match policy {
                ExistingWorkPolicy::Keep => {
                    debug!("Work {} already scheduled, keeping existing", name);
                    return Ok(ScheduleDecision::KeptExisting);
                }
                ExistingWorkPolicy::Replace => {
                    existing.abort();
                    ScheduleDecision::Replaced
                }
            },
            _ => ScheduleDecision::Scheduled,
        };

        let handle = runtime.spawn(work_loop(name.to_string(), period, self.backoff, work));
        tasks.insert(name.to_string(), handle);

        info!(
            "Work {} scheduled every {:?} ({:?})",
            name, period, decision
        );
        Ok(decision)
    }

    fn cancel(&self, name: &str) -> bool {
        let handle = match self.tasks.lock() {
            Ok(mut tasks) => tasks.remove(name),
            Err(_) => None,
        };
        match handle {
            Some(handle) => {
                handle.abort();
                info!("Work {} cancelled", name);
                true
            }
            None => false,
        }
    }

    fn is_scheduled(&self, name: &str) -> bool {
        self.tasks
            .lock()
            .map(|tasks| tasks.get(name).map_or(false, |h| !h.is_finished()))
            .unwrap_or(false)
    }
}

async fn work_loop(
    name: String,
    period: Duration,
    backoff: BackoffPolicy,
    work: Arc<dyn RecurringWork>,
) {
    let mut attempt: u32 = 0;

    loop {
        let outcome = work.run().await;

        let delay = match outcome {
            SampleRunOutcome::Retry => {
                attempt = attempt.saturating_add(1);
                let delay = backoff.delay(attempt);
                warn!(
                    "Work {} asked for retry (attempt {}), next run in {:?}",
                    name, attempt, delay
                );
                delay
            }
            SampleRunOutcome::Success | SampleRunOutcome::PermanentFailure => {
                attempt = 0;
                debug!("Work {} finished: {}", name, outcome);
                period
            }
        };

        tokio::time::sleep(delay).await;
    }
}
