//! Sampler and scheduler error types

use location_model::SampleRunOutcome;
use location_provider::ProviderError;
use sample_store::StorageError;
use thiserror::Error;

/// Failures inside a single sampler run
#[derive(Debug, Error)]
pub enum SampleError {
    /// Fine location permission is not granted
    #[error("Location permission not granted")]
    PermissionDenied,

    /// The location provider failed to answer
    #[error("Location provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The sample could not be persisted
    #[error("Failed to persist sample: {0}")]
    Write(#[from] StorageError),
}

impl SampleError {
    /// Outcome reported to the scheduler for this failure
    pub fn outcome(&self) -> SampleRunOutcome {
        match self {
            SampleError::PermissionDenied => SampleRunOutcome::PermanentFailure,
            SampleError::Provider(_) | SampleError::Write(_) => SampleRunOutcome::Retry,
        }
    }
}

/// Errors from registering recurring work
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Work name must not be empty")]
    EmptyName,

    #[error("Period must be greater than zero")]
    InvalidPeriod,

    #[error("No async runtime available to run work")]
    NoRuntime,

    #[error("Scheduler state poisoned")]
    Poisoned,
}
