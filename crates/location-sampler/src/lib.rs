//! Location Sampler
//!
//! Background side of the location core:
//! - [`LocationSampler`] reads the last known position and persists it
//! - [`TokioWorkScheduler`] re-runs recurring work under a unique name
//! - [`LocationTracker`] republishes live position updates on the event bus

mod error;
mod sampler;
mod scheduler;
mod tracker;

pub use error::{SampleError, SchedulerError};
pub use sampler::{LocationSampler, SampleReport, SamplerConfig};
pub use scheduler::{
    BackoffPolicy, ExistingWorkPolicy, RecurringWork, ScheduleDecision, TokioWorkScheduler,
    WorkScheduler,
};
pub use tracker::LocationTracker;
