//! Location Sampler Implementation

use crate::scheduler::{BackoffPolicy, RecurringWork};
use crate::SampleError;
use async_trait::async_trait;
use location_model::{LocationSample, SampleRunOutcome};
use location_provider::{Clock, LocationProvider, PermissionSource};
use sample_store::SampleStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Configuration for periodic sampling
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Interval between scheduled runs (default: 15 s)
    pub period: Duration,
    /// Unique name the recurring work is registered under
    pub work_name: String,
    /// First retry delay after a transient failure
    pub retry_backoff: Duration,
    /// Upper bound for the retry delay
    pub max_backoff: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(15),
            work_name: "LocationSyncWork".to_string(),
            retry_backoff: Duration::from_secs(10),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl SamplerConfig {
    /// Retry policy derived from this config
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial: self.retry_backoff,
            max: self.max_backoff,
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleReport {
    /// A new sample replaced the persisted one
    Saved(LocationSample),
    /// The provider had no fix; nothing was written
    NoFix,
}

/// Reads the last known position and persists it as the latest sample
pub struct LocationSampler {
    provider: Arc<dyn LocationProvider>,
    permission: Arc<dyn PermissionSource>,
    clock: Arc<dyn Clock>,
    store: SampleStore,
}

impl LocationSampler {
    /// Create a new sampler
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        permission: Arc<dyn PermissionSource>,
        clock: Arc<dyn Clock>,
        store: SampleStore,
    ) -> Self {
        Self {
            provider,
            permission,
            clock,
            store,
        }
    }

    /// Store the sampler writes to
    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    /// Run one sampling pass and translate the result for the scheduler.
    ///
    /// Never fails: every error is folded into a [`SampleRunOutcome`].
    pub async fn run(&self) -> SampleRunOutcome {
        match self.sample().await {
            Ok(SampleReport::Saved(sample)) => {
                info!(
                    "Location: {}, {} saved",
                    sample.latitude, sample.longitude
                );
                SampleRunOutcome::Success
            }
            Ok(SampleReport::NoFix) => {
                info!("No location found");
                SampleRunOutcome::Success
            }
            Err(e) => {
                let outcome = e.outcome();
                match e {
                    SampleError::PermissionDenied => {
                        warn!("Skipping location sync: {}", e)
                    }
                    _ => error!("Error syncing location: {}", e),
                }
                outcome
            }
        }
    }

    /// Run one sampling pass.
    ///
    /// Nothing is written unless the provider returns a position.
    pub async fn sample(&self) -> Result<SampleReport, SampleError> {
        if !self.permission.fine_location().is_granted() {
            return Err(SampleError::PermissionDenied);
        }

        let position = match self.provider.last_known_position().await? {
            Some(position) => position,
            None => return Ok(SampleReport::NoFix),
        };

        let sample = LocationSample::new(position, self.clock.now_millis());
        debug!("Persisting sample captured at {}", sample.captured_at_ms);
        self.store.write(&sample)?;

        Ok(SampleReport::Saved(sample))
    }
}

#[async_trait]
impl RecurringWork for LocationSampler {
    async fn run(&self) -> SampleRunOutcome {
        LocationSampler::run(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use location_model::{GeofenceRegion, Position};
    use location_provider::{
        FixedClock, LocationRequest, PermissionStatus, PositionStream, ProviderError,
        RegionEventStream, ScriptedProvider, StaticPermission,
    };
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    struct Harness {
        _dir: TempDir,
        provider: Arc<ScriptedProvider>,
        permission: Arc<StaticPermission>,
        clock: Arc<FixedClock>,
        sampler: LocationSampler,
    }

    fn harness(provider: ScriptedProvider, granted: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(provider);
        let permission = Arc::new(if granted {
            StaticPermission::granted()
        } else {
            StaticPermission::denied()
        });
        let clock = Arc::new(FixedClock::new(1000));
        let sampler = LocationSampler::new(
            provider.clone(),
            permission.clone(),
            clock.clone(),
            SampleStore::in_dir(dir.path()),
        );
        Harness {
            _dir: dir,
            provider,
            permission,
            clock,
            sampler,
        }
    }

    fn toronto() -> Position {
        Position::new(43.6532, -79.3832).unwrap()
    }

    #[tokio::test]
    async fn test_saves_position_with_timestamp() {
        let h = harness(ScriptedProvider::fixed(toronto()), true);

        assert_eq!(h.sampler.run().await, SampleRunOutcome::Success);

        let content = fs::read_to_string(h.sampler.store().path()).unwrap();
        assert_eq!(content, r#"{"latitude":43.6532,"longitude":-79.3832,"timestamp":1000}"#);
    }

    #[tokio::test]
    async fn test_permission_denied_is_permanent() {
        let h = harness(ScriptedProvider::fixed(toronto()), false);

        assert_eq!(h.sampler.run().await, SampleRunOutcome::PermanentFailure);
        assert_eq!(h.provider.fetch_count(), 0);
        assert!(!h.sampler.store().path().exists());
    }

    #[tokio::test]
    async fn test_provider_error_retries_and_keeps_file() {
        let h = harness(ScriptedProvider::fixed(toronto()), true);
        h.sampler.run().await;
        let before = fs::read(h.sampler.store().path()).unwrap();

        h.provider
            .push_answer(Err(ProviderError::Transient("timeout".to_string())));
        h.clock.set(2000);

        assert_eq!(h.sampler.run().await, SampleRunOutcome::Retry);
        assert_eq!(fs::read(h.sampler.store().path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_no_fix_is_success_without_write() {
        let h = harness(ScriptedProvider::new(), true);

        assert_eq!(h.sampler.sample().await.unwrap(), SampleReport::NoFix);
        assert_eq!(h.sampler.run().await, SampleRunOutcome::Success);
        assert!(!h.sampler.store().path().exists());
    }

    #[tokio::test]
    async fn test_no_fix_leaves_previous_sample() {
        let h = harness(ScriptedProvider::new(), true);
        h.provider.push_answer(Ok(Some(toronto())));
        h.sampler.run().await;
        let before = fs::read(h.sampler.store().path()).unwrap();

        h.clock.set(5000);
        assert_eq!(h.sampler.run().await, SampleRunOutcome::Success);
        assert_eq!(fs::read(h.sampler.store().path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_write_failure_retries() {
        let h = harness(ScriptedProvider::fixed(toronto()), true);
        fs::create_dir(h.sampler.store().path()).unwrap();

        assert_eq!(h.sampler.run().await, SampleRunOutcome::Retry);
    }

    #[tokio::test]
    async fn test_permission_granted_later() {
        let h = harness(ScriptedProvider::fixed(toronto()), false);
        assert_eq!(h.sampler.run().await, SampleRunOutcome::PermanentFailure);

        h.permission.set(PermissionStatus::Granted);
        assert_eq!(h.sampler.run().await, SampleRunOutcome::Success);
        assert!(h.sampler.store().path().exists());
    }

    #[tokio::test]
    async fn test_repeated_run_is_byte_identical() {
        let h = harness(ScriptedProvider::fixed(toronto()), true);

        h.sampler.run().await;
        let first = fs::read(h.sampler.store().path()).unwrap();
        h.sampler.run().await;
        let second = fs::read(h.sampler.store().path()).unwrap();

        assert_eq!(first, second);
    }

    /// Provider whose fetch never completes
    struct Stalled {
        entered: Arc<Notify>,
    }

    #[async_trait]
    impl LocationProvider for Stalled {
        async fn last_known_position(&self) -> Result<Option<Position>, ProviderError> {
            self.entered.notify_one();
            std::future::pending().await
        }

        async fn request_location_updates(
            &self,
            _request: LocationRequest,
        ) -> Result<PositionStream, ProviderError> {
            Err(ProviderError::NoProvider)
        }

        async fn subscribe_to_region_events(
            &self,
            _region: &GeofenceRegion,
        ) -> Result<RegionEventStream, ProviderError> {
            Err(ProviderError::NoProvider)
        }
    }

    #[tokio::test]
    async fn test_cancelled_run_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::in_dir(dir.path());
        store.write(&LocationSample::new(toronto(), 500)).unwrap();
        let before = fs::read(store.path()).unwrap();

        let entered = Arc::new(Notify::new());
        let sampler = Arc::new(LocationSampler::new(
            Arc::new(Stalled {
                entered: entered.clone(),
            }),
            Arc::new(StaticPermission::granted()),
            Arc::new(FixedClock::new(1000)),
            store.clone(),
        ));

        let task = tokio::spawn({
            let sampler = sampler.clone();
            async move { sampler.run().await }
        });
        entered.notified().await;
        task.abort();

        assert!(task.await.unwrap_err().is_cancelled());
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    fn provider_answer() -> impl Strategy<Value = Result<Option<Position>, ProviderError>> {
        prop_oneof![
            Just(Ok(None)),
            Just(Err(ProviderError::NoProvider)),
            Just(Err(ProviderError::LocationDisabled)),
            (-90.0f64..=90.0, -180.0f64..=180.0)
                .prop_map(|(lat, lng)| Ok(Some(Position::new(lat, lng).unwrap()))),
        ]
    }

    proptest! {
        #[test]
        fn prop_denied_never_writes(answer in provider_answer(), existing in any::<bool>()) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let h = harness(ScriptedProvider::with_fallback(answer), false);
            if existing {
                fs::write(h.sampler.store().path(), b"previous").unwrap();
            }

            let outcome = rt.block_on(h.sampler.run());

            prop_assert_eq!(outcome, SampleRunOutcome::PermanentFailure);
            prop_assert_eq!(h.provider.fetch_count(), 0);
            if existing {
                prop_assert_eq!(fs::read(h.sampler.store().path()).unwrap(), b"previous".to_vec());
            } else {
                prop_assert!(!h.sampler.store().path().exists());
            }
        }

        #[test]
        fn prop_success_writes_single_record(
            lat in -90.0f64..=90.0,
            lng in -180.0f64..=180.0,
            ts in 0i64..4_102_444_800_000,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let position = Position::new(lat, lng).unwrap();
            let h = harness(ScriptedProvider::fixed(position), true);
            fs::write(h.sampler.store().path(), b"stale content that is longer than a sample record").unwrap();
            h.clock.set(ts);

            let report = rt.block_on(h.sampler.sample()).unwrap();
            let expected = LocationSample::new(position, ts);
            prop_assert_eq!(report, SampleReport::Saved(expected));

            let content = fs::read(h.sampler.store().path()).unwrap();
            prop_assert_eq!(content, serde_json::to_vec(&expected).unwrap());
        }
    }
}
