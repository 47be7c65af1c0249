//! Scripted provider for tests

use crate::{LocationProvider, LocationRequest, PositionStream, ProviderError, RegionEventStream};
use async_trait::async_trait;
use location_model::{GeofenceRegion, Position, RawGeofenceEvent};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Channel depth for scripted subscriptions
const STREAM_CAPACITY: usize = 16;

/// Provider that replays queued answers.
///
/// Queued `last_known_position` answers are consumed in order; once the
/// queue is empty the fallback answer is returned on every call.
pub struct ScriptedProvider {
    answers: Mutex<VecDeque<Result<Option<Position>, ProviderError>>>,
    fallback: Mutex<Result<Option<Position>, ProviderError>>,
    update_senders: Mutex<Vec<mpsc::Sender<Position>>>,
    region_senders: Mutex<Vec<(String, mpsc::Sender<RawGeofenceEvent>)>>,
    fetch_count: AtomicUsize,
}

impl ScriptedProvider {
    /// Provider whose fallback answer is "no fix"
    pub fn new() -> Self {
        Self::with_fallback(Ok(None))
    }

    /// Provider that always answers with `position`
    pub fn fixed(position: Position) -> Self {
        Self::with_fallback(Ok(Some(position)))
    }

    /// Provider that always fails with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self::with_fallback(Err(error))
    }

    pub fn with_fallback(fallback: Result<Option<Position>, ProviderError>) -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            update_senders: Mutex::new(Vec::new()),
            region_senders: Mutex::new(Vec::new()),
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// Queue a one-shot answer for `last_known_position`
    pub fn push_answer(&self, answer: Result<Option<Position>, ProviderError>) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push_back(answer);
        }
    }

    /// Number of `last_known_position` calls so far
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Deliver a position to every update subscriber; returns deliveries made
    pub async fn emit_position(&self, position: Position) -> usize {
        let senders = match self.update_senders.lock() {
            Ok(senders) => senders.clone(),
            Err(_) => return 0,
        };
        let mut delivered = 0;
        for tx in senders {
            if tx.send(position).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Deliver a raw event to subscribers of `region_id`; returns deliveries made
    pub async fn emit_region_event(&self, region_id: &str, event: RawGeofenceEvent) -> usize {
        let senders: Vec<_> = match self.region_senders.lock() {
            Ok(senders) => senders
                .iter()
                .filter(|(id, _)| id == region_id)
                .map(|(_, tx)| tx.clone())
                .collect(),
            Err(_) => return 0,
        };
        let mut delivered = 0;
        for tx in senders {
            if tx.send(event.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Drop all subscriptions, ending their streams
    pub fn close_subscriptions(&self) {
        if let Ok(mut senders) = self.update_senders.lock() {
            senders.clear();
        }
        if let Ok(mut senders) = self.region_senders.lock() {
            senders.clear();
        }
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for ScriptedProvider {
    async fn last_known_position(&self) -> Result<Option<Position>, ProviderError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let queued = self
            .answers
            .lock()
            .map_err(|e| ProviderError::Transient(format!("Lock error: {}", e)))?
            .pop_front();

        match queued {
            Some(answer) => answer,
            None => self
                .fallback
                .lock()
                .map_err(|e| ProviderError::Transient(format!("Lock error: {}", e)))?
                .clone(),
        }
    }

    async fn request_location_updates(
        &self,
        request: LocationRequest,
    ) -> Result<PositionStream, ProviderError> {
        debug!("Scripted location updates requested: {:?}", request);
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        self.update_senders
            .lock()
            .map_err(|e| ProviderError::Transient(format!("Lock error: {}", e)))?
            .push(tx);
        Ok(rx)
    }

    async fn subscribe_to_region_events(
        &self,
        region: &GeofenceRegion,
    ) -> Result<RegionEventStream, ProviderError> {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        self.region_senders
            .lock()
            .map_err(|e| ProviderError::Transient(format!("Lock error: {}", e)))?
            .push((region.id.clone(), tx));
        Ok(rx)
    }
}
