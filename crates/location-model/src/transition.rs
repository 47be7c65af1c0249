//! Geofence transition events

use serde::{Deserialize, Serialize};

/// Platform transition code for entering a region
pub const TRANSITION_ENTER: i32 = 1;
/// Platform transition code for leaving a region
pub const TRANSITION_EXIT: i32 = 2;
/// Platform transition code for lingering inside a region
pub const TRANSITION_DWELL: i32 = 4;

/// Kind of boundary transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    Enter,
    Exit,
    Dwell,
    /// Any code the core does not know about
    Unrecognized(i32),
}

impl TransitionKind {
    /// Decode a platform transition code
    pub fn from_code(code: i32) -> Self {
        match code {
            TRANSITION_ENTER => TransitionKind::Enter,
            TRANSITION_EXIT => TransitionKind::Exit,
            TRANSITION_DWELL => TransitionKind::Dwell,
            other => TransitionKind::Unrecognized(other),
        }
    }

    /// Platform transition code
    pub fn code(&self) -> i32 {
        match self {
            TransitionKind::Enter => TRANSITION_ENTER,
            TransitionKind::Exit => TRANSITION_EXIT,
            TransitionKind::Dwell => TRANSITION_DWELL,
            TransitionKind::Unrecognized(code) => *code,
        }
    }
}

/// Undecoded event as handed over by a geofencing service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGeofenceEvent {
    /// Set when the service reports an internal error instead of a transition
    #[serde(default)]
    pub error_code: Option<i32>,
    /// Platform transition code
    #[serde(default)]
    pub transition: Option<i32>,
    /// Regions that triggered the event
    #[serde(default)]
    pub triggering_region_ids: Vec<String>,
}

impl RawGeofenceEvent {
    /// Transition event for a single region
    pub fn transition(region_id: impl Into<String>, kind: TransitionKind) -> Self {
        Self {
            error_code: None,
            transition: Some(kind.code()),
            triggering_region_ids: vec![region_id.into()],
        }
    }

    /// Error event carrying a service status code
    pub fn error(code: i32) -> Self {
        Self {
            error_code: Some(code),
            transition: None,
            triggering_region_ids: Vec::new(),
        }
    }
}

/// Decoded transition event, consumed once by the transition handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    /// Region that triggered the event (empty if the service named none)
    pub region_id: String,
    pub kind: TransitionKind,
    /// Service reported an error; no transition processing applies
    pub errored: bool,
}

impl TransitionEvent {
    /// Decode a raw service event.
    ///
    /// Only a service error code marks the event as errored. A missing
    /// transition code decodes to `Unrecognized(0)`, which the handler
    /// ignores. Only the first triggering region is kept since exactly one
    /// region is registered.
    pub fn decode(raw: &RawGeofenceEvent) -> Self {
        let errored = raw.error_code.is_some();
        let kind = TransitionKind::from_code(raw.transition.unwrap_or(0));
        let region_id = raw
            .triggering_region_ids
            .first()
            .cloned()
            .unwrap_or_default();

        Self {
            region_id,
            kind,
            errored,
        }
    }
}

impl From<&RawGeofenceEvent> for TransitionEvent {
    fn from(raw: &RawGeofenceEvent) -> Self {
        Self::decode(raw)
    }
}
