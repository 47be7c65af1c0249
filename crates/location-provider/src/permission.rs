//! Location permission port

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Fine location permission state as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Query for the fine location permission.
///
/// The core only reads the state; prompting belongs to the host UI.
pub trait PermissionSource: Send + Sync {
    fn fine_location(&self) -> PermissionStatus;
}

/// Permission flag that the host flips when the user answers a prompt
#[derive(Debug)]
pub struct StaticPermission {
    granted: AtomicBool,
}

impl StaticPermission {
    pub fn granted() -> Self {
        Self {
            granted: AtomicBool::new(true),
        }
    }

    pub fn denied() -> Self {
        Self {
            granted: AtomicBool::new(false),
        }
    }

    /// Update the permission state
    pub fn set(&self, status: PermissionStatus) {
        self.granted.store(status.is_granted(), Ordering::SeqCst);
    }
}

impl PermissionSource for StaticPermission {
    fn fine_location(&self) -> PermissionStatus {
        if self.granted.load(Ordering::SeqCst) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}
