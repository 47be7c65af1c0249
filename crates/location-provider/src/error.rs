//! Provider Error Types

use thiserror::Error;

/// Errors raised by a location provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No location provider is available on this device
    #[error("No location provider available")]
    NoProvider,

    /// Location services are switched off
    #[error("Location services are disabled")]
    LocationDisabled,

    /// Provider failed in a way that may resolve on its own
    #[error("Transient provider failure: {0}")]
    Transient(String),
}
