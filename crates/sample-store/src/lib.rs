//! Sample Store
//!
//! Persists the most recent location sample as a single JSON document.
//! Every write replaces the whole file; no history is kept.

mod store;

pub use store::{SampleStore, DEFAULT_FILE_NAME};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
