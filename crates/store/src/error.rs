use std::path::PathBuf;

use guardrule_core::error::CoreError;

/// Failures while loading a fixture.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid fixture JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Inconsistent fixture: {0}")]
    Fixture(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::Store(err.to_string())
    }
}
