//! Error types for dashboard orchestration.

use crate::client::ApiError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}
