//! State store and session configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Limits applied by the state reducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum retained notifications; older ones are trimmed
    pub max_notifications: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_notifications: 50,
        }
    }
}

/// Where the bearer token and user settings persist between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file backing the session store; in-memory only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}
