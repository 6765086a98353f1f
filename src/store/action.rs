//! The closed set of state transitions.

use super::state::{DashboardData, Filters, Notification, SettingsPatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every way the application state can change.
///
/// Serialized as `{ "type": "SET_LOADING", "payload": true }` so UI code can
/// dispatch actions as JSON through [`Store::dispatch_json`](super::Store::dispatch_json).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Replace the dashboard data after a successful fetch
    SetDashboardData {
        data: DashboardData,
        #[serde(default = "Utc::now")]
        received_at: DateTime<Utc>,
    },
    SetLoading(bool),
    SetError(Option<String>),
    SetFilters(Filters),
    ResetFilters,
    AddNotification(Notification),
    RemoveNotification(String),
    MarkNotificationRead(String),
    MarkAllNotificationsRead,
    ClearNotifications,
    UpdateSettings(SettingsPatch),
    SetCacheEnabled(bool),
    RecordCacheHit,
    RecordCacheMiss,
    SetCacheSize(usize),
    ResetCacheStats,
    /// Restore initial state, keeping settings
    ResetState,
}

impl Action {
    /// Wire names of every action, as used in the `type` field.
    pub const KINDS: [&'static str; 17] = [
        "SET_DASHBOARD_DATA",
        "SET_LOADING",
        "SET_ERROR",
        "SET_FILTERS",
        "RESET_FILTERS",
        "ADD_NOTIFICATION",
        "REMOVE_NOTIFICATION",
        "MARK_NOTIFICATION_READ",
        "MARK_ALL_NOTIFICATIONS_READ",
        "CLEAR_NOTIFICATIONS",
        "UPDATE_SETTINGS",
        "SET_CACHE_ENABLED",
        "RECORD_CACHE_HIT",
        "RECORD_CACHE_MISS",
        "SET_CACHE_SIZE",
        "RESET_CACHE_STATS",
        "RESET_STATE",
    ];

    /// `SetDashboardData` stamped with the current time.
    pub fn dashboard_data(data: DashboardData) -> Self {
        Action::SetDashboardData {
            data,
            received_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetDashboardData { .. } => "SET_DASHBOARD_DATA",
            Action::SetLoading(_) => "SET_LOADING",
            Action::SetError(_) => "SET_ERROR",
            Action::SetFilters(_) => "SET_FILTERS",
            Action::ResetFilters => "RESET_FILTERS",
            Action::AddNotification(_) => "ADD_NOTIFICATION",
            Action::RemoveNotification(_) => "REMOVE_NOTIFICATION",
            Action::MarkNotificationRead(_) => "MARK_NOTIFICATION_READ",
            Action::MarkAllNotificationsRead => "MARK_ALL_NOTIFICATIONS_READ",
            Action::ClearNotifications => "CLEAR_NOTIFICATIONS",
            Action::UpdateSettings(_) => "UPDATE_SETTINGS",
            Action::SetCacheEnabled(_) => "SET_CACHE_ENABLED",
            Action::RecordCacheHit => "RECORD_CACHE_HIT",
            Action::RecordCacheMiss => "RECORD_CACHE_MISS",
            Action::SetCacheSize(_) => "SET_CACHE_SIZE",
            Action::ResetCacheStats => "RESET_CACHE_STATS",
            Action::ResetState => "RESET_STATE",
        }
    }
}
