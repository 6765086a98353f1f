//! Application state and the domain types it holds.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ticket counts by GLPI status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketTotals {
    pub new: u64,
    pub in_progress: u64,
    pub pending: u64,
    pub resolved: u64,
    pub closed: u64,
    pub total: u64,
}

impl TicketTotals {
    /// Tickets not yet resolved or closed.
    pub fn open(&self) -> u64 {
        self.new + self.in_progress + self.pending
    }
}

/// One row of the technician ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianRank {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub resolved: u64,
}

/// Aggregated metrics returned by the dashboard endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardData {
    pub totals: TicketTotals,
    /// Totals per support level ("N1".."N4")
    pub by_level: BTreeMap<String, TicketTotals>,
    pub technician_ranking: Vec<TechnicianRank>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

/// GLPI ticket status used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    InProgress,
    Pending,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "new" => Ok(TicketStatus::New),
            "in_progress" => Ok(TicketStatus::InProgress),
            "pending" => Ok(TicketStatus::Pending),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(format!("Invalid ticket status: {}", s)),
        }
    }
}

/// Dashboard filters, sent to the backend as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub levels: Vec<String>,
    pub statuses: Vec<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician: Option<u64>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        *self == Filters::default()
    }

    /// Query parameters in a stable order; empty filters produce none.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(start) = self.start_date {
            query.push(("start_date".to_string(), start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            query.push(("end_date".to_string(), end.format("%Y-%m-%d").to_string()));
        }
        if !self.levels.is_empty() {
            query.push(("levels".to_string(), self.levels.join(",")));
        }
        if !self.statuses.is_empty() {
            let statuses: Vec<_> = self.statuses.iter().map(TicketStatus::as_str).collect();
            query.push(("status".to_string(), statuses.join(",")));
        }
        if let Some(technician) = self.technician {
            query.push(("technician".to_string(), technician.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

/// User preferences. Survive `ResetState` and persist across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
    pub notifications_enabled: bool,
    pub compact_view: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Auto,
            auto_refresh: true,
            refresh_interval_secs: 300,
            notifications_enabled: true,
            compact_view: false,
        }
    }
}

/// Partial settings update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub auto_refresh: Option<bool>,
    pub refresh_interval_secs: Option<u64>,
    pub notifications_enabled: Option<bool>,
    pub compact_view: Option<bool>,
}

impl Settings {
    /// Shallow-merge a patch.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(auto_refresh) = patch.auto_refresh {
            self.auto_refresh = auto_refresh;
        }
        if let Some(interval) = patch.refresh_interval_secs {
            self.refresh_interval_secs = interval;
        }
        if let Some(enabled) = patch.notifications_enabled {
            self.notifications_enabled = enabled;
        }
        if let Some(compact) = patch.compact_view {
            self.compact_view = compact;
        }
    }
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            theme: Some(settings.theme),
            auto_refresh: Some(settings.auto_refresh),
            refresh_interval_secs: Some(settings.refresh_interval_secs),
            notifications_enabled: Some(settings.notifications_enabled),
            compact_view: Some(settings.compact_view),
        }
    }
}

/// Cache counters as displayed by the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheState {
    pub enabled: bool,
    pub stats: CacheStats,
}

impl Default for CacheState {
    fn default() -> Self {
        Self {
            enabled: true,
            stats: CacheStats::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

fn new_notification_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A user-facing notification.
///
/// When deserialized from a partial object, `id` and `timestamp` are
/// synthesized and `read` defaults to false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default = "new_notification_id")]
    pub id: String,
    #[serde(default)]
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: new_notification_id(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
        }
    }
}

/// The caller-supplied part of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }
}

impl From<NotificationDraft> for Notification {
    fn from(draft: NotificationDraft) -> Self {
        Notification::new(draft.kind, draft.title, draft.message)
    }
}

/// Everything the UI renders from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub dashboard_data: Option<DashboardData>,
    pub filters: Filters,
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub settings: Settings,
    pub cache: CacheState,
    /// Newest first
    pub notifications: Vec<Notification>,
    pub unread_notifications: usize,
}
