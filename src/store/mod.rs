//! Reducer-driven application state store.
//!
//! All state changes go through [`Store::dispatch`]; observers hold a
//! [`watch::Receiver`] and see every committed state.

pub mod action;
pub mod reducer;
pub mod state;

pub use action::Action;
pub use reducer::reduce;
pub use state::{
    AppState, CacheState, CacheStats, DashboardData, Filters, Notification, NotificationDraft,
    NotificationKind, Settings, SettingsPatch, TechnicianRank, Theme, TicketStatus, TicketTotals,
};

use crate::config::StoreConfig;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Action is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Action has no string 'type' field")]
    MissingType,

    #[error("Invalid payload for {kind}: {message}")]
    InvalidPayload { kind: String, message: String },
}

/// Owns the [`AppState`] and applies actions through [`reduce`].
#[derive(Debug)]
pub struct Store {
    state: watch::Sender<AppState>,
    config: StoreConfig,
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_state(AppState::default(), config)
    }

    pub fn with_state(initial: AppState, config: StoreConfig) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Apply an action and notify subscribers.
    pub fn dispatch(&self, action: Action) {
        tracing::trace!(action = action.kind(), "Dispatching action");
        let config = &self.config;
        self.state.send_modify(|state| {
            let current = std::mem::take(state);
            *state = reduce(current, action, config);
        });
    }

    /// Dispatch an action given as `{"type": ..., "payload": ...}`.
    ///
    /// Unknown action types are ignored with a warning and return `Ok(false)`.
    /// Known types with a malformed payload are rejected.
    pub fn dispatch_json(&self, raw: &str) -> Result<bool, StoreError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| StoreError::InvalidJson(e.to_string()))?;
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(StoreError::MissingType)?
            .to_string();

        if !Action::KINDS.contains(&kind.as_str()) {
            tracing::warn!(action = %kind, "Ignoring unknown action");
            return Ok(false);
        }

        let action: Action =
            serde_json::from_value(value).map_err(|e| StoreError::InvalidPayload {
                kind: kind.clone(),
                message: e.to_string(),
            })?;
        self.dispatch(action);
        Ok(true)
    }

    /// Add a notification built from `draft` and return its generated id.
    pub fn add_notification(&self, draft: impl Into<NotificationDraft>) -> String {
        let notification = Notification::from(draft.into());
        let id = notification.id.clone();
        self.dispatch(Action::AddNotification(notification));
        id
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Read part of the state without cloning all of it.
    pub fn select<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_updates_state() {
        let store = Store::default();
        store.dispatch(Action::SetLoading(true));
        assert!(store.state().is_loading);
        assert!(store.select(|s| s.error.is_none()));
    }

    #[test]
    fn test_add_notification_returns_id() {
        let store = Store::default();
        let id = store.add_notification(NotificationDraft::error("Refresh failed", "timeout"));
        let state = store.state();
        assert_eq!(state.notifications[0].id, id);
        assert_eq!(state.notifications[0].kind, NotificationKind::Error);
        assert_eq!(state.unread_notifications, 1);

        store.dispatch(Action::RemoveNotification(id));
        assert_eq!(store.state().unread_notifications, 0);
    }

    #[test]
    fn test_dispatch_json_known_action() {
        let store = Store::default();
        let applied = store
            .dispatch_json(r#"{"type": "SET_ERROR", "payload": "boom"}"#)
            .unwrap();
        assert!(applied);
        assert_eq!(store.state().error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_dispatch_json_partial_notification() {
        let store = Store::default();
        store
            .dispatch_json(r#"{"type": "ADD_NOTIFICATION", "payload": {"title": "Hello"}}"#)
            .unwrap();
        let state = store.state();
        assert_eq!(state.notifications.len(), 1);
        assert!(!state.notifications[0].id.is_empty());
    }

    #[test]
    fn test_dispatch_json_unknown_action_is_ignored() {
        let store = Store::default();
        let before = store.state();
        assert_eq!(store.dispatch_json(r#"{"type": "DO_MAGIC"}"#), Ok(false));
        assert_eq!(store.state(), before);
    }

    #[test]
    fn test_dispatch_json_errors() {
        let store = Store::default();
        assert!(matches!(
            store.dispatch_json("not json"),
            Err(StoreError::InvalidJson(_))
        ));
        assert_eq!(
            store.dispatch_json(r#"{"payload": 1}"#),
            Err(StoreError::MissingType)
        );
        assert!(matches!(
            store.dispatch_json(r#"{"type": "SET_LOADING", "payload": "yes"}"#),
            Err(StoreError::InvalidPayload { .. })
        ));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = Store::default();
        let mut rx = store.subscribe();
        store.dispatch(Action::SetError(Some("offline".to_string())));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().error.as_deref(), Some("offline"));
    }
}
