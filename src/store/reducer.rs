//! Pure state transitions.

use super::action::Action;
use super::state::{AppState, Filters};
use crate::config::StoreConfig;

/// Apply one action to the state and return the next state.
///
/// Never fails. Actions referring to unknown notification ids leave the
/// state untouched.
pub fn reduce(mut state: AppState, action: Action, config: &StoreConfig) -> AppState {
    match action {
        Action::SetDashboardData { data, received_at } => {
            state.dashboard_data = Some(data);
            state.error = None;
            state.is_loading = false;
            state.last_updated = Some(received_at);
        }
        Action::SetLoading(loading) => {
            state.is_loading = loading;
            if loading {
                state.error = None;
            }
        }
        Action::SetError(error) => {
            state.error = error;
            state.is_loading = false;
        }
        Action::SetFilters(filters) => state.filters = filters,
        Action::ResetFilters => state.filters = Filters::default(),
        Action::AddNotification(notification) => {
            state.notifications.insert(0, notification);
            state.notifications.truncate(config.max_notifications);
            recount_unread(&mut state);
        }
        Action::RemoveNotification(id) => {
            state.notifications.retain(|n| n.id != id);
            recount_unread(&mut state);
        }
        Action::MarkNotificationRead(id) => {
            if let Some(notification) = state.notifications.iter_mut().find(|n| n.id == id) {
                notification.read = true;
            }
            recount_unread(&mut state);
        }
        Action::MarkAllNotificationsRead => {
            for notification in &mut state.notifications {
                notification.read = true;
            }
            state.unread_notifications = 0;
        }
        Action::ClearNotifications => {
            state.notifications.clear();
            state.unread_notifications = 0;
        }
        Action::UpdateSettings(patch) => state.settings.apply(patch),
        Action::SetCacheEnabled(enabled) => state.cache.enabled = enabled,
        Action::RecordCacheHit => {
            state.cache.stats.hits = state.cache.stats.hits.saturating_add(1);
        }
        Action::RecordCacheMiss => {
            state.cache.stats.misses = state.cache.stats.misses.saturating_add(1);
        }
        Action::SetCacheSize(size) => state.cache.stats.size = size,
        Action::ResetCacheStats => state.cache.stats = Default::default(),
        Action::ResetState => {
            state = AppState {
                settings: state.settings,
                ..AppState::default()
            };
        }
    }
    state
}

fn recount_unread(state: &mut AppState) {
    state.unread_notifications = state.notifications.iter().filter(|n| !n.read).count();
}
