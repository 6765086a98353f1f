//! Session persistence: bearer token and user settings.

use super::{Dashboard, DashboardError};
use crate::store::{Action, Settings, SettingsPatch};

pub(crate) const TOKEN_KEY: &str = "auth_token";
pub(crate) const SETTINGS_KEY: &str = "user_settings";

impl Dashboard {
    /// Use `token` for API calls and remember it for the next session.
    pub fn login(&self, token: &str) -> Result<(), DashboardError> {
        self.client.set_auth_token(token);
        self.storage.set(TOKEN_KEY, token)?;
        tracing::info!("Session started");
        Ok(())
    }

    /// Forget the token, drop cached responses and reset state.
    ///
    /// Settings survive, as with any state reset.
    pub fn logout(&self) -> Result<(), DashboardError> {
        self.client.clear_auth_token();
        self.client.clear_cache();
        self.storage.remove(TOKEN_KEY)?;
        self.reset();
        tracing::info!("Session ended");
        Ok(())
    }

    /// Reload a stored token and settings. Returns whether a token was found.
    ///
    /// Unreadable stored settings are discarded with a warning.
    pub fn restore_session(&self) -> Result<bool, DashboardError> {
        if let Some(raw) = self.storage.get(SETTINGS_KEY)? {
            match serde_json::from_str::<Settings>(&raw) {
                Ok(settings) => {
                    self.store
                        .dispatch(Action::UpdateSettings(SettingsPatch::from(settings)));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable stored settings");
                    self.storage.remove(SETTINGS_KEY)?;
                }
            }
        }

        match self.storage.get(TOKEN_KEY)? {
            Some(token) if !token.is_empty() => {
                self.client.set_auth_token(token);
                tracing::debug!("Restored session token");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Merge `patch` into the settings and persist the result.
    pub fn save_settings(&self, patch: SettingsPatch) -> Result<Settings, DashboardError> {
        self.store.dispatch(Action::UpdateSettings(patch));
        let settings = self.store.select(|s| s.settings.clone());
        self.storage
            .set(SETTINGS_KEY, &serde_json::to_string(&settings)?)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::config::DashboardConfig;
    use crate::storage::{KeyValueStore, MemoryStorage};
    use crate::store::Theme;
    use std::sync::Arc;

    fn dashboard(storage: Arc<MemoryStorage>) -> Dashboard {
        let config = DashboardConfig::default();
        let client = ApiClient::new(&config).unwrap();
        Dashboard::from_parts(&config, Arc::new(client), storage)
    }

    #[test]
    fn test_login_persists_token() {
        let storage = Arc::new(MemoryStorage::new());
        let dashboard = dashboard(storage.clone());
        dashboard.login("secret").unwrap();

        assert!(dashboard.client().has_auth_token());
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("secret"));
    }

    #[test]
    fn test_restore_session_in_new_instance() {
        let storage = Arc::new(MemoryStorage::new());
        let first = dashboard(storage.clone());
        first.login("secret").unwrap();
        first
            .save_settings(SettingsPatch {
                theme: Some(Theme::Dark),
                refresh_interval_secs: Some(30),
                ..SettingsPatch::default()
            })
            .unwrap();

        let second = dashboard(storage);
        assert!(second.restore_session().unwrap());
        assert!(second.client().has_auth_token());
        let settings = second.store().select(|s| s.settings.clone());
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.refresh_interval_secs, 30);
    }

    #[test]
    fn test_restore_without_session() {
        let dashboard = dashboard(Arc::new(MemoryStorage::new()));
        assert!(!dashboard.restore_session().unwrap());
        assert!(!dashboard.client().has_auth_token());
    }

    #[test]
    fn test_corrupt_settings_are_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(SETTINGS_KEY, "{not json").unwrap();
        let dashboard = dashboard(storage.clone());

        assert!(!dashboard.restore_session().unwrap());
        assert_eq!(storage.get(SETTINGS_KEY).unwrap(), None);
        assert_eq!(
            dashboard.store().select(|s| s.settings.clone()),
            Settings::default()
        );
    }

    #[test]
    fn test_logout_clears_token_but_keeps_settings() {
        let storage = Arc::new(MemoryStorage::new());
        let dashboard = dashboard(storage.clone());
        dashboard.login("secret").unwrap();
        dashboard
            .save_settings(SettingsPatch {
                compact_view: Some(true),
                ..SettingsPatch::default()
            })
            .unwrap();
        dashboard.store().dispatch(Action::SetError(Some("stale".to_string())));

        dashboard.logout().unwrap();

        assert!(!dashboard.client().has_auth_token());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        let state = dashboard.store().state();
        assert!(state.error.is_none());
        assert!(state.settings.compact_view);
    }
}
