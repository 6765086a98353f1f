//! Dashboard orchestration
//!
//! [`Dashboard`] wires an [`ApiClient`] to a [`Store`]: it fetches the
//! aggregated metrics for the current filters and turns the result into state
//! transitions. Each refresh takes a generation number; a response that
//! arrives after a newer refresh has started is dropped, so a slow request can
//! never overwrite fresher data. The client fences its cache the same way, so
//! the dropped response is not served from the cache later either.

mod error;
mod session;

pub use error::DashboardError;

use crate::client::{ApiClient, Fetched, RequestOptions};
use crate::config::DashboardConfig;
use crate::monitor::RequestStats;
use crate::storage::{FileStorage, KeyValueStore, MemoryStorage};
use crate::store::{Action, DashboardData, Filters, NotificationDraft, Store};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of a single [`Dashboard::refresh_data`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New data was stored.
    Updated { from_cache: bool },
    /// The request failed; the error is now in the state and previous data is kept.
    Failed { error: String },
    /// A newer refresh started before this one finished; its result was discarded.
    Superseded,
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated { .. })
    }
}

/// Owns the API client, the state store and session storage for one dashboard.
pub struct Dashboard {
    client: Arc<ApiClient>,
    store: Arc<Store>,
    storage: Arc<dyn KeyValueStore>,
    metrics_endpoint: String,
    generation: AtomicU64,
}

impl Dashboard {
    /// Build a dashboard with a network client and the configured session storage.
    pub fn new(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let client = ApiClient::new(config)?;
        let storage: Arc<dyn KeyValueStore> = match &config.session.storage_path {
            Some(path) => Arc::new(FileStorage::open(path)?),
            None => Arc::new(MemoryStorage::new()),
        };
        Ok(Self::from_parts(config, Arc::new(client), storage))
    }

    /// Assemble a dashboard from existing parts (for testing or sharing a client).
    pub fn from_parts(
        config: &DashboardConfig,
        client: Arc<ApiClient>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let dashboard = Self {
            client,
            store: Arc::new(Store::new(config.store.clone())),
            storage,
            metrics_endpoint: config.api.metrics_endpoint.clone(),
            generation: AtomicU64::new(0),
        };
        dashboard.sync_cache_state();
        dashboard
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Fetch dashboard metrics for the current filters and update the state.
    pub async fn refresh_data(&self) -> RefreshOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.dispatch(Action::SetLoading(true));

        let options = self
            .store
            .select(|s| s.filters.to_query())
            .into_iter()
            .fold(RequestOptions::get(), |options, (name, value)| {
                options.query(name, value)
            });
        let result = self
            .client
            .request::<DashboardData>(&self.metrics_endpoint, options)
            .await;
        self.record_cache_lookup(result.as_ref().is_ok_and(|fetched| fetched.from_cache));

        let latest = self.generation.load(Ordering::SeqCst);
        if latest != generation {
            tracing::debug!(generation, latest, "Discarding superseded refresh");
            metrics::counter!("ticketboard_refresh_total", "outcome" => "superseded").increment(1);
            return RefreshOutcome::Superseded;
        }

        match result {
            Ok(Fetched {
                data: response,
                from_cache,
            }) => {
                if !response.success {
                    return self.fail(response.failure_message());
                }
                let Some(data) = response.data else {
                    return self.fail("Response contained no dashboard data".to_string());
                };

                self.store.dispatch(Action::dashboard_data(data));
                metrics::counter!("ticketboard_refresh_total", "outcome" => "updated").increment(1);
                tracing::info!(from_cache, "Dashboard data refreshed");
                RefreshOutcome::Updated { from_cache }
            }
            Err(error) => self.fail(error.to_string()),
        }
    }

    /// Replace the filters and refresh.
    pub async fn set_filters(&self, filters: Filters) -> RefreshOutcome {
        self.store.dispatch(Action::SetFilters(filters));
        self.refresh_data().await
    }

    /// Clear the filters and refresh.
    pub async fn reset_filters(&self) -> RefreshOutcome {
        self.store.dispatch(Action::ResetFilters);
        self.refresh_data().await
    }

    /// Toggle response caching on the client and mirror it in the state.
    pub fn set_cache_enabled(&self, enabled: bool) {
        self.client.set_cache_enabled(enabled);
        self.sync_cache_state();
    }

    pub fn clear_cache(&self) {
        self.client.clear_cache();
        self.store.dispatch(Action::ResetCacheStats);
        self.sync_cache_state();
    }

    /// Reset the state (settings survive) and re-sync cache flags with the client.
    pub fn reset(&self) {
        self.store.dispatch(Action::ResetState);
        self.sync_cache_state();
    }

    /// Aggregates over the client's recent requests.
    pub fn request_stats(&self) -> RequestStats {
        self.client.monitor().stats()
    }

    /// Refresh periodically according to the auto-refresh settings until
    /// `cancel_token` fires.
    ///
    /// Settings are re-read before every wait, so interval changes and
    /// toggling auto-refresh take effect without restarting the task.
    pub fn spawn_auto_refresh(self: Arc<Self>, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Auto-refresh started");

            loop {
                let (enabled, interval_secs) = self
                    .store
                    .select(|s| (s.settings.auto_refresh, s.settings.refresh_interval_secs));
                let interval = Duration::from_secs(interval_secs.max(1));

                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Auto-refresh shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if enabled {
                            let outcome = self.refresh_data().await;
                            tracing::debug!(?outcome, "Auto-refresh cycle completed");
                        }
                    }
                }
            }
        })
    }

    /// Discard any in-flight refresh and release client resources.
    pub fn dispose(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.store.dispatch(Action::SetLoading(false));
        self.client.dispose();
        self.sync_cache_state();
        tracing::debug!("Dashboard disposed");
    }

    fn fail(&self, message: String) -> RefreshOutcome {
        tracing::warn!(error = %message, "Dashboard refresh failed");
        metrics::counter!("ticketboard_refresh_total", "outcome" => "failed").increment(1);
        self.store.dispatch(Action::SetError(Some(message.clone())));
        if self.store.select(|s| s.settings.notifications_enabled) {
            self.store.add_notification(NotificationDraft::error(
                "Failed to refresh dashboard",
                message.clone(),
            ));
        }
        RefreshOutcome::Failed { error: message }
    }

    fn record_cache_lookup(&self, from_cache: bool) {
        if !self.client.cache_enabled() {
            return;
        }
        self.store.dispatch(if from_cache {
            Action::RecordCacheHit
        } else {
            Action::RecordCacheMiss
        });
        self.store.dispatch(Action::SetCacheSize(self.client.cache_len()));
    }

    fn sync_cache_state(&self) {
        self.store
            .dispatch(Action::SetCacheEnabled(self.client.cache_enabled()));
        self.store
            .dispatch(Action::SetCacheSize(self.client.cache_len()));
    }
}
