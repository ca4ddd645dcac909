use crate::api_actor;
use crate::clients::ApiClient;
use crate::localize::{Locale, Localizer, StaticLocalizer};
use crate::model::{Policy, Transaction, POLICY, TRANSACTION};
use crate::navigation::NavigationLog;
use crate::pages::PageContext;
use record_store::{RecordStore, RemoteApi, StoreConfig, TypedSchema};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Settings for [`WorkspaceSystem::new`].
#[derive(Debug, Clone)]
pub struct SystemConfig {
    pub store_name: String,
    /// Requests the API actor queues before senders wait.
    pub api_buffer: usize,
    /// Simulated round trip of every write.
    pub api_latency: Duration,
    pub locale: Locale,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            store_name: "workspace".to_string(),
            api_buffer: 32,
            api_latency: Duration::ZERO,
            locale: Locale::En,
        }
    }
}

/// The running app: store, API actor and navigation.
pub struct WorkspaceSystem {
    pub store: RecordStore,
    /// Direct handle on the API actor, for failure injection and history.
    pub api: ApiClient,
    pub navigator: Arc<NavigationLog>,
    pub localizer: Arc<StaticLocalizer>,
    remote: Arc<dyn RemoteApi>,
    handle: tokio::task::JoinHandle<()>,
}

impl WorkspaceSystem {
    /// Creates the store and starts the API actor. Must be called inside a Tokio runtime.
    pub fn new(config: SystemConfig) -> Self {
        let store = RecordStore::with_config(StoreConfig::named(config.store_name.clone()));
        store.register_schema(POLICY, TypedSchema::<Policy>::new());
        store.register_schema(TRANSACTION, TypedSchema::<Transaction>::new());

        let (server, api) = api_actor::new(config.api_buffer, config.api_latency);
        let handle = tokio::spawn(server.run());

        info!(store = %config.store_name, locale = ?config.locale, "Workspace system started");
        Self {
            store,
            remote: Arc::new(api.clone()),
            api,
            navigator: Arc::new(NavigationLog::new()),
            localizer: Arc::new(StaticLocalizer::new(config.locale)),
            handle,
        }
    }

    /// Collaborators for mounting a page.
    pub fn context(&self) -> PageContext {
        let localizer: Arc<dyn Localizer> = self.localizer.clone();
        PageContext {
            store: self.store.clone(),
            remote: Arc::clone(&self.remote),
            navigator: self.navigator.clone(),
            localizer,
        }
    }

    /// Stops the API actor and waits for it. Close every page first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down workspace system...");

        drop(self.remote);
        drop(self.api);

        if let Err(e) = self.handle.await {
            error!("API actor task failed: {:?}", e);
            return Err(format!("API actor task failed: {:?}", e));
        }

        info!(records = self.store.len(), "Workspace system shutdown complete.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::policy_key;
    use serde_json::json;

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let system = WorkspaceSystem::new(SystemConfig::default());
        assert_eq!(system.store.name(), "workspace");
        assert!(system.api.history().await.unwrap().is_empty());
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_policy_schema_is_enforced() {
        let system = WorkspaceSystem::new(SystemConfig::default());
        let bad = system
            .store
            .set(&policy_key("P1"), json!({"id": "P1", "customUnits": "none"}));
        assert!(bad.is_err());
        assert!(system
            .store
            .set(&policy_key("P1"), json!({"id": "P1", "name": "Team"}))
            .is_ok());
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_open_contexts() {
        let system = WorkspaceSystem::new(SystemConfig::default());
        let ctx = system.context();
        let shutdown = tokio::spawn(system.shutdown());
        tokio::task::yield_now().await;
        assert!(!shutdown.is_finished());

        drop(ctx);
        shutdown.await.unwrap().unwrap();
    }
}
