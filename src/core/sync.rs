//! Keeps an in-memory [`PricingConfig`] in step with the external store.
//!
//! [`ConfigSync`] is the only writer. Readers hold a [`ConfigHandle`], which
//! can be cloned freely and never allows writes.
use crate::core::document::{DocumentStore, Snapshot};
use crate::core::pricing::{self, Quote};
use crate::core::settings::PricingConfig;
use anyhow::{Result, anyhow};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct SyncState {
    config: Arc<PricingConfig>,
    loading: bool,
}

/// Applies store snapshots to the shared configuration.
pub struct ConfigSync {
    tx: watch::Sender<SyncState>,
}

/// Read-only view of the current configuration.
#[derive(Clone)]
pub struct ConfigHandle {
    rx: watch::Receiver<SyncState>,
}

impl ConfigSync {
    /// Starts from the built-in defaults, in the loading state.
    pub fn new() -> (Self, ConfigHandle) {
        Self::with_config(PricingConfig::default())
    }

    pub fn with_config(config: PricingConfig) -> (Self, ConfigHandle) {
        let (tx, rx) = watch::channel(SyncState {
            config: Arc::new(config),
            loading: true,
        });
        (ConfigSync { tx }, ConfigHandle { rx })
    }

    /// Replaces the configuration with the one described by `snapshot` and
    /// clears the loading flag. A missing document keeps the current values.
    ///
    /// Readers are only woken when something they can observe changed.
    /// Returns whether that was the case.
    pub fn apply(&self, snapshot: &Snapshot) -> bool {
        self.tx.send_if_modified(|state| {
            let was_loading = std::mem::replace(&mut state.loading, false);
            match snapshot {
                Some(doc) => {
                    let config = PricingConfig::from_document(doc);
                    if *state.config == config {
                        debug!("Settings snapshot unchanged");
                        return was_loading;
                    }
                    state.config = Arc::new(config);
                    debug!("Applied settings snapshot");
                    true
                }
                None => {
                    debug!("Settings document missing, keeping current values");
                    was_loading
                }
            }
        })
    }

    /// Loads the current document, then follows the store's change feed
    /// until it ends.
    pub async fn run(&self, store: &dyn DocumentStore) -> Result<()> {
        match store.get().await {
            Ok(snapshot) => {
                self.apply(&snapshot);
                info!("Loaded pricing settings");
            }
            Err(e) => warn!(error = %e, "Initial settings load failed"),
        }

        let mut updates = store.subscribe().await?;
        while let Some(snapshot) = updates.next().await {
            self.apply(&snapshot);
        }
        debug!("Settings subscription ended");
        Ok(())
    }
}

impl ConfigHandle {
    /// The configuration currently in effect.
    pub fn config(&self) -> Arc<PricingConfig> {
        Arc::clone(&self.rx.borrow().config)
    }

    /// True until the first snapshot has been applied.
    pub fn is_loading(&self) -> bool {
        self.rx.borrow().loading
    }

    /// Quotes against the configuration currently in effect.
    pub fn quote(&self, input_price: f64, category: Option<&str>) -> Quote {
        pricing::quote(input_price, category, &self.config())
    }

    /// Waits for the next change and marks it as seen.
    pub async fn changed(&mut self) -> Result<()> {
        self.rx
            .changed()
            .await
            .map_err(|_| anyhow!("Settings synchronization stopped"))
    }

    /// Waits until the first snapshot has been applied.
    pub async fn wait_loaded(&mut self) -> Result<()> {
        self.rx
            .wait_for(|state| !state.loading)
            .await
            .map(|_| ())
            .map_err(|_| anyhow!("Settings synchronization stopped before loading"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Document;
    use crate::store::memory::MemoryDocumentStore;
    use async_trait::async_trait;
    use futures::channel::mpsc;
    use futures::stream::BoxStream;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::time::Duration;

    fn document(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    /// Store whose reads fail but whose change feed still delivers.
    struct UnreadableStore {
        updates: Mutex<Option<mpsc::UnboundedReceiver<Snapshot>>>,
    }

    impl UnreadableStore {
        fn new() -> (Self, mpsc::UnboundedSender<Snapshot>) {
            let (tx, rx) = mpsc::unbounded();
            let store = UnreadableStore {
                updates: Mutex::new(Some(rx)),
            };
            (store, tx)
        }

        fn is_subscribed(&self) -> bool {
            self.updates.lock().unwrap().is_none()
        }
    }

    #[async_trait]
    impl DocumentStore for UnreadableStore {
        async fn get(&self) -> Result<Snapshot> {
            Err(anyhow!("settings store unavailable"))
        }

        async fn subscribe(&self) -> Result<BoxStream<'static, Snapshot>> {
            let rx = self
                .updates
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| anyhow!("already subscribed"))?;
            Ok(rx.boxed())
        }

        async fn merge(&self, _patch: Document) -> Result<()> {
            Err(anyhow!("settings store unavailable"))
        }
    }

    #[test]
    fn test_new_handle_is_loading_with_defaults() {
        let (_sync, handle) = ConfigSync::new();
        assert!(handle.is_loading());
        assert_eq!(*handle.config(), PricingConfig::default());
    }

    #[test]
    fn test_apply_snapshot_replaces_config() {
        let (sync, handle) = ConfigSync::new();

        sync.apply(&Some(document(json!({
            "exchangeRate": 11.0,
            "serviceFee": 0,
            "baseDeliveryFee": 1000,
            "categoryCoefficients": { "Sneakers": 2.0 }
        }))));

        assert!(!handle.is_loading());
        let config = handle.config();
        assert_eq!(config.exchange_rate, 11.0);
        assert_eq!(config.base_delivery_fee, 1000.0);
        assert_eq!(config.coefficient("Sneakers"), Some(2.0));
        assert_eq!(config.coefficient("Hoodies"), Some(1.6));
    }

    #[test]
    fn test_cloned_handles_share_updates() {
        let (sync, handle) = ConfigSync::new();
        let other = handle.clone();

        sync.apply(&Some(document(json!({ "exchangeRate": 9.5 }))));

        assert_eq!(handle.config().exchange_rate, 9.5);
        assert_eq!(other.config().exchange_rate, 9.5);
        assert!(!other.is_loading());
    }

    #[test]
    fn test_apply_missing_document_keeps_values() {
        let (sync, handle) = ConfigSync::new();
        sync.apply(&None);
        assert!(!handle.is_loading());
        assert_eq!(*handle.config(), PricingConfig::default());
    }

    #[test]
    fn test_apply_reports_observable_changes() {
        let (sync, _handle) = ConfigSync::new();
        let doc = Some(document(json!({ "exchangeRate": 11.0 })));

        assert!(sync.apply(&doc));
        assert!(!sync.apply(&doc));
        assert!(!sync.apply(&None));
        assert!(sync.apply(&Some(document(json!({ "exchangeRate": 11.5 })))));
    }

    #[test]
    fn test_last_snapshot_wins() {
        let (sync, handle) = ConfigSync::new();
        sync.apply(&Some(document(json!({ "exchangeRate": 11.0 }))));
        sync.apply(&Some(document(json!({ "exchangeRate": 12.0, "serviceFee": 5 }))));

        let config = handle.config();
        assert_eq!(config.exchange_rate, 12.0);
        assert_eq!(config.service_fee, 5.0);
    }

    #[test]
    fn test_quote_uses_current_config() {
        let (sync, handle) = ConfigSync::new();
        sync.apply(&Some(document(json!({
            "exchangeRate": 12.7,
            "serviceFee": 0,
            "baseDeliveryFee": 1300
        }))));

        let quote = handle.quote(100.0, None);
        assert_eq!(quote.display_total(), "3205.00");
        assert_eq!(handle.quote(100.0, None), quote);
    }

    #[test]
    fn test_malformed_rate_quotes_zero() {
        let (sync, handle) = ConfigSync::new();
        sync.apply(&Some(document(json!({ "exchangeRate": "abc", "serviceFee": 1500 }))));

        assert_eq!(handle.config().exchange_rate, 0.0);
        assert_eq!(handle.quote(100.0, None).total_price, 0.0);
    }

    #[tokio::test]
    async fn test_run_follows_store_updates() {
        let store = Arc::new(MemoryDocumentStore::with_document(document(json!({
            "exchangeRate": 10.0,
            "serviceFee": 100,
            "baseDeliveryFee": 1000
        }))));
        let (sync, mut handle) = ConfigSync::new();

        let task_store = Arc::clone(&store);
        let task = tokio::spawn(async move { sync.run(task_store.as_ref()).await });

        handle.wait_loaded().await.unwrap();
        assert_eq!(handle.config().exchange_rate, 10.0);

        store
            .merge(document(json!({ "exchangeRate": 11.5 })))
            .await
            .unwrap();
        while handle.config().exchange_rate != 11.5 {
            handle.changed().await.unwrap();
        }
        assert_eq!(handle.config().service_fee, 100.0);

        task.abort();
    }

    #[tokio::test]
    async fn test_failed_initial_load_stays_loading_until_snapshot() {
        let (store, tx) = UnreadableStore::new();
        let store = Arc::new(store);
        let (sync, mut handle) = ConfigSync::new();

        let task_store = Arc::clone(&store);
        let task = tokio::spawn(async move { sync.run(task_store.as_ref()).await });

        tokio::time::timeout(Duration::from_secs(2), async {
            while !store.is_subscribed() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(handle.is_loading());
        assert_eq!(*handle.config(), PricingConfig::default());

        tx.unbounded_send(Some(document(json!({
            "exchangeRate": 11.0,
            "serviceFee": 200,
            "baseDeliveryFee": 900
        }))))
        .unwrap();
        handle.wait_loaded().await.unwrap();

        assert!(!handle.is_loading());
        let config = handle.config();
        assert_eq!(config.exchange_rate, 11.0);
        assert_eq!(config.service_fee, 200.0);
        assert_eq!(config.base_delivery_fee, 900.0);

        drop(tx);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_handle_reports_stopped_sync() {
        let (sync, mut handle) = ConfigSync::new();
        drop(sync);
        assert!(handle.wait_loaded().await.is_err());
    }
}
