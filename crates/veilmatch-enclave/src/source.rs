//! Resting-order sources.
//!
//! The enclave never owns the order pool. Each invocation asks a
//! [`RestingOrderSource`] for the current encrypted snapshot of one pair.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use veilmatch_types::{
    BackendConfig, OrderId, PairId, RestingEntry, RestingOrdersResponse, Result, VeilmatchError,
};

/// Supplier of the encrypted resting snapshot, in arrival order.
#[async_trait]
pub trait RestingOrderSource: Send + Sync {
    async fn fetch_resting(&self, pair_id: &PairId) -> Result<Vec<RestingEntry>>;
}

// =============================================================================
// HTTP backend
// =============================================================================

/// `GET <base><orders_path>?pairId=<pair>` on the backend.
#[derive(Debug)]
pub struct HttpRestingOrderSource {
    client: reqwest::Client,
    url: String,
}

impl HttpRestingOrderSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VeilmatchError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(backend: &BackendConfig) -> Result<Self> {
        let base = backend.base_url.as_deref().ok_or_else(|| {
            VeilmatchError::Configuration("resting-order source requires backend.base_url".into())
        })?;
        Self::new(
            format!("{}{}", base.trim_end_matches('/'), backend.orders_path),
            Duration::from_millis(backend.request_timeout_ms),
        )
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RestingOrderSource for HttpRestingOrderSource {
    async fn fetch_resting(&self, pair_id: &PairId) -> Result<Vec<RestingEntry>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("pairId", pair_id.as_str())])
            .send()
            .await
            .map_err(|e| VeilmatchError::BookFetch {
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VeilmatchError::BookFetch {
                reason: format!("HTTP {status}"),
            });
        }

        let body: RestingOrdersResponse =
            response.json().await.map_err(|e| VeilmatchError::BookFetch {
                reason: format!("invalid body: {e}"),
            })?;
        debug!(pair = %pair_id, entries = body.orders.len(), "Fetched resting orders");
        Ok(body.orders)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Shared in-process order pool, keyed by pair, in arrival order.
///
/// Cloning yields another handle to the same pool.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrderStore {
    pools: Arc<RwLock<BTreeMap<PairId, Vec<RestingEntry>>>>,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the back of its pair's queue.
    pub async fn insert(&self, pair_id: PairId, entry: RestingEntry) {
        self.pools.write().await.entry(pair_id).or_default().push(entry);
    }

    /// Remove every entry with `id`. Returns `true` if any was removed.
    pub async fn remove(&self, pair_id: &PairId, id: &OrderId) -> bool {
        let mut pools = self.pools.write().await;
        let Some(pool) = pools.get_mut(pair_id) else {
            return false;
        };
        let before = pool.len();
        pool.retain(|e| e.id != *id);
        let removed = pool.len() != before;
        if pool.is_empty() {
            pools.remove(pair_id);
        }
        removed
    }

    pub async fn get(&self, pair_id: &PairId, id: &OrderId) -> Option<RestingEntry> {
        self.pools
            .read()
            .await
            .get(pair_id)
            .and_then(|pool| pool.iter().find(|e| e.id == *id).cloned())
    }

    /// Swap the payload of the first entry with `id`, keeping its place in
    /// the queue. Returns `false` if there is no such entry.
    pub async fn replace_payload(&self, pair_id: &PairId, id: &OrderId, payload: String) -> bool {
        let mut pools = self.pools.write().await;
        let Some(entry) = pools
            .get_mut(pair_id)
            .and_then(|pool| pool.iter_mut().find(|e| e.id == *id))
        else {
            return false;
        };
        entry.encrypted_payload = payload;
        true
    }

    pub async fn len(&self, pair_id: &PairId) -> usize {
        self.pools.read().await.get(pair_id).map_or(0, Vec::len)
    }

    pub async fn is_empty(&self) -> bool {
        self.pools.read().await.is_empty()
    }
}

#[async_trait]
impl RestingOrderSource for MemoryOrderStore {
    async fn fetch_resting(&self, pair_id: &PairId) -> Result<Vec<RestingEntry>> {
        Ok(self
            .pools
            .read()
            .await
            .get(pair_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> PairId {
        PairId::new("ETH-USDC")
    }

    #[tokio::test]
    async fn memory_store_keeps_arrival_order() {
        let store = MemoryOrderStore::new();
        store.insert(pair(), RestingEntry::new("a", "p1")).await;
        store.insert(pair(), RestingEntry::new("b", "p2")).await;
        store.insert(PairId::new("BTC-USDC"), RestingEntry::new("c", "p3")).await;

        let ids: Vec<String> = store
            .fetch_resting(&pair())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id.0)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.len(&PairId::new("BTC-USDC")).await, 1);
    }

    #[tokio::test]
    async fn memory_store_remove() {
        let store = MemoryOrderStore::new();
        store.insert(pair(), RestingEntry::new("a", "p1")).await;
        assert!(!store.remove(&pair(), &OrderId::new("zz")).await);
        assert!(store.remove(&pair(), &OrderId::new("a")).await);
        assert!(store.is_empty().await);
        assert!(store.fetch_resting(&pair()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replaced_payload_keeps_queue_position() {
        let store = MemoryOrderStore::new();
        store.insert(pair(), RestingEntry::new("a", "p1")).await;
        store.insert(pair(), RestingEntry::new("b", "p2")).await;
        assert!(store.replace_payload(&pair(), &OrderId::new("a"), "p1-rest".into()).await);
        assert!(!store.replace_payload(&pair(), &OrderId::new("zz"), "x".into()).await);

        let pool = store.fetch_resting(&pair()).await.unwrap();
        assert_eq!(pool[0], RestingEntry::new("a", "p1-rest"));
        assert_eq!(pool[1].id.as_str(), "b");
        assert_eq!(
            store.get(&pair(), &OrderId::new("b")).await,
            Some(RestingEntry::new("b", "p2"))
        );
    }

    #[tokio::test]
    async fn clones_share_the_pool() {
        let store = MemoryOrderStore::new();
        let handle = store.clone();
        handle.insert(pair(), RestingEntry::new("a", "p1")).await;
        assert_eq!(store.len(&pair()).await, 1);
    }

    #[test]
    fn http_source_url() {
        let backend = BackendConfig {
            base_url: Some("https://api.example.com/".into()),
            ..BackendConfig::default()
        };
        let source = HttpRestingOrderSource::from_config(&backend).unwrap();
        assert_eq!(source.url(), "https://api.example.com/orders/encrypted");
        assert!(HttpRestingOrderSource::from_config(&BackendConfig::default()).is_err());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_book_fetch_error() {
        let source =
            HttpRestingOrderSource::new("http://127.0.0.1:1/orders", Duration::from_millis(500))
                .unwrap();
        let err = source.fetch_resting(&pair()).await.unwrap_err();
        assert!(matches!(err, VeilmatchError::BookFetch { .. }));
    }
}
