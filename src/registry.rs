use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use crate::db;
use crate::dispatch::resolve::{self, Resolution};
use crate::models::Endpoint;

/// In-memory routing table over the persisted endpoint definitions.
///
/// Loaded once at startup and then kept in step with storage by the
/// management handlers, which call [`upsert`](Self::upsert) and
/// [`remove`](Self::remove) after each successful write. Entries stay in
/// declaration order so resolution can take the first match.
///
/// Endpoint writes hold [`lock_writes`](Self::lock_writes) from the storage
/// statement until the registry reflects it, so the snapshot applies writes
/// in the order they committed.
pub struct EndpointRegistry {
    endpoints: RwLock<Vec<Endpoint>>,
    writes: Mutex<()>,
}

impl EndpointRegistry {
    pub fn new(mut endpoints: Vec<Endpoint>) -> Self {
        endpoints.sort_by_key(|e| (e.created_at, e.id));
        Self {
            endpoints: RwLock::new(endpoints),
            writes: Mutex::new(()),
        }
    }

    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        Ok(Self::new(db::endpoints::list_all(pool).await?))
    }

    /// Serializes endpoint writes. Reads and dispatch are not blocked.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }

    pub async fn len(&self) -> usize {
        self.endpoints.read().await.len()
    }

    pub async fn snapshot(&self) -> Vec<Endpoint> {
        self.endpoints.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<Endpoint> {
        self.endpoints
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// Ids from `ids` that are not registered, in input order.
    pub async fn unknown_ids(&self, ids: &[Uuid]) -> Vec<Uuid> {
        let endpoints = self.endpoints.read().await;
        ids.iter()
            .filter(|id| !endpoints.iter().any(|e| e.id == **id))
            .copied()
            .collect()
    }

    pub async fn upsert(&self, endpoint: Endpoint) {
        let mut endpoints = self.endpoints.write().await;
        endpoints.retain(|e| e.id != endpoint.id);
        let at = endpoints.partition_point(|e| (e.created_at, e.id) <= (endpoint.created_at, endpoint.id));
        endpoints.insert(at, endpoint);
    }

    pub async fn remove(&self, id: Uuid) {
        self.endpoints.write().await.retain(|e| e.id != id);
    }

    pub async fn resolve(&self, method: &axum::http::Method, path: &str) -> Resolution<Endpoint> {
        let endpoints = self.endpoints.read().await;
        resolve::resolve(&endpoints, method, path).cloned()
    }
}
