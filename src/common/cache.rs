// src/common/cache.rs

use std::{future::Future, time::Duration};

use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};

use crate::common::error::AppError;

/// Entidades cujas listagens passam pelo cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEntity {
    Buildings,
    Floors,
    Rooms,
    SpaceConnections,
    Personnel,
    InventoryItems,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub entity: CacheEntity,
    pub filter: String,
}

impl CacheKey {
    pub fn new(entity: CacheEntity, filter: impl Into<String>) -> Self {
        Self { entity, filter: filter.into() }
    }
}

// Cache de consultas: (entidade, filtro) -> JSON.
// Mutações invalidam a entidade inteira; não há merge.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<CacheKey, serde_json::Value>,
}

impl QueryCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    pub async fn get_or_load<T, F, Fut>(&self, key: CacheKey, loader: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if let Some(cached) = self.inner.get(&key).await {
            match serde_json::from_value::<T>(cached) {
                Ok(value) => {
                    tracing::debug!(entity = ?key.entity, filter = %key.filter, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(entity = ?key.entity, error = %e, "entrada de cache ilegível, recarregando");
                    self.inner.invalidate(&key).await;
                }
            }
        }

        let value = loader().await?;
        let json = serde_json::to_value(&value).map_err(anyhow::Error::from)?;
        self.inner.insert(key, json).await;
        Ok(value)
    }

    pub async fn invalidate_entity(&self, entity: CacheEntity) {
        let keys: Vec<_> = self
            .inner
            .iter()
            .filter(|(key, _)| key.entity == entity)
            .map(|(key, _)| key)
            .collect();

        for key in keys {
            self.inner.invalidate(key.as_ref()).await;
        }
        tracing::debug!(entity = ?entity, "cache invalidado");
    }

    pub async fn invalidate_entities(&self, entities: &[CacheEntity]) {
        for entity in entities {
            self.invalidate_entity(*entity).await;
        }
    }

    #[cfg(test)]
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.inner.get(key).await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn cache() -> QueryCache {
        QueryCache::new(100, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = cache();
        let loads = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new(CacheEntity::Rooms, "floor=1");

        for _ in 0..3 {
            let loads = loads.clone();
            let rooms: Vec<String> = cache
                .get_or_load(key.clone(), || async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["101".to_string(), "102".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(rooms.len(), 2);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_only_touches_the_given_entity() {
        let cache = cache();
        let rooms = CacheKey::new(CacheEntity::Rooms, "floor=1");
        let buildings = CacheKey::new(CacheEntity::Buildings, "all");

        let _: u32 = cache.get_or_load(rooms.clone(), || async { Ok(1) }).await.unwrap();
        let _: u32 = cache.get_or_load(buildings.clone(), || async { Ok(2) }).await.unwrap();

        cache.invalidate_entity(CacheEntity::Rooms).await;

        assert!(!cache.contains(&rooms).await);
        assert!(cache.contains(&buildings).await);
    }

    #[tokio::test]
    async fn loader_errors_are_not_cached() {
        let cache = cache();
        let key = CacheKey::new(CacheEntity::Personnel, "minimal");

        let first: Result<u32, AppError> = cache
            .get_or_load(key.clone(), || async { Err(AppError::ResourceNotFound("x".into())) })
            .await;
        assert!(first.is_err());
        assert!(!cache.contains(&key).await);

        let second: u32 = cache.get_or_load(key, || async { Ok(7) }).await.unwrap();
        assert_eq!(second, 7);
    }
}
