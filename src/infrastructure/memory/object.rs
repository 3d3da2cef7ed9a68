//! In-Memory Distributed Object Store
//!
//! JSON 对象按 id 保存，每次写入版本号加一。

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

use crate::application::ports::{ClientError, DistObjClient, VersionedObject};

/// 内存对象存储
pub struct InMemoryObjectStore {
    objects: DashMap<String, VersionedObject>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
        }
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

fn conflict(id: &str, expected: u64, actual: u64) -> ClientError {
    ClientError::Conflict(format!(
        "object `{}` is at version {}, expected {}",
        id, actual, expected
    ))
}

#[async_trait]
impl DistObjClient for InMemoryObjectStore {
    async fn load(&self, id: &str) -> Result<Option<VersionedObject>, ClientError> {
        Ok(self.objects.get(id).map(|object| object.clone()))
    }

    async fn store(
        &self,
        id: &str,
        value: Value,
        expected_version: Option<u64>,
    ) -> Result<u64, ClientError> {
        let version = match self.objects.entry(id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get().version;
                if let Some(expected) = expected_version.filter(|v| *v != current) {
                    return Err(conflict(id, expected, current));
                }
                let version = current + 1;
                occupied.insert(VersionedObject { version, value });
                version
            }
            Entry::Vacant(vacant) => {
                if let Some(expected) = expected_version.filter(|v| *v != 0) {
                    return Err(conflict(id, expected, 0));
                }
                vacant.insert(VersionedObject { version: 1, value });
                1
            }
        };
        tracing::debug!(object = %id, version = version, "Object stored");
        Ok(version)
    }

    async fn remove(&self, id: &str) -> Result<bool, ClientError> {
        Ok(self.objects.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_versions_increase_on_store() {
        let store = InMemoryObjectStore::new();
        assert!(store.load("cart").await.unwrap().is_none());

        assert_eq!(store.store("cart", json!({"items": 1}), None).await.unwrap(), 1);
        assert_eq!(store.store("cart", json!({"items": 2}), Some(1)).await.unwrap(), 2);

        let object = store.load("cart").await.unwrap().unwrap();
        assert_eq!(object.version, 2);
        assert_eq!(object.value["items"], 2);
    }

    #[tokio::test]
    async fn test_stale_version_is_a_conflict() {
        let store = InMemoryObjectStore::new();
        store.store("cart", json!(1), None).await.unwrap();
        store.store("cart", json!(2), None).await.unwrap();

        let err = store.store("cart", json!(3), Some(1)).await.unwrap_err();
        assert!(matches!(err, ClientError::Conflict(_)));
        assert_eq!(store.load("cart").await.unwrap().unwrap().value, json!(2));
    }

    #[tokio::test]
    async fn test_create_only_with_version_zero() {
        let store = InMemoryObjectStore::new();
        assert!(matches!(
            store.store("new", json!({}), Some(3)).await,
            Err(ClientError::Conflict(_))
        ));
        assert_eq!(store.store("new", json!({}), Some(0)).await.unwrap(), 1);
        assert!(matches!(
            store.store("new", json!({}), Some(0)).await,
            Err(ClientError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryObjectStore::new();
        store.store("tmp", json!(null), None).await.unwrap();
        assert!(store.remove("tmp").await.unwrap());
        assert!(!store.remove("tmp").await.unwrap());
    }
}
