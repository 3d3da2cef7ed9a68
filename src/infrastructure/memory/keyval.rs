//! In-Memory Key-Value Client

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::application::ports::{ClientError, KeyValClient};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// 内存 Key-Value 存储
///
/// 过期的 key 在下一次访问时惰性删除。
pub struct InMemoryKeyVal {
    entries: DashMap<String, Entry>,
}

impl InMemoryKeyVal {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for InMemoryKeyVal {
    fn default() -> Self {
        Self::new()
    }
}

fn expiry(ttl: Option<Duration>) -> Result<Option<DateTime<Utc>>, ClientError> {
    match ttl {
        None => Ok(None),
        Some(ttl) => {
            let ttl = chrono::Duration::from_std(ttl)
                .map_err(|e| ClientError::Backend(format!("invalid ttl: {}", e)))?;
            Ok(Some(Utc::now() + ttl))
        }
    }
}

#[async_trait]
impl KeyValClient for InMemoryKeyVal {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let now = Utc::now();
        match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }

        self.entries.remove_if(key, |_, e| e.is_expired(now));
        tracing::debug!(key = %key, "Key expired");
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), ClientError> {
        let expires_at = expiry(ttl)?;
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        tracing::debug!(key = %key, ttl = ?ttl, "Key set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, ClientError> {
        let now = Utc::now();
        Ok(self
            .entries
            .remove(key)
            .map(|(_, entry)| !entry.is_expired(now))
            .unwrap_or(false))
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, ClientError> {
        let now = Utc::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));

        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let kv = InMemoryKeyVal::new();
        assert_eq!(kv.get("a").await.unwrap(), None);

        kv.set("a", "1", None).await.unwrap();
        kv.set("a", "2", None).await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), Some("2".to_string()));

        assert!(kv.delete("a").await.unwrap());
        assert!(!kv.delete("a").await.unwrap());
        assert_eq!(kv.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let kv = InMemoryKeyVal::new();
        kv.set("session", "x", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        kv.set("forever", "y", None).await.unwrap();
        assert!(kv.get("session").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(kv.get("session").await.unwrap(), None);
        assert_eq!(kv.keys("").await.unwrap(), vec!["forever".to_string()]);
    }

    #[tokio::test]
    async fn test_keys_by_prefix_are_sorted() {
        let kv = InMemoryKeyVal::new();
        for key in ["user:2", "user:1", "order:1"] {
            kv.set(key, "v", None).await.unwrap();
        }
        assert_eq!(
            kv.keys("user:").await.unwrap(),
            vec!["user:1".to_string(), "user:2".to_string()]
        );
    }
}
