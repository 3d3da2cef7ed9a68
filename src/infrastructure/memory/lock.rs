//! In-Memory Distributed Lock
//!
//! 单进程内的锁表，过期的锁在下一次访问时视为空闲。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::application::ports::{ClientError, DistLockClient};

#[derive(Debug, Clone)]
struct Lease {
    owner: String,
    expires_at: DateTime<Utc>,
}

impl Lease {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// 内存锁
pub struct InMemoryLock {
    leases: DashMap<String, Lease>,
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self {
            leases: DashMap::new(),
        }
    }
}

impl Default for InMemoryLock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DistLockClient for InMemoryLock {
    async fn try_lock(&self, name: &str, owner: &str, ttl: Duration) -> Result<bool, ClientError> {
        if owner.is_empty() {
            return Err(ClientError::Backend("lock owner is empty".to_string()));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| ClientError::Backend(format!("invalid ttl: {}", e)))?;
        let now = Utc::now();
        let lease = Lease {
            owner: owner.to_string(),
            expires_at: now + ttl,
        };

        // entry 持有分片写锁，判断与写入是原子的
        match self.leases.entry(name.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get();
                if current.is_live(now) && current.owner != owner {
                    return Ok(false);
                }
                occupied.insert(lease);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(lease);
            }
        }
        tracing::debug!(lock = %name, owner = %owner, "Lock acquired");
        Ok(true)
    }

    async fn unlock(&self, name: &str, owner: &str) -> Result<bool, ClientError> {
        let now = Utc::now();
        let released = self
            .leases
            .remove_if(name, |_, lease| lease.owner == owner && lease.is_live(now))
            .is_some();
        if released {
            tracing::debug!(lock = %name, owner = %owner, "Lock released");
        }
        Ok(released)
    }

    async fn holder(&self, name: &str) -> Result<Option<String>, ClientError> {
        let now = Utc::now();
        Ok(self
            .leases
            .get(name)
            .filter(|lease| lease.is_live(now))
            .map(|lease| lease.owner.clone()))
    }
}
