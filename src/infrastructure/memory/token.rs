//! In-Memory Token Service
//!
//! 签发不透明令牌（UUID v4），服务端保存 subject 与过期时间。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::application::ports::{ClientError, TokenService};

#[derive(Debug, Clone)]
struct Grant {
    subject: String,
    expires_at: DateTime<Utc>,
}

/// 内存令牌服务
pub struct InMemoryTokenService {
    grants: DashMap<String, Grant>,
}

impl InMemoryTokenService {
    pub fn new() -> Self {
        Self {
            grants: DashMap::new(),
        }
    }

    /// 清理已过期的令牌，返回清理数量
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.grants.len();
        self.grants.retain(|_, grant| grant.expires_at > now);
        before - self.grants.len()
    }
}

impl Default for InMemoryTokenService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenService for InMemoryTokenService {
    async fn issue(&self, subject: &str, ttl: Duration) -> Result<String, ClientError> {
        if subject.is_empty() {
            return Err(ClientError::Backend("token subject is empty".to_string()));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| ClientError::Backend(format!("invalid ttl: {}", e)))?;

        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + ttl;
        self.grants.insert(
            token.clone(),
            Grant {
                subject: subject.to_string(),
                expires_at,
            },
        );
        tracing::info!(subject = %subject, expires_at = %expires_at, "Token issued");
        Ok(token)
    }

    async fn validate(&self, token: &str) -> Result<String, ClientError> {
        let grant = self
            .grants
            .get(token)
            .map(|g| g.clone())
            .ok_or(ClientError::InvalidToken)?;

        if grant.expires_at <= Utc::now() {
            self.grants.remove(token);
            return Err(ClientError::Expired("token".to_string()));
        }
        Ok(grant.subject)
    }

    async fn revoke(&self, token: &str) -> Result<(), ClientError> {
        self.grants
            .remove(token)
            .map(|(_, grant)| {
                tracing::info!(subject = %grant.subject, "Token revoked");
            })
            .ok_or(ClientError::InvalidToken)
    }
}
