//! External Client Ports - 外部协作者接口
//!
//! key-value、发布/订阅、队列、密钥查询、令牌服务、分布式锁、共享对象。
//! facade 只按名称解析它们，不关心内部实现。

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// 外部客户端错误
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Client not registered: {0}")]
    NotRegistered(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Expired: {0}")]
    Expired(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Key-Value 客户端
#[async_trait]
pub trait KeyValClient: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError>;

    /// `ttl` 为 None 时永不过期
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), ClientError>;

    /// 返回 key 是否存在
    async fn delete(&self, key: &str) -> Result<bool, ClientError>;

    /// 按前缀列出 key，结果有序
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, ClientError>;
}

/// 订阅句柄
pub struct Subscription {
    topic: String,
    receiver: broadcast::Receiver<String>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, receiver: broadcast::Receiver<String>) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 接收下一条消息，发布端全部关闭后返回 None
    ///
    /// 消费过慢导致的丢消息会被跳过并记录警告。
    pub async fn recv(&mut self) -> Option<String> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = %self.topic, skipped = skipped, "Subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// 发布/订阅客户端
#[async_trait]
pub trait PubSubClient: Send + Sync {
    /// 返回收到消息的订阅者数量
    async fn publish(&self, topic: &str, payload: &str) -> Result<usize, ClientError>;

    async fn subscribe(&self, topic: &str) -> Result<Subscription, ClientError>;
}

/// 队列客户端（FIFO）
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn push(&self, queue: &str, payload: &str) -> Result<(), ClientError>;

    /// 非阻塞出队，队列为空时返回 None
    async fn pop(&self, queue: &str) -> Result<Option<String>, ClientError>;

    async fn len(&self, queue: &str) -> Result<usize, ClientError>;
}

/// 密钥查询
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn secret(&self, key: &str) -> Result<String, ClientError>;
}

/// 令牌签发与校验
#[async_trait]
pub trait TokenService: Send + Sync {
    async fn issue(&self, subject: &str, ttl: Duration) -> Result<String, ClientError>;

    /// 校验成功时返回 subject
    async fn validate(&self, token: &str) -> Result<String, ClientError>;

    async fn revoke(&self, token: &str) -> Result<(), ClientError>;
}

/// 分布式锁
///
/// 锁由 `owner` 持有，`ttl` 到期后自动失效。
#[async_trait]
pub trait DistLockClient: Send + Sync {
    /// 尝试加锁，被他人持有时返回 false；持有者重复加锁会续期
    async fn try_lock(&self, name: &str, owner: &str, ttl: Duration) -> Result<bool, ClientError>;

    /// 只有持有者能解锁，返回是否确实释放
    async fn unlock(&self, name: &str, owner: &str) -> Result<bool, ClientError>;

    /// 当前持有者，未加锁或已过期时返回 None
    async fn holder(&self, name: &str) -> Result<Option<String>, ClientError>;
}

/// 带版本号的共享对象
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedObject {
    pub version: u64,
    pub value: Value,
}

/// 分布式对象存储（乐观并发）
#[async_trait]
pub trait DistObjClient: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<VersionedObject>, ClientError>;

    /// 写入对象并返回新版本号
    ///
    /// `expected_version` 为 Some 时必须与当前版本一致（对象不存在视为 0），
    /// 否则返回 `Conflict`。
    async fn store(
        &self,
        id: &str,
        value: Value,
        expected_version: Option<u64>,
    ) -> Result<u64, ClientError>;

    async fn remove(&self, id: &str) -> Result<bool, ClientError>;
}
