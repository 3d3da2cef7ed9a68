//! In-Memory Pub/Sub Client
//!
//! 每个 topic 一个 `tokio::sync::broadcast` 通道，首次订阅或发布时创建。

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::application::ports::{ClientError, PubSubClient, Subscription};

const DEFAULT_CAPACITY: usize = 256;

/// 内存发布/订阅
pub struct InMemoryPubSub {
    topics: DashMap<String, broadcast::Sender<String>>,
    capacity: usize,
}

impl InMemoryPubSub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// 每个 topic 的缓冲容量，慢订阅者超过容量后丢弃最旧的消息
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<String> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for InMemoryPubSub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PubSubClient for InMemoryPubSub {
    async fn publish(&self, topic: &str, payload: &str) -> Result<usize, ClientError> {
        // 没有订阅者时 send 返回错误，视为投递给 0 个订阅者
        let delivered = self.sender(topic).send(payload.to_string()).unwrap_or(0);
        tracing::debug!(topic = %topic, subscribers = delivered, "Message published");
        Ok(delivered)
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, ClientError> {
        let receiver = self.sender(topic).subscribe();
        tracing::debug!(topic = %topic, "Subscribed");
        Ok(Subscription::new(topic, receiver))
    }
}
