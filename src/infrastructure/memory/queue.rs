//! In-Memory Queue Client

use std::collections::VecDeque;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::ports::{ClientError, QueueClient};

/// 内存 FIFO 队列，按队列名隔离
pub struct InMemoryQueue {
    queues: DashMap<String, VecDeque<String>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn push(&self, queue: &str, payload: &str) -> Result<(), ClientError> {
        let mut entries = self.queues.entry(queue.to_string()).or_default();
        entries.push_back(payload.to_string());
        tracing::debug!(queue = %queue, depth = entries.len(), "Message queued");
        Ok(())
    }

    async fn pop(&self, queue: &str) -> Result<Option<String>, ClientError> {
        Ok(self
            .queues
            .get_mut(queue)
            .and_then(|mut entries| entries.pop_front()))
    }

    async fn len(&self, queue: &str) -> Result<usize, ClientError> {
        Ok(self.queues.get(queue).map(|e| e.len()).unwrap_or(0))
    }
}
