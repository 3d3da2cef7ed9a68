//! Memory Layer - In-Memory Clients
//!
//! 外部协作者的内存实现：key-value、发布/订阅、队列、令牌服务、锁、共享对象

mod keyval;
mod lock;
mod object;
mod pubsub;
mod queue;
mod token;

use std::sync::Arc;

pub use keyval::InMemoryKeyVal;
pub use lock::InMemoryLock;
pub use object::InMemoryObjectStore;
pub use pubsub::InMemoryPubSub;
pub use queue::InMemoryQueue;
pub use token::InMemoryTokenService;

use super::secret::EnvSecretStore;
use crate::application::{Services, DEFAULT_NAME};

/// 以内存实现填充全部缺省实例
///
/// 密钥查询使用环境变量（`secret_prefix` 为变量名前缀）。
pub fn in_memory_services(secret_prefix: &str) -> Services {
    let mut services = Services::new();
    services
        .keyval
        .register(DEFAULT_NAME, Arc::new(InMemoryKeyVal::new()));
    services
        .pubsub
        .register(DEFAULT_NAME, Arc::new(InMemoryPubSub::new()));
    services
        .queue
        .register(DEFAULT_NAME, Arc::new(InMemoryQueue::new()));
    services
        .tokens
        .register(DEFAULT_NAME, Arc::new(InMemoryTokenService::new()));
    services
        .secrets
        .register(DEFAULT_NAME, Arc::new(EnvSecretStore::new(secret_prefix)));
    services
        .locks
        .register(DEFAULT_NAME, Arc::new(InMemoryLock::new()));
    services
        .objects
        .register(DEFAULT_NAME, Arc::new(InMemoryObjectStore::new()));
    services
}
