//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod http;
pub mod memory;
pub mod secret;

pub use http::{register_axum, AxumApp, AxumContext, AXUM_BACKEND};
pub use memory::{
    in_memory_services, InMemoryKeyVal, InMemoryLock, InMemoryObjectStore, InMemoryPubSub,
    InMemoryQueue, InMemoryTokenService,
};
pub use secret::EnvSecretStore;
