//! HTTP Layer - axum 后端
//!
//! - app: App 实现、Router 构建与监听
//! - context: 单请求 Context 实现
//! - cors / middleware / metrics: 全局中间件与 `/metrics`
//! - error: 逃逸错误到信封的映射

pub mod app;
pub mod context;
pub mod cors;
pub mod error;
pub mod metrics;
pub mod middleware;

pub use app::{register_axum, AxumApp, AXUM_BACKEND};
pub use context::AxumContext;
pub use cors::build_cors_layer;
pub use metrics::{HttpMetrics, METRICS_PATH};
