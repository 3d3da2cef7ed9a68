//! Portico - 后端无关的 HTTP 应用 facade
//!
//! 架构设计: Hexagonal Architecture
//!
//! 应用层 (application/):
//! - Ports: App / Context 能力接口、处理链、外部协作者接口
//! - Registry: 后端工厂、控制器、外部协作者注册表
//! - Envelope: 统一响应信封 Result / ResultPaged / CodedError
//! - Bootstrap: 启动生命周期
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: axum 后端（CORS、指标、状态码日志）
//! - Memory: key-value、发布/订阅、队列、令牌服务、锁、共享对象内存实现
//! - Secret: 环境变量密钥查询
//!
//! 控制器 (controllers/): 示例路由

pub mod application;
pub mod config;
pub mod controllers;
pub mod infrastructure;

pub use application::{
    App, ApiResult, ApiResultPaged, Bootstrap, CodedError, Context, ContextExt, FacadeError,
};
pub use config::{load_config, AppConfig};
