//! 应用层 - 后端无关的 facade 核心
//!
//! 包含：
//! - ports: App / Context 能力接口、处理链、外部协作者接口
//! - registry: 后端工厂注册表、控制器注册表、外部协作者注册表
//! - envelope: 统一响应信封
//! - bootstrap: 启动生命周期
//! - error: 错误定义

pub mod bootstrap;
pub mod envelope;
pub mod error;
pub mod ports;
pub mod registry;
pub mod tempfiles;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{Bootstrap, Lifecycle};
pub use envelope::{ApiResult, ApiResultPaged, CodedError, SUCCESS_MESSAGE};
pub use error::{errno, FacadeError};
pub use ports::{
    handler, with_state, App, Chain, ClientError, Context, ContextExt, DistLockClient,
    DistObjClient, HandlerFunc, HandlerResult, KeyValClient, Method, PubSubClient, QueueClient,
    RouteInfo, SecretStore, Subscription, TokenService, UploadedFile, VersionedObject,
};
pub use registry::{AppCreators, Controller, Controllers, NamedRegistry, Services, DEFAULT_NAME};
