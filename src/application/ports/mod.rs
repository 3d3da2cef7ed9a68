//! Application Ports - 能力接口定义
//!
//! 定义应用代码与后端适配器、外部协作者之间的抽象接口

mod app;
mod clients;
mod context;
mod handler;

pub use app::{App, Method, RouteInfo};
pub use clients::{
    ClientError, DistLockClient, DistObjClient, KeyValClient, PubSubClient, QueueClient,
    SecretStore, Subscription, TokenService, VersionedObject,
};
pub use context::{Context, ContextExt, UploadedFile};
pub use handler::{
    handler, preflight, with_state, Chain, ChainCursor, HandlerFunc, HandlerResult,
};
