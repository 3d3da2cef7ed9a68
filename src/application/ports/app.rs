//! App Port - 应用能力接口
//!
//! 进程级对象，持有后端的路由表与监听器。
//! 路由只能在 `start` 之前添加；`start` 消费 App，服务开始后路由表不可变。

use async_trait::async_trait;
use std::fmt;

use super::handler::{Chain, HandlerFunc};
use crate::application::error::FacadeError;

/// 支持注册的 HTTP 方法
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 路由表中的一项（只读视图）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: Method,
    pub path: String,
    /// 调用方提供的处理函数数量（不含 preflight）
    pub handlers: usize,
}

/// App 能力接口
///
/// 同一 method + path 重复注册时，首次注册生效，之后的注册被忽略并记录警告。
#[async_trait]
pub trait App: Send {
    /// 后端名称
    fn backend(&self) -> &str;

    /// 添加路由
    fn add_route(&mut self, method: Method, path: &str, chain: Chain);

    /// 当前路由表，按注册顺序
    fn routes(&self) -> Vec<RouteInfo>;

    /// 绑定地址并开始服务，直到进程终止或传输层出现致命错误
    async fn start(self: Box<Self>) -> Result<(), FacadeError>;

    fn get(&mut self, path: &str, handlers: Vec<HandlerFunc>) {
        self.add_route(Method::Get, path, Chain::new(handlers));
    }

    fn post(&mut self, path: &str, handlers: Vec<HandlerFunc>) {
        self.add_route(Method::Post, path, Chain::new(handlers));
    }

    fn put(&mut self, path: &str, handlers: Vec<HandlerFunc>) {
        self.add_route(Method::Put, path, Chain::new(handlers));
    }

    fn patch(&mut self, path: &str, handlers: Vec<HandlerFunc>) {
        self.add_route(Method::Patch, path, Chain::new(handlers));
    }

    fn delete(&mut self, path: &str, handlers: Vec<HandlerFunc>) {
        self.add_route(Method::Delete, path, Chain::new(handlers));
    }
}
