//! Handler Port - 处理函数与处理链
//!
//! 一个路由绑定一条有序处理链，按顺序对单个请求执行。
//! 每条链的第一级固定为 [`preflight`]，由 [`Chain::new`] 自动插入，调用方无法去除。
//!
//! 链的推进只有一种方式：处理函数调用 `ctx.next()`。
//! 因此处理函数返回 `Err` 时，后续处理函数不会被执行。

use futures_util::future::BoxFuture;
use std::sync::Arc;

use super::context::Context;
use crate::application::error::FacadeError;

/// 处理函数的返回值
pub type HandlerResult = Result<(), FacadeError>;

/// 处理函数
///
/// 无状态的函数引用，被匹配该路由的所有请求共享。
pub type HandlerFunc =
    Arc<dyn for<'a> Fn(&'a mut dyn Context) -> BoxFuture<'a, HandlerResult> + Send + Sync>;

/// 将函数包装为 [`HandlerFunc`]
///
/// ```rust,no_run
/// use futures_util::future::BoxFuture;
/// use portico::application::ports::{handler, Context, HandlerResult};
///
/// fn ping(ctx: &mut dyn Context) -> BoxFuture<'_, HandlerResult> {
///     Box::pin(async move { ctx.send_string("pong".to_string()) })
/// }
///
/// let h = handler(ping);
/// ```
pub fn handler<F>(f: F) -> HandlerFunc
where
    F: for<'a> Fn(&'a mut dyn Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 携带共享状态的处理函数
///
/// 每次调用时 clone 一份 `state` 传入，适合 `Arc<...>` 形式的服务句柄。
pub fn with_state<S, F>(state: S, f: F) -> HandlerFunc
where
    S: Clone + Send + Sync + 'static,
    F: for<'a> Fn(&'a mut dyn Context, S) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    handler(move |ctx| f(ctx, state.clone()))
}

/// 每条处理链的固定第一级
///
/// 跨域策略由全局 CORS 层统一负责，这一级只做透传。
pub fn preflight(ctx: &mut dyn Context) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move { ctx.next().await })
}

/// 处理链
#[derive(Clone)]
pub struct Chain {
    stages: Arc<[HandlerFunc]>,
}

impl Chain {
    /// 创建处理链，自动在最前面插入 [`preflight`]
    pub fn new(handlers: Vec<HandlerFunc>) -> Self {
        let mut stages: Vec<HandlerFunc> = Vec::with_capacity(handlers.len() + 1);
        stages.push(handler(preflight));
        stages.extend(handlers);
        Self {
            stages: stages.into(),
        }
    }

    /// 总级数（包含 preflight）
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// 调用方提供的处理函数数量
    pub fn handler_count(&self) -> usize {
        self.stages.len() - 1
    }

    pub fn stage(&self, index: usize) -> Option<&HandlerFunc> {
        self.stages.get(index)
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("stages", &self.len()).finish()
    }
}

/// 单个请求在处理链上的位置
///
/// 后端适配器在 `Context::next` 中调用 [`ChainCursor::advance`] 取出下一级。
#[derive(Debug, Clone)]
pub struct ChainCursor {
    chain: Chain,
    next: usize,
}

impl ChainCursor {
    pub fn new(chain: Chain) -> Self {
        Self { chain, next: 0 }
    }

    /// 取出下一级处理函数，链已走完时返回 None
    pub fn advance(&mut self) -> Option<HandlerFunc> {
        let stage = self.chain.stage(self.next).cloned()?;
        self.next += 1;
        Some(stage)
    }

    /// 已执行的级数
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.chain.len()
    }
}
