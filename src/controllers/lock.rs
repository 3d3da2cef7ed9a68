//! Lock Controller
//!
//! - `POST /lock/:name`：以 `owner` 身份加锁，可选 `ttl`（秒）
//! - `GET /lock/:name`：查询当前持有者
//! - `DELETE /lock/:name?owner=`：持有者解锁

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;

use super::errno;
use crate::application::{
    with_state, App, CodedError, Context, ContextExt, Controller, DistLockClient, HandlerResult,
};

/// 未指定 ttl 时的锁有效期
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);

type Locks = Arc<dyn DistLockClient>;

pub struct LockController {
    locks: Locks,
}

impl LockController {
    pub fn new(locks: Locks) -> Self {
        Self { locks }
    }
}

impl Controller for LockController {
    fn name(&self) -> &str {
        "lock"
    }

    fn register(&self, app: &mut dyn App) {
        app.post("/lock/:name", vec![with_state(self.locks.clone(), acquire)]);
        app.get("/lock/:name", vec![with_state(self.locks.clone(), holder)]);
        app.delete("/lock/:name", vec![with_state(self.locks.clone(), release)]);
    }
}

#[derive(Debug, Deserialize)]
struct LockRequest {
    owner: String,
    #[serde(default)]
    ttl: Option<u64>,
}

fn acquire(ctx: &mut dyn Context, locks: Locks) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let name = ctx.param_or("name", "");
        let request: LockRequest = ctx.bind()?;
        if request.owner.is_empty() {
            return ctx.send_error(&CodedError::new(errno::INVALID_ARGUMENT, "owner is required"));
        }
        let ttl = request
            .ttl
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LOCK_TTL);

        if !locks.try_lock(&name, &request.owner, ttl).await? {
            return ctx.send_error(&CodedError::new(
                errno::LOCK_HELD,
                format!("lock is held: {}", name),
            ));
        }
        ctx.send_result(json!({
            "lock": name,
            "owner": request.owner,
            "ttl": ttl.as_secs(),
        }))
    })
}

fn holder(ctx: &mut dyn Context, locks: Locks) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let name = ctx.param_or("name", "");
        let owner = locks.holder(&name).await?;
        ctx.send_result(json!({ "lock": name, "locked": owner.is_some(), "owner": owner }))
    })
}

fn release(ctx: &mut dyn Context, locks: Locks) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let name = ctx.param_or("name", "");
        let owner = ctx.query_or("owner", "");
        if !locks.unlock(&name, &owner).await? {
            return ctx.send_error(&CodedError::new(
                errno::LOCK_NOT_HELD,
                format!("lock `{}` is not held by `{}`", name, owner),
            ));
        }
        ctx.send_result(json!({ "lock": name, "released": true }))
    })
}
