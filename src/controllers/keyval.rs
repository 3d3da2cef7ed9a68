//! Key-Value Controller
//!
//! `GET/POST/DELETE /kv/:key`，`GET /kv` 分页列出 key

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;

use super::errno;
use crate::application::{
    with_state, App, CodedError, Context, ContextExt, Controller, FacadeError, HandlerResult,
    KeyValClient,
};

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

type KeyVal = Arc<dyn KeyValClient>;

/// Key-Value 接口
pub struct KeyValController {
    kv: KeyVal,
}

impl KeyValController {
    pub fn new(kv: KeyVal) -> Self {
        Self { kv }
    }
}

impl Controller for KeyValController {
    fn name(&self) -> &str {
        "keyval"
    }

    fn register(&self, app: &mut dyn App) {
        app.get("/kv", vec![with_state(self.kv.clone(), list_keys)]);
        app.get("/kv/:key", vec![with_state(self.kv.clone(), get_key)]);
        app.post("/kv/:key", vec![with_state(self.kv.clone(), set_key)]);
        app.delete("/kv/:key", vec![with_state(self.kv.clone(), delete_key)]);
    }
}

fn get_key(ctx: &mut dyn Context, kv: KeyVal) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let key = ctx.param_or("key", "");
        match kv.get(&key).await? {
            Some(value) => ctx.send_result(json!({ "key": key, "value": value })),
            None => ctx.send_error(&CodedError::new(
                errno::KEY_NOT_FOUND,
                format!("key not found: {}", key),
            )),
        }
    })
}

#[derive(Debug, Deserialize)]
struct SetRequest {
    value: String,
    /// 过期时间（秒）
    #[serde(default)]
    ttl: Option<u64>,
}

fn set_key(ctx: &mut dyn Context, kv: KeyVal) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let key = ctx.param_or("key", "");
        let request: SetRequest = ctx.bind()?;
        let ttl = request.ttl.filter(|secs| *secs > 0).map(Duration::from_secs);

        kv.set(&key, &request.value, ttl).await?;
        ctx.status(201);
        ctx.send_result(json!({ "key": key, "ttl": request.ttl }))
    })
}

fn delete_key(ctx: &mut dyn Context, kv: KeyVal) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let key = ctx.param_or("key", "");
        let deleted = kv.delete(&key).await?;
        ctx.send_result(json!({ "key": key, "deleted": deleted }))
    })
}

fn parse_u32(ctx: &dyn Context, name: &str, default: u32) -> Result<u32, CodedError> {
    match ctx.query(name) {
        None | Some("") => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            CodedError::new(
                errno::INVALID_ARGUMENT,
                format!("{} must be a positive integer", name),
            )
        }),
    }
}

fn list_keys(ctx: &mut dyn Context, kv: KeyVal) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let page = parse_u32(ctx, "page", 1);
        let size = parse_u32(ctx, "size", DEFAULT_PAGE_SIZE);
        let (page, size) = match (page, size) {
            (Ok(page), Ok(size)) if size > 0 && size <= MAX_PAGE_SIZE => (page, size),
            (Err(err), _) | (_, Err(err)) => return ctx.send_error(&err),
            _ => {
                return ctx.send_error(&CodedError::new(
                    errno::INVALID_ARGUMENT,
                    format!("size must be between 1 and {}", MAX_PAGE_SIZE),
                ))
            }
        };

        let prefix = ctx.query_or("prefix", "");
        let keys = kv.keys(&prefix).await?;
        let total_page = u32::try_from(keys.len().div_ceil(size as usize)).unwrap_or(u32::MAX);
        if page > total_page.max(1) {
            return Err(FacadeError::InvalidPage {
                curr_page: page,
                total_page,
            });
        }

        let offset = (page.saturating_sub(1) as usize).saturating_mul(size as usize);
        let items: Vec<&String> = keys.iter().skip(offset).take(size as usize).collect();

        ctx.send_paged_of(&items, page, total_page)
    })
}
