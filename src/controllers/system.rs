//! System Controller
//!
//! 存活检查与回显接口

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::application::{handler, with_state, App, Context, ContextExt, Controller, HandlerResult};

/// 系统接口
pub struct SystemController {
    started_at: DateTime<Utc>,
}

impl SystemController {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }
}

impl Default for SystemController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for SystemController {
    fn name(&self) -> &str {
        "system"
    }

    fn register(&self, app: &mut dyn App) {
        app.get("/ping", vec![handler(ping)]);
        app.get("/health", vec![with_state(self.started_at, health)]);
        app.get("/echo/:name", vec![handler(echo_name)]);
        app.post("/echo", vec![handler(echo_body)]);
    }
}

fn ping(ctx: &mut dyn Context) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move { ctx.send_string("pong".to_string()) })
}

fn health(ctx: &mut dyn Context, started_at: DateTime<Utc>) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let uptime = (Utc::now() - started_at).num_seconds().max(0);
        ctx.send_result(json!({
            "status": "ok",
            "started_at": started_at.to_rfc3339(),
            "uptime_secs": uptime,
        }))
    })
}

fn echo_name(ctx: &mut dyn Context) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let name = ctx.param_or("name", "");
        let greeting = ctx.query_or("greeting", "hello");
        ctx.send_string(format!("{}, {}", greeting, name))
    })
}

#[derive(Debug, Deserialize)]
struct EchoRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct EchoResponse {
    message: String,
    length: usize,
}

fn echo_body(ctx: &mut dyn Context) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let request: EchoRequest = ctx.bind()?;
        let length = request.message.chars().count();
        ctx.send_result_of(&EchoResponse {
            message: request.message,
            length,
        })
    })
}
