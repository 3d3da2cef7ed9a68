//! Queue Controller

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::json;

use super::errno;
use crate::application::{
    with_state, App, CodedError, Context, ContextExt, Controller, HandlerResult, QueueClient,
};

type Queue = Arc<dyn QueueClient>;

/// 队列接口：`POST /queue/:name` 入队请求体，`GET /queue/:name` 出队
pub struct QueueController {
    queue: Queue,
}

impl QueueController {
    pub fn new(queue: Queue) -> Self {
        Self { queue }
    }
}

impl Controller for QueueController {
    fn name(&self) -> &str {
        "queue"
    }

    fn register(&self, app: &mut dyn App) {
        app.post("/queue/:name", vec![with_state(self.queue.clone(), push)]);
        app.get("/queue/:name", vec![with_state(self.queue.clone(), pop)]);
    }
}

fn push(ctx: &mut dyn Context, queue: Queue) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let name = ctx.param_or("name", "");
        let payload = String::from_utf8_lossy(ctx.body()).into_owned();
        if payload.is_empty() {
            return ctx.send_error(&CodedError::new(
                errno::INVALID_ARGUMENT,
                "message body is empty",
            ));
        }

        queue.push(&name, &payload).await?;
        let depth = queue.len(&name).await?;
        ctx.send_result(json!({ "queue": name, "depth": depth }))
    })
}

fn pop(ctx: &mut dyn Context, queue: Queue) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let name = ctx.param_or("name", "");
        match queue.pop(&name).await? {
            Some(message) => ctx.send_result(json!({ "queue": name, "message": message })),
            None => ctx.send_error(&CodedError::new(
                errno::QUEUE_EMPTY,
                format!("queue is empty: {}", name),
            )),
        }
    })
}
