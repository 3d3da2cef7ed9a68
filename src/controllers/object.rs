//! Object Controller
//!
//! 带版本号的共享 JSON 对象。`PUT` 可通过 `version` 查询参数做乐观并发控制，
//! 版本不一致时返回 `VERSION_CONFLICT`。

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::{json, Value};

use super::errno;
use crate::application::{
    with_state, App, ClientError, CodedError, Context, ContextExt, Controller, DistObjClient,
    HandlerResult,
};

type Objects = Arc<dyn DistObjClient>;

pub struct ObjectController {
    objects: Objects,
}

impl ObjectController {
    pub fn new(objects: Objects) -> Self {
        Self { objects }
    }
}

impl Controller for ObjectController {
    fn name(&self) -> &str {
        "object"
    }

    fn register(&self, app: &mut dyn App) {
        app.get("/obj/:id", vec![with_state(self.objects.clone(), load)]);
        app.put("/obj/:id", vec![with_state(self.objects.clone(), store)]);
        app.delete("/obj/:id", vec![with_state(self.objects.clone(), remove)]);
    }
}

fn not_found(id: &str) -> CodedError {
    CodedError::new(errno::OBJECT_NOT_FOUND, format!("object not found: {}", id))
}

fn load(ctx: &mut dyn Context, objects: Objects) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let id = ctx.param_or("id", "");
        match objects.load(&id).await? {
            Some(object) => ctx.send_result(json!({
                "id": id,
                "version": object.version,
                "value": object.value,
            })),
            None => ctx.send_error(&not_found(&id)),
        }
    })
}

fn store(ctx: &mut dyn Context, objects: Objects) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let id = ctx.param_or("id", "");
        let raw_version = ctx.query_or("version", "");
        let expected = if raw_version.is_empty() {
            None
        } else {
            match raw_version.parse::<u64>() {
                Ok(version) => Some(version),
                Err(_) => {
                    return ctx.send_error(&CodedError::new(
                        errno::INVALID_ARGUMENT,
                        "version must be a non-negative integer",
                    ))
                }
            }
        };
        let value: Value = ctx.bind()?;

        match objects.store(&id, value, expected).await {
            Ok(version) => ctx.send_result(json!({ "id": id, "version": version })),
            Err(ClientError::Conflict(message)) => {
                ctx.send_error(&CodedError::new(errno::VERSION_CONFLICT, message))
            }
            Err(e) => Err(e.into()),
        }
    })
}

fn remove(ctx: &mut dyn Context, objects: Objects) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let id = ctx.param_or("id", "");
        if !objects.remove(&id).await? {
            return ctx.send_error(&not_found(&id));
        }
        ctx.send_result(json!({ "id": id, "deleted": true }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::{call, get, json as json_request, router};
    use crate::infrastructure::memory::InMemoryObjectStore;

    fn controller() -> ObjectController {
        ObjectController::new(Arc::new(InMemoryObjectStore::new()))
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let router = router(&controller());

        let request = json_request("PUT", "/obj/cart", r#"{"items":[1]}"#);
        let (status, body) = call(&router, request).await;
        assert_eq!(status, 200);
        assert_eq!(body["Data"]["version"], 1);

        let (_, body) = call(&router, get("/obj/cart")).await;
        assert_eq!(body["Data"]["version"], 1);
        assert_eq!(body["Data"]["value"]["items"][0], 1);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let router = router(&controller());
        call(&router, json_request("PUT", "/obj/cart", "1")).await;

        let (_, body) = call(&router, json_request("PUT", "/obj/cart?version=1", "2")).await;
        assert_eq!(body["Data"]["version"], 2);

        let (status, body) = call(&router, json_request("PUT", "/obj/cart?version=1", "3")).await;
        assert_eq!(status, 400);
        assert_eq!(body["Code"], errno::VERSION_CONFLICT);

        let (_, body) = call(&router, get("/obj/cart")).await;
        assert_eq!(body["Data"]["value"], 2);
    }

    #[tokio::test]
    async fn test_invalid_version_and_missing_object() {
        let router = router(&controller());

        let (status, body) = call(&router, json_request("PUT", "/obj/a?version=x", "1")).await;
        assert_eq!(status, 400);
        assert_eq!(body["Code"], errno::INVALID_ARGUMENT);

        let (_, body) = call(&router, get("/obj/a")).await;
        assert_eq!(body["Code"], errno::OBJECT_NOT_FOUND);

        let (_, body) = call(&router, json_request("DELETE", "/obj/a", "")).await;
        assert_eq!(body["Code"], errno::OBJECT_NOT_FOUND);
    }
}
