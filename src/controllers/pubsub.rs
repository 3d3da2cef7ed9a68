//! Pub/Sub Controller

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::json;

use crate::application::{
    with_state, App, Context, ContextExt, Controller, HandlerResult, PubSubClient,
};

type PubSub = Arc<dyn PubSubClient>;

/// 发布接口：`POST /pubsub/:topic`，请求体即消息内容
pub struct PubSubController {
    pubsub: PubSub,
}

impl PubSubController {
    pub fn new(pubsub: PubSub) -> Self {
        Self { pubsub }
    }
}

impl Controller for PubSubController {
    fn name(&self) -> &str {
        "pubsub"
    }

    fn register(&self, app: &mut dyn App) {
        app.post("/pubsub/:topic", vec![with_state(self.pubsub.clone(), publish)]);
    }
}

fn publish(ctx: &mut dyn Context, pubsub: PubSub) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let topic = ctx.param_or("topic", "");
        let payload = String::from_utf8_lossy(ctx.body()).into_owned();
        let subscribers = pubsub.publish(&topic, &payload).await?;
        ctx.send_result(json!({ "topic": topic, "subscribers": subscribers }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::{call, router};
    use crate::infrastructure::memory::InMemoryPubSub;
    use axum::body::Body;
    use axum::http::Request;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let pubsub: PubSub = Arc::new(InMemoryPubSub::new());
        let mut subscription = pubsub.subscribe("alerts").await.unwrap();
        let router = router(&PubSubController::new(pubsub));

        let request = Request::builder()
            .method("POST")
            .uri("/pubsub/alerts")
            .body(Body::from("disk full"))
            .unwrap();
        let (status, body) = call(&router, request).await;
        assert_eq!(status, 200);
        assert_eq!(body["Data"]["subscribers"], 1);
        assert_eq!(subscription.recv().await.as_deref(), Some("disk full"));
    }
}
