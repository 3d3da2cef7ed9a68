//! Secret Controller
//!
//! 只报告密钥是否存在，从不回显密钥内容

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::json;

use crate::application::{
    with_state, App, ClientError, Context, ContextExt, Controller, HandlerResult, SecretStore,
};

type Secrets = Arc<dyn SecretStore>;

pub struct SecretController {
    secrets: Secrets,
}

impl SecretController {
    pub fn new(secrets: Secrets) -> Self {
        Self { secrets }
    }
}

impl Controller for SecretController {
    fn name(&self) -> &str {
        "secret"
    }

    fn register(&self, app: &mut dyn App) {
        app.get("/secret/:key", vec![with_state(self.secrets.clone(), presence)]);
    }
}

fn presence(ctx: &mut dyn Context, secrets: Secrets) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let key = ctx.param_or("key", "");
        let present = match secrets.secret(&key).await {
            Ok(_) => true,
            Err(ClientError::NotFound(_)) => false,
            Err(e) => return Err(e.into()),
        };
        ctx.send_result(json!({ "key": key, "present": present }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::{call, get, router};
    use crate::infrastructure::secret::EnvSecretStore;

    #[tokio::test]
    async fn test_presence_without_value() {
        std::env::set_var("PORTICO_SECRET_CTRL_TEST_DB_PASSWORD", "hunter2");
        let store = Arc::new(EnvSecretStore::new("PORTICO_SECRET_CTRL_TEST_"));
        let router = router(&SecretController::new(store));

        let (status, body) = call(&router, get("/secret/db.password")).await;
        assert_eq!(status, 200);
        assert_eq!(body["Data"]["present"], true);
        assert!(!body.to_string().contains("hunter2"));

        let (_, body) = call(&router, get("/secret/missing")).await;
        assert_eq!(body["Data"]["present"], false);
    }
}
