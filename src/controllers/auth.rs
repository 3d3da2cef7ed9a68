//! Auth Controller
//!
//! 令牌签发、身份查询与注销。
//!
//! [`require_token`] 是可复用的处理链中间级：校验 `Authorization: Bearer <token>`，
//! 成功后把 subject 与 token 写入副通道并继续执行处理链，失败时直接返回错误信封。

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;

use super::errno;
use crate::application::{
    handler, with_state, App, ClientError, CodedError, Context, ContextExt, Controller,
    HandlerResult, TokenService,
};

/// 副通道中的 subject
pub const SUBJECT_KEY: &str = "auth.subject";

/// 副通道中的 token
pub const TOKEN_KEY: &str = "auth.token";

type Tokens = Arc<dyn TokenService>;

/// 鉴权接口
pub struct AuthController {
    tokens: Tokens,
    ttl: Duration,
}

impl AuthController {
    pub fn new(tokens: Tokens, ttl: Duration) -> Self {
        Self { tokens, ttl }
    }
}

impl Controller for AuthController {
    fn name(&self) -> &str {
        "auth"
    }

    fn register(&self, app: &mut dyn App) {
        app.post(
            "/auth/token",
            vec![with_state((self.tokens.clone(), self.ttl), issue_token)],
        );
        app.get(
            "/auth/whoami",
            vec![
                with_state(self.tokens.clone(), require_token),
                handler(whoami),
            ],
        );
        app.delete(
            "/auth/token",
            vec![
                with_state(self.tokens.clone(), require_token),
                with_state(self.tokens.clone(), revoke_token),
            ],
        );
    }
}

fn bearer(ctx: &dyn Context) -> Option<String> {
    let value = ctx.get_header("authorization")?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn unauthorized(message: &str) -> CodedError {
    CodedError::new(errno::UNAUTHORIZED, message)
}

/// 令牌校验中间级
pub fn require_token(ctx: &mut dyn Context, tokens: Tokens) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let Some(token) = bearer(ctx) else {
            return ctx.send_error(&unauthorized("missing bearer token"));
        };

        match tokens.validate(&token).await {
            Ok(subject) => {
                ctx.set(SUBJECT_KEY, &subject);
                ctx.set(TOKEN_KEY, &token);
                ctx.next().await
            }
            Err(ClientError::InvalidToken) => ctx.send_error(&unauthorized("invalid token")),
            Err(ClientError::Expired(_)) => ctx.send_error(&unauthorized("token expired")),
            Err(e) => Err(e.into()),
        }
    })
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    subject: String,
}

fn issue_token(ctx: &mut dyn Context, state: (Tokens, Duration)) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let (tokens, ttl) = state;
        let request: TokenRequest = ctx.bind()?;
        let subject = request.subject.trim();
        if subject.is_empty() {
            return ctx.send_error(&CodedError::new(
                errno::INVALID_ARGUMENT,
                "subject is required",
            ));
        }

        let token = tokens.issue(subject, ttl).await?;
        ctx.send_result(json!({
            "token": token,
            "subject": subject,
            "expires_in": ttl.as_secs(),
        }))
    })
}

fn whoami(ctx: &mut dyn Context) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let subject = ctx.get(SUBJECT_KEY).to_string();
        ctx.send_result(json!({ "subject": subject }))
    })
}

fn revoke_token(ctx: &mut dyn Context, tokens: Tokens) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let token = ctx.get(TOKEN_KEY).to_string();
        tokens.revoke(&token).await?;
        ctx.send_result(json!({ "revoked": true }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::{call, get, json as json_request, router};
    use crate::infrastructure::memory::InMemoryTokenService;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;

    fn setup() -> Router {
        let tokens: Tokens = Arc::new(InMemoryTokenService::new());
        router(&AuthController::new(tokens, Duration::from_secs(60)))
    }

    fn with_bearer(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    async fn issue(router: &Router, subject: &str) -> String {
        let body = format!(r#"{{"subject":"{}"}}"#, subject);
        let (status, body) = call(router, json_request("POST", "/auth/token", &body)).await;
        assert_eq!(status, 200);
        assert_eq!(body["Data"]["expires_in"], 60);
        body["Data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_whoami_reads_subject_from_side_channel() {
        let router = setup();
        let token = issue(&router, "alice").await;

        let (status, body) = call(&router, with_bearer("GET", "/auth/whoami", &token)).await;
        assert_eq!(status, 200);
        assert_eq!(body["Data"]["subject"], "alice");
    }

    #[tokio::test]
    async fn test_missing_or_bad_token_short_circuits() {
        let router = setup();

        let (status, body) = call(&router, get("/auth/whoami")).await;
        assert_eq!(status, 400);
        assert_eq!(body["Code"], errno::UNAUTHORIZED);
        assert_eq!(body["Messages"], "missing bearer token");

        let (_, body) = call(&router, with_bearer("GET", "/auth/whoami", "forged")).await;
        assert_eq!(body["Messages"], "invalid token");
    }

    #[tokio::test]
    async fn test_revoked_token_is_rejected() {
        let router = setup();
        let token = issue(&router, "bob").await;

        let (status, body) = call(&router, with_bearer("DELETE", "/auth/token", &token)).await;
        assert_eq!(status, 200);
        assert_eq!(body["Data"]["revoked"], true);

        let (_, body) = call(&router, with_bearer("GET", "/auth/whoami", &token)).await;
        assert_eq!(body["Code"], errno::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_blank_subject_is_rejected() {
        let router = setup();
        let request = json_request("POST", "/auth/token", r#"{"subject":"  "}"#);
        let (status, body) = call(&router, request).await;
        assert_eq!(status, 400);
        assert_eq!(body["Code"], errno::INVALID_ARGUMENT);
    }
}
