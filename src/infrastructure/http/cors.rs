//! CORS Layer
//!
//! 全局跨域策略，作为所有路由的外层中间件。
//!
//! 浏览器不接受 `Access-Control-Allow-Origin: *` 与 credentials 同时出现，
//! tower-http 也会拒绝这种组合；因此 origins 含 `*` 且允许 credentials 时，
//! 回显请求的 Origin，效果等同于放开所有来源。

use std::time::Duration;

use http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

/// 根据配置构建 CORS 层
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let wildcard = is_wildcard(&config.allow_origins);

    let origin = if wildcard {
        if config.allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::from(Any)
        }
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o.trim()) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let methods = if is_wildcard(&config.allow_methods) && !config.allow_credentials {
        AllowMethods::from(Any)
    } else {
        let methods: Vec<Method> = config
            .allow_methods
            .iter()
            .filter(|m| !skip_wildcard(m, "method"))
            .filter_map(|m| match Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes()) {
                Ok(method) => Some(method),
                Err(_) => {
                    tracing::warn!(method = %m, "Ignoring invalid CORS method");
                    None
                }
            })
            .collect();
        AllowMethods::list(methods)
    };

    let headers = if is_wildcard(&config.allow_headers) && !config.allow_credentials {
        AllowHeaders::from(Any)
    } else {
        let headers: Vec<HeaderName> = config
            .allow_headers
            .iter()
            .filter(|h| !skip_wildcard(h, "header"))
            .filter_map(|h| match HeaderName::from_bytes(h.trim().as_bytes()) {
                Ok(name) => Some(name),
                Err(_) => {
                    tracing::warn!(header = %h, "Ignoring invalid CORS header");
                    None
                }
            })
            .collect();
        AllowHeaders::list(headers)
    };

    let mut layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(config.allow_credentials);

    if config.max_age_secs > 0 {
        layer = layer.max_age(Duration::from_secs(config.max_age_secs));
    }

    layer
}

/// 列表中是否含 `*`
fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v.trim() == "*")
}

/// 允许 credentials 时 `*` 只能作为 origin 使用，其余位置的 `*` 被忽略
fn skip_wildcard(value: &str, kind: &str) -> bool {
    let wildcard = value.trim() == "*";
    if wildcard {
        tracing::warn!(kind = %kind, "Ignoring CORS wildcard together with credentials");
    }
    wildcard
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    fn router(config: &CorsConfig) -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(build_cors_layer(config))
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method("OPTIONS")
            .uri("/ping")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_default_policy_allows_any_origin_with_credentials() {
        let response = router(&CorsConfig::default())
            .oneshot(preflight("https://app.example.com"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains("PATCH"));
        let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed.contains("authorization"));
        assert!(allowed.contains("accept-language"));
    }

    #[tokio::test]
    async fn test_wildcard_without_credentials_sends_star() {
        let config = CorsConfig {
            allow_credentials: false,
            ..CorsConfig::default()
        };
        let request = Request::builder()
            .uri("/ping")
            .header(header::ORIGIN, "https://other.example.com")
            .body(Body::empty())
            .unwrap();

        let response = router(&config).oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_explicit_origin_list() {
        let config = CorsConfig {
            allow_origins: vec!["https://allowed.example.com".to_string()],
            ..CorsConfig::default()
        };

        let response = router(&config)
            .oneshot(preflight("https://evil.example.com"))
            .await
            .unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_wildcard_headers_with_credentials_do_not_panic() {
        let config = CorsConfig {
            allow_methods: vec!["*".to_string(), "GET".to_string()],
            allow_headers: vec!["*".to_string()],
            ..CorsConfig::default()
        };
        let response = router(&config)
            .oneshot(preflight("https://app.example.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
    }

    #[tokio::test]
    async fn test_wildcard_headers_without_credentials_allow_any() {
        let config = CorsConfig {
            allow_methods: vec!["*".to_string()],
            allow_headers: vec!["*".to_string()],
            allow_credentials: false,
            ..CorsConfig::default()
        };
        let response = router(&config)
            .oneshot(preflight("https://app.example.com"))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "*");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
    }
}
