//! Axum App
//!
//! [`App`] 的 axum 实现：收集路由，启动时构建 Router 并监听。
//!
//! 每个路由注册为一个 axum 端点，端点把请求缓冲为 [`AxumContext`]
//! 后从第一级（preflight）开始执行处理链。

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, Path, Request},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{on, MethodFilter, MethodRouter},
    Json, Router,
};
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::context::AxumContext;
use super::cors::build_cors_layer;
use super::metrics::{HttpMetrics, METRICS_PATH};
use super::middleware::{error_logging_middleware, track_metrics};
use crate::application::ports::{App, Chain, Method, RouteInfo};
use crate::application::{errno, ApiResult, AppCreators, CodedError, FacadeError};
use crate::config::{AppConfig, CorsConfig, HttpConfig};

/// axum 后端的注册名
pub const AXUM_BACKEND: &str = "axum";

struct RouteEntry {
    method: Method,
    path: String,
    chain: Chain,
}

/// axum 后端
pub struct AxumApp {
    http: HttpConfig,
    cors: CorsConfig,
    metrics: Arc<HttpMetrics>,
    routes: Vec<RouteEntry>,
}

impl AxumApp {
    pub fn new(http: HttpConfig, cors: CorsConfig, namespace: impl Into<String>) -> Self {
        Self {
            http,
            cors,
            metrics: Arc::new(HttpMetrics::new(namespace)),
            routes: Vec::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.app.http.clone(),
            config.cors.clone(),
            config.metrics.namespace.clone(),
        )
    }

    pub fn metrics(&self) -> Arc<HttpMetrics> {
        self.metrics.clone()
    }

    /// 构建 Router
    ///
    /// 同一路径的多个方法合并为一个 MethodRouter；`/metrics` 为内置端点。
    pub fn into_router(self) -> Router {
        let temp_dir = self.http.temp_dir();
        let mut groups: BTreeMap<String, MethodRouter> = BTreeMap::new();

        for entry in self.routes {
            let endpoint = chain_endpoint(entry.chain, temp_dir.clone());
            let filter = method_filter(entry.method);
            let grouped = match groups.remove(&entry.path) {
                Some(existing) => existing.on(filter, endpoint),
                None => on(filter, endpoint),
            };
            groups.insert(entry.path, grouped);
        }

        let metrics = self.metrics.clone();
        let metrics_endpoint = move || {
            let metrics = metrics.clone();
            async move {
                (
                    [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                    metrics.render(),
                )
            }
        };
        let grouped = match groups.remove(METRICS_PATH) {
            Some(existing) => existing.on(MethodFilter::GET, metrics_endpoint),
            None => on(MethodFilter::GET, metrics_endpoint),
        };
        groups.insert(METRICS_PATH.to_string(), grouped);

        let mut router = Router::new();
        for (path, method_router) in groups {
            router = router.route(&path, method_router);
        }

        // 请求体大小限制同时作用于缓冲的 body 与 multipart 表单
        router
            .fallback(not_found)
            .layer(DefaultBodyLimit::max(self.http.body_limit))
            .layer(middleware::from_fn_with_state(
                self.metrics.clone(),
                track_metrics,
            ))
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(build_cors_layer(&self.cors))
    }

    /// 在给定的 listener 上服务，直到 `shutdown` 完成
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), FacadeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.into_router();
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| FacadeError::Serve(e.to_string()))
    }
}

#[async_trait]
impl App for AxumApp {
    fn backend(&self) -> &str {
        AXUM_BACKEND
    }

    fn add_route(&mut self, method: Method, path: &str, chain: Chain) {
        if method == Method::Get && path == METRICS_PATH {
            tracing::warn!(
                path = %path,
                "Route shadowed by the built-in metrics endpoint, ignoring"
            );
            return;
        }
        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.path == path)
        {
            tracing::warn!(
                method = %method,
                path = %path,
                "Duplicate route, keeping the first registration"
            );
            return;
        }

        tracing::debug!(
            method = %method,
            path = %path,
            handlers = chain.handler_count(),
            "Route added"
        );
        self.routes.push(RouteEntry {
            method,
            path: path.to_string(),
            chain,
        });
    }

    fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|r| RouteInfo {
                method: r.method,
                path: r.path.clone(),
                handlers: r.chain.handler_count(),
            })
            .collect()
    }

    async fn start(self: Box<Self>) -> Result<(), FacadeError> {
        let addr = self.http.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| FacadeError::Serve(format!("failed to bind {}: {}", addr, e)))?;

        info!(
            addr = %addr,
            routes = self.routes.len(),
            "Starting HTTP server (with graceful shutdown)"
        );
        self.serve(listener, shutdown_signal()).await?;
        info!("Server shutdown complete");

        Ok(())
    }
}

/// 向注册表登记 axum 后端
pub fn register_axum(creators: &mut AppCreators, config: &AppConfig) {
    let config = config.clone();
    creators.register(AXUM_BACKEND, move || {
        Box::new(AxumApp::from_config(&config)) as Box<dyn App>
    });
}

fn method_filter(method: Method) -> MethodFilter {
    match method {
        Method::Get => MethodFilter::GET,
        Method::Post => MethodFilter::POST,
        Method::Put => MethodFilter::PUT,
        Method::Patch => MethodFilter::PATCH,
        Method::Delete => MethodFilter::DELETE,
    }
}

fn chain_endpoint(
    chain: Chain,
    temp_dir: PathBuf,
) -> impl Fn(Option<Path<HashMap<String, String>>>, Request) -> BoxFuture<'static, Response>
       + Clone
       + Send
       + Sync
       + 'static {
    move |params, request| {
        let chain = chain.clone();
        let temp_dir = temp_dir.clone();
        let params = params.map(|Path(p)| p).unwrap_or_default();
        Box::pin(async move {
            match AxumContext::from_request(request, params, chain, temp_dir).await {
                Ok(ctx) => ctx.run().await,
                Err(rejection) => rejection,
            }
        })
    }
}

async fn not_found(request: Request) -> Response {
    let path = request.uri().path();
    let err = CodedError::new(errno::NOT_FOUND, format!("route not found: {}", path));
    (StatusCode::NOT_FOUND, Json(ApiResult::from(&err))).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
