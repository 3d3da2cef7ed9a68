//! Bootstrap - 启动流程编排
//!
//! 状态机：
//!
//! ```text
//! Uninitialized -> BackendSelected -> AppCreated -> RoutesRegistered -> Running -> Terminated
//! ```
//!
//! - 读取配置中的后端名称
//! - 通过 Creator Registry 创建 App（找不到后端时启动失败，不存在可用的缺省后端）
//! - 通过 Controller Registry 注册全部路由
//! - 调用 `App::start`，阻塞直到进程终止或传输层致命错误
//!
//! 不提供请求排空屏障，终止时在途请求按尽力而为处理。

use std::fmt;

use super::error::FacadeError;
use super::ports::{App, RouteInfo};
use super::registry::{AppCreators, Controllers};
use crate::config::AppConfig;

/// 启动生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    BackendSelected,
    AppCreated,
    RoutesRegistered,
    Running,
    Terminated,
}

impl Lifecycle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::BackendSelected => "backend_selected",
            Self::AppCreated => "app_created",
            Self::RoutesRegistered => "routes_registered",
            Self::Running => "running",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 启动器
pub struct Bootstrap {
    configured_backend: String,
    creators: AppCreators,
    controllers: Controllers,
    state: Lifecycle,
    backend: Option<String>,
    app: Option<Box<dyn App>>,
}

impl Bootstrap {
    pub fn new(
        backend: impl Into<String>,
        creators: AppCreators,
        controllers: Controllers,
    ) -> Self {
        Self {
            configured_backend: backend.into(),
            creators,
            controllers,
            state: Lifecycle::Uninitialized,
            backend: None,
            app: None,
        }
    }

    /// 从配置中读取后端名称（`app.backend`）
    pub fn from_config(
        config: &AppConfig,
        creators: AppCreators,
        controllers: Controllers,
    ) -> Self {
        Self::new(config.app.backend.clone(), creators, controllers)
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// 已选择的后端名称
    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref()
    }

    /// 已注册的路由（App 创建之后、启动之前可用）
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.app.as_ref().map(|app| app.routes()).unwrap_or_default()
    }

    fn transition(&mut self, expected: Lifecycle, next: Lifecycle) -> Result<(), FacadeError> {
        if self.state != expected {
            return Err(FacadeError::InvalidLifecycle {
                from: self.state.as_str(),
                to: next.as_str(),
            });
        }
        tracing::debug!(from = %self.state, to = %next, "Lifecycle transition");
        self.state = next;
        Ok(())
    }

    /// Uninitialized -> BackendSelected
    pub fn select_backend(&mut self) -> Result<&str, FacadeError> {
        if self.state == Lifecycle::Uninitialized && self.configured_backend.trim().is_empty() {
            return Err(FacadeError::Config("backend name is empty".to_string()));
        }
        self.transition(Lifecycle::Uninitialized, Lifecycle::BackendSelected)?;
        let name = self.configured_backend.trim().to_string();
        tracing::info!(backend = %name, "Backend selected");
        Ok(self.backend.insert(name).as_str())
    }

    /// BackendSelected -> AppCreated
    ///
    /// 查找失败时状态保持不变，不产生任何 App。
    pub fn create_app(&mut self) -> Result<(), FacadeError> {
        if self.state != Lifecycle::BackendSelected {
            return self.transition(Lifecycle::BackendSelected, Lifecycle::AppCreated);
        }
        let name = self.backend.clone().unwrap_or_default();
        let app = self.creators.create(&name).map_err(|e| {
            tracing::error!(
                backend = %name,
                available = ?self.creators.names(),
                "Backend not found"
            );
            e
        })?;
        self.app = Some(app);
        self.transition(Lifecycle::BackendSelected, Lifecycle::AppCreated)
    }

    /// AppCreated -> RoutesRegistered
    pub fn register_routes(&mut self) -> Result<(), FacadeError> {
        self.transition(Lifecycle::AppCreated, Lifecycle::RoutesRegistered)?;
        if let Some(app) = self.app.as_deref_mut() {
            self.controllers.register_all(app);
            tracing::info!(
                controllers = self.controllers.len(),
                routes = app.routes().len(),
                "Routes registered"
            );
        }
        Ok(())
    }

    /// RoutesRegistered -> Running -> Terminated
    ///
    /// App 被消费，返回后状态为 Terminated。
    pub async fn run(&mut self) -> Result<(), FacadeError> {
        self.transition(Lifecycle::RoutesRegistered, Lifecycle::Running)?;
        let app = self
            .app
            .take()
            .ok_or_else(|| FacadeError::Config("no app to start".to_string()))?;

        tracing::info!(backend = app.backend(), "Starting app");
        let result = app.start().await;
        self.state = Lifecycle::Terminated;

        match &result {
            Ok(()) => tracing::info!("App terminated"),
            Err(e) => tracing::error!(error = %e, "App terminated with error"),
        }
        result
    }

    /// 依次执行全部阶段
    pub async fn launch(mut self) -> Result<(), FacadeError> {
        self.select_backend()?;
        self.create_app()?;
        self.register_routes()?;
        self.run().await
    }
}
