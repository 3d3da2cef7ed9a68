//! Creator Registry - 后端名称到 App 工厂的映射
//!
//! 在组合根（main）中显式构建并传入 Bootstrap，不使用全局可变状态。

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::error::FacadeError;
use crate::application::ports::App;

/// 零参数 App 工厂
pub type AppCreator = Arc<dyn Fn() -> Box<dyn App> + Send + Sync>;

/// 后端工厂注册表
#[derive(Clone, Default)]
pub struct AppCreators {
    creators: HashMap<String, AppCreator>,
}

impl AppCreators {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工厂，同名时后注册的覆盖先注册的
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn App> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.creators.insert(name.clone(), Arc::new(factory)).is_some() {
            tracing::debug!(backend = %name, "App creator overwritten");
        } else {
            tracing::debug!(backend = %name, "App creator registered");
        }
        self
    }

    /// 按名称创建 App
    pub fn create(&self, name: &str) -> Result<Box<dyn App>, FacadeError> {
        let factory = self
            .creators
            .get(name)
            .ok_or_else(|| FacadeError::BackendNotFound {
                name: name.to_string(),
                available: self.names(),
            })?;
        Ok(factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    /// 已注册的名称（排序后）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.creators.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

impl std::fmt::Debug for AppCreators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCreators")
            .field("names", &self.names())
            .finish()
    }
}
