//! Controller Registry - 有序的控制器集合
//!
//! 控制器只负责一件事：把自己的路由注册到给定的 App 上。
//! 注册顺序即插入顺序，部分控制器依赖更具体的路由先于兜底路由注册。

use crate::application::ports::App;

/// 控制器
pub trait Controller: Send + Sync {
    /// 日志中使用的名称
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 在 App 上注册路由
    fn register(&self, app: &mut dyn App);
}

impl<F> Controller for F
where
    F: Fn(&mut dyn App) + Send + Sync,
{
    fn register(&self, app: &mut dyn App) {
        self(app)
    }
}

/// 控制器注册表
#[derive(Default)]
pub struct Controllers {
    controllers: Vec<Box<dyn Controller>>,
}

impl Controllers {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加控制器，不做重复检测
    pub fn add<C: Controller + 'static>(&mut self, controller: C) -> &mut Self {
        self.controllers.push(Box::new(controller));
        self
    }

    /// 按插入顺序让每个控制器注册路由
    pub fn register_all(&self, app: &mut dyn App) {
        for controller in &self.controllers {
            let before = app.routes().len();
            controller.register(app);
            tracing::info!(
                controller = controller.name(),
                routes = app.routes().len().saturating_sub(before),
                backend = app.backend(),
                "Controller registered"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
