//! 测试用 App：只记录路由，不监听端口

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::application::error::FacadeError;
use crate::application::ports::{App, Chain, Method, RouteInfo};

pub(crate) struct RecordingApp {
    name: String,
    routes: Vec<(Method, String, Chain)>,
    starts: Arc<AtomicUsize>,
    fail_start: bool,
}

impl RecordingApp {
    pub(crate) fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            routes: Vec::new(),
            starts: Arc::new(AtomicUsize::new(0)),
            fail_start: false,
        }
    }

    /// 与外部共享启动计数
    pub(crate) fn with_start_counter(mut self, starts: Arc<AtomicUsize>) -> Self {
        self.starts = starts;
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail_start = true;
        self
    }
}

#[async_trait]
impl App for RecordingApp {
    fn backend(&self) -> &str {
        &self.name
    }

    fn add_route(&mut self, method: Method, path: &str, chain: Chain) {
        if self
            .routes
            .iter()
            .any(|(m, p, _)| *m == method && p == path)
        {
            return;
        }
        self.routes.push((method, path.to_string(), chain));
    }

    fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|(method, path, chain)| RouteInfo {
                method: *method,
                path: path.clone(),
                handlers: chain.handler_count(),
            })
            .collect()
    }

    async fn start(self: Box<Self>) -> Result<(), FacadeError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(FacadeError::Serve("listener refused".to_string()));
        }
        Ok(())
    }
}
