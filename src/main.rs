//! Portico - 后端无关的 HTTP 应用 facade
//!
//! 组合根：加载配置 → 初始化日志 → 注册后端与控制器 → 启动

use portico::application::{AppCreators, Bootstrap};
use portico::config::{load_config, print_config, LogConfig};
use portico::controllers::default_controllers;
use portico::infrastructure::{in_memory_services, register_axum};

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},portico={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Portico - HTTP application facade");
    print_config(&config);

    // 外部协作者（内存实现）
    let services = in_memory_services(&config.secrets.env_prefix);

    // 后端工厂
    let mut creators = AppCreators::new();
    register_axum(&mut creators, &config);

    // 控制器
    let controllers = default_controllers(&config, &services)
        .map_err(|e| anyhow::anyhow!("Failed to build controllers: {}", e))?;

    Bootstrap::from_config(&config, creators, controllers)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Startup aborted: {}", e))?;

    Ok(())
}
