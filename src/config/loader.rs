//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（portico.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["portico", "portico.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `PORTICO_`，层级分隔符 `__`）
/// 2. 配置文件（portico.toml 或 portico.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `PORTICO_APP__BACKEND=axum`
/// - `PORTICO_APP__HTTP__ADDRESS=127.0.0.1`
/// - `PORTICO_APP__HTTP__PORT=9000`
/// - `PORTICO_LOG__LEVEL=debug`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("app.backend", "axum")?
        .set_default("app.upload_dir", "data/uploads")?
        .set_default("app.http.address", "0.0.0.0")?
        .set_default("app.http.port", 8080)?
        .set_default("app.http.body_limit", 50 * 1024 * 1024)?
        .set_default("metrics.namespace", "service")?
        .set_default("secrets.env_prefix", "APP_SECRET_")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: PORTICO_APP__HTTP__PORT=9000
    builder = builder.add_source(
        Environment::with_prefix("PORTICO")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.app.backend.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Backend name cannot be empty".to_string(),
        ));
    }

    if config.app.http.address.is_empty() {
        return Err(ConfigError::ValidationError(
            "HTTP address cannot be empty".to_string(),
        ));
    }

    if config.app.http.port == 0 {
        return Err(ConfigError::ValidationError(
            "HTTP port cannot be 0".to_string(),
        ));
    }

    if config.app.http.body_limit == 0 {
        return Err(ConfigError::ValidationError(
            "Body limit cannot be 0".to_string(),
        ));
    }

    if config.cors.allow_credentials {
        let wildcard = |values: &[String]| values.iter().any(|v| v.trim() == "*");
        if wildcard(&config.cors.allow_methods) || wildcard(&config.cors.allow_headers) {
            return Err(ConfigError::ValidationError(
                "CORS methods and headers cannot be `*` when credentials are allowed".to_string(),
            ));
        }
    }

    if config.metrics.namespace.is_empty() {
        return Err(ConfigError::ValidationError(
            "Metrics namespace cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Backend: {}", config.app.backend);
    tracing::info!("HTTP: {}", config.app.http.addr());
    tracing::info!("Body Limit: {} bytes", config.app.http.body_limit);
    tracing::info!("Temp Directory: {:?}", config.app.http.temp_dir());
    tracing::info!("Upload Directory: {:?}", config.app.upload_dir);
    tracing::info!("CORS Origins: {}", config.cors.allow_origins.join(","));
    tracing::info!("Metrics Namespace: {}", config.metrics.namespace);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.app.http.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_backend() {
        let mut config = AppConfig::default();
        config.app.backend = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_address() {
        let mut config = AppConfig::default();
        config.app.http.address = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_wildcard_cors_headers_with_credentials() {
        let mut config = AppConfig::default();
        config.cors.allow_headers = vec!["*".to_string()];
        assert!(validate_config(&config).is_err());

        config.cors.allow_credentials = false;
        assert!(validate_config(&config).is_ok());

        config.cors.allow_credentials = true;
        config.cors.allow_headers = vec!["Authorization".to_string()];
        config.cors.allow_methods = vec![" * ".to_string()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[app]
backend = "mock"

[app.http]
address = "127.0.0.1"
port = 9100

[cors]
allow_origins = ["https://example.com"]
allow_credentials = false
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.app.backend, "mock");
        assert_eq!(config.app.http.addr(), "127.0.0.1:9100");
        assert_eq!(config.cors.allow_origins, vec!["https://example.com"]);
        assert!(!config.cors.allow_credentials);
        // 未覆盖的字段保持默认
        assert_eq!(config.log.level, "info");
    }
}
