//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 应用配置（后端选择、监听地址）
    #[serde(default)]
    pub app: AppSection,

    /// 跨域配置
    #[serde(default)]
    pub cors: CorsConfig,

    /// 指标配置
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// 密钥查询配置
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// `[app]` 配置段
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    /// 后端名称，启动时用于查找 App 工厂
    #[serde(default = "default_backend")]
    pub backend: String,

    /// HTTP 监听配置
    #[serde(default)]
    pub http: HttpConfig,

    /// 上传文件保存目录
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

fn default_backend() -> String {
    "axum".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("data/uploads")
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            http: HttpConfig::default(),
            upload_dir: default_upload_dir(),
        }
    }
}

/// `[app.http]` 配置段
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// 监听地址
    #[serde(default = "default_address")]
    pub address: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 临时文件目录，未设置时使用系统临时目录
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// 请求体大小上限（字节）
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    50 * 1024 * 1024 // 50 MB
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            temp_dir: None,
            body_limit: default_body_limit(),
        }
    }
}

impl HttpConfig {
    /// 获取监听地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// 实际使用的临时目录
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// 跨域配置
///
/// 缺省为全放开策略。
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allow_origins")]
    pub allow_origins: Vec<String>,

    #[serde(default = "default_allow_methods")]
    pub allow_methods: Vec<String>,

    #[serde(default = "default_allow_headers")]
    pub allow_headers: Vec<String>,

    #[serde(default = "default_allow_credentials")]
    pub allow_credentials: bool,

    /// 预检结果缓存时间（秒），0 表示不发送
    #[serde(default)]
    pub max_age_secs: u64,
}

fn default_allow_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_allow_methods() -> Vec<String> {
    ["GET", "POST", "HEAD", "PUT", "DELETE", "PATCH", "OPTIONS"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_allow_headers() -> Vec<String> {
    [
        "Origin",
        "Content-Type",
        "Accept",
        "Content-Length",
        "Accept-Language",
        "Accept-Encoding",
        "Connection",
        "Access-Control-Allow-Origin",
        "Authorization",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect()
}

fn default_allow_credentials() -> bool {
    true
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: default_allow_origins(),
            allow_methods: default_allow_methods(),
            allow_headers: default_allow_headers(),
            allow_credentials: default_allow_credentials(),
            max_age_secs: 0,
        }
    }
}

/// 指标配置
///
/// 指标端点固定为 `/metrics`，始终开启。
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// 指标名前缀
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "service".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

/// 密钥查询配置
#[derive(Debug, Clone, Deserialize)]
pub struct SecretsConfig {
    /// 密钥对应环境变量的前缀
    #[serde(default = "default_secret_prefix")]
    pub env_prefix: String,
}

fn default_secret_prefix() -> String {
    "APP_SECRET_".to_string()
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            env_prefix: default_secret_prefix(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
