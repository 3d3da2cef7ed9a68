//! 应用层错误定义
//!
//! 统一的 facade 错误类型，覆盖配置、请求绑定、业务、传输四类错误

use thiserror::Error;

use super::envelope::CodedError;
use super::ports::ClientError;

/// 错误码定义（写入信封的 `Code` 字段）
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const INTERNAL_ERROR: i32 = 500;
}

/// Facade 错误
#[derive(Debug, Error)]
pub enum FacadeError {
    /// 后端名称未注册
    #[error("backend not found: {name} (registered: {})", .available.join(", "))]
    BackendNotFound { name: String, available: Vec<String> },

    /// 生命周期状态迁移非法
    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidLifecycle {
        from: &'static str,
        to: &'static str,
    },

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 请求体解码失败
    #[error("Decode error: {0}")]
    Decode(String),

    /// 未上传对应字段的文件
    #[error("no file uploaded under form field `{0}`")]
    MissingFile(String),

    /// multipart 表单解析失败
    #[error("Malformed form: {0}")]
    MalformedForm(String),

    /// 非法的 header 名称或值
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// 分页计数违反约束
    #[error("invalid page counters: curr_page={curr_page}, total_page={total_page}")]
    InvalidPage { curr_page: u32, total_page: u32 },

    /// 验证错误
    #[error("Validation error: {0}")]
    Validation(String),

    /// 业务错误
    #[error(transparent)]
    Coded(#[from] CodedError),

    /// 外部服务错误
    #[error("Service error: {0}")]
    Service(#[from] ClientError),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 监听/服务失败
    #[error("Serve error: {0}")]
    Serve(String),

    /// 同一请求上重复调用终结操作
    #[error("response already sent")]
    AlreadySent,
}

impl FacadeError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// 创建业务错误
    pub fn coded(code: i32, message: impl Into<String>) -> Self {
        Self::Coded(CodedError::new(code, message))
    }

    /// 是否属于调用方错误（映射为 4xx）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Decode(_)
                | Self::MissingFile(_)
                | Self::MalformedForm(_)
                | Self::InvalidHeader(_)
                | Self::InvalidPage { .. }
                | Self::Validation(_)
                | Self::Coded(_)
        )
    }

    /// HTTP 状态码
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }

    /// 信封中的 `Code`
    pub fn envelope_code(&self) -> i32 {
        match self {
            Self::Coded(err) => err.code,
            _ if self.is_client_error() => errno::BAD_REQUEST,
            _ => errno::INTERNAL_ERROR,
        }
    }

    /// 转换为可发送的业务错误
    pub fn to_coded(&self) -> CodedError {
        match self {
            Self::Coded(err) => err.clone(),
            other => CodedError::new(other.envelope_code(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coded_error_keeps_its_code() {
        let err: FacadeError = CodedError::new(42, "bad").into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.envelope_code(), 42);
        assert_eq!(err.to_coded(), CodedError::new(42, "bad"));
        assert_eq!(err.to_string(), "[42] bad");
    }

    #[test]
    fn test_binding_errors_are_client_errors() {
        assert_eq!(FacadeError::Decode("x".into()).status_code(), 400);
        assert_eq!(FacadeError::MissingFile("avatar".into()).envelope_code(), 400);
    }

    #[test]
    fn test_transport_errors_are_server_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = FacadeError::from(io);
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.envelope_code(), errno::INTERNAL_ERROR);
    }

    #[test]
    fn test_backend_not_found_lists_registered_names() {
        let err = FacadeError::BackendNotFound {
            name: "fibre".into(),
            available: vec!["axum".into(), "mock".into()],
        };
        assert_eq!(
            err.to_string(),
            "backend not found: fibre (registered: axum, mock)"
        );
    }
}
