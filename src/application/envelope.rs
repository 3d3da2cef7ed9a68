//! Response Envelope
//!
//! 统一响应结构，所有后端适配器必须输出完全相同的 JSON：
//! - 成功: `{"Code":0,"Messages":"Success","Data":...}`
//! - 分页: 追加 `"CurrPage"` 与 `"TotalPage"`
//! - 错误: `{"Code":n,"Messages":"..."}`（不含 Data）
//!
//! 字段顺序由结构体声明顺序决定，serde_json 按声明顺序输出。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::error::FacadeError;

/// 成功响应的固定消息
pub const SUCCESS_MESSAGE: &str = "Success";

/// 统一 API 响应格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult {
    #[serde(rename = "Code")]
    pub code: i32,
    #[serde(rename = "Messages")]
    pub messages: String,
    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResult {
    /// 成功响应
    pub fn success(data: Value) -> Self {
        Self {
            code: 0,
            messages: SUCCESS_MESSAGE.to_string(),
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

impl From<&CodedError> for ApiResult {
    fn from(err: &CodedError) -> Self {
        Self {
            code: err.code,
            messages: err.message.clone(),
            data: None,
        }
    }
}

/// 分页响应
///
/// 与 [`ApiResult`] 共享前三个字段，随后是 `CurrPage`、`TotalPage`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResultPaged {
    #[serde(rename = "Code")]
    pub code: i32,
    #[serde(rename = "Messages")]
    pub messages: String,
    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(rename = "CurrPage")]
    pub curr_page: u32,
    #[serde(rename = "TotalPage")]
    pub total_page: u32,
}

impl ApiResultPaged {
    /// 分页成功响应
    ///
    /// `curr_page` 必须 >= 1；当 `total_page > 0` 时 `curr_page <= total_page`。
    pub fn success(data: Value, curr_page: u32, total_page: u32) -> Result<Self, FacadeError> {
        validate_page(curr_page, total_page)?;
        Ok(Self {
            code: 0,
            messages: SUCCESS_MESSAGE.to_string(),
            data: Some(data),
            curr_page,
            total_page,
        })
    }
}

fn validate_page(curr_page: u32, total_page: u32) -> Result<(), FacadeError> {
    if curr_page == 0 || (total_page > 0 && curr_page > total_page) {
        return Err(FacadeError::InvalidPage {
            curr_page,
            total_page,
        });
    }
    Ok(())
}

/// 业务错误
///
/// 由业务逻辑创建，只被 `send_error` 消费，永不持久化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedError {
    pub code: i32,
    pub message: String,
}

impl CodedError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 校验 code != 0 的构造方式
    pub fn try_new(code: i32, message: impl Into<String>) -> Result<Self, FacadeError> {
        if code == 0 {
            return Err(FacadeError::Validation(
                "coded error must carry a non-zero code".to_string(),
            ));
        }
        Ok(Self::new(code, message))
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for CodedError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_bytes() {
        let result = ApiResult::success(json!({"id": 7}));
        let body = serde_json::to_string(&result).unwrap();
        assert_eq!(body, r#"{"Code":0,"Messages":"Success","Data":{"id":7}}"#);
    }

    #[test]
    fn test_null_payload_keeps_data_field() {
        let body = serde_json::to_string(&ApiResult::success(Value::Null)).unwrap();
        assert_eq!(body, r#"{"Code":0,"Messages":"Success","Data":null}"#);
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let err = CodedError::new(42, "bad");
        let body = serde_json::to_string(&ApiResult::from(&err)).unwrap();
        assert_eq!(body, r#"{"Code":42,"Messages":"bad"}"#);
    }

    #[test]
    fn test_paged_field_order() {
        let paged = ApiResultPaged::success(json!([1, 2]), 2, 5).unwrap();
        let body = serde_json::to_string(&paged).unwrap();
        assert_eq!(
            body,
            r#"{"Code":0,"Messages":"Success","Data":[1,2],"CurrPage":2,"TotalPage":5}"#
        );
    }

    #[test]
    fn test_paged_rejects_invalid_counters() {
        assert!(ApiResultPaged::success(json!([]), 0, 3).is_err());
        assert!(ApiResultPaged::success(json!([]), 4, 3).is_err());
        // 空结果集：total_page = 0 时允许 curr_page = 1
        assert!(ApiResultPaged::success(json!([]), 1, 0).is_ok());
    }

    #[test]
    fn test_coded_error_requires_non_zero_code() {
        assert!(CodedError::try_new(0, "nope").is_err());
        assert_eq!(CodedError::try_new(7, "x").unwrap().code, 7);
    }
}
