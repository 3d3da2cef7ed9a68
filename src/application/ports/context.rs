//! Context Port - 请求上下文能力接口
//!
//! 每个请求一个 Context，生命周期等于一次请求，不跨请求共享。
//! 具体实现由后端适配器提供（见 infrastructure/http）。
//!
//! 终结操作（`send_*`）每个请求只应调用一次：首次写入生效，
//! 之后的调用返回 [`FacadeError::AlreadySent`]，已暂存的响应保持不变。

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::path::Path;

use super::handler::HandlerResult;
use crate::application::envelope::CodedError;
use crate::application::error::FacadeError;

/// 上传的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// 请求上下文
///
/// 副通道（`set` / `get`）是非结构化的、按请求隔离的字符串映射，
/// 用于同一条处理链上的处理函数之间传递数据，例如鉴权中间件写入用户身份。
/// 它不是 header，不会持久化，也不会传播到本次请求之外。
#[async_trait]
pub trait Context: Send {
    /// 请求方法（大写）
    fn method(&self) -> &str;

    /// 请求路径
    fn path(&self) -> &str;

    /// 设置响应状态码，不会立即发送
    fn status(&mut self, code: u16) -> &mut dyn Context;

    /// 原始请求体
    fn body(&self) -> &[u8];

    /// 路径参数
    fn param(&self, key: &str) -> Option<&str>;

    /// 查询参数
    fn query(&self, key: &str) -> Option<&str>;

    /// 表单字段（urlencoded 或 multipart 文本字段）
    fn form_value(&self, key: &str) -> Option<&str>;

    /// 全部表单字段，按出现顺序
    fn form_fields(&self) -> &[(String, String)];

    /// 上传的文件
    fn form_file(&self, key: &str) -> Result<&UploadedFile, FacadeError>;

    /// 将上传的文件保存到 `path`，覆盖已有文件
    async fn save_file(&mut self, key: &str, path: &Path) -> HandlerResult;

    /// 设置响应 header
    fn set_header(&mut self, key: &str, value: &str) -> HandlerResult;

    /// 读取请求 header
    fn get_header(&self, key: &str) -> Option<&str>;

    /// 写入副通道
    fn set(&mut self, key: &str, value: &str);

    /// 读取副通道，未写入的 key 返回空字符串
    fn get(&self, key: &str) -> &str;

    fn send_string(&mut self, data: String) -> HandlerResult;

    /// `{"Code":0,"Messages":"Success","Data":data}`
    fn send_result(&mut self, data: Value) -> HandlerResult;

    /// 分页成功响应
    fn send_paged(&mut self, data: Value, curr_page: u32, total_page: u32) -> HandlerResult;

    /// 错误信封，状态码 400
    fn send_error(&mut self, err: &CodedError) -> HandlerResult;

    fn send_json(&mut self, data: Value) -> HandlerResult;

    /// 发送磁盘文件，`name` 非空时作为下载文件名
    async fn send_file(&mut self, path: &Path, name: &str) -> HandlerResult;

    /// 发送内存数据：写入临时文件后发送，返回时临时文件已删除
    async fn send_file_bytes(&mut self, data: &[u8], name: &str) -> HandlerResult;

    /// 执行处理链的下一级
    async fn next(&mut self) -> HandlerResult;

    /// 是否已调用过终结操作
    fn is_sent(&self) -> bool;

    /// 访问后端原生上下文
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Context 的泛型便捷方法
pub trait ContextExt: Context {
    /// 路径参数，仅在缺失时返回默认值
    fn param_or(&self, key: &str, default: &str) -> String {
        self.param(key).unwrap_or(default).to_string()
    }

    fn query_or(&self, key: &str, default: &str) -> String {
        self.query(key).unwrap_or(default).to_string()
    }

    fn form_value_or(&self, key: &str, default: &str) -> String {
        self.form_value(key).unwrap_or(default).to_string()
    }

    /// 按 Content-Type 反序列化请求体
    ///
    /// - 缺省或 `application/json`：JSON
    /// - `application/x-www-form-urlencoded` / `multipart/form-data`：表单字段
    fn bind<T: DeserializeOwned>(&self) -> Result<T, FacadeError> {
        let content_type = self.get_header("content-type").unwrap_or("");
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "" | "application/json" => serde_json::from_slice(self.body())
                .map_err(|e| FacadeError::Decode(format!("invalid JSON body: {}", e))),
            "application/x-www-form-urlencoded" | "multipart/form-data" => {
                let encoded = serde_urlencoded::to_string(self.form_fields())
                    .map_err(|e| FacadeError::Decode(e.to_string()))?;
                serde_urlencoded::from_str(&encoded)
                    .map_err(|e| FacadeError::Decode(format!("invalid form body: {}", e)))
            }
            other if other.ends_with("+json") => serde_json::from_slice(self.body())
                .map_err(|e| FacadeError::Decode(format!("invalid JSON body: {}", e))),
            other => Err(FacadeError::Decode(format!(
                "unsupported content type: {}",
                other
            ))),
        }
    }

    fn send_result_of<T: Serialize>(&mut self, data: &T) -> HandlerResult {
        let value = to_value(data)?;
        self.send_result(value)
    }

    fn send_paged_of<T: Serialize>(
        &mut self,
        data: &T,
        curr_page: u32,
        total_page: u32,
    ) -> HandlerResult {
        let value = to_value(data)?;
        self.send_paged(value, curr_page, total_page)
    }

    fn send_json_of<T: Serialize>(&mut self, data: &T) -> HandlerResult {
        let value = to_value(data)?;
        self.send_json(value)
    }
}

impl<C: Context + ?Sized> ContextExt for C {}

fn to_value<T: Serialize>(data: &T) -> Result<Value, FacadeError> {
    serde_json::to_value(data)
        .map_err(|e| FacadeError::Validation(format!("payload is not serializable: {}", e)))
}
