//! Axum Context
//!
//! 单个请求的 [`Context`] 实现：请求在进入处理链之前被完整缓冲
//! （body、路径参数、查询参数、表单字段与上传文件），
//! 响应先暂存，处理链结束后一次性转换为 axum [`Response`]。

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart, Request},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::application::ports::{Chain, ChainCursor, Context, HandlerResult, UploadedFile};
use crate::application::tempfiles::{persist_bytes_async, write_scoped_async};
use crate::application::{ApiResult, ApiResultPaged, CodedError, FacadeError};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// 暂存的响应体
enum StagedBody {
    Empty,
    Bytes(Bytes),
    File { file: File, len: u64 },
}

/// 解析后的请求表单
#[derive(Default)]
struct ParsedForm {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
    error: Option<String>,
}

/// axum 后端的请求上下文
pub struct AxumContext {
    method: String,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    query: Vec<(String, String)>,
    form: ParsedForm,
    data: Option<HashMap<String, String>>,
    status: StatusCode,
    response_headers: HeaderMap,
    response_body: StagedBody,
    sent: bool,
    cursor: ChainCursor,
    temp_dir: PathBuf,
}

impl AxumContext {
    /// 缓冲整个请求并创建上下文
    ///
    /// body 读取受 `DefaultBodyLimit` 约束，超限时直接返回 axum 的拒绝响应。
    pub async fn from_request(
        request: Request,
        params: HashMap<String, String>,
        chain: Chain,
        temp_dir: PathBuf,
    ) -> Result<Self, Response> {
        let method = request.method().as_str().to_string();
        let path = request.uri().path().to_string();
        let query = parse_query(request.uri().query().unwrap_or(""));
        let headers = request.headers().clone();
        let extensions = request.extensions().clone();

        let body = Bytes::from_request(request, &())
            .await
            .map_err(IntoResponse::into_response)?;

        let form = match mime_of(&headers).as_str() {
            "application/x-www-form-urlencoded" => parse_urlencoded(&body),
            "multipart/form-data" => {
                let mut rebuilt = Request::new(Body::from(body.clone()));
                *rebuilt.headers_mut() = headers.clone();
                *rebuilt.extensions_mut() = extensions;
                parse_multipart(rebuilt).await
            }
            _ => ParsedForm::default(),
        };

        if let Some(err) = &form.error {
            tracing::debug!(
                method = %method,
                path = %path,
                error = %err,
                "Failed to parse form body"
            );
        }

        Ok(Self {
            method,
            path,
            headers,
            body,
            params,
            query,
            form,
            data: None,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            response_body: StagedBody::Empty,
            sent: false,
            cursor: ChainCursor::new(chain),
            temp_dir,
        })
    }

    /// 执行整条处理链并生成响应
    pub async fn run(mut self) -> Response {
        let outcome = self.next().await;
        self.finish(outcome)
    }

    /// 请求 header（原生访问）
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 全部路径参数
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// 已暂存的响应状态码
    pub fn response_status(&self) -> StatusCode {
        self.status
    }

    /// 已暂存的响应 header
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// 处理链已经执行到的级数
    pub fn chain_position(&self) -> usize {
        self.cursor.position()
    }

    /// 把处理链的结果转换为响应
    ///
    /// 逃逸的错误只在尚未发送响应时映射为错误信封，已发送的响应保持不变。
    fn finish(self, outcome: HandlerResult) -> Response {
        if let Err(err) = outcome {
            if !self.sent {
                return err.into_response();
            }
            tracing::warn!(
                method = %self.method,
                path = %self.path,
                error = %err,
                "Handler failed after response was sent"
            );
        }

        let mut headers = self.response_headers;
        let body = match self.response_body {
            StagedBody::Empty => Body::empty(),
            StagedBody::Bytes(bytes) => Body::from(bytes),
            StagedBody::File { file, len } => {
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
                Body::from_stream(ReaderStream::new(file))
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        response.headers_mut().extend(headers);
        response
    }

    fn ensure_unsent(&self) -> HandlerResult {
        if self.sent {
            tracing::warn!(method = %self.method, path = %self.path, "Response already sent");
            return Err(FacadeError::AlreadySent);
        }
        Ok(())
    }

    fn default_content_type(&mut self, value: HeaderValue) {
        self.response_headers
            .entry(header::CONTENT_TYPE)
            .or_insert(value);
    }

    fn commit(&mut self, content_type: &'static str, body: Bytes) -> HandlerResult {
        self.ensure_unsent()?;
        self.default_content_type(HeaderValue::from_static(content_type));
        self.response_body = StagedBody::Bytes(body);
        self.sent = true;
        Ok(())
    }

    fn commit_json<T: serde::Serialize>(&mut self, payload: &T) -> HandlerResult {
        self.ensure_unsent()?;
        let bytes = serde_json::to_vec(payload)
            .map_err(|e| FacadeError::validation(format!("payload is not serializable: {}", e)))?;
        self.commit(APPLICATION_JSON, Bytes::from(bytes))
    }

    /// 暂存文件响应；`buffered` 时整个文件读入内存，调用返回后源文件可被删除
    async fn commit_file(&mut self, path: &Path, name: &str, buffered: bool) -> HandlerResult {
        self.ensure_unsent()?;

        let body = if buffered {
            StagedBody::Bytes(Bytes::from(tokio::fs::read(path).await?))
        } else {
            let file = File::open(path).await?;
            let len = file.metadata().await?.len();
            StagedBody::File { file, len }
        };

        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
            self.default_content_type(value);
        }

        if !name.is_empty() {
            let disposition = format!("attachment; filename=\"{}\"", name.replace('"', "\\\""));
            match HeaderValue::from_str(&disposition) {
                Ok(value) => {
                    self.response_headers
                        .insert(header::CONTENT_DISPOSITION, value);
                }
                Err(_) => {
                    tracing::warn!(name = %name, "Download name is not a valid header value");
                }
            }
        }

        self.response_body = body;
        self.sent = true;
        Ok(())
    }
}

#[async_trait]
impl Context for AxumContext {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn status(&mut self, code: u16) -> &mut dyn Context {
        match StatusCode::from_u16(code) {
            Ok(status) => self.status = status,
            Err(_) => tracing::warn!(code = code, "Ignoring invalid status code"),
        }
        self
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    fn query(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    fn form_value(&self, key: &str) -> Option<&str> {
        lookup(&self.form.fields, key)
    }

    fn form_fields(&self) -> &[(String, String)] {
        &self.form.fields
    }

    fn form_file(&self, key: &str) -> Result<&UploadedFile, FacadeError> {
        if let Some(err) = &self.form.error {
            return Err(FacadeError::MalformedForm(err.clone()));
        }
        self.form
            .files
            .iter()
            .find(|f| f.field_name == key)
            .ok_or_else(|| FacadeError::MissingFile(key.to_string()))
    }

    async fn save_file(&mut self, key: &str, path: &Path) -> HandlerResult {
        let file = self.form_file(key)?;
        let size = file.size();
        let data = file.data.clone();
        persist_bytes_async(path.to_path_buf(), data).await?;
        tracing::debug!(field = %key, path = %path.display(), size = size, "Uploaded file saved");
        Ok(())
    }

    fn set_header(&mut self, key: &str, value: &str) -> HandlerResult {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| FacadeError::InvalidHeader(format!("invalid header name: {}", key)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| FacadeError::InvalidHeader(format!("invalid value for header {}", key)))?;
        self.response_headers.insert(name, value);
        Ok(())
    }

    fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    fn set(&mut self, key: &str, value: &str) {
        self.data
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> &str {
        self.data
            .as_ref()
            .and_then(|data| data.get(key))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn send_string(&mut self, data: String) -> HandlerResult {
        self.commit(TEXT_PLAIN, Bytes::from(data))
    }

    fn send_result(&mut self, data: Value) -> HandlerResult {
        self.commit_json(&ApiResult::success(data))
    }

    fn send_paged(&mut self, data: Value, curr_page: u32, total_page: u32) -> HandlerResult {
        self.ensure_unsent()?;
        let paged = ApiResultPaged::success(data, curr_page, total_page)?;
        self.commit_json(&paged)
    }

    fn send_error(&mut self, err: &CodedError) -> HandlerResult {
        self.ensure_unsent()?;
        self.status = StatusCode::BAD_REQUEST;
        self.commit_json(&ApiResult::from(err))
    }

    fn send_json(&mut self, data: Value) -> HandlerResult {
        self.commit_json(&data)
    }

    async fn send_file(&mut self, path: &Path, name: &str) -> HandlerResult {
        self.commit_file(path, name, false).await
    }

    async fn send_file_bytes(&mut self, data: &[u8], name: &str) -> HandlerResult {
        self.ensure_unsent()?;
        let temp =
            write_scoped_async(self.temp_dir.clone(), name.to_string(), data.to_vec()).await?;
        let result = self.commit_file(temp.path(), name, true).await;
        drop(temp);
        result
    }

    async fn next(&mut self) -> HandlerResult {
        match self.cursor.advance() {
            Some(stage) => {
                let ctx: &mut dyn Context = self;
                stage(ctx).await
            }
            None => Ok(()),
        }
    }

    fn is_sent(&self) -> bool {
        self.sent
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn mime_of(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

fn parse_query(raw: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(raw).unwrap_or_else(|e| {
        tracing::debug!(query = %raw, error = %e, "Failed to parse query string");
        Vec::new()
    })
}

fn parse_urlencoded(body: &[u8]) -> ParsedForm {
    match serde_urlencoded::from_bytes(body) {
        Ok(fields) => ParsedForm {
            fields,
            ..ParsedForm::default()
        },
        Err(e) => ParsedForm {
            error: Some(e.to_string()),
            ..ParsedForm::default()
        },
    }
}

async fn parse_multipart(request: Request) -> ParsedForm {
    let mut form = ParsedForm::default();
    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(rejection) => {
            form.error = Some(rejection.body_text());
            return form;
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                form.error = Some(e.body_text());
                break;
            }
        };

        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                form.error = Some(e.body_text());
                break;
            }
        };

        if file_name.is_some() {
            form.files.push(UploadedFile {
                field_name,
                file_name,
                content_type,
                data: data.to_vec(),
            });
        } else {
            let value = String::from_utf8_lossy(&data).into_owned();
            form.fields.push((field_name, value));
        }
    }

    form
}
