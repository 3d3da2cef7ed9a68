//! Files Controller
//!
//! - `POST /files`：multipart 字段 `file` 保存到上传目录
//! - `GET /files/:name`：下载已上传的文件
//! - `GET /files/:name/report`：生成文件信息的 CSV 并以附件返回

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde_json::json;

use super::errno;
use crate::application::tempfiles::sanitize_file_name;
use crate::application::{
    with_state, App, CodedError, Context, ContextExt, Controller, HandlerResult,
};

/// 上传表单中的文件字段名
pub const FILE_FIELD: &str = "file";

pub struct FilesController {
    upload_dir: PathBuf,
}

impl FilesController {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }
}

impl Controller for FilesController {
    fn name(&self) -> &str {
        "files"
    }

    fn register(&self, app: &mut dyn App) {
        app.post("/files", vec![with_state(self.upload_dir.clone(), upload)]);
        app.get("/files/:name", vec![with_state(self.upload_dir.clone(), download)]);
        app.get(
            "/files/:name/report",
            vec![with_state(self.upload_dir.clone(), report)],
        );
    }
}

fn not_found(name: &str) -> CodedError {
    CodedError::new(errno::FILE_NOT_FOUND, format!("file not found: {}", name))
}

fn upload(ctx: &mut dyn Context, dir: PathBuf) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let file = ctx.form_file(FILE_FIELD)?;
        let name = sanitize_file_name(file.file_name.as_deref().unwrap_or(FILE_FIELD));
        let size = file.size();

        tokio::fs::create_dir_all(&dir).await?;
        ctx.save_file(FILE_FIELD, &dir.join(&name)).await?;
        tracing::info!(name = %name, size = size, "File uploaded");

        ctx.status(201);
        ctx.send_result(json!({ "name": name, "size": size }))
    })
}

fn download(ctx: &mut dyn Context, dir: PathBuf) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let name = sanitize_file_name(&ctx.param_or("name", ""));
        let path = dir.join(&name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return ctx.send_error(&not_found(&name));
        }
        ctx.send_file(&path, &name).await
    })
}

fn report(ctx: &mut dyn Context, dir: PathBuf) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let name = sanitize_file_name(&ctx.param_or("name", ""));
        let metadata = match tokio::fs::metadata(dir.join(&name)).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return ctx.send_error(&not_found(&name)),
        };

        let modified = metadata
            .modified()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
            .unwrap_or_default();
        let csv = format!("name,size,modified\n{},{},{}\n", name, metadata.len(), modified);

        ctx.send_file_bytes(csv.as_bytes(), &format!("{}.csv", name))
            .await
    })
}
