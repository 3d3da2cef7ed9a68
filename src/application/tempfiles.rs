//! Scoped Temp Files - 临时文件的获取与释放
//!
//! SaveFile / SendFileBytes 使用的临时文件都是 [`NamedTempFile`]，
//! 在成功、处理函数出错、传输出错的每条路径上随 drop 删除。

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// SendFileBytes 临时文件名前缀
pub const SEND_FILE_PREFIX: &str = "sendFile";

const UPLOAD_PREFIX: &str = ".upload";

/// 把文件名限制为单个路径分量
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.trim() {
        "" | "." | ".." => "file".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// 在 `dir` 中创建 `sendFile*_<name>` 临时文件并写入数据
pub fn write_scoped(dir: &Path, name: &str, data: &[u8]) -> io::Result<NamedTempFile> {
    let suffix = format!("_{}", sanitize_file_name(name));
    let mut file = tempfile::Builder::new()
        .prefix(SEND_FILE_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)?;
    file.write_all(data)?;
    file.flush()?;
    Ok(file)
}

/// 原子地写入 `target`，覆盖已有文件
///
/// 先写入同目录下的临时文件再 rename；失败时临时文件随 drop 删除。
pub fn persist_bytes(target: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::Builder::new()
        .prefix(UPLOAD_PREFIX)
        .tempfile_in(dir)?;
    file.write_all(data)?;
    file.flush()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// [`write_scoped`] 的异步版本，在阻塞线程池中执行
pub async fn write_scoped_async(
    dir: PathBuf,
    name: String,
    data: Vec<u8>,
) -> io::Result<NamedTempFile> {
    tokio::task::spawn_blocking(move || write_scoped(&dir, &name, &data))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

/// [`persist_bytes`] 的异步版本，在阻塞线程池中执行
pub async fn persist_bytes_async(target: PathBuf, data: Vec<u8>) -> io::Result<()> {
    tokio::task::spawn_blocking(move || persist_bytes(&target, &data))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}
