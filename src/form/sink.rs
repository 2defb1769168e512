use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// 导出文件的落地端（浏览器里对应触发下载，CLI 里对应写入目录）
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn save(&self, file_name: &str, contents: &[u8]) -> std::io::Result<PathBuf>;
}

/// 写入本地目录；目录不存在时创建。
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// 文件名只保留最后一段，并替换掉文件系统不接受的字符（与浏览器保存下载时的处理一致）。
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "download.json".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, file_name: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(sanitize_file_name(file_name));
        tokio::fs::write(&path, contents).await?;
        tracing::info!("导出文件已保存: {}", path.display());
        Ok(path)
    }
}
