use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use super::controller::{ExportTransport, TransportError};
use crate::features::export::API_KEY_HEADER;

/// 错误响应体中只关心 `error` 字段
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
}

/// 通过 HTTP 调用导出接口
#[derive(Debug, Clone)]
pub struct HttpExportTransport {
    client: Client,
    download_url: Url,
}

impl HttpExportTransport {
    /// `download_url` 为导出接口的完整地址，例如 `http://127.0.0.1:3000/api/download`
    pub fn new(client: Client, download_url: Url) -> Self {
        Self {
            client,
            download_url,
        }
    }

    /// 由服务根地址与接口前缀拼出导出地址
    pub fn from_base(client: Client, base_url: &str, api_prefix: &str) -> Result<Self, TransportError> {
        let raw = format!(
            "{}/{}/download",
            base_url.trim_end_matches('/'),
            api_prefix.trim_matches('/')
        )
        .replace("//download", "/download");
        let url = Url::parse(&raw).map_err(|e| TransportError::Network(format!("无效的地址 {raw}: {e}")))?;
        Ok(Self::new(client, url))
    }

    /// 带 database / collection 查询参数的请求地址（两者均做 URL 编码）
    pub fn request_url(&self, database: &str, collection: &str) -> Url {
        let mut url = self.download_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("database", database)
            .append_pair("collection", collection);
        url
    }
}

#[async_trait]
impl ExportTransport for HttpExportTransport {
    async fn fetch_export(
        &self,
        database: &str,
        collection: &str,
        api_key: &str,
    ) -> Result<Value, TransportError> {
        let resp = self
            .client
            .get(self.request_url(database, collection))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorPayload>()
                .await
                .ok()
                .and_then(|p| p.error)
                .filter(|m| !m.is_empty());
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
