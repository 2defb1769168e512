use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use super::gate::GateState;
use super::sink::DownloadSink;
use crate::error::EXPORT_FAILED_MESSAGE;
use serde_json::Value;

/// 兜底错误文案（底层错误没有可展示信息时使用）
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// 调用导出接口失败的原因
#[derive(Error, Debug)]
pub enum TransportError {
    /// 接口返回非 2xx；`message` 取自响应体的 `error` 字段
    #[error("{}", .message.as_deref().unwrap_or(EXPORT_FAILED_MESSAGE))]
    Rejected { status: u16, message: Option<String> },

    /// 请求未能发出或连接中断
    #[error("{0}")]
    Network(String),

    /// 成功响应体无法解析
    #[error("{0}")]
    Decode(String),
}

/// 导出接口的调用方式（HTTP 实现见 [`super::api::HttpExportTransport`]）
///
/// 成功时返回原始响应体，落盘内容与服务端返回的字段保持一致。
#[async_trait]
pub trait ExportTransport: Send + Sync {
    async fn fetch_export(
        &self,
        database: &str,
        collection: &str,
        api_key: &str,
    ) -> Result<Value, TransportError>;
}

/// 一次提交的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 上一次提交仍在进行，本次未发起调用
    Ignored,
    /// 失败，附带展示给用户的文案
    Failed(String),
    /// 成功，文件已交给下载落地端
    Downloaded { file_name: String, count: usize },
}

/// 表单可见状态快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    pub database: String,
    pub collection: String,
    pub api_key: String,
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// 导出表单控制器。
///
/// 只能在访问闸门放行后创建。状态放在互斥锁里，允许多个任务共享同一表单；
/// `loading` 为真期间的重复提交会被直接忽略。
#[derive(Debug, Default)]
pub struct ExportForm {
    state: Mutex<FormSnapshot>,
}

impl ExportForm {
    /// 闸门为 `Authorized` 时返回可交互的表单
    pub fn open(gate: GateState) -> Option<Self> {
        (gate == GateState::Authorized).then(Self::default)
    }

    fn lock(&self) -> MutexGuard<'_, FormSnapshot> {
        // 状态只含纯数据，锁中毒时继续使用内部值即可。
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_database(&self, value: impl Into<String>) {
        self.lock().database = value.into();
    }

    pub fn set_collection(&self, value: impl Into<String>) {
        self.lock().collection = value.into();
    }

    pub fn set_api_key(&self, value: impl Into<String>) {
        self.lock().api_key = value.into();
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// 提交表单：调用导出接口，成功则把格式化后的 JSON 交给下载落地端。
    pub async fn submit(
        &self,
        transport: &dyn ExportTransport,
        sink: &dyn DownloadSink,
    ) -> SubmitOutcome {
        let (database, collection, api_key) = {
            let mut st = self.lock();
            if st.loading {
                return SubmitOutcome::Ignored;
            }
            st.loading = true;
            st.error = None;
            st.success = None;
            (st.database.clone(), st.collection.clone(), st.api_key.clone())
        };
        let _loading = LoadingGuard { form: self };

        match run_export(transport, sink, &database, &collection, &api_key).await {
            Ok((file_name, count)) => {
                self.lock().success = Some(format!(
                    "Successfully downloaded {count} documents from {collection}"
                ));
                SubmitOutcome::Downloaded { file_name, count }
            }
            Err(message) => {
                self.lock().error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }
}

/// 离开作用域（含提前返回、取消）时清除 loading。
struct LoadingGuard<'a> {
    form: &'a ExportForm,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.form.lock().loading = false;
    }
}

async fn run_export(
    transport: &dyn ExportTransport,
    sink: &dyn DownloadSink,
    database: &str,
    collection: &str,
    api_key: &str,
) -> Result<(String, usize), String> {
    let response = transport
        .fetch_export(database, collection, api_key)
        .await
        .map_err(|e| display_message(&e))?;

    let contents = serde_json::to_vec_pretty(&response).map_err(|e| display_message(&e))?;
    let file_name = download_file_name(collection, Utc::now().timestamp_millis());
    sink.save(&file_name, &contents)
        .await
        .map_err(|e| display_message(&e))?;

    Ok((file_name, document_count(&response)))
}

/// 取响应里的 `count`；缺失时退回 `data` 的长度。
fn document_count(response: &Value) -> usize {
    response
        .get("count")
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .or_else(|| response.get("data").and_then(Value::as_array).map(Vec::len))
        .unwrap_or(0)
}

fn display_message(err: &dyn std::error::Error) -> String {
    let msg = err.to_string();
    if msg.is_empty() {
        GENERIC_ERROR_MESSAGE.to_string()
    } else {
        msg
    }
}

/// 下载文件名：`<collection>_<unix 毫秒>.json`
pub fn download_file_name(collection: &str, unix_ms: i64) -> String {
    format!("{collection}_{unix_ms}.json")
}
