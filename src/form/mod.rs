//! 导出表单的客户端逻辑：访问闸门、提交流程、HTTP 调用与文件落地。
//!
//! 页面脚本与 `export_cli` 共用同一套语义，这里是可测试的 Rust 版本。

pub mod api;
pub mod controller;
pub mod gate;
pub mod sink;

pub use api::HttpExportTransport;
pub use controller::{
    ExportForm, ExportTransport, FormSnapshot, GENERIC_ERROR_MESSAGE, SubmitOutcome,
    TransportError, download_file_name,
};
pub use gate::{AccessGate, GateState};
pub use sink::{DirectorySink, DownloadSink};
