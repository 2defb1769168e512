use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 导出接口对外的通用失败文案（500 类错误共用）
pub const EXPORT_FAILED_MESSAGE: &str = "Failed to download collection";

/// 应用统一错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 请求方法不被支持（导出接口仅接受 GET）
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// 共享密钥缺失或不匹配
    #[error("Unauthorized: Invalid API key")]
    Unauthorized,

    /// 参数校验错误
    #[error("{0}")]
    BadRequest(String),

    /// 服务端配置缺失（不是调用方的问题）
    #[error("{0} not configured")]
    Configuration(&'static str),

    /// 文档库连接/查询失败
    #[error("文档库错误: {0}")]
    Store(#[from] StoreError),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 文档库错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    /// 连接串无法解析
    #[error("{0}")]
    InvalidUri(String),

    /// 建立连接失败（含 ping 失败）
    #[error("{0}")]
    Connect(String),

    /// 查询或游标读取失败
    #[error("{0}")]
    Query(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match *err.kind {
            mongodb::error::ErrorKind::InvalidArgument { .. } => {
                StoreError::InvalidUri(err.to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// 错误响应体：`error` 为面向用户的短文案，`details` 仅在 500 类错误中附带底层原因。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// 错误文案
    #[schema(example = "Unauthorized: Invalid API key")]
    pub error: String,

    /// 底层错误描述（仅 500）
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "MONGODB_URI not configured")]
    pub details: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "UNAUTHORIZED")]
    pub code: String,

    /// 可选：请求追踪 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Store(_) => "UPSTREAM_FAILURE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 拆分为（对外文案, 诊断详情）。客户端错误原样返回文案；服务端错误统一文案并附带原因。
    fn message_and_details(&self) -> (String, Option<String>) {
        match self {
            AppError::MethodNotAllowed | AppError::Unauthorized | AppError::BadRequest(_) => {
                (self.to_string(), None)
            }
            AppError::Configuration(_) => (EXPORT_FAILED_MESSAGE.to_string(), Some(self.to_string())),
            AppError::Store(e) => (EXPORT_FAILED_MESSAGE.to_string(), Some(e.to_string())),
            AppError::Internal(msg) => ("Internal server error".to_string(), Some(msg.clone())),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, details) = self.message_and_details();

        let body = ErrorBody {
            error,
            details,
            code: self.stable_code().to_string(),
            request_id: crate::request_id::current_request_id(),
        };

        (status, Json(body)).into_response()
    }
}
