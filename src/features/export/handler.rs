use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, Method, Uri},
    response::Json,
    routing::any,
};
use chrono::Utc;

use crate::{error::AppError, state::AppState, store};

use super::models::{DownloadQuery, ExportResponse};

/// 共享密钥所在请求头
pub const API_KEY_HEADER: &str = "x-api-key";

const MISSING_PARAMS_MESSAGE: &str = "Missing required parameters: collection and database";

/// 请求头中的密钥与配置值做简单相等比较；未配置密钥时一律拒绝。
fn is_authorized(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|provided| !provided.is_empty() && provided == expected)
}

#[utoipa::path(
    get,
    path = "/download",
    summary = "导出集合",
    description = "校验 `x-api-key` 后连接文档库，读取指定集合的全部文档并以 JSON 返回。不分页、不流式。",
    params(
        DownloadQuery,
        ("x-api-key" = String, Header, description = "共享密钥")
    ),
    responses(
        (status = 200, description = "导出成功", body = ExportResponse),
        (status = 400, description = "缺少 database 或 collection", body = crate::error::ErrorBody),
        (status = 401, description = "密钥缺失或错误", body = crate::error::ErrorBody),
        (status = 405, description = "仅支持 GET", body = crate::error::ErrorBody),
        (status = 500, description = "未配置连接串或文档库连接/查询失败", body = crate::error::ErrorBody)
    ),
    security(("ApiKey" = [])),
    tag = "Export"
)]
pub async fn download_collection(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<ExportResponse>, AppError> {
    if method != Method::GET {
        return Err(AppError::MethodNotAllowed);
    }

    if !is_authorized(state.export.api_key(), &headers) {
        tracing::warn!("导出请求被拒绝：x-api-key 缺失或不匹配");
        return Err(AppError::Unauthorized);
    }

    // 鉴权通过后才解析查询串，保证未授权请求不触达任何参数逻辑。
    let Query(query) = Query::<DownloadQuery>::try_from_uri(&uri)
        .map_err(|_| AppError::BadRequest(MISSING_PARAMS_MESSAGE.to_string()))?;
    let (database, collection) = query
        .required()
        .ok_or_else(|| AppError::BadRequest(MISSING_PARAMS_MESSAGE.to_string()))?;

    let started = Instant::now();
    let result = match state.export.mongodb_uri() {
        Some(conn_str) => {
            store::fetch_collection(state.store.as_ref(), conn_str, database, collection)
                .await
                .map_err(AppError::from)
        }
        None => Err(AppError::Configuration("MONGODB_URI")),
    };

    let documents = match result {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!(database, collection, "Error downloading collection: {}", e);
            return Err(e);
        }
    };

    let response = ExportResponse::new(database, collection, documents, Utc::now());
    tracing::info!(
        database,
        collection,
        count = response.count,
        elapsed_ms = elapsed_millis(started.elapsed()),
        "集合导出完成"
    );
    Ok(Json(response))
}

/// 毫秒数超出 u64 时饱和，不做截断
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

pub fn create_export_router() -> Router<AppState> {
    Router::new().route("/download", any(download_collection))
}
