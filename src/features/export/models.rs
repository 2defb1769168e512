use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 导出接口的查询参数。两个字段都按可选解析，缺失与空串在处理器里统一判定。
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// 目标数据库名
    pub database: Option<String>,
    /// 目标集合名
    pub collection: Option<String>,
}

impl DownloadQuery {
    /// 两个参数都存在且非空时返回 (database, collection)
    pub fn required(&self) -> Option<(&str, &str)> {
        let database = self.database.as_deref().filter(|s| !s.is_empty())?;
        let collection = self.collection.as_deref().filter(|s| !s.is_empty())?;
        Some((database, collection))
    }
}

/// 导出结果（每次请求新建，不落盘）
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    /// 集合名（原样回显请求参数）
    #[schema(example = "users")]
    pub collection: String,
    /// 数据库名（原样回显请求参数）
    #[schema(example = "myDatabase")]
    pub database: String,
    /// 文档数量，恒等于 `data.len()`
    #[schema(example = 2)]
    pub count: usize,
    /// 全部文档
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
    /// 导出时间（UTC，毫秒精度）
    #[schema(example = "2026-10-18T09:30:00.123Z")]
    pub exported_at: String,
}

impl ExportResponse {
    pub fn new(
        database: impl Into<String>,
        collection: impl Into<String>,
        data: Vec<Value>,
        exported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            collection: collection.into(),
            database: database.into(),
            count: data.len(),
            data,
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
