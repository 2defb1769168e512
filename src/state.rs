use std::sync::Arc;

use crate::config::{AppConfig, ExportConfig};
use crate::store::{DocumentStore, MongoStore};

/// 聚合的应用共享状态（只读，请求间不共享可变数据）
#[derive(Clone)]
pub struct AppState {
    /// 连接串与两个静态口令
    pub export: Arc<ExportConfig>,
    /// 文档库连接工厂
    pub store: Arc<dyn DocumentStore>,
    /// 业务接口前缀（表单页脚本据此拼接导出地址）
    pub api_prefix: String,
}

impl AppState {
    pub fn new(export: ExportConfig, store: Arc<dyn DocumentStore>, api_prefix: impl Into<String>) -> Self {
        Self {
            export: Arc::new(export),
            store,
            api_prefix: api_prefix.into(),
        }
    }

    /// 按全局配置构建生产状态（MongoDB 实现）
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.export.clone(),
            Arc::new(MongoStore::new()),
            config.api.prefix.clone(),
        )
    }

    /// 导出接口的完整路径
    pub fn download_path(&self) -> String {
        format!("{}/download", crate::app::normalize_prefix(&self.api_prefix))
    }
}
