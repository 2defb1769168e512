#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use serde_json::Value;

use collection_export::AppConfig;
use collection_export::app::build_router;
use collection_export::config::ExportConfig;
use collection_export::error::StoreError;
use collection_export::state::AppState;
use collection_export::store::{DocumentStore, StoreConnection};

pub const API_KEY: &str = "test-api-key";
pub const ACCESS_KEY: &str = "test-access-key";
pub const MONGODB_URI: &str = "mongodb://localhost:27017";

/// 内存文档库：记录连接/关闭次数与最近一次查询的库名集合名。
#[derive(Default)]
pub struct MockStore {
    pub connects: AtomicUsize,
    pub closes: Arc<AtomicUsize>,
    pub queried: Arc<Mutex<Vec<(String, String)>>>,
    pub documents: Vec<Value>,
    pub connect_error: Option<String>,
    pub query_error: Option<String>,
}

impl MockStore {
    pub fn with_documents(documents: Vec<Value>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

struct MockConnection {
    closes: Arc<AtomicUsize>,
    queried: Arc<Mutex<Vec<(String, String)>>>,
    documents: Vec<Value>,
    query_error: Option<String>,
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn connect(&self, _uri: &str) -> Result<Box<dyn StoreConnection>, StoreError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.connect_error {
            return Err(StoreError::Connect(msg.clone()));
        }
        Ok(Box::new(MockConnection {
            closes: self.closes.clone(),
            queried: self.queried.clone(),
            documents: self.documents.clone(),
            query_error: self.query_error.clone(),
        }))
    }
}

#[async_trait]
impl StoreConnection for MockConnection {
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Value>, StoreError> {
        self.queried
            .lock()
            .unwrap()
            .push((database.to_string(), collection.to_string()));
        match &self.query_error {
            Some(msg) => Err(StoreError::Query(msg.clone())),
            None => Ok(self.documents.clone()),
        }
    }

    async fn close(self: Box<Self>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn full_export_config() -> ExportConfig {
    ExportConfig {
        mongodb_uri: Some(MONGODB_URI.to_string()),
        api_key: Some(API_KEY.to_string()),
        access_key: Some(ACCESS_KEY.to_string()),
    }
}

/// 以默认配置 + 指定导出配置组装完整路由
pub fn build_app(export: ExportConfig, store: Arc<MockStore>) -> Router {
    let mut config = AppConfig::default();
    config.export = export.clone();
    let state = AppState::new(export, store, config.api.prefix.clone());
    build_router(&config, state)
}
