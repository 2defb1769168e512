use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::Client;
use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use serde_json::Value;

use super::convert::document_to_json;
use super::{DocumentStore, StoreConnection};
use crate::error::StoreError;

/// 基于官方 `mongodb` 驱动的文档库实现。
///
/// 每次 `connect` 都新建一个 `Client`，不在请求间共享。
#[derive(Debug, Default, Clone)]
pub struct MongoStore;

impl MongoStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn connect(&self, uri: &str) -> Result<Box<dyn StoreConnection>, StoreError> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|e| StoreError::InvalidUri(e.to_string()))?;
        let client =
            Client::with_options(options).map_err(|e| StoreError::Connect(e.to_string()))?;

        // 驱动是惰性连接的，这里用 ping 确认连接真正可用。
        if let Err(e) = client.database("admin").run_command(doc! { "ping": 1 }).await {
            client.shutdown().await;
            return Err(StoreError::Connect(e.to_string()));
        }

        tracing::debug!("文档库连接已建立");
        Ok(Box::new(MongoConnection { client }))
    }
}

/// 单次请求独占的 MongoDB 连接
pub struct MongoConnection {
    client: Client,
}

#[async_trait]
impl StoreConnection for MongoConnection {
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Value>, StoreError> {
        let coll = self
            .client
            .database(database)
            .collection::<Document>(collection);

        let cursor = coll.find(doc! {}).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        Ok(documents.into_iter().map(document_to_json).collect())
    }

    async fn close(self: Box<Self>) {
        self.client.shutdown().await;
        tracing::debug!("文档库连接已关闭");
    }
}
