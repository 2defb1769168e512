//! 文档库抽象
//!
//! 导出接口只依赖这里的两个 trait：
//! - [`DocumentStore`]：按连接串打开一次性连接；
//! - [`StoreConnection`]：在连接上做全量读取，并在结束时显式关闭。
//!
//! 连接不做池化与复用，每个请求独占一条连接，生命周期与请求一致。

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// BSON → JSON 转换
pub mod convert;
/// MongoDB 实现
pub mod mongo;

pub use mongo::MongoStore;

/// 文档库连接工厂
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 打开一条新连接。返回 `Err` 时不会留下需要关闭的资源。
    async fn connect(&self, uri: &str) -> Result<Box<dyn StoreConnection>, StoreError>;
}

/// 单次请求持有的文档库连接
#[async_trait]
pub trait StoreConnection: Send + Sync {
    /// 以空过滤条件读取集合内全部文档，并整体物化到内存。
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Value>, StoreError>;

    /// 释放连接。
    async fn close(self: Box<Self>);
}

/// 打开连接 → 全量读取 → 关闭连接。
///
/// 只要 `connect` 成功，无论读取成功与否 `close` 都恰好调用一次。
pub async fn fetch_collection(
    store: &dyn DocumentStore,
    uri: &str,
    database: &str,
    collection: &str,
) -> Result<Vec<Value>, StoreError> {
    let conn = store.connect(uri).await?;
    let result = conn.find_all(database, collection).await;
    conn.close().await;
    result
}
