// ==========================================
// GraphRAG 图谱导入 - 存储层
// ==========================================
// 职责: 图存储客户端与事务的抽象 + Dgraph HTTP 实现 + 内存实现
// 红线: 导入逻辑只依赖 trait，不直接触达具体存储
// ==========================================

pub mod dgraph;
pub mod memory;
pub mod schema;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::WireMutation;
use crate::importer::error::ImportResult;

pub use dgraph::DgraphClient;
pub use memory::MemoryStore;

/// 存储事务
///
/// 一个批次对应一个事务: 查重探针与变更在同一事务内执行，
/// commit / discard 之后事务即失效
#[async_trait]
pub trait StoreTransaction: Send {
    /// 执行只读查询，返回响应的 data 部分
    async fn query(&mut self, query: &str) -> ImportResult<Value>;

    /// 暂存一组 set 变更
    async fn mutate_set(&mut self, mutations: &[WireMutation]) -> ImportResult<()>;

    /// 暂存一组 delete 变更（`{"uid": "0x.."}` 形式）
    async fn mutate_del(&mut self, deletes: &[Value]) -> ImportResult<()>;

    async fn commit(self: Box<Self>) -> ImportResult<()>;

    async fn discard(self: Box<Self>) -> ImportResult<()>;
}

/// 存储客户端
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// 连通性检查（失败时导入立即终止）
    async fn check_connection(&self) -> ImportResult<()>;

    /// 开启新事务
    async fn begin(&self) -> ImportResult<Box<dyn StoreTransaction>>;

    /// 应用 schema 变更
    async fn alter_schema(&self, schema: &str) -> ImportResult<()>;

    /// 清空全部数据与 schema
    async fn drop_all(&self) -> ImportResult<()>;
}
