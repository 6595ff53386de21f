// ==========================================
// GraphRAG 图谱导入 - 核心库
// ==========================================
// 系统定位: GraphRAG 产出的表格数据 → 图存储的批量导入工具
// 技术栈: Tokio + Dgraph HTTP API
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值与记录模型
pub mod domain;

// 配置层 - 类型注册表与验证规则
pub mod config;

// 导入层 - 加载/转换/验证/落库
pub mod importer;

// 存储层 - 图存储客户端
pub mod store;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    BusinessRecord, CellValue, Coercion, ConflictPolicy, EntityType, IdFormat, ImportSummary,
    NumericKind, RawRow, RawTable, TypeImportOutcome, WireMutation,
};

// 配置
pub use config::{ImportOptions, Registry, ValidationRules, DEFAULT_BATCH_SIZE};

// 导入器
pub use importer::{
    BatchImporter, FileLoader, GraphImporter, ImportError, ImportManager, ImportResult,
    StorageValidator, TechnicalFormatter,
};

// 存储
pub use store::{DgraphClient, MemoryStore, StoreClient, StoreTransaction};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "GraphRAG 图谱导入工具";

// 默认存储端点
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
