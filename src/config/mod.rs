// ==========================================
// GraphRAG 图谱导入 - 配置层
// ==========================================
// 职责: 实体类型注册表 + 分层验证规则 + 导入选项
// 红线: 配置对象显式构造、启动时建成、此后只读
// ==========================================

pub mod registry;
pub mod validation_rules;

pub use registry::{EntityTypeConfig, Registry, RelationConfig};
pub use validation_rules::{
    validation_rules_for, BusinessRules, FileRules, LengthRule, StorageRules, ValidationRules,
    DEFAULT_FORMATS,
};

use crate::domain::types::{Coercion, ConflictPolicy};
use std::path::PathBuf;

/// 默认批次大小
pub const DEFAULT_BATCH_SIZE: usize = 1000;

// ==========================================
// ImportOptions - 导入运行选项
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// 数据文件根目录
    pub data_dir: PathBuf,
    /// 每事务批次大小
    pub batch_size: usize,
    /// 冲突处理策略
    pub policy: ConflictPolicy,
    /// 数值转换策略
    pub coercion: Coercion,
}

impl ImportOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            policy: ConflictPolicy::Upsert,
            coercion: Coercion::Lenient,
        }
    }
}
