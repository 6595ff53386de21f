// ==========================================
// GraphRAG 图谱导入 - 记录与汇总模型
// ==========================================
// 职责: 原始表格 / 业务记录 / 存储变更 / 导入汇总
// 数据流: RawTable → BusinessRecord → WireMutation
// ==========================================

use crate::domain::types::EntityType;
use crate::domain::value::CellValue;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// 原始行: 列名 → 弱类型值（文件加载产物）
pub type RawRow = BTreeMap<String, CellValue>;

/// 业务记录: 字段名 → 值，总是包含 `type` 判别字段
pub type BusinessRecord = BTreeMap<String, CellValue>;

/// 存储变更: 技术格式化后的 JSON 对象，交给 mutate 一次性消费
pub type WireMutation = serde_json::Map<String, serde_json::Value>;

// ==========================================
// RawTable - 内存表格
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

// ==========================================
// TypeImportOutcome - 单类型批量导入结果
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeImportOutcome {
    /// 成功提交的记录数
    pub imported: usize,
    /// skip 策略丢弃的记录数
    pub skipped: usize,
    /// 记录级与批次级错误（每条/每批一条）
    pub errors: Vec<String>,
}

impl TypeImportOutcome {
    pub fn merge(&mut self, other: TypeImportOutcome) {
        self.imported += other.imported;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}

// ==========================================
// ImportSummary - 全量导入汇总
// ==========================================
// 用途: 面向调用方的最终结果（每类型成功计数 + 错误列表）
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub counts: BTreeMap<EntityType, usize>,
    pub skipped: BTreeMap<EntityType, usize>,
    pub errors: Vec<String>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}
