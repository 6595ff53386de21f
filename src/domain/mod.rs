// ==========================================
// GraphRAG 图谱导入 - 领域层
// ==========================================
// 职责: 基础类型 / 单元格值模型 / 记录与汇总模型
// ==========================================

pub mod record;
pub mod types;
pub mod value;

pub use record::{BusinessRecord, ImportSummary, RawRow, RawTable, TypeImportOutcome, WireMutation};
pub use types::{Coercion, ConflictPolicy, EntityType, IdFormat, NumericKind};
pub use value::CellValue;
