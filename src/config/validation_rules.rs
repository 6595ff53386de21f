// ==========================================
// GraphRAG 图谱导入 - 分层验证规则
// ==========================================
// 职责: 按类型定义 文件层 / 业务层 / 存储层 的验证规则
// 分层: file（格式/必需列）→ business（字段值）→ storage（ID/唯一性）
// ==========================================

use crate::domain::types::{EntityType, IdFormat};

// ==========================================
// FileRules - 文件层规则
// ==========================================
#[derive(Debug, Clone)]
pub struct FileRules {
    pub supported_formats: &'static [&'static str],
    pub required_columns: &'static [&'static str],
}

// ==========================================
// LengthRule - 字段长度约束
// ==========================================
#[derive(Debug, Clone)]
pub struct LengthRule {
    pub field: &'static str,
    pub min: Option<usize>,
    pub max: Option<usize>,
}

// ==========================================
// BusinessRules - 业务层规则
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BusinessRules {
    pub required_fields: &'static [&'static str],
    pub length_rules: &'static [LengthRule],
    /// `type` 字段的枚举约束（None = 不校验）
    pub valid_types: Option<&'static [&'static str]>,
    /// 社区成员下限（None = 不校验）
    pub min_members: Option<usize>,
}

// ==========================================
// StorageRules - 存储层规则
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct StorageRules {
    pub id_format: Option<IdFormat>,
    /// 复合唯一约束字段集（目前仅 relationship 使用）
    pub composite_unique: Option<&'static [&'static str]>,
}

// ==========================================
// ValidationRules - 三层规则汇总
// ==========================================
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub file: FileRules,
    pub business: BusinessRules,
    pub storage: StorageRules,
}

pub const DEFAULT_FORMATS: &[&str] = &["csv", "json", "xlsx"];

/// 固定规则表（内容对齐上游验证规则配置）
pub fn validation_rules_for(entity_type: EntityType) -> ValidationRules {
    match entity_type {
        EntityType::TextUnit => ValidationRules {
            file: FileRules {
                supported_formats: DEFAULT_FORMATS,
                required_columns: &["id", "text"],
            },
            business: BusinessRules {
                required_fields: &["id", "text"],
                length_rules: &[LengthRule { field: "text", min: None, max: Some(10_000) }],
                valid_types: None,
                min_members: None,
            },
            storage: StorageRules {
                id_format: Some(IdFormat::Hash),
                composite_unique: None,
            },
        },
        EntityType::Document => ValidationRules {
            file: FileRules {
                supported_formats: DEFAULT_FORMATS,
                required_columns: &["id", "title", "text"],
            },
            business: BusinessRules {
                required_fields: &["id", "title", "text"],
                length_rules: &[LengthRule { field: "text", min: Some(1), max: None }],
                valid_types: None,
                min_members: None,
            },
            storage: StorageRules {
                id_format: Some(IdFormat::Hash),
                composite_unique: None,
            },
        },
        EntityType::Entity => ValidationRules {
            file: FileRules {
                supported_formats: DEFAULT_FORMATS,
                required_columns: &["id", "title", "type", "description"],
            },
            business: BusinessRules {
                required_fields: &["id", "title", "type", "description"],
                length_rules: &[],
                valid_types: None,
                min_members: None,
            },
            storage: StorageRules {
                id_format: Some(IdFormat::Uuid),
                composite_unique: None,
            },
        },
        EntityType::Relationship => ValidationRules {
            file: FileRules {
                supported_formats: DEFAULT_FORMATS,
                required_columns: &["id", "source", "target"],
            },
            business: BusinessRules {
                required_fields: &["id", "source", "target"],
                length_rules: &[],
                valid_types: None,
                min_members: None,
            },
            storage: StorageRules {
                id_format: None,
                composite_unique: Some(&["source", "target"]),
            },
        },
        EntityType::Community => ValidationRules {
            file: FileRules {
                supported_formats: DEFAULT_FORMATS,
                required_columns: &["id", "community", "level", "title"],
            },
            business: BusinessRules {
                required_fields: &["id", "community", "level", "title"],
                length_rules: &[],
                valid_types: None,
                min_members: Some(1),
            },
            storage: StorageRules {
                id_format: Some(IdFormat::Uuid),
                composite_unique: None,
            },
        },
        EntityType::CommunityReport => ValidationRules {
            file: FileRules {
                supported_formats: DEFAULT_FORMATS,
                required_columns: &["id", "community", "full_content_json"],
            },
            business: BusinessRules {
                required_fields: &["id", "community", "full_content_json"],
                length_rules: &[],
                valid_types: None,
                min_members: None,
            },
            storage: StorageRules {
                id_format: Some(IdFormat::Uuid),
                composite_unique: None,
            },
        },
    }
}
