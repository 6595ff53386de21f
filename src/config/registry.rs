// ==========================================
// GraphRAG 图谱导入 - 实体类型注册表
// ==========================================
// 职责: 集中定义六种实体类型的字段配置与文件发现模式
// 红线: 注册表构建一次，只读共享，无全局可变状态
// ==========================================

use crate::config::validation_rules::{validation_rules_for, ValidationRules};
use crate::domain::types::{EntityType, NumericKind};
use std::collections::BTreeMap;

// ==========================================
// RelationConfig - 关系边配置
// ==========================================
// field: 边取值来源字段（None 表示经由对端字段反向建立）
#[derive(Debug, Clone)]
pub struct RelationConfig {
    pub name: &'static str,
    pub field: Option<&'static str>,
    pub target_type: EntityType,
}

// ==========================================
// EntityTypeConfig - 单类型字段配置
// ==========================================
// 不变式: required_fields 与 optional_fields 不相交
#[derive(Debug, Clone)]
pub struct EntityTypeConfig {
    pub entity_type: EntityType,
    /// 数据根目录下的文件发现模式
    pub file_pattern: &'static str,
    pub required_fields: &'static [&'static str],
    pub optional_fields: &'static [&'static str],
    /// 数组型列（预归一化为 List）
    pub list_fields: &'static [&'static str],
    /// 数值字段 → 目标类型（尽力转换）
    pub numeric_fields: &'static [(&'static str, NumericKind)],
    pub date_fields: &'static [&'static str],
    pub json_fields: &'static [&'static str],
    pub text_fields: &'static [&'static str],
    pub relations: &'static [RelationConfig],
    /// 转换后的批级后处理钩子名（None = 恒等）
    pub post_import: Option<&'static str>,
}

impl EntityTypeConfig {
    pub fn type_name(&self) -> &'static str {
        self.entity_type.type_name()
    }

    /// 必填 + 可选字段的顺序遍历
    pub fn all_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required_fields
            .iter()
            .chain(self.optional_fields.iter())
            .copied()
    }
}

// ===== 固定配置表（与上游字段字典一致）=====

static TEXT_UNIT_CONFIG: EntityTypeConfig = EntityTypeConfig {
    entity_type: EntityType::TextUnit,
    file_pattern: "*text_units*",
    required_fields: &["id", "text"],
    optional_fields: &[
        "human_readable_id",
        "n_tokens",
        "document_ids",
        "entity_ids",
        "relationship_ids",
        "covariate_ids",
    ],
    list_fields: &["document_ids", "entity_ids", "relationship_ids", "covariate_ids"],
    numeric_fields: &[("n_tokens", NumericKind::Int)],
    date_fields: &[],
    json_fields: &[],
    text_fields: &[],
    relations: &[
        RelationConfig { name: "documents", field: Some("document_ids"), target_type: EntityType::Document },
        RelationConfig { name: "entities", field: Some("entity_ids"), target_type: EntityType::Entity },
        RelationConfig { name: "relationships", field: Some("relationship_ids"), target_type: EntityType::Relationship },
        RelationConfig { name: "communities", field: None, target_type: EntityType::Community },
    ],
    post_import: None,
};

static DOCUMENT_CONFIG: EntityTypeConfig = EntityTypeConfig {
    entity_type: EntityType::Document,
    file_pattern: "*documents*",
    required_fields: &["id", "title", "text"],
    optional_fields: &["human_readable_id", "creation_date", "metadata", "text_unit_ids"],
    list_fields: &["text_unit_ids"],
    numeric_fields: &[],
    date_fields: &["creation_date"],
    json_fields: &["metadata"],
    text_fields: &["title", "text"],
    relations: &[RelationConfig {
        name: "text_units",
        field: Some("text_unit_ids"),
        target_type: EntityType::TextUnit,
    }],
    post_import: None,
};

static ENTITY_CONFIG: EntityTypeConfig = EntityTypeConfig {
    entity_type: EntityType::Entity,
    file_pattern: "*entities*",
    required_fields: &["id", "title", "type", "description"],
    optional_fields: &["human_readable_id", "frequency", "degree", "x", "y", "text_unit_ids"],
    list_fields: &["text_unit_ids"],
    numeric_fields: &[
        ("frequency", NumericKind::Int),
        ("degree", NumericKind::Int),
        ("x", NumericKind::Float),
        ("y", NumericKind::Float),
    ],
    date_fields: &[],
    json_fields: &[],
    text_fields: &["title", "description", "type"],
    relations: &[
        RelationConfig { name: "text_units", field: Some("text_unit_ids"), target_type: EntityType::TextUnit },
        RelationConfig { name: "related_entities", field: None, target_type: EntityType::Relationship },
        RelationConfig { name: "communities", field: None, target_type: EntityType::Community },
    ],
    post_import: None,
};

static RELATIONSHIP_CONFIG: EntityTypeConfig = EntityTypeConfig {
    entity_type: EntityType::Relationship,
    file_pattern: "*relationships*",
    required_fields: &["id", "source", "target"],
    optional_fields: &[
        "human_readable_id",
        "description",
        "weight",
        "combined_degree",
        "text_unit_ids",
        "type",
    ],
    list_fields: &["text_unit_ids"],
    numeric_fields: &[
        ("weight", NumericKind::Float),
        ("combined_degree", NumericKind::Int),
    ],
    date_fields: &[],
    json_fields: &[],
    text_fields: &["description"],
    relations: &[
        RelationConfig { name: "source_entity", field: Some("source"), target_type: EntityType::Entity },
        RelationConfig { name: "target_entity", field: Some("target"), target_type: EntityType::Entity },
        RelationConfig { name: "text_units", field: Some("text_unit_ids"), target_type: EntityType::TextUnit },
        RelationConfig { name: "communities", field: None, target_type: EntityType::Community },
    ],
    post_import: Some("setup_entity_relations"),
};

static COMMUNITY_CONFIG: EntityTypeConfig = EntityTypeConfig {
    entity_type: EntityType::Community,
    file_pattern: "*communities*",
    required_fields: &["id", "community", "level", "title"],
    optional_fields: &[
        "human_readable_id",
        "parent",
        "size",
        "period",
        "children",
        "entity_ids",
        "relationship_ids",
        "text_unit_ids",
        "name",
        "members",
    ],
    list_fields: &["children", "entity_ids", "relationship_ids", "text_unit_ids", "members"],
    numeric_fields: &[
        ("community", NumericKind::Int),
        ("level", NumericKind::Int),
        ("size", NumericKind::Int),
        ("parent", NumericKind::Int),
    ],
    date_fields: &["period"],
    json_fields: &[],
    text_fields: &["title", "name"],
    relations: &[
        RelationConfig { name: "entities", field: Some("entity_ids"), target_type: EntityType::Entity },
        RelationConfig { name: "relationships", field: Some("relationship_ids"), target_type: EntityType::Relationship },
        RelationConfig { name: "text_units", field: Some("text_unit_ids"), target_type: EntityType::TextUnit },
        RelationConfig { name: "child_communities", field: Some("children"), target_type: EntityType::Community },
    ],
    post_import: Some("setup_hierarchy"),
};

static COMMUNITY_REPORT_CONFIG: EntityTypeConfig = EntityTypeConfig {
    entity_type: EntityType::CommunityReport,
    file_pattern: "*community_reports*",
    required_fields: &["id", "community", "full_content_json"],
    optional_fields: &[
        "human_readable_id",
        "summary",
        "title",
        "findings",
        "rating",
        "explanation",
        "create_time",
        "period",
        "level",
        "entity_ids",
        "text_unit_ids",
        "data",
        "created_at",
    ],
    list_fields: &["entity_ids", "text_unit_ids"],
    numeric_fields: &[("rating", NumericKind::Int), ("level", NumericKind::Int)],
    date_fields: &["period", "create_time"],
    json_fields: &["full_content_json", "findings"],
    text_fields: &["title", "summary", "explanation"],
    relations: &[
        RelationConfig { name: "community", field: Some("community"), target_type: EntityType::Community },
        RelationConfig { name: "entities", field: Some("entity_ids"), target_type: EntityType::Entity },
        RelationConfig { name: "text_units", field: Some("text_unit_ids"), target_type: EntityType::TextUnit },
    ],
    post_import: None,
};

// ==========================================
// Registry - 注册表
// ==========================================
// 用途: 进程生命周期的只读配置对象，显式构造、按引用传递
pub struct Registry {
    configs: BTreeMap<EntityType, &'static EntityTypeConfig>,
    rules: BTreeMap<EntityType, ValidationRules>,
}

impl Registry {
    pub fn new() -> Self {
        let mut configs = BTreeMap::new();
        for config in [
            &TEXT_UNIT_CONFIG,
            &DOCUMENT_CONFIG,
            &ENTITY_CONFIG,
            &RELATIONSHIP_CONFIG,
            &COMMUNITY_CONFIG,
            &COMMUNITY_REPORT_CONFIG,
        ] {
            configs.insert(config.entity_type, config);
        }

        let rules = EntityType::IMPORT_ORDER
            .iter()
            .map(|et| (*et, validation_rules_for(*et)))
            .collect();

        Self { configs, rules }
    }

    /// 取指定类型的字段配置（类型集合封闭，查找必定命中）
    pub fn get(&self, entity_type: EntityType) -> &'static EntityTypeConfig {
        self.configs[&entity_type]
    }

    /// 取指定类型的分层验证规则
    pub fn rules(&self, entity_type: EntityType) -> &ValidationRules {
        &self.rules[&entity_type]
    }

    /// 推荐导入顺序（依赖序）
    pub fn import_order(&self) -> &'static [EntityType] {
        &EntityType::IMPORT_ORDER
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
