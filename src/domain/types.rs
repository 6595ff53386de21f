// ==========================================
// GraphRAG 图谱导入 - 基础类型定义
// ==========================================
// 职责: 实体类型 / 冲突策略 / ID 格式等枚举
// 红线: 实体类型是编译期封闭集合，不做字符串反射分发
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// EntityType - 实体类型（封闭集合）
// ==========================================
// 用途: 驱动注册表查找与转换器分发
// 顺序: 按导入依赖顺序声明（text_unit 在前，community_report 在后）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    TextUnit,
    Document,
    Entity,
    Relationship,
    Community,
    CommunityReport,
}

impl EntityType {
    /// 所有实体类型，按导入依赖顺序排列
    ///
    /// 子记录必须先于引用它们的父记录落库
    pub const IMPORT_ORDER: [EntityType; 6] = [
        EntityType::TextUnit,
        EntityType::Document,
        EntityType::Entity,
        EntityType::Relationship,
        EntityType::Community,
        EntityType::CommunityReport,
    ];

    /// 数据类型名（配置键 / CLI 参数）
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::TextUnit => "text_unit",
            EntityType::Document => "document",
            EntityType::Entity => "entity",
            EntityType::Relationship => "relationship",
            EntityType::Community => "community",
            EntityType::CommunityReport => "community_report",
        }
    }

    /// 存储层类型标签（dgraph.type）
    pub fn type_name(&self) -> &'static str {
        match self {
            EntityType::TextUnit => "TextUnit",
            EntityType::Document => "Document",
            EntityType::Entity => "Entity",
            EntityType::Relationship => "Relationship",
            EntityType::Community => "Community",
            EntityType::CommunityReport => "CommunityReport",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text_unit" => Ok(EntityType::TextUnit),
            "document" => Ok(EntityType::Document),
            "entity" => Ok(EntityType::Entity),
            "relationship" => Ok(EntityType::Relationship),
            "community" => Ok(EntityType::Community),
            "community_report" => Ok(EntityType::CommunityReport),
            other => Err(format!("未知的数据类型: {}", other)),
        }
    }
}

// ==========================================
// ConflictPolicy - 冲突处理策略
// ==========================================
// insert: 不查重，总是创建
// upsert: 已存在则删除重建（默认）
// skip:   已存在则丢弃本条
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    Insert,
    Upsert,
    Skip,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Insert => "insert",
            ConflictPolicy::Upsert => "upsert",
            ConflictPolicy::Skip => "skip",
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(ConflictPolicy::Insert),
            "upsert" => Ok(ConflictPolicy::Upsert),
            "skip" => Ok(ConflictPolicy::Skip),
            other => Err(format!(
                "未知的冲突策略: {}（可选: insert/upsert/skip）",
                other
            )),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// IdFormat - 存储层 ID 格式规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdFormat {
    /// 十六进制哈希，长度 >= 32
    Hash,
    /// RFC 4122 UUID
    Uuid,
    /// 可解析为整数
    Int,
}

// ==========================================
// NumericKind - 数值字段目标类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Int,
    Float,
}

// ==========================================
// Coercion - 数值转换策略
// ==========================================
// Lenient: 数值转换失败丢弃该字段，日期解析失败原样透传（与上游行为一致）
// Strict:  数值转换失败使整个文件转换失败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coercion {
    #[default]
    Lenient,
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_round_trip() {
        for et in EntityType::IMPORT_ORDER {
            assert_eq!(et.as_str().parse::<EntityType>().unwrap(), et);
        }
    }

    #[test]
    fn test_entity_type_unknown() {
        assert!("covariate".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_conflict_policy_round_trip() {
        for p in [
            ConflictPolicy::Insert,
            ConflictPolicy::Upsert,
            ConflictPolicy::Skip,
        ] {
            assert_eq!(p.as_str().parse::<ConflictPolicy>().unwrap(), p);
        }
    }

    #[test]
    fn test_import_order_children_first() {
        let order = EntityType::IMPORT_ORDER;
        let pos = |et: EntityType| order.iter().position(|x| *x == et).unwrap();
        assert!(pos(EntityType::TextUnit) < pos(EntityType::Entity));
        assert!(pos(EntityType::Entity) < pos(EntityType::Relationship));
        assert!(pos(EntityType::Relationship) < pos(EntityType::Community));
        assert!(pos(EntityType::Community) < pos(EntityType::CommunityReport));
    }
}
