// ==========================================
// GraphRAG 图谱导入 - 记录转换层
// ==========================================
// 职责: 原始行 → 业务记录（业务验证 + 字段规范化 + 类型后处理）
// 红线: 任一行验证失败即整个文件转换失败，由导入管理器丢弃该文件
// ==========================================

pub mod community;
pub mod community_report;
pub mod document;
pub mod entity;
pub mod relationship;
pub mod text_unit;

use crate::config::{BusinessRules, EntityTypeConfig, Registry};
use crate::domain::{BusinessRecord, CellValue, Coercion, EntityType, RawRow};

use super::error::{ImportError, ImportResult};
use super::normalize;

pub use community::CommunityConverter;
pub use community_report::CommunityReportConverter;
pub use document::DocumentConverter;
pub use entity::EntityConverter;
pub use relationship::RelationshipConverter;
pub use text_unit::TextUnitConverter;

/// 单类型记录转换器
///
/// convert 处理单行，post_process 在全部行转换完成后做跨记录整理
pub trait RecordConverter: Send + Sync {
    fn entity_type(&self) -> EntityType;

    fn convert(&self, row: &RawRow) -> ImportResult<BusinessRecord>;

    fn post_process(&self, _records: &mut Vec<BusinessRecord>) -> ImportResult<()> {
        Ok(())
    }
}

/// 按类型构造转换器
pub fn converter_for(
    registry: &Registry,
    entity_type: EntityType,
    coercion: Coercion,
) -> Box<dyn RecordConverter> {
    let config = registry.get(entity_type);
    let rules = registry.rules(entity_type).business.clone();
    match entity_type {
        EntityType::TextUnit => Box::new(TextUnitConverter::new(config, rules, coercion)),
        EntityType::Document => Box::new(DocumentConverter::new(config, rules, coercion)),
        EntityType::Entity => Box::new(EntityConverter::new(config, rules, coercion)),
        EntityType::Relationship => Box::new(RelationshipConverter::new(config, rules, coercion)),
        EntityType::Community => Box::new(CommunityConverter::new(config, rules, coercion)),
        EntityType::CommunityReport => {
            Box::new(CommunityReportConverter::new(config, rules, coercion))
        }
    }
}

// ===== 共享转换管线 =====

/// 业务层验证（必填字段 / 枚举约束，针对原始行）
pub(crate) fn validate_business(row: &RawRow, rules: &BusinessRules) -> ImportResult<()> {
    let missing: Vec<String> = rules
        .required_fields
        .iter()
        .filter(|f| !row.get(**f).map(CellValue::is_valid).unwrap_or(false))
        .map(|f| f.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingFields { fields: missing });
    }

    if let Some(valid) = rules.valid_types {
        if let Some(value) = row.get("type") {
            let text = value.stringify();
            if !valid.iter().any(|v| v.eq_ignore_ascii_case(&text)) {
                return Err(ImportError::InvalidType {
                    field: "type".to_string(),
                    value: text,
                    valid: valid.iter().map(|v| v.to_string()).collect(),
                });
            }
        }
    }

    Ok(())
}

/// 长度约束针对规范化后的记录，按字符串形态计长
/// （数值/列表取自 JSON 输入时同样受约束）
pub(crate) fn validate_lengths(
    record: &BusinessRecord,
    rules: &BusinessRules,
) -> ImportResult<()> {
    for rule in rules.length_rules {
        let Some(value) = record.get(rule.field) else { continue };
        let len = value.stringify().chars().count();
        if let Some(min) = rule.min {
            if len < min {
                return Err(ImportError::MinLength {
                    field: rule.field.to_string(),
                    len,
                    min,
                });
            }
        }
        if let Some(max) = rule.max {
            if len > max {
                return Err(ImportError::MaxLength {
                    field: rule.field.to_string(),
                    len,
                    max,
                });
            }
        }
    }
    Ok(())
}

/// 字段规范化
///
/// 先写入类型标签，再按配置顺序复制字段；同名业务字段（如 entity 的
/// `type` 语义类型）允许覆盖标签。无效值（Null/空文本/NaN）直接丢弃。
pub(crate) fn process_fields(
    row: &RawRow,
    config: &EntityTypeConfig,
    coercion: Coercion,
) -> ImportResult<BusinessRecord> {
    let mut record = BusinessRecord::new();
    record.insert(
        "type".to_string(),
        CellValue::Text(config.entity_type.as_str().to_string()),
    );

    for field in config.all_fields() {
        let Some(value) = row.get(field) else { continue };
        if !value.is_valid() {
            continue;
        }

        let normalized = if config.list_fields.contains(&field) {
            Some(normalize::coerce_list(value))
        } else if let Some((_, kind)) = config
            .numeric_fields
            .iter()
            .find(|(name, _)| *name == field)
        {
            normalize::coerce_numeric(field, value, *kind, coercion)?
        } else if config.date_fields.contains(&field) {
            Some(normalize::coerce_date(value))
        } else if config.json_fields.contains(&field) {
            Some(normalize::coerce_json(value))
        } else if config.text_fields.contains(&field) {
            Some(normalize::coerce_text(value))
        } else {
            Some(value.clone())
        };

        if let Some(v) = normalized {
            record.insert(field.to_string(), v);
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LengthRule;
    use std::collections::BTreeMap;

    fn row(pairs: &[(&str, CellValue)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn test_missing_required_fields_collected() {
        let rules = BusinessRules {
            required_fields: &["id", "text"],
            ..Default::default()
        };
        let err = validate_business(
            &row(&[("id", CellValue::Text("x".into())), ("text", CellValue::Null)]),
            &rules,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "[business.MISSING_FIELDS] 缺少必需字段: [\"text\"]");
    }

    #[test]
    fn test_length_rules() {
        let rules = BusinessRules {
            required_fields: &["text"],
            length_rules: &[LengthRule {
                field: "text",
                min: Some(2),
                max: Some(4),
            }],
            ..Default::default()
        };
        assert!(validate_lengths(&row(&[("text", CellValue::Text("abc".into()))]), &rules).is_ok());
        let err =
            validate_lengths(&row(&[("text", CellValue::Text("a".into()))]), &rules).unwrap_err();
        assert_eq!(err.code(), Some("MIN_LENGTH"));
        let err = validate_lengths(&row(&[("text", CellValue::Text("abcde".into()))]), &rules)
            .unwrap_err();
        assert_eq!(err.code(), Some("MAX_LENGTH"));
    }

    #[test]
    fn test_length_rules_apply_to_non_text_values() {
        // JSON 输入可能让长度约束字段落为数值/列表，按字符串形态计长
        let rules = BusinessRules {
            length_rules: &[LengthRule {
                field: "text",
                min: Some(2),
                max: None,
            }],
            ..Default::default()
        };
        let err = validate_lengths(&row(&[("text", CellValue::Int(5))]), &rules).unwrap_err();
        assert_eq!(err.code(), Some("MIN_LENGTH"));
        assert!(validate_lengths(&row(&[("text", CellValue::Int(42))]), &rules).is_ok());
    }

    #[test]
    fn test_type_tag_written_first_and_overwritable() {
        let registry = Registry::new();
        let config = registry.get(EntityType::Entity);
        let record = process_fields(
            &row(&[
                ("id", CellValue::Text("u-1".into())),
                ("title", CellValue::Text("ACME".into())),
                ("type", CellValue::Text("organization".into())),
                ("description", CellValue::Text("a company".into())),
            ]),
            config,
            Coercion::Lenient,
        )
        .unwrap();
        // entity 的语义类型覆盖了标签
        assert_eq!(record.get("type"), Some(&CellValue::Text("organization".into())));
    }

    #[test]
    fn test_tag_kept_when_no_type_field() {
        let registry = Registry::new();
        let config = registry.get(EntityType::TextUnit);
        let record = process_fields(
            &row(&[
                ("id", CellValue::Text("abc".into())),
                ("text", CellValue::Text("hello".into())),
            ]),
            config,
            Coercion::Lenient,
        )
        .unwrap();
        assert_eq!(record.get("type"), Some(&CellValue::Text("text_unit".into())));
    }

    #[test]
    fn test_invalid_values_dropped() {
        let registry = Registry::new();
        let config = registry.get(EntityType::TextUnit);
        let record = process_fields(
            &row(&[
                ("id", CellValue::Text("abc".into())),
                ("text", CellValue::Text("hello".into())),
                ("n_tokens", CellValue::Null),
            ]),
            config,
            Coercion::Lenient,
        )
        .unwrap();
        assert!(!record.contains_key("n_tokens"));
    }
}
