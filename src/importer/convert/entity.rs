use crate::config::{BusinessRules, EntityTypeConfig};
use crate::domain::{BusinessRecord, CellValue, Coercion, EntityType, RawRow};

use super::super::error::ImportResult;
use super::{process_fields, validate_business, validate_lengths, RecordConverter};

/// 实体转换器
///
/// 语义类型字段 `type` 覆盖类型标签；配置了 valid_types 时做枚举校验
pub struct EntityConverter {
    config: &'static EntityTypeConfig,
    rules: BusinessRules,
    coercion: Coercion,
}

impl EntityConverter {
    pub fn new(config: &'static EntityTypeConfig, rules: BusinessRules, coercion: Coercion) -> Self {
        Self {
            config,
            rules,
            coercion,
        }
    }
}

impl RecordConverter for EntityConverter {
    fn entity_type(&self) -> EntityType {
        EntityType::Entity
    }

    fn convert(&self, row: &RawRow) -> ImportResult<BusinessRecord> {
        validate_business(row, &self.rules)?;
        let mut record = process_fields(row, self.config, self.coercion)?;
        validate_lengths(&record, &self.rules)?;
        // 语义类型统一去除首尾空白
        let trimmed = match record.get("type") {
            Some(CellValue::Text(t)) if t.trim() != t => Some(t.trim().to_string()),
            _ => None,
        };
        if let Some(t) = trimmed {
            record.insert("type".to_string(), CellValue::Text(t));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Registry;

    fn converter() -> EntityConverter {
        let registry = Registry::new();
        EntityConverter::new(
            registry.get(EntityType::Entity),
            registry.rules(EntityType::Entity).business.clone(),
            Coercion::Lenient,
        )
    }

    fn base_row() -> RawRow {
        [
            (
                "id".to_string(),
                CellValue::Text("aaaaaaaa-1111-2222-3333-444444444444".into()),
            ),
            ("title".to_string(), CellValue::Text("ACME".into())),
            ("type".to_string(), CellValue::Text(" organization ".into())),
            ("description".to_string(), CellValue::Text("a company".into())),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_semantic_type_overrides_tag() {
        let record = converter().convert(&base_row()).unwrap();
        assert_eq!(
            record.get("type"),
            Some(&CellValue::Text("organization".into()))
        );
    }

    #[test]
    fn test_coordinates_coerced_to_float() {
        let mut row = base_row();
        row.insert("x".to_string(), CellValue::Text("1.5".into()));
        row.insert("y".to_string(), CellValue::Int(2));
        let record = converter().convert(&row).unwrap();
        assert_eq!(record.get("x"), Some(&CellValue::Float(1.5)));
        assert_eq!(record.get("y"), Some(&CellValue::Float(2.0)));
    }

    #[test]
    fn test_bad_degree_dropped_in_lenient_mode() {
        let mut row = base_row();
        row.insert("degree".to_string(), CellValue::Text("很多".into()));
        let record = converter().convert(&row).unwrap();
        assert!(!record.contains_key("degree"));
    }
}
