use crate::config::{BusinessRules, EntityTypeConfig};
use crate::domain::{BusinessRecord, CellValue, Coercion, EntityType, RawRow};

use super::super::error::{ImportError, ImportResult};
use super::{process_fields, validate_business, validate_lengths, RecordConverter};

/// 社区转换器
///
/// members 缺失时回退到 entity_ids；成员仍为空按业务规则拒绝。
/// 后处理补齐 parent 默认值并按 level 升序排列，保证父社区先落库。
pub struct CommunityConverter {
    config: &'static EntityTypeConfig,
    rules: BusinessRules,
    coercion: Coercion,
}

impl CommunityConverter {
    pub fn new(config: &'static EntityTypeConfig, rules: BusinessRules, coercion: Coercion) -> Self {
        Self {
            config,
            rules,
            coercion,
        }
    }
}

impl RecordConverter for CommunityConverter {
    fn entity_type(&self) -> EntityType {
        EntityType::Community
    }

    fn convert(&self, row: &RawRow) -> ImportResult<BusinessRecord> {
        validate_business(row, &self.rules)?;
        let mut record = process_fields(row, self.config, self.coercion)?;
        validate_lengths(&record, &self.rules)?;

        let members_empty = !record.get("members").map(CellValue::is_valid).unwrap_or(false);
        if members_empty {
            let fallback = match record.get("entity_ids") {
                Some(v @ CellValue::List(_)) if v.is_valid() => Some(v.clone()),
                _ => None,
            };
            match fallback {
                Some(v) => {
                    record.insert("members".to_string(), v);
                }
                None => {
                    record.remove("members");
                }
            }
        }

        if let Some(min) = self.rules.min_members {
            let count = match record.get("members") {
                Some(CellValue::List(items)) => items.len(),
                _ => 0,
            };
            if count < min {
                let id = record.get("id").map(CellValue::stringify).unwrap_or_default();
                return Err(ImportError::MinMembers { id, min });
            }
        }

        Ok(record)
    }

    fn post_process(&self, records: &mut Vec<BusinessRecord>) -> ImportResult<()> {
        for record in records.iter_mut() {
            // 根社区 parent 统一为 -1
            record
                .entry("parent".to_string())
                .or_insert(CellValue::Int(-1));
        }
        records.sort_by_key(|r| match r.get("level") {
            Some(CellValue::Int(n)) => *n,
            _ => i64::MAX,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Registry;

    fn converter() -> CommunityConverter {
        let registry = Registry::new();
        CommunityConverter::new(
            registry.get(EntityType::Community),
            registry.rules(EntityType::Community).business.clone(),
            Coercion::Lenient,
        )
    }

    fn community_row(id: &str, level: i64, entity_ids: &str) -> RawRow {
        [
            ("id".to_string(), CellValue::Text(id.to_string())),
            ("community".to_string(), CellValue::Int(7)),
            ("level".to_string(), CellValue::Int(level)),
            ("title".to_string(), CellValue::Text("社区 7".into())),
            (
                "entity_ids".to_string(),
                CellValue::Text(entity_ids.to_string()),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_members_fallback_to_entity_ids() {
        let record = converter()
            .convert(&community_row(
                "aaaaaaaa-1111-2222-3333-444444444444",
                0,
                "e1,e2",
            ))
            .unwrap();
        assert_eq!(
            record.get("members"),
            Some(&CellValue::List(vec![
                CellValue::Text("e1".into()),
                CellValue::Text("e2".into())
            ]))
        );
    }

    #[test]
    fn test_empty_members_rejected() {
        let err = converter()
            .convert(&community_row(
                "aaaaaaaa-1111-2222-3333-444444444444",
                0,
                "",
            ))
            .unwrap_err();
        assert_eq!(err.code(), Some("MIN_MEMBERS"));
    }

    #[test]
    fn test_post_process_orders_by_level_and_defaults_parent() {
        let conv = converter();
        let mut records = vec![
            conv.convert(&community_row("aaaaaaaa-1111-2222-3333-444444444441", 2, "e1"))
                .unwrap(),
            conv.convert(&community_row("aaaaaaaa-1111-2222-3333-444444444442", 0, "e2"))
                .unwrap(),
        ];
        conv.post_process(&mut records).unwrap();
        assert_eq!(records[0].get("level"), Some(&CellValue::Int(0)));
        assert_eq!(records[0].get("parent"), Some(&CellValue::Int(-1)));
    }
}
