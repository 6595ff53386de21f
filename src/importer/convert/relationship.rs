use std::collections::BTreeSet;

use tracing::warn;

use crate::config::{BusinessRules, EntityTypeConfig};
use crate::domain::{BusinessRecord, CellValue, Coercion, EntityType, RawRow};

use super::super::error::ImportResult;
use super::{process_fields, validate_business, validate_lengths, RecordConverter};

/// 关系转换器
///
/// weight 缺失时补默认值 1.0；后处理按 (source, target) 去重，
/// 同批内保留首条
pub struct RelationshipConverter {
    config: &'static EntityTypeConfig,
    rules: BusinessRules,
    coercion: Coercion,
}

impl RelationshipConverter {
    pub fn new(config: &'static EntityTypeConfig, rules: BusinessRules, coercion: Coercion) -> Self {
        Self {
            config,
            rules,
            coercion,
        }
    }
}

impl RecordConverter for RelationshipConverter {
    fn entity_type(&self) -> EntityType {
        EntityType::Relationship
    }

    fn convert(&self, row: &RawRow) -> ImportResult<BusinessRecord> {
        validate_business(row, &self.rules)?;
        let mut record = process_fields(row, self.config, self.coercion)?;
        validate_lengths(&record, &self.rules)?;
        record
            .entry("weight".to_string())
            .or_insert(CellValue::Float(1.0));
        Ok(record)
    }

    fn post_process(&self, records: &mut Vec<BusinessRecord>) -> ImportResult<()> {
        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
        let before = records.len();
        records.retain(|r| {
            let key = (
                r.get("source").map(CellValue::stringify).unwrap_or_default(),
                r.get("target").map(CellValue::stringify).unwrap_or_default(),
            );
            seen.insert(key)
        });
        let dropped = before - records.len();
        if dropped > 0 {
            warn!(dropped, "同批内重复的 (source, target) 关系已去重");
        }
        Ok(())
    }
}
