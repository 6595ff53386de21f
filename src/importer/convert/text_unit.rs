use crate::config::{BusinessRules, EntityTypeConfig};
use crate::domain::{BusinessRecord, Coercion, EntityType, RawRow};

use super::super::error::ImportResult;
use super::{process_fields, validate_business, validate_lengths, RecordConverter};

/// 文本块转换器
///
/// 无类型特有处理，走共享管线（text 长度上限由业务规则约束）
pub struct TextUnitConverter {
    config: &'static EntityTypeConfig,
    rules: BusinessRules,
    coercion: Coercion,
}

impl TextUnitConverter {
    pub fn new(config: &'static EntityTypeConfig, rules: BusinessRules, coercion: Coercion) -> Self {
        Self {
            config,
            rules,
            coercion,
        }
    }
}

impl RecordConverter for TextUnitConverter {
    fn entity_type(&self) -> EntityType {
        EntityType::TextUnit
    }

    fn convert(&self, row: &RawRow) -> ImportResult<BusinessRecord> {
        validate_business(row, &self.rules)?;
        let record = process_fields(row, self.config, self.coercion)?;
        validate_lengths(&record, &self.rules)?;
        Ok(record)
    }
}
