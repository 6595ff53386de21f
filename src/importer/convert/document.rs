use crate::config::{BusinessRules, EntityTypeConfig};
use crate::domain::{BusinessRecord, Coercion, EntityType, RawRow};

use super::super::error::ImportResult;
use super::{process_fields, validate_business, validate_lengths, RecordConverter};

/// 文档转换器
///
/// creation_date 走日期规范化（解析失败保留原文本），metadata 走 JSON 校验
pub struct DocumentConverter {
    config: &'static EntityTypeConfig,
    rules: BusinessRules,
    coercion: Coercion,
}

impl DocumentConverter {
    pub fn new(config: &'static EntityTypeConfig, rules: BusinessRules, coercion: Coercion) -> Self {
        Self {
            config,
            rules,
            coercion,
        }
    }
}

impl RecordConverter for DocumentConverter {
    fn entity_type(&self) -> EntityType {
        EntityType::Document
    }

    fn convert(&self, row: &RawRow) -> ImportResult<BusinessRecord> {
        validate_business(row, &self.rules)?;
        let record = process_fields(row, self.config, self.coercion)?;
        validate_lengths(&record, &self.rules)?;
        Ok(record)
    }
}
