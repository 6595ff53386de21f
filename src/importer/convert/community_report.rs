use crate::config::{BusinessRules, EntityTypeConfig};
use crate::domain::{BusinessRecord, CellValue, Coercion, EntityType, RawRow};

use super::super::error::ImportResult;
use super::{process_fields, validate_business, validate_lengths, RecordConverter};

/// 社区报告转换器
///
/// full_content_json / findings 走 JSON 校验重序列化；
/// title 缺失时从 full_content_json 的 title 字段回填
pub struct CommunityReportConverter {
    config: &'static EntityTypeConfig,
    rules: BusinessRules,
    coercion: Coercion,
}

impl CommunityReportConverter {
    pub fn new(config: &'static EntityTypeConfig, rules: BusinessRules, coercion: Coercion) -> Self {
        Self {
            config,
            rules,
            coercion,
        }
    }
}

impl RecordConverter for CommunityReportConverter {
    fn entity_type(&self) -> EntityType {
        EntityType::CommunityReport
    }

    fn convert(&self, row: &RawRow) -> ImportResult<BusinessRecord> {
        validate_business(row, &self.rules)?;
        let mut record = process_fields(row, self.config, self.coercion)?;
        validate_lengths(&record, &self.rules)?;

        if !record.contains_key("title") {
            let title = record
                .get("full_content_json")
                .and_then(CellValue::as_text)
                .and_then(|s| serde_json::from_str::<serde_json::Value>(s).ok())
                .and_then(|json| {
                    json.get("title")
                        .and_then(|t| t.as_str().map(str::to_string))
                });
            if let Some(title) = title {
                record.insert("title".to_string(), CellValue::Text(title));
            }
        }

        Ok(record)
    }
}
