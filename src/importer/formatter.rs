// ==========================================
// GraphRAG 图谱导入 - 技术格式化器
// ==========================================
// 职责: 业务记录 → 存储层 JSON 变更体
// 约定: 语义 type 字段丢弃，只保留 dgraph.type 标签；Null 与纯空白
//       文本不上行；节点 uid 由存储端分配；时间戳 RFC3339；二进制按
//       UTF-8 优先、否则 base64
// ==========================================

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::SecondsFormat;
use serde_json::Value;

use crate::domain::{BusinessRecord, CellValue, EntityType, WireMutation};

use super::error::{ImportError, ImportResult};

/// 技术格式化器
///
/// 无状态，可跨类型共享
pub struct TechnicalFormatter;

impl TechnicalFormatter {
    pub fn new() -> Self {
        TechnicalFormatter
    }

    /// 单条记录格式化为变更体
    pub fn format(
        &self,
        entity_type: EntityType,
        record: &BusinessRecord,
    ) -> ImportResult<WireMutation> {
        if record.get("id").and_then(CellValue::as_text).is_none() {
            return Err(ImportError::MissingFields {
                fields: vec!["id".to_string()],
            });
        }

        let mut mutation = WireMutation::new();
        mutation.insert(
            "dgraph.type".to_string(),
            Value::String(entity_type.type_name().to_string()),
        );
        for (field, value) in record {
            // 语义 type 已由 dgraph.type 承载
            if field == "type" {
                continue;
            }
            match wire_value(value) {
                Value::Null => {}
                Value::String(s) if s.trim().is_empty() => {}
                v => {
                    mutation.insert(field.clone(), v);
                }
            }
        }
        Ok(mutation)
    }

    /// 整批格式化（批内顺序保持）
    pub fn format_batch(
        &self,
        entity_type: EntityType,
        records: &[BusinessRecord],
    ) -> ImportResult<Vec<WireMutation>> {
        records
            .iter()
            .map(|r| self.format(entity_type, r))
            .collect()
    }
}

impl Default for TechnicalFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn wire_value(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Int(n) => Value::from(*n),
        CellValue::Float(f) => Value::from(*f),
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::Timestamp(ts) => {
            Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        }
        CellValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::String(BASE64.encode(bytes)),
        },
        CellValue::List(items) => Value::Array(items.iter().map(wire_value).collect()),
        // 嵌套映射中的 Null 条目同样丢弃
        CellValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), wire_value(v)))
                .filter(|(_, v)| !v.is_null())
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_emits_type_tag_without_uid() {
        let record: BusinessRecord = [
            ("id".to_string(), CellValue::Text("abc/123".into())),
            ("text".to_string(), CellValue::Text("hello".into())),
        ]
        .into_iter()
        .collect();

        let m = TechnicalFormatter::new()
            .format(EntityType::TextUnit, &record)
            .unwrap();
        // uid 留给存储端分配，避免同批内派生名碰撞导致节点合并
        assert_eq!(m.get("uid"), None);
        assert_eq!(
            m.get("dgraph.type"),
            Some(&Value::String("TextUnit".into()))
        );
        assert_eq!(m.get("text"), Some(&Value::String("hello".into())));
    }

    #[test]
    fn test_semantic_type_and_blank_values_dropped() {
        let record: BusinessRecord = [
            ("id".to_string(), CellValue::Text("abc".into())),
            ("type".to_string(), CellValue::Text("text_unit".into())),
            ("note".to_string(), CellValue::Text("   ".into())),
            ("extra".to_string(), CellValue::Null),
            ("text".to_string(), CellValue::Text("hello".into())),
        ]
        .into_iter()
        .collect();

        let m = TechnicalFormatter::new()
            .format(EntityType::TextUnit, &record)
            .unwrap();
        assert_eq!(m.get("type"), None);
        assert_eq!(m.get("note"), None);
        assert_eq!(m.get("extra"), None);
        assert_eq!(
            m.get("dgraph.type"),
            Some(&Value::String("TextUnit".into()))
        );
    }

    #[test]
    fn test_nested_map_null_entries_dropped() {
        let nested: std::collections::BTreeMap<String, CellValue> = [
            ("kept".to_string(), CellValue::Int(1)),
            ("gone".to_string(), CellValue::Null),
        ]
        .into_iter()
        .collect();
        let record: BusinessRecord = [
            ("id".to_string(), CellValue::Text("abc".into())),
            ("attrs".to_string(), CellValue::Map(nested)),
        ]
        .into_iter()
        .collect();

        let m = TechnicalFormatter::new()
            .format(EntityType::TextUnit, &record)
            .unwrap();
        let attrs = m.get("attrs").and_then(Value::as_object).unwrap();
        assert_eq!(attrs.get("kept"), Some(&Value::from(1)));
        assert!(!attrs.contains_key("gone"));
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let record: BusinessRecord = [
            ("id".to_string(), CellValue::Text("d1".into())),
            ("creation_date".to_string(), CellValue::Timestamp(ts)),
        ]
        .into_iter()
        .collect();

        let m = TechnicalFormatter::new()
            .format(EntityType::Document, &record)
            .unwrap();
        assert_eq!(
            m.get("creation_date"),
            Some(&Value::String("2024-03-01T08:30:00Z".into()))
        );
    }

    #[test]
    fn test_bytes_utf8_else_base64() {
        let record: BusinessRecord = [
            ("id".to_string(), CellValue::Text("d1".into())),
            ("blob".to_string(), CellValue::Bytes(vec![0xff, 0xfe])),
            ("note".to_string(), CellValue::Bytes(b"plain".to_vec())),
        ]
        .into_iter()
        .collect();

        let m = TechnicalFormatter::new()
            .format(EntityType::Document, &record)
            .unwrap();
        assert_eq!(m.get("note"), Some(&Value::String("plain".into())));
        assert_eq!(m.get("blob"), Some(&Value::String(BASE64.encode([0xff, 0xfe]))));
    }

    #[test]
    fn test_missing_id_rejected() {
        let record: BusinessRecord =
            [("text".to_string(), CellValue::Text("x".into()))].into_iter().collect();
        let err = TechnicalFormatter::new()
            .format(EntityType::TextUnit, &record)
            .unwrap_err();
        assert_eq!(err.code(), Some("MISSING_FIELDS"));
    }
}
