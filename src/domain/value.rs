// ==========================================
// GraphRAG 图谱导入 - 单元格值模型
// ==========================================
// 职责: 表格数据的弱类型值表示，贯穿 文件加载 → 业务转换
// 说明: 时间戳/二进制作为独立变体保留，技术格式化时统一降级为 JSON
// ==========================================

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

// ==========================================
// CellValue - 单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
    List(Vec<CellValue>),
    Map(BTreeMap<String, CellValue>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// 值是否有效（非 Null、非空列表、非全空白文本之外的空串）
    ///
    /// 对齐上游对 None/NaN/空数组 的统一判空口径
    pub fn is_valid(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Float(f) => !f.is_nan(),
            CellValue::Text(s) => !s.is_empty(),
            CellValue::List(items) => !items.is_empty(),
            _ => true,
        }
    }

    /// 文本视图（仅 Text 变体）
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 标量转字符串（文本字段/ID 字符串化口径）
    pub fn stringify(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            CellValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            CellValue::List(items) => items
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| v.stringify())
                .collect::<Vec<_>>()
                .join("; "),
            CellValue::Map(_) => self.to_json().to_string(),
        }
    }

    /// 从 serde_json::Value 构造（JSON 文件加载路径）
    pub fn from_json(value: &Value) -> CellValue {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Int(i)
                } else {
                    CellValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Array(items) => CellValue::List(items.iter().map(CellValue::from_json).collect()),
            Value::Object(map) => CellValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// 降级为 JSON 值（不做存储层系的空值/空串过滤，见 formatter）
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Int(i) => Value::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            CellValue::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            CellValue::List(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
            CellValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid() {
        assert!(!CellValue::Null.is_valid());
        assert!(!CellValue::Float(f64::NAN).is_valid());
        assert!(!CellValue::Text(String::new()).is_valid());
        assert!(!CellValue::List(vec![]).is_valid());
        assert!(CellValue::Int(0).is_valid());
        assert!(CellValue::Text("x".into()).is_valid());
    }

    #[test]
    fn test_stringify_list_joins_semicolon() {
        let list = CellValue::List(vec![
            CellValue::Text("a".into()),
            CellValue::Null,
            CellValue::Int(3),
        ]);
        assert_eq!(list.stringify(), "a; 3");
    }

    #[test]
    fn test_from_json_round_trip() {
        let v: Value = serde_json::json!({"a": 1, "b": [1.5, "x"], "c": null});
        let cell = CellValue::from_json(&v);
        assert_eq!(cell.to_json(), v);
    }
}
