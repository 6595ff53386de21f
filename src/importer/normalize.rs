// ==========================================
// GraphRAG 图谱导入 - 字段规范化
// ==========================================
// 职责: 单元格值到业务字段的规范化（数值/日期/列表/JSON）
// 红线: 宽松模式下规范化失败丢弃字段，不中断整行
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::domain::{CellValue, Coercion, NumericKind};

use super::error::{ImportError, ImportResult};

/// 数值规范化
///
/// 宽松模式: 失败返回 Ok(None)，调用方丢弃该字段；
/// 严格模式: 失败返回业务层错误。
pub fn coerce_numeric(
    field: &str,
    value: &CellValue,
    kind: NumericKind,
    coercion: Coercion,
) -> ImportResult<Option<CellValue>> {
    let coerced = try_coerce_numeric(value, kind);
    match coerced {
        Some(v) => Ok(Some(v)),
        None => match coercion {
            Coercion::Lenient => Ok(None),
            Coercion::Strict => Err(ImportError::NumericCoercion {
                field: field.to_string(),
                value: value.stringify(),
            }),
        },
    }
}

fn try_coerce_numeric(value: &CellValue, kind: NumericKind) -> Option<CellValue> {
    match (value, kind) {
        (CellValue::Int(n), NumericKind::Int) => Some(CellValue::Int(*n)),
        (CellValue::Int(n), NumericKind::Float) => Some(CellValue::Float(*n as f64)),
        (CellValue::Float(f), NumericKind::Float) => Some(CellValue::Float(*f)),
        // 浮点转整数仅接受无小数部分的值
        (CellValue::Float(f), NumericKind::Int) => {
            if f.fract() == 0.0 && f.is_finite() {
                Some(CellValue::Int(*f as i64))
            } else {
                None
            }
        }
        (CellValue::Bool(b), NumericKind::Int) => Some(CellValue::Int(i64::from(*b))),
        (CellValue::Text(s), _) => {
            let t = s.trim();
            if t.is_empty() {
                return None;
            }
            match kind {
                NumericKind::Int => t
                    .parse::<i64>()
                    .ok()
                    .map(CellValue::Int)
                    .or_else(|| try_coerce_numeric(&CellValue::Float(t.parse().ok()?), kind)),
                NumericKind::Float => t.parse::<f64>().ok().map(CellValue::Float),
            }
        }
        _ => None,
    }
}

/// 日期规范化
///
/// 解析失败时原样保留文本值（下游按字符串存储），与数值字段的丢弃策略不同。
pub fn coerce_date(value: &CellValue) -> CellValue {
    match value {
        CellValue::Timestamp(ts) => CellValue::Timestamp(*ts),
        CellValue::Text(s) => match parse_datetime(s.trim()) {
            Some(ts) => CellValue::Timestamp(ts),
            None => value.clone(),
        },
        // 整数按 Unix 秒解释
        CellValue::Int(n) => match Utc.timestamp_opt(*n, 0).single() {
            Some(ts) => CellValue::Timestamp(ts),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];
    for fmt in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }
    None
}

/// 列表规范化
///
/// 文本按 JSON 数组优先解析，失败时退化为逗号分隔；已是列表的原样保留。
pub fn coerce_list(value: &CellValue) -> CellValue {
    match value {
        CellValue::List(_) => value.clone(),
        CellValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return CellValue::List(Vec::new());
            }
            if t.starts_with('[') {
                if let Ok(json) = serde_json::from_str::<serde_json::Value>(t) {
                    if json.is_array() {
                        return CellValue::from_json(&json);
                    }
                }
            }
            CellValue::List(
                t.split(',')
                    .map(|p| p.trim())
                    .filter(|p| !p.is_empty())
                    .map(|p| CellValue::Text(p.to_string()))
                    .collect(),
            )
        }
        CellValue::Null => CellValue::List(Vec::new()),
        other => CellValue::List(vec![other.clone()]),
    }
}

/// JSON 字段规范化
///
/// 校验文本确实是合法 JSON 并重新序列化为紧凑文本；
/// 结构化值直接序列化。非法 JSON 原样保留。
pub fn coerce_json(value: &CellValue) -> CellValue {
    match value {
        CellValue::Text(s) => match serde_json::from_str::<serde_json::Value>(s.trim()) {
            Ok(json) => match serde_json::to_string(&json) {
                Ok(compact) => CellValue::Text(compact),
                Err(_) => value.clone(),
            },
            Err(_) => value.clone(),
        },
        CellValue::Map(_) | CellValue::List(_) => match serde_json::to_string(&value.to_json()) {
            Ok(compact) => CellValue::Text(compact),
            Err(_) => value.clone(),
        },
        _ => value.clone(),
    }
}

/// 文本规范化
///
/// 可迭代值（列表）用 "; " 连接为单一文本，其它值 stringify。
pub fn coerce_text(value: &CellValue) -> CellValue {
    match value {
        CellValue::Text(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.stringify()),
    }
}
