// ==========================================
// GraphRAG 图谱导入 - 文件加载器
// ==========================================
// 职责: 按实体类型的文件通配符定位数据文件，加载为统一的 RawTable
// 支持格式: csv / json / xlsx
// 红线: 缺少必需列立即报 [file.MISSING_COLUMNS]，不进入转换阶段
// ==========================================

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{TimeZone, Utc};
use tracing::{debug, warn};

use crate::config::{EntityTypeConfig, FileRules};
use crate::domain::{CellValue, RawRow, RawTable};

use super::error::{ImportError, ImportResult};

/// 文件加载器
pub struct FileLoader {
    data_dir: PathBuf,
}

impl FileLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        FileLoader {
            data_dir: data_dir.into(),
        }
    }

    /// 按类型配置的通配符查找数据文件（仅保留受支持格式，按文件名排序）
    pub fn find_files(
        &self,
        config: &EntityTypeConfig,
        rules: &FileRules,
    ) -> ImportResult<Vec<PathBuf>> {
        let pattern = self
            .data_dir
            .join(config.file_pattern)
            .to_string_lossy()
            .into_owned();
        let mut files: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| ImportError::FileReadError(e.to_string()))?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .filter(|p| {
                extension_of(p)
                    .map(|ext| rules.supported_formats.contains(&ext.as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        debug!(
            entity_type = config.type_name(),
            pattern = %pattern,
            count = files.len(),
            "定位数据文件"
        );
        Ok(files)
    }

    /// 加载单个文件为 RawTable，并校验必需列
    pub fn load(&self, path: &Path, rules: &FileRules) -> ImportResult<RawTable> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let ext = extension_of(path).unwrap_or_default();
        if !rules.supported_formats.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat {
                ext,
                supported: rules
                    .supported_formats
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            });
        }

        let table = match ext.as_str() {
            "csv" => load_csv(path)?,
            "json" => load_json(path)?,
            "xlsx" => load_xlsx(path)?,
            other => {
                return Err(ImportError::UnsupportedFormat {
                    ext: other.to_string(),
                    supported: rules
                        .supported_formats
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                })
            }
        };

        check_required_columns(&table, rules)?;
        Ok(table)
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

fn check_required_columns(table: &RawTable, rules: &FileRules) -> ImportResult<()> {
    let missing: Vec<String> = rules
        .required_columns
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::MissingColumns { columns: missing })
    }
}

fn load_csv(path: &Path) -> ImportResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: RawRow = BTreeMap::new();
        for (i, col) in columns.iter().enumerate() {
            let raw = record.get(i).unwrap_or("");
            row.insert(col.clone(), csv_cell(raw));
        }
        rows.push(row);
    }
    Ok(RawTable { columns, rows })
}

// CSV 无类型信息，保守推断: 空→Null，其余保留文本（由规范化阶段按字段语义转换）
fn csv_cell(raw: &str) -> CellValue {
    if raw.trim().is_empty() {
        CellValue::Null
    } else {
        CellValue::Text(raw.to_string())
    }
}

fn load_json(path: &Path) -> ImportResult<RawTable> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let records = match value {
        serde_json::Value::Array(items) => items,
        // 单对象文件按单行表处理
        obj @ serde_json::Value::Object(_) => vec![obj],
        other => {
            return Err(ImportError::JsonParseError(format!(
                "期望对象数组，得到 {other}"
            )))
        }
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    for item in &records {
        let obj = item.as_object().ok_or_else(|| {
            ImportError::JsonParseError("数组元素必须是对象".to_string())
        })?;
        let mut row: RawRow = BTreeMap::new();
        for (key, val) in obj {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
            row.insert(key.clone(), CellValue::from_json(val));
        }
        rows.push(row);
    }
    Ok(RawTable { columns, rows })
}

fn load_xlsx(path: &Path) -> ImportResult<RawTable> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::ExcelParseError("工作簿没有工作表".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

    let mut iter = range.rows();
    let header = iter
        .next()
        .ok_or_else(|| ImportError::ExcelParseError("工作表为空".to_string()))?;
    let columns: Vec<String> = header
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for cells in iter {
        let mut row: RawRow = BTreeMap::new();
        let mut all_empty = true;
        for (i, col) in columns.iter().enumerate() {
            if col.is_empty() {
                continue;
            }
            let value = cells.get(i).map(excel_cell).unwrap_or(CellValue::Null);
            if !value.is_null() {
                all_empty = false;
            }
            row.insert(col.clone(), value);
        }
        // 跳过整行为空的尾部行
        if all_empty {
            warn!(file = %path.display(), "跳过空行");
            continue;
        }
        rows.push(row);
    }
    Ok(RawTable { columns, rows })
}

fn excel_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Int(n) => CellValue::Int(*n),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::Timestamp(Utc.from_utc_datetime(&naive)),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("{e:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FORMATS;
    use std::io::Write;

    fn file_rules() -> FileRules {
        FileRules {
            supported_formats: DEFAULT_FORMATS,
            required_columns: &["id", "text"],
        }
    }

    #[test]
    fn test_load_csv_with_required_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text_units.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "id,text,n_tokens").unwrap();
        writeln!(f, "abc,hello world,12").unwrap();
        writeln!(f, "def,second,").unwrap();
        drop(f);

        let loader = FileLoader::new(dir.path());
        let table = loader.load(&path, &file_rules()).unwrap();
        assert_eq!(table.columns, vec!["id", "text", "n_tokens"]);
        assert_eq!(table.rows.len(), 2);
        // CSV 保留文本，空单元格为 Null
        assert_eq!(
            table.rows[0].get("n_tokens"),
            Some(&CellValue::Text("12".into()))
        );
        assert_eq!(table.rows[1].get("n_tokens"), Some(&CellValue::Null));
    }

    #[test]
    fn test_missing_columns_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text_units.csv");
        std::fs::write(&path, "id,n_tokens\nabc,12\n").unwrap();

        let loader = FileLoader::new(dir.path());
        let err = loader.load(&path, &file_rules()).unwrap_err();
        assert_eq!(err.code(), Some("MISSING_COLUMNS"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileLoader::new(dir.path());
        let err = loader
            .load(&dir.path().join("nope.csv"), &file_rules())
            .unwrap_err();
        assert_eq!(err.code(), Some("NOT_FOUND"));
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text_units.parquet");
        std::fs::write(&path, b"PAR1").unwrap();

        let loader = FileLoader::new(dir.path());
        let err = loader.load(&path, &file_rules()).unwrap_err();
        assert_eq!(err.code(), Some("FORMAT"));
    }

    #[test]
    fn test_load_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text_units.json");
        std::fs::write(
            &path,
            r#"[{"id": "abc", "text": "hi", "n_tokens": 3}, {"id": "def", "text": "yo"}]"#,
        )
        .unwrap();

        let loader = FileLoader::new(dir.path());
        let table = loader.load(&path, &file_rules()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("n_tokens"), Some(&CellValue::Int(3)));
    }

    #[test]
    fn test_find_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_text_units.csv"), "id,text\n").unwrap();
        std::fs::write(dir.path().join("a_text_units.json"), "[]").unwrap();
        std::fs::write(dir.path().join("text_units.parquet"), "x").unwrap();

        let loader = FileLoader::new(dir.path());
        let registry = crate::config::Registry::new();
        let config = registry.get(crate::domain::EntityType::TextUnit);
        let files = loader.find_files(config, &file_rules()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_text_units.json", "b_text_units.csv"]);
    }
}
