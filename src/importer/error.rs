// ==========================================
// GraphRAG 图谱导入 - 导入模块错误类型
// ==========================================
// 分层: file（文件层）/ business（业务层）/ storage（存储层）/ 传输层
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
///
/// Display 统一携带 `[层.错误码]` 前缀，便于日志归因
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件层 =====
    #[error("[file.NOT_FOUND] 文件不存在: {0}")]
    FileNotFound(String),

    #[error("[file.FORMAT] 不支持的文件格式: {ext}（支持: {supported:?}）")]
    UnsupportedFormat {
        ext: String,
        supported: Vec<String>,
    },

    #[error("[file.MISSING_COLUMNS] 缺少必需列: {columns:?}")]
    MissingColumns { columns: Vec<String> },

    #[error("[file.READ] 文件读取失败: {0}")]
    FileReadError(String),

    #[error("[file.PARSE] CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("[file.PARSE] Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("[file.PARSE] JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 业务层 =====
    #[error("[business.MISSING_FIELDS] 缺少必需字段: {fields:?}")]
    MissingFields { fields: Vec<String> },

    #[error("[business.MIN_LENGTH] 字段 {field} 长度 {len} 小于最小长度 {min}")]
    MinLength {
        field: String,
        len: usize,
        min: usize,
    },

    #[error("[business.MAX_LENGTH] 字段 {field} 长度 {len} 大于最大长度 {max}")]
    MaxLength {
        field: String,
        len: usize,
        max: usize,
    },

    #[error("[business.INVALID_TYPE] 字段 {field} 值不在有效范围: {value}（有效值: {valid:?}）")]
    InvalidType {
        field: String,
        value: String,
        valid: Vec<String>,
    },

    #[error("[business.MIN_MEMBERS] 社区 {id} 成员为空（至少需要 {min} 个成员）")]
    MinMembers { id: String, min: usize },

    #[error("[business.NUMERIC] 字段 {field} 无法转换为数值: {value}")]
    NumericCoercion { field: String, value: String },

    // ===== 存储层 =====
    #[error("[storage.ID_FORMAT] ID 格式不符合 {expected} 规则: {id}")]
    IdFormat { id: String, expected: String },

    #[error("[storage.UNIQUE] ID 已存在: {id}")]
    Unique { id: String, existing_uid: String },

    #[error("[storage.COMPOSITE_UNIQUE] 记录已存在: {detail}")]
    CompositeUnique { detail: String },

    // ===== 传输 / 事务 =====
    #[error("[store.CONNECTION] 存储连接失败: {0}")]
    StoreConnection(String),

    #[error("[store.TRANSACTION] 事务操作失败: {0}")]
    StoreTransaction(String),

    #[error("[store.QUERY] 查询失败: {0}")]
    StoreQuery(String),

    #[error("[store.MUTATION] 变更提交失败: {0}")]
    StoreMutation(String),

    // ===== 通用 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 所属验证层（传输/通用错误返回 None）
    pub fn layer(&self) -> Option<&'static str> {
        match self {
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat { .. }
            | ImportError::MissingColumns { .. }
            | ImportError::FileReadError(_)
            | ImportError::CsvParseError(_)
            | ImportError::ExcelParseError(_)
            | ImportError::JsonParseError(_) => Some("file"),
            ImportError::MissingFields { .. }
            | ImportError::MinLength { .. }
            | ImportError::MaxLength { .. }
            | ImportError::InvalidType { .. }
            | ImportError::MinMembers { .. }
            | ImportError::NumericCoercion { .. } => Some("business"),
            ImportError::IdFormat { .. }
            | ImportError::Unique { .. }
            | ImportError::CompositeUnique { .. } => Some("storage"),
            _ => None,
        }
    }

    /// 错误码（与 Display 前缀一致）
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ImportError::FileNotFound(_) => Some("NOT_FOUND"),
            ImportError::UnsupportedFormat { .. } => Some("FORMAT"),
            ImportError::MissingColumns { .. } => Some("MISSING_COLUMNS"),
            ImportError::MissingFields { .. } => Some("MISSING_FIELDS"),
            ImportError::MinLength { .. } => Some("MIN_LENGTH"),
            ImportError::MaxLength { .. } => Some("MAX_LENGTH"),
            ImportError::InvalidType { .. } => Some("INVALID_TYPE"),
            ImportError::MinMembers { .. } => Some("MIN_MEMBERS"),
            ImportError::NumericCoercion { .. } => Some("NUMERIC"),
            ImportError::IdFormat { .. } => Some("ID_FORMAT"),
            ImportError::Unique { .. } => Some("UNIQUE"),
            ImportError::CompositeUnique { .. } => Some("COMPOSITE_UNIQUE"),
            _ => None,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}

// 实现 From<reqwest::Error>
impl From<reqwest::Error> for ImportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ImportError::StoreConnection(err.to_string())
        } else {
            ImportError::StoreTransaction(err.to_string())
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
