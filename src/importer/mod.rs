// ==========================================
// GraphRAG 图谱导入 - 导入层
// ==========================================
// 数据流: 文件发现/加载 → 记录转换 → 技术格式化 → 存储验证 → 批量落库
// ==========================================

pub mod batch_importer;
pub mod convert;
pub mod error;
pub mod file_loader;
pub mod formatter;
pub mod graph_importer;
pub mod import_manager;
pub mod normalize;
pub mod storage_validator;

pub use batch_importer::BatchImporter;
pub use convert::{converter_for, RecordConverter};
pub use error::{ImportError, ImportResult};
pub use file_loader::FileLoader;
pub use formatter::TechnicalFormatter;
pub use graph_importer::GraphImporter;
pub use import_manager::{Collected, ImportManager};
pub use storage_validator::{Conflict, StorageValidator};
