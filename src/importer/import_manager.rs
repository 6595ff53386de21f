// ==========================================
// GraphRAG 图谱导入 - 导入管理器
// ==========================================
// 职责: 单类型的文件发现 → 并行加载 → 记录转换 → 类型后处理
// 红线: 单文件失败只记录该文件的错误，其余文件照常导入
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::{FileRules, ImportOptions, Registry};
use crate::domain::{BusinessRecord, EntityType, RawTable};

use super::convert::{converter_for, RecordConverter};
use super::error::{ImportError, ImportResult};
use super::file_loader::FileLoader;

/// 单类型收集结果
#[derive(Debug, Default)]
pub struct Collected {
    pub records: Vec<BusinessRecord>,
    /// 文件级与记录级错误
    pub errors: Vec<String>,
    pub files: usize,
}

/// 导入管理器
pub struct ImportManager {
    registry: Arc<Registry>,
    options: ImportOptions,
}

impl ImportManager {
    pub fn new(registry: Arc<Registry>, options: ImportOptions) -> Self {
        Self { registry, options }
    }

    /// 收集单类型的全部业务记录
    ///
    /// 文件按名称顺序加载（结果顺序与文件顺序一致），加载走阻塞线程池
    pub async fn collect(&self, entity_type: EntityType) -> ImportResult<Collected> {
        let config = self.registry.get(entity_type);
        let file_rules = self.registry.rules(entity_type).file.clone();
        let loader = FileLoader::new(&self.options.data_dir);
        let files = loader.find_files(config, &file_rules)?;
        if files.is_empty() {
            info!(%entity_type, "未发现数据文件");
            return Ok(Collected::default());
        }

        let tables = load_files_parallel(&self.options.data_dir, &files, &file_rules).await;

        let converter = converter_for(&self.registry, entity_type, self.options.coercion);
        let mut collected = Collected {
            files: files.len(),
            ..Collected::default()
        };
        for (path, table) in files.iter().zip(tables) {
            let name = file_name(path);
            match table {
                Ok(table) => convert_table(&*converter, &name, &table, &mut collected),
                Err(e) => {
                    warn!(file = %name, error = %e, "文件加载失败，跳过该文件");
                    collected.errors.push(format!("{name}: {e}"));
                }
            }
        }

        converter.post_process(&mut collected.records)?;
        info!(
            %entity_type,
            files = collected.files,
            records = collected.records.len(),
            errors = collected.errors.len(),
            "记录收集完成"
        );
        Ok(collected)
    }
}

async fn load_files_parallel(
    data_dir: &Path,
    files: &[PathBuf],
    rules: &FileRules,
) -> Vec<ImportResult<RawTable>> {
    let tasks: Vec<_> = files
        .iter()
        .map(|path| {
            let loader = FileLoader::new(data_dir.to_path_buf());
            let path = path.clone();
            let rules = rules.clone();
            tokio::task::spawn_blocking(move || loader.load(&path, &rules))
        })
        .collect();

    join_all(tasks)
        .await
        .into_iter()
        .map(|joined| match joined {
            Ok(result) => result,
            Err(e) => Err(ImportError::FileReadError(format!("加载任务失败: {e}"))),
        })
        .collect()
}

/// 单文件转换（任一行失败则整个文件作废，不保留已转换的行）
fn convert_table(
    converter: &dyn RecordConverter,
    file: &str,
    table: &RawTable,
    collected: &mut Collected,
) {
    let mut records = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        match converter.convert(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(file = %file, row = i + 1, error = %e, "记录转换失败，放弃整个文件");
                collected
                    .errors
                    .push(format!("{file} 第 {} 行: {e}", i + 1));
                return;
            }
        }
    }
    collected.records.extend(records);
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
