// ==========================================
// GraphRAG 图谱导入 - 导入编排器
// ==========================================
// 职责: 连通性检查 → 依赖序逐类型导入 → 汇总
// 红线: 连通性检查失败立即终止；单类型失败不阻断后续类型
// ==========================================

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::config::{ImportOptions, Registry};
use crate::domain::{EntityType, ImportSummary};
use crate::store::StoreClient;

use super::batch_importer::BatchImporter;
use super::error::ImportResult;
use super::import_manager::ImportManager;
use super::storage_validator::StorageValidator;

/// 图谱导入编排器
pub struct GraphImporter {
    registry: Arc<Registry>,
    client: Arc<dyn StoreClient>,
    options: ImportOptions,
}

impl GraphImporter {
    pub fn new(client: Arc<dyn StoreClient>, options: ImportOptions) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            client,
            options,
        }
    }

    /// 全类型导入（依赖序）
    pub async fn run(&self) -> ImportResult<ImportSummary> {
        self.run_types(&EntityType::IMPORT_ORDER).await
    }

    /// 指定类型导入
    ///
    /// 无论调用方传入顺序如何，实际执行总是按依赖序
    pub async fn run_types(&self, types: &[EntityType]) -> ImportResult<ImportSummary> {
        self.client.check_connection().await?;

        let started = Instant::now();
        let manager = ImportManager::new(Arc::clone(&self.registry), self.options.clone());
        let batcher = BatchImporter::new(
            self.client.as_ref(),
            self.options.batch_size,
            self.options.policy,
        );

        let mut summary = ImportSummary::default();
        for entity_type in self
            .registry
            .import_order()
            .iter()
            .filter(|t| types.contains(*t))
        {
            let collected = match manager.collect(*entity_type).await {
                Ok(collected) => collected,
                Err(e) => {
                    error!(%entity_type, error = %e, "记录收集失败，跳过该类型");
                    summary.errors.push(format!("{entity_type}: {e}"));
                    continue;
                }
            };
            summary.errors.extend(collected.errors);
            if collected.records.is_empty() {
                summary.counts.insert(*entity_type, 0);
                continue;
            }

            let validator = StorageValidator::new(
                *entity_type,
                self.registry.rules(*entity_type).storage.clone(),
            );
            let outcome = batcher
                .import_type(*entity_type, &validator, &collected.records)
                .await;
            info!(
                %entity_type,
                imported = outcome.imported,
                skipped = outcome.skipped,
                errors = outcome.errors.len(),
                "类型导入完成"
            );
            summary.counts.insert(*entity_type, outcome.imported);
            if outcome.skipped > 0 {
                summary.skipped.insert(*entity_type, outcome.skipped);
            }
            summary.errors.extend(outcome.errors);
        }

        summary.elapsed = started.elapsed();
        info!(
            total = summary.total(),
            errors = summary.errors.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "导入结束"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_requested_order_normalized_to_dependency_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("text_units.csv"),
            format!("id,text\n{},hello\n", "a".repeat(32)),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("documents.csv"),
            format!("id,title,text\n{},标题,正文\n", "d".repeat(32)),
        )
        .unwrap();

        let store = MemoryStore::new();
        let importer = GraphImporter::new(
            Arc::new(store.clone()),
            ImportOptions::new(dir.path()),
        );
        // 逆序传入
        let summary = importer
            .run_types(&[EntityType::Document, EntityType::TextUnit])
            .await
            .unwrap();
        assert_eq!(summary.counts.get(&EntityType::TextUnit), Some(&1));
        assert_eq!(summary.counts.get(&EntityType::Document), Some(&1));
        assert_eq!(store.node_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_dir_yields_zero_counts() {
        let dir = tempfile::tempdir().unwrap();
        let importer = GraphImporter::new(
            Arc::new(MemoryStore::new()),
            ImportOptions::new(dir.path()),
        );
        let summary = importer.run().await.unwrap();
        assert_eq!(summary.total(), 0);
        assert!(summary.errors.is_empty());
    }
}
