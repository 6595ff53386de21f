// ==========================================
// GraphRAG 图谱导入 - 事务批量导入器
// ==========================================
// 职责: 业务记录按批落库，一个批次对应一个事务
// 红线: 批内任一变更/提交失败则整批放弃，继续下一批；
//       记录级错误只丢弃该条，不影响同批其余记录
// ==========================================

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::domain::{
    BusinessRecord, ConflictPolicy, EntityType, TypeImportOutcome, WireMutation,
};
use crate::store::{StoreClient, StoreTransaction};

use super::error::{ImportError, ImportResult};
use super::formatter::TechnicalFormatter;
use super::storage_validator::StorageValidator;

/// 单条记录的落库动作
enum Stage {
    Create(WireMutation),
    /// 冲突记录删旧建新（upsert）
    Replace {
        del: Value,
        mutation: WireMutation,
    },
    Skip,
}

/// 批量导入器
pub struct BatchImporter<'a> {
    client: &'a dyn StoreClient,
    formatter: TechnicalFormatter,
    batch_size: usize,
    policy: ConflictPolicy,
}

impl<'a> BatchImporter<'a> {
    pub fn new(client: &'a dyn StoreClient, batch_size: usize, policy: ConflictPolicy) -> Self {
        Self {
            client,
            formatter: TechnicalFormatter::new(),
            // 批次大小下限为 1
            batch_size: batch_size.max(1),
            policy,
        }
    }

    /// 单类型全量导入（按 batch_size 切批，批间顺序执行）
    pub async fn import_type(
        &self,
        entity_type: EntityType,
        validator: &StorageValidator,
        records: &[BusinessRecord],
    ) -> TypeImportOutcome {
        let mut outcome = TypeImportOutcome::default();
        for (batch_no, batch) in records.chunks(self.batch_size).enumerate() {
            let base_index = batch_no * self.batch_size;
            let batch_outcome = self
                .import_batch(entity_type, validator, batch, batch_no + 1, base_index)
                .await;
            outcome.merge(batch_outcome);
        }
        outcome
    }

    async fn import_batch(
        &self,
        entity_type: EntityType,
        validator: &StorageValidator,
        batch: &[BusinessRecord],
        batch_no: usize,
        base_index: usize,
    ) -> TypeImportOutcome {
        let mut outcome = TypeImportOutcome::default();
        let mut txn = match self.client.begin().await {
            Ok(txn) => txn,
            Err(e) => {
                outcome
                    .errors
                    .push(format!("{entity_type} 第 {batch_no} 批: {e}"));
                return outcome;
            }
        };

        let mut dels: Vec<Value> = Vec::new();
        let mut sets: Vec<WireMutation> = Vec::new();
        for (i, record) in batch.iter().enumerate() {
            match self
                .stage_record(txn.as_mut(), entity_type, validator, record)
                .await
            {
                Ok(Stage::Create(mutation)) => sets.push(mutation),
                Ok(Stage::Replace { del, mutation }) => {
                    dels.push(del);
                    sets.push(mutation);
                }
                Ok(Stage::Skip) => outcome.skipped += 1,
                Err(e) if is_transport(&e) => {
                    // 事务已不可信，整批放弃
                    warn!(%entity_type, batch_no, error = %e, "批次因传输错误放弃");
                    let _ = txn.discard().await;
                    outcome
                        .errors
                        .push(format!("{entity_type} 第 {batch_no} 批: {e}"));
                    return outcome;
                }
                Err(e) => {
                    outcome
                        .errors
                        .push(format!("{entity_type} 第 {} 行: {e}", base_index + i + 1));
                }
            }
        }

        if sets.is_empty() && dels.is_empty() {
            let _ = txn.discard().await;
            return outcome;
        }

        let staged = sets.len();
        match self.flush(txn, dels, sets).await {
            Ok(()) => {
                debug!(%entity_type, batch_no, imported = staged, "批次已提交");
                outcome.imported += staged;
            }
            Err(e) => {
                warn!(%entity_type, batch_no, error = %e, "批次提交失败");
                outcome
                    .errors
                    .push(format!("{entity_type} 第 {batch_no} 批: {e}"));
            }
        }
        outcome
    }

    async fn flush(
        &self,
        mut txn: Box<dyn StoreTransaction>,
        dels: Vec<Value>,
        sets: Vec<WireMutation>,
    ) -> ImportResult<()> {
        let result = async {
            if !dels.is_empty() {
                txn.mutate_del(&dels).await?;
            }
            txn.mutate_set(&sets).await
        }
        .await;
        match result {
            Ok(()) => txn.commit().await,
            Err(e) => {
                let _ = txn.discard().await;
                Err(e)
            }
        }
    }

    async fn stage_record(
        &self,
        txn: &mut dyn StoreTransaction,
        entity_type: EntityType,
        validator: &StorageValidator,
        record: &BusinessRecord,
    ) -> ImportResult<Stage> {
        validator.check_id_format(record)?;

        // insert 策略不查重，直接创建
        let conflict = match self.policy {
            ConflictPolicy::Insert => None,
            ConflictPolicy::Upsert | ConflictPolicy::Skip => {
                validator.check_conflict(txn, record).await?
            }
        };

        match (conflict, self.policy) {
            (None, _) | (Some(_), ConflictPolicy::Insert) => {
                Ok(Stage::Create(self.formatter.format(entity_type, record)?))
            }
            (Some(conflict), ConflictPolicy::Upsert) => Ok(Stage::Replace {
                del: json!({ "uid": conflict.existing_uid() }),
                mutation: self.formatter.format(entity_type, record)?,
            }),
            (Some(_), ConflictPolicy::Skip) => Ok(Stage::Skip),
        }
    }
}

fn is_transport(e: &ImportError) -> bool {
    matches!(
        e,
        ImportError::StoreConnection(_)
            | ImportError::StoreTransaction(_)
            | ImportError::StoreQuery(_)
            | ImportError::StoreMutation(_)
    )
}
