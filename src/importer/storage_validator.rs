// ==========================================
// GraphRAG 图谱导入 - 存储层验证器
// ==========================================
// 职责: ID 格式校验 + 事务内唯一性探针（id 唯一 / 复合唯一）
// 红线: 探针与后续变更必须在同一事务内执行
// ==========================================

use serde_json::Value;

use crate::config::StorageRules;
use crate::domain::{BusinessRecord, CellValue, EntityType, IdFormat};
use crate::store::StoreTransaction;

use super::error::{ImportError, ImportResult};

/// 探针命中的已有记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// id 唯一约束命中
    Id { existing_uid: String },
    /// 复合唯一约束命中
    Composite {
        existing_uid: String,
        detail: String,
    },
}

impl Conflict {
    pub fn existing_uid(&self) -> &str {
        match self {
            Conflict::Id { existing_uid } | Conflict::Composite { existing_uid, .. } => {
                existing_uid
            }
        }
    }
}

/// 存储层验证器
pub struct StorageValidator {
    entity_type: EntityType,
    rules: StorageRules,
}

impl StorageValidator {
    pub fn new(entity_type: EntityType, rules: StorageRules) -> Self {
        Self { entity_type, rules }
    }

    /// ID 格式校验（配置了 id_format 的类型）
    pub fn check_id_format(&self, record: &BusinessRecord) -> ImportResult<()> {
        let Some(format) = self.rules.id_format else {
            return Ok(());
        };
        let id = record_id(record)?;
        let ok = match format {
            // 至少 32 位十六进制
            IdFormat::Hash => id.len() >= 32 && id.chars().all(|c| c.is_ascii_hexdigit()),
            IdFormat::Uuid => uuid::Uuid::parse_str(&id).is_ok(),
            IdFormat::Int => id.parse::<i64>().is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(ImportError::IdFormat {
                id,
                expected: format!("{format:?}").to_lowercase(),
            })
        }
    }

    /// 唯一性探针
    ///
    /// 依次执行 id 唯一与复合唯一探针（按配置），后执行者的结论生效
    pub async fn check_conflict(
        &self,
        txn: &mut dyn StoreTransaction,
        record: &BusinessRecord,
    ) -> ImportResult<Option<Conflict>> {
        let mut conflict = None;

        if self.rules.id_format.is_some() {
            let id = record_id(record)?;
            let query = format!(
                r#"{{ exists(func: eq(id, "{}")) @filter(type({})) {{ uid }} }}"#,
                escape(&id),
                self.entity_type.type_name()
            );
            conflict = first_uid(&txn.query(&query).await?)
                .map(|existing_uid| Conflict::Id { existing_uid });
        }

        // 任一复合字段缺失则不发复合探针
        if let Some(fields) = self.rules.composite_unique {
            let values: Option<Vec<String>> = fields
                .iter()
                .map(|f| {
                    record
                        .get(*f)
                        .filter(|v| v.is_valid())
                        .map(CellValue::stringify)
                })
                .collect();
            let Some(values) = values else {
                return Ok(conflict);
            };
            let terms: Vec<String> = fields
                .iter()
                .zip(&values)
                .map(|(field, value)| format!(r#"eq({}, "{}")"#, field, escape(value)))
                .collect();
            let query = format!(
                r#"{{ exists(func: type({})) @filter({}) {{ uid }} }}"#,
                self.entity_type.type_name(),
                terms.join(" AND ")
            );
            conflict = first_uid(&txn.query(&query).await?).map(|existing_uid| {
                Conflict::Composite {
                    existing_uid,
                    detail: fields.join(", "),
                }
            });
        }

        Ok(conflict)
    }
}

fn record_id(record: &BusinessRecord) -> ImportResult<String> {
    match record.get("id") {
        Some(v) if v.is_valid() => Ok(v.stringify()),
        _ => Err(ImportError::MissingFields {
            fields: vec!["id".to_string()],
        }),
    }
}

fn first_uid(data: &Value) -> Option<String> {
    data.get("exists")
        .and_then(Value::as_array)
        .and_then(|hits| hits.first())
        .and_then(|hit| hit.get("uid"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation_rules_for;
    use crate::store::{MemoryStore, StoreClient};
    use serde_json::{json, Map};

    fn record(pairs: &[(&str, &str)]) -> BusinessRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
            .collect()
    }

    #[test]
    fn test_hash_id_format() {
        let validator = StorageValidator::new(
            EntityType::TextUnit,
            validation_rules_for(EntityType::TextUnit).storage,
        );
        assert!(validator
            .check_id_format(&record(&[("id", &"a".repeat(32))]))
            .is_ok());
        let err = validator
            .check_id_format(&record(&[("id", "zzz")]))
            .unwrap_err();
        assert_eq!(err.code(), Some("ID_FORMAT"));
    }

    #[test]
    fn test_uuid_id_format() {
        let validator = StorageValidator::new(
            EntityType::Entity,
            validation_rules_for(EntityType::Entity).storage,
        );
        assert!(validator
            .check_id_format(&record(&[(
                "id",
                "aaaaaaaa-1111-2222-3333-444444444444"
            )]))
            .is_ok());
        assert!(validator
            .check_id_format(&record(&[("id", "not-a-uuid")]))
            .is_err());
    }

    #[test]
    fn test_relationship_has_no_id_format() {
        let validator = StorageValidator::new(
            EntityType::Relationship,
            validation_rules_for(EntityType::Relationship).storage,
        );
        assert!(validator.check_id_format(&record(&[("id", "自由格式")])).is_ok());
    }

    #[tokio::test]
    async fn test_id_probe_hits_existing() {
        let store = MemoryStore::new();
        let mut node = Map::new();
        node.insert("id".to_string(), json!("a".repeat(32)));
        let uid = store.seed("TextUnit", node);

        let validator = StorageValidator::new(
            EntityType::TextUnit,
            validation_rules_for(EntityType::TextUnit).storage,
        );
        let mut txn = store.begin().await.unwrap();
        let conflict = validator
            .check_conflict(txn.as_mut(), &record(&[("id", &"a".repeat(32))]))
            .await
            .unwrap();
        assert_eq!(conflict, Some(Conflict::Id { existing_uid: uid }));

        let miss = validator
            .check_conflict(txn.as_mut(), &record(&[("id", &"b".repeat(32))]))
            .await
            .unwrap();
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn test_composite_probe() {
        let store = MemoryStore::new();
        let mut node = Map::new();
        node.insert("id".to_string(), json!("r1"));
        node.insert("source".to_string(), json!("A"));
        node.insert("target".to_string(), json!("B"));
        let uid = store.seed("Relationship", node);

        let validator = StorageValidator::new(
            EntityType::Relationship,
            validation_rules_for(EntityType::Relationship).storage,
        );
        let mut txn = store.begin().await.unwrap();
        let conflict = validator
            .check_conflict(
                txn.as_mut(),
                &record(&[("id", "r2"), ("source", "A"), ("target", "B")]),
            )
            .await
            .unwrap();
        assert_eq!(
            conflict,
            Some(Conflict::Composite {
                existing_uid: uid,
                detail: "source, target".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_composite_probe_skipped_when_field_missing() {
        let store = MemoryStore::new();
        let mut node = Map::new();
        node.insert("id".to_string(), json!("r1"));
        node.insert("source".to_string(), json!("A"));
        node.insert("target".to_string(), json!(""));
        store.seed("Relationship", node);

        let validator = StorageValidator::new(
            EntityType::Relationship,
            validation_rules_for(EntityType::Relationship).storage,
        );
        // target 缺失: 不发复合探针，也不应隐式用空串命中已有记录
        let mut txn = store.begin().await.unwrap();
        let conflict = validator
            .check_conflict(txn.as_mut(), &record(&[("id", "r2"), ("source", "A")]))
            .await
            .unwrap();
        assert_eq!(conflict, None);
    }
}
