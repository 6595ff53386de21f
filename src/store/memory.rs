// ==========================================
// GraphRAG 图谱导入 - 内存存储实现
// ==========================================
// 职责: 进程内图存储，供测试与 dry-run 使用
// 能力: 解析导入器使用的探针查询（eq / type 条件），支持按调用序
//       注入变更/提交失败
// ==========================================

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::domain::WireMutation;
use crate::importer::error::{ImportError, ImportResult};

use super::{StoreClient, StoreTransaction};

#[derive(Default)]
struct State {
    /// uid → 节点（已提交数据）
    nodes: BTreeMap<String, Map<String, Value>>,
    next_uid: u64,
    mutate_calls: usize,
    commit_calls: usize,
    fail_mutation_at: Option<usize>,
    fail_commit_at: Option<usize>,
}

/// 内存存储
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // 锁中毒时继续使用内部数据（测试进程内不跨 panic 复用）
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 第 n 次（1 起）mutate 调用返回错误
    pub fn fail_mutation_at(&self, n: usize) {
        self.lock().fail_mutation_at = Some(n);
    }

    /// 第 n 次（1 起）commit 调用返回错误
    pub fn fail_commit_at(&self, n: usize) {
        self.lock().fail_commit_at = Some(n);
    }

    /// 直接写入一个已提交节点，返回分配的 uid
    pub fn seed(&self, type_name: &str, mut node: Map<String, Value>) -> String {
        let mut state = self.lock();
        state.next_uid += 1;
        let uid = format!("0x{:x}", state.next_uid);
        node.insert("uid".to_string(), Value::String(uid.clone()));
        node.insert(
            "dgraph.type".to_string(),
            Value::String(type_name.to_string()),
        );
        state.nodes.insert(uid.clone(), node);
        uid
    }

    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    /// 指定类型的全部节点（按 uid 升序）
    pub fn nodes_of_type(&self, type_name: &str) -> Vec<Map<String, Value>> {
        self.lock()
            .nodes
            .values()
            .filter(|n| node_has_type(n, type_name))
            .cloned()
            .collect()
    }

    pub fn find_by_id(&self, type_name: &str, id: &str) -> Option<Map<String, Value>> {
        self.lock()
            .nodes
            .values()
            .find(|n| {
                node_has_type(n, type_name)
                    && n.get("id").and_then(Value::as_str) == Some(id)
            })
            .cloned()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn check_connection(&self) -> ImportResult<()> {
        Ok(())
    }

    async fn begin(&self) -> ImportResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            staged_sets: Vec::new(),
            staged_dels: Vec::new(),
        }))
    }

    async fn alter_schema(&self, _schema: &str) -> ImportResult<()> {
        Ok(())
    }

    async fn drop_all(&self) -> ImportResult<()> {
        let mut state = self.lock();
        state.nodes.clear();
        state.next_uid = 0;
        Ok(())
    }
}

struct MemoryTransaction {
    state: Arc<Mutex<State>>,
    staged_sets: Vec<WireMutation>,
    staged_dels: Vec<String>,
}

impl MemoryTransaction {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn query(&mut self, query: &str) -> ImportResult<Value> {
        let (alias, type_cond, eq_conds) = parse_probe(query)?;
        let state = self.lock();
        let hits: Vec<Value> = state
            .nodes
            .values()
            .filter(|node| {
                type_cond
                    .as_deref()
                    .map(|t| node_has_type(node, t))
                    .unwrap_or(true)
                    && eq_conds.iter().all(|(field, expected)| {
                        node.get(field).map(|v| values_eq(v, expected)).unwrap_or(false)
                    })
            })
            .map(|node| json!({ "uid": node.get("uid").cloned().unwrap_or(Value::Null) }))
            .collect();
        let mut data = Map::new();
        data.insert(alias, Value::Array(hits));
        Ok(Value::Object(data))
    }

    async fn mutate_set(&mut self, mutations: &[WireMutation]) -> ImportResult<()> {
        let mut state = self.lock();
        state.mutate_calls += 1;
        if state.fail_mutation_at == Some(state.mutate_calls) {
            return Err(ImportError::StoreMutation(
                "注入的变更失败".to_string(),
            ));
        }
        drop(state);
        self.staged_sets.extend(mutations.iter().cloned());
        Ok(())
    }

    async fn mutate_del(&mut self, deletes: &[Value]) -> ImportResult<()> {
        for del in deletes {
            let uid = del
                .get("uid")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ImportError::StoreMutation("delete 变更缺少 uid".to_string())
                })?;
            self.staged_dels.push(uid.to_string());
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> ImportResult<()> {
        let MemoryTransaction {
            state,
            staged_sets,
            staged_dels,
        } = *self;
        let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
        state.commit_calls += 1;
        if state.fail_commit_at == Some(state.commit_calls) {
            return Err(ImportError::StoreTransaction(
                "注入的提交失败".to_string(),
            ));
        }
        for uid in &staged_dels {
            state.nodes.remove(uid);
        }
        // 与 Dgraph 一致: 空白节点名在同一事务内共享，
        // 不带 uid 的变更体各自成为新节点
        let mut blank_uids: BTreeMap<String, String> = BTreeMap::new();
        for mutation in staged_sets {
            let uid = match mutation.get("uid").and_then(Value::as_str) {
                Some(uid) if uid.starts_with("0x") => uid.to_string(),
                Some(blank) => {
                    if let Some(uid) = blank_uids.get(blank) {
                        uid.clone()
                    } else {
                        state.next_uid += 1;
                        let uid = format!("0x{:x}", state.next_uid);
                        blank_uids.insert(blank.to_string(), uid.clone());
                        uid
                    }
                }
                None => {
                    state.next_uid += 1;
                    format!("0x{:x}", state.next_uid)
                }
            };
            let node = state.nodes.entry(uid.clone()).or_default();
            for (k, v) in mutation {
                if k != "uid" {
                    node.insert(k, v);
                }
            }
            node.insert("uid".to_string(), Value::String(uid));
        }
        Ok(())
    }

    async fn discard(self: Box<Self>) -> ImportResult<()> {
        Ok(())
    }
}

fn node_has_type(node: &Map<String, Value>, type_name: &str) -> bool {
    match node.get("dgraph.type") {
        Some(Value::String(s)) => s == type_name,
        Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some(type_name)),
        _ => false,
    }
}

fn values_eq(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    // 数值探针与文本存储（或反之）按字符串形态比较
    match (actual, expected) {
        (Value::String(a), b) | (b, Value::String(a)) => match b {
            Value::Number(n) => a == &n.to_string(),
            _ => false,
        },
        _ => false,
    }
}

/// 解析探针查询
///
/// 支持的形态:
///   `{ alias(func: eq(field, "v")) @filter(type(T)) { uid } }`
///   `{ alias(func: type(T)) @filter(eq(a, "x") AND eq(b, "y")) { uid } }`
fn parse_probe(query: &str) -> ImportResult<(String, Option<String>, Vec<(String, Value)>)> {
    let body = query.trim().trim_start_matches('{').trim();
    let paren = body.find('(').ok_or_else(|| {
        ImportError::StoreQuery(format!("无法解析查询: {query}"))
    })?;
    let alias = body[..paren].trim().to_string();
    if alias.is_empty() {
        return Err(ImportError::StoreQuery(format!("查询缺少别名: {query}")));
    }

    let mut type_cond = None;
    let mut rest = query;
    while let Some(pos) = rest.find("type(") {
        // 跳过 "dgraph.type(" 之类的误匹配
        let preceded_by_word = rest[..pos]
            .chars()
            .next_back()
            .map(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
            .unwrap_or(false);
        let after = &rest[pos + "type(".len()..];
        if !preceded_by_word {
            if let Some(end) = after.find(')') {
                type_cond = Some(after[..end].trim().to_string());
            }
        }
        rest = after;
    }

    let mut eq_conds = Vec::new();
    let mut rest = query;
    while let Some(pos) = rest.find("eq(") {
        let after = &rest[pos + "eq(".len()..];
        let end = after.find(')').ok_or_else(|| {
            ImportError::StoreQuery(format!("eq 条件未闭合: {query}"))
        })?;
        let inner = &after[..end];
        let (field, raw) = inner.split_once(',').ok_or_else(|| {
            ImportError::StoreQuery(format!("eq 条件缺少值: {query}"))
        })?;
        let raw = raw.trim();
        let value = if let Some(stripped) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"'))
        {
            Value::String(stripped.to_string())
        } else {
            serde_json::from_str(raw)
                .map_err(|_| ImportError::StoreQuery(format!("eq 值无法解析: {raw}")))?
        };
        eq_conds.push((field.trim().to_string(), value));
        rest = &after[end..];
    }

    Ok((alias, type_cond, eq_conds))
}
