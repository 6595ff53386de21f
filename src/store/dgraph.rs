// ==========================================
// GraphRAG 图谱导入 - Dgraph HTTP 客户端
// ==========================================
// 职责: 经 Dgraph HTTP API 实现存储客户端与事务
// 协议: /query /mutate /commit 携带 startTs 串联同一事务，
//       commit 回传事务累计的 keys/preds
// ==========================================

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::domain::WireMutation;
use crate::importer::error::{ImportError, ImportResult};

use super::{StoreClient, StoreTransaction};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Dgraph 客户端
#[derive(Clone)]
pub struct DgraphClient {
    http: reqwest::Client,
    base: String,
}

impl DgraphClient {
    pub fn new(endpoint: impl Into<String>) -> ImportResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ImportError::StoreConnection(e.to_string()))?;
        Ok(Self {
            http,
            base: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.base
    }
}

#[async_trait]
impl StoreClient for DgraphClient {
    #[instrument(skip(self), fields(endpoint = %self.base))]
    async fn check_connection(&self) -> ImportResult<()> {
        let resp = self
            .http
            .get(format!("{}/health", self.base))
            .send()
            .await
            .map_err(|e| ImportError::StoreConnection(e.to_string()))?;
        if resp.status().is_success() {
            debug!("存储连通性检查通过");
            Ok(())
        } else {
            Err(ImportError::StoreConnection(format!(
                "健康检查返回 {}",
                resp.status()
            )))
        }
    }

    async fn begin(&self) -> ImportResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(DgraphTransaction {
            http: self.http.clone(),
            base: self.base.clone(),
            start_ts: 0,
            keys: BTreeSet::new(),
            preds: BTreeSet::new(),
        }))
    }

    async fn alter_schema(&self, schema: &str) -> ImportResult<()> {
        let resp = self
            .http
            .post(format!("{}/alter", self.base))
            .body(schema.to_string())
            .send()
            .await?;
        check_errors(resp.json().await?).map_err(ImportError::StoreMutation)?;
        Ok(())
    }

    async fn drop_all(&self) -> ImportResult<()> {
        let resp = self
            .http
            .post(format!("{}/alter", self.base))
            .json(&json!({"drop_all": true}))
            .send()
            .await?;
        check_errors(resp.json().await?).map_err(ImportError::StoreMutation)?;
        Ok(())
    }
}

/// Dgraph 事务
///
/// start_ts 为 0 表示尚未分配（首个请求的响应中取得）
struct DgraphTransaction {
    http: reqwest::Client,
    base: String,
    start_ts: u64,
    keys: BTreeSet<String>,
    preds: BTreeSet<String>,
}

impl DgraphTransaction {
    fn absorb_txn_context(&mut self, body: &Value) {
        let Some(txn) = body.pointer("/extensions/txn") else {
            return;
        };
        if let Some(ts) = txn.get("start_ts").and_then(Value::as_u64) {
            self.start_ts = ts;
        }
        for key in ["keys", "preds"] {
            if let Some(items) = txn.get(key).and_then(Value::as_array) {
                let target = if key == "keys" {
                    &mut self.keys
                } else {
                    &mut self.preds
                };
                target.extend(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string),
                );
            }
        }
    }

    fn with_start_ts(&self, path: &str) -> String {
        if self.start_ts == 0 {
            format!("{}/{}", self.base, path)
        } else {
            format!("{}/{}?startTs={}", self.base, path, self.start_ts)
        }
    }

    async fn mutate(&mut self, body: Value) -> ImportResult<()> {
        let resp = self
            .http
            .post(self.with_start_ts("mutate"))
            .json(&body)
            .send()
            .await?;
        let body: Value = resp.json().await?;
        check_errors(body.clone()).map_err(ImportError::StoreMutation)?;
        self.absorb_txn_context(&body);
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for DgraphTransaction {
    async fn query(&mut self, query: &str) -> ImportResult<Value> {
        let resp = self
            .http
            .post(self.with_start_ts("query"))
            .header("Content-Type", "application/dql")
            .body(query.to_string())
            .send()
            .await?;
        let body: Value = resp.json().await?;
        check_errors(body.clone()).map_err(ImportError::StoreQuery)?;
        self.absorb_txn_context(&body);
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }

    async fn mutate_set(&mut self, mutations: &[WireMutation]) -> ImportResult<()> {
        self.mutate(json!({ "set": mutations })).await
    }

    async fn mutate_del(&mut self, deletes: &[Value]) -> ImportResult<()> {
        self.mutate(json!({ "delete": deletes })).await
    }

    async fn commit(self: Box<Self>) -> ImportResult<()> {
        if self.start_ts == 0 {
            // 空事务无须提交
            return Ok(());
        }
        let keys: Vec<&String> = self.keys.iter().collect();
        let preds: Vec<&String> = self.preds.iter().collect();
        let resp = self
            .http
            .post(format!("{}/commit?startTs={}", self.base, self.start_ts))
            .json(&json!({ "keys": keys, "preds": preds }))
            .send()
            .await?;
        check_errors(resp.json().await?)
            .map_err(ImportError::StoreTransaction)?;
        debug!(start_ts = self.start_ts, "事务已提交");
        Ok(())
    }

    async fn discard(self: Box<Self>) -> ImportResult<()> {
        if self.start_ts == 0 {
            return Ok(());
        }
        let resp = self
            .http
            .post(format!(
                "{}/commit?startTs={}&abort=true",
                self.base, self.start_ts
            ))
            .send()
            .await?;
        // abort 响应里的错误不再上抛，事务已放弃
        if let Ok(body) = resp.json::<Value>().await {
            if let Err(msg) = check_errors(body) {
                debug!(start_ts = self.start_ts, error = %msg, "事务放弃返回错误");
            }
        }
        Ok(())
    }
}

/// Dgraph 响应的 errors 数组转为错误消息
fn check_errors(body: Value) -> Result<(), String> {
    match body.get("errors").and_then(Value::as_array) {
        Some(errors) if !errors.is_empty() => {
            let msgs: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("未知错误")
                        .to_string()
                })
                .collect();
            Err(msgs.join("; "))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_errors_extracts_messages() {
        let body = json!({"errors": [{"message": "schema not defined"}]});
        assert_eq!(check_errors(body), Err("schema not defined".to_string()));
        assert!(check_errors(json!({"data": {}})).is_ok());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = DgraphClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080");
    }
}
