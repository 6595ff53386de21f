// ==========================================
// GraphRAG 图谱导入 - 存储 schema
// ==========================================
// 职责: 六种节点类型的谓词与类型定义，及 schema 初始化入口
// 约定: id 建精确索引供查重探针使用；source/target 同样建索引
//       支撑复合唯一探针
// ==========================================

use tracing::info;

use crate::importer::error::ImportResult;

use super::StoreClient;

/// 谓词定义（全类型共享一张谓词表）
pub const PREDICATES: &str = r#"
id: string @index(exact) .
type: string @index(exact) .
title: string @index(term) .
name: string .
text: string .
description: string .
summary: string .
explanation: string .
human_readable_id: string .
n_tokens: int .
frequency: int .
degree: int .
combined_degree: int .
weight: float .
x: float .
y: float .
source: string @index(exact) .
target: string @index(exact) .
community: int @index(int) .
level: int @index(int) .
parent: int .
size: int .
rating: int .
period: string .
creation_date: string .
create_time: string .
created_at: string .
metadata: string .
full_content_json: string .
findings: string .
data: string .
members: [string] .
children: [string] .
document_ids: [string] .
entity_ids: [string] .
relationship_ids: [string] .
text_unit_ids: [string] .
covariate_ids: [string] .
"#;

/// 类型定义
pub const TYPES: &str = r#"
type TextUnit {
    id
    type
    text
    human_readable_id
    n_tokens
    document_ids
    entity_ids
    relationship_ids
    covariate_ids
}

type Document {
    id
    type
    title
    text
    human_readable_id
    creation_date
    metadata
    text_unit_ids
}

type Entity {
    id
    type
    title
    description
    human_readable_id
    frequency
    degree
    x
    y
    text_unit_ids
}

type Relationship {
    id
    type
    source
    target
    description
    human_readable_id
    weight
    combined_degree
    text_unit_ids
}

type Community {
    id
    type
    community
    level
    title
    name
    human_readable_id
    parent
    size
    period
    children
    members
    entity_ids
    relationship_ids
    text_unit_ids
}

type CommunityReport {
    id
    type
    community
    level
    title
    summary
    explanation
    full_content_json
    findings
    rating
    human_readable_id
    period
    create_time
    created_at
    data
    entity_ids
    text_unit_ids
}
"#;

/// 完整 schema 文本
pub fn full_schema() -> String {
    format!("{PREDICATES}\n{TYPES}")
}

/// 初始化 schema
///
/// drop_existing 为真时先清空全部数据再建 schema
pub async fn init_schema(client: &dyn StoreClient, drop_existing: bool) -> ImportResult<()> {
    if drop_existing {
        info!("清空存储中的全部数据与 schema");
        client.drop_all().await?;
    }
    client.alter_schema(&full_schema()).await?;
    info!("schema 初始化完成");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_covers_probe_predicates() {
        let schema = full_schema();
        // 查重探针依赖的索引
        assert!(schema.contains("id: string @index(exact)"));
        assert!(schema.contains("source: string @index(exact)"));
        assert!(schema.contains("target: string @index(exact)"));
    }

    #[test]
    fn test_all_node_types_defined() {
        let schema = full_schema();
        for t in [
            "type TextUnit",
            "type Document",
            "type Entity",
            "type Relationship",
            "type Community",
            "type CommunityReport",
        ] {
            assert!(schema.contains(t), "缺少类型定义: {t}");
        }
    }
}
