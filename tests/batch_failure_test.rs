// ==========================================
// 批次失败与隔离集成测试
// ==========================================
// 测试目标: 单批失败整批放弃、其余批次不受影响；坏文件不拖垮同类型其余文件
// ==========================================


use std::fmt::Write as _;
use std::sync::Arc;

use graphrag_import::{
    ConflictPolicy, EntityType, GraphImporter, ImportOptions, MemoryStore,
};
use test_helpers::hash_id;

fn entity_uuid(i: usize) -> String {
    format!("{:08x}-0000-0000-0000-{:012x}", i, i)
}

fn write_entities_bulk(dir: &std::path::Path, count: usize) {
    let mut csv = String::from("id,title,type,description\n");
    for i in 0..count {
        writeln!(csv, "{},实体{},organization,描述{}", entity_uuid(i), i, i)
            .expect("拼接 CSV 失败");
    }
    std::fs::write(dir.join("entities.csv"), csv).expect("写文件失败");
}

#[tokio::test]
async fn test_failed_batch_discarded_others_committed() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    write_entities_bulk(dir.path(), 2500);

    let store = MemoryStore::new();
    // 第 2 批（第 1001-2000 条）的变更失败
    store.fail_mutation_at(2);

    let mut options = ImportOptions::new(dir.path());
    options.policy = ConflictPolicy::Insert;
    let summary = GraphImporter::new(Arc::new(store.clone()), options)
        .run_types(&[EntityType::Entity])
        .await
        .expect("导入失败");

    // 3 批中 1 批整批放弃
    assert_eq!(summary.counts.get(&EntityType::Entity), Some(&1500));
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("第 2 批"));
    assert_eq!(store.nodes_of_type("Entity").len(), 1500);

    // 失败批的记录一条都不存在
    assert!(store.find_by_id("Entity", &entity_uuid(1000)).is_none());
    assert!(store.find_by_id("Entity", &entity_uuid(1999)).is_none());
    // 前后批的边界记录完好
    assert!(store.find_by_id("Entity", &entity_uuid(999)).is_some());
    assert!(store.find_by_id("Entity", &entity_uuid(2000)).is_some());
}

#[tokio::test]
async fn test_commit_failure_discards_batch() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    write_entities_bulk(dir.path(), 30);

    let store = MemoryStore::new();
    store.fail_commit_at(1);

    let mut options = ImportOptions::new(dir.path());
    options.policy = ConflictPolicy::Insert;
    options.batch_size = 10;
    let summary = GraphImporter::new(Arc::new(store.clone()), options)
        .run_types(&[EntityType::Entity])
        .await
        .expect("导入失败");

    assert_eq!(summary.counts.get(&EntityType::Entity), Some(&20));
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(store.nodes_of_type("Entity").len(), 20);
}

#[tokio::test]
async fn test_bad_file_does_not_block_good_files() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    // 三个文件: 一个缺必需列，两个正常
    std::fs::write(dir.path().join("a_text_units.csv"), "id,n_tokens\nx,1\n")
        .expect("写文件失败");
    std::fs::write(
        dir.path().join("b_text_units.csv"),
        format!("id,text\n{},第一块\n", hash_id('a')),
    )
    .expect("写文件失败");
    std::fs::write(
        dir.path().join("c_text_units.csv"),
        format!("id,text\n{},第二块\n", hash_id('b')),
    )
    .expect("写文件失败");

    let store = MemoryStore::new();
    let summary = GraphImporter::new(
        Arc::new(store.clone()),
        ImportOptions::new(dir.path()),
    )
    .run_types(&[EntityType::TextUnit])
    .await
    .expect("导入失败");

    assert_eq!(summary.counts.get(&EntityType::TextUnit), Some(&2));
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("a_text_units.csv"));
    assert!(summary.errors[0].contains("MISSING_COLUMNS"));
    assert_eq!(store.nodes_of_type("TextUnit").len(), 2);
}

#[tokio::test]
async fn test_batch_size_one_isolates_every_record() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    write_entities_bulk(dir.path(), 3);

    let store = MemoryStore::new();
    store.fail_mutation_at(2);

    let mut options = ImportOptions::new(dir.path());
    options.policy = ConflictPolicy::Insert;
    options.batch_size = 1;
    let summary = GraphImporter::new(Arc::new(store.clone()), options)
        .run_types(&[EntityType::Entity])
        .await
        .expect("导入失败");

    assert_eq!(summary.counts.get(&EntityType::Entity), Some(&2));
    assert!(store.find_by_id("Entity", &entity_uuid(1)).is_none());
}
