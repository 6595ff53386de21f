// ==========================================
// GraphRAG 图谱导入 - 命令行入口
// ==========================================
// 用法:
//   graphrag-import --data-dir ./output [--endpoint http://localhost:8080]
//                   [--types entity,relationship] [--conflict upsert]
//                   [--batch-size 1000] [--strict] [--init-schema] [--dry-run]
// ==========================================

use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use graphrag_import::store::schema;
use graphrag_import::{
    logging, Coercion, ConflictPolicy, DgraphClient, EntityType, GraphImporter, ImportOptions,
    ImportSummary, MemoryStore, StoreClient, DEFAULT_ENDPOINT,
};

struct CliArgs {
    data_dir: String,
    endpoint: String,
    types: Vec<EntityType>,
    policy: ConflictPolicy,
    batch_size: usize,
    coercion: Coercion,
    init_schema: bool,
    dry_run: bool,
}

fn print_usage() {
    eprintln!("用法: graphrag-import --data-dir <目录> [选项]");
    eprintln!();
    eprintln!("选项:");
    eprintln!("  --data-dir <目录>     GraphRAG 输出目录（必填）");
    eprintln!("  --endpoint <地址>     存储端点（默认 {DEFAULT_ENDPOINT}）");
    eprintln!("  --types <列表>        仅导入指定类型，逗号分隔");
    eprintln!("                        （text_unit/document/entity/relationship/community/community_report）");
    eprintln!("  --conflict <策略>     冲突策略 insert/upsert/skip（默认 upsert）");
    eprintln!("  --batch-size <N>      每事务批次大小（默认 1000）");
    eprintln!("  --strict              数值转换失败按错误处理（默认尽力转换）");
    eprintln!("  --init-schema         导入前初始化存储 schema");
    eprintln!("  --dry-run             使用内存存储演练，不触达真实存储");
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = CliArgs {
        data_dir: String::new(),
        endpoint: DEFAULT_ENDPOINT.to_string(),
        types: EntityType::IMPORT_ORDER.to_vec(),
        policy: ConflictPolicy::Upsert,
        batch_size: graphrag_import::DEFAULT_BATCH_SIZE,
        coercion: Coercion::Lenient,
        init_schema: false,
        dry_run: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--data-dir" => {
                args.data_dir = iter.next().ok_or("--data-dir 缺少取值")?;
            }
            "--endpoint" => {
                args.endpoint = iter.next().ok_or("--endpoint 缺少取值")?;
            }
            "--types" => {
                let raw = iter.next().ok_or("--types 缺少取值")?;
                let mut types = Vec::new();
                for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    types.push(EntityType::from_str(part)?);
                }
                if types.is_empty() {
                    return Err("--types 取值为空".to_string());
                }
                args.types = types;
            }
            "--conflict" => {
                let raw = iter.next().ok_or("--conflict 缺少取值")?;
                args.policy = ConflictPolicy::from_str(&raw)?;
            }
            "--batch-size" => {
                let raw = iter.next().ok_or("--batch-size 缺少取值")?;
                args.batch_size = raw
                    .parse::<usize>()
                    .map_err(|_| format!("--batch-size 取值无效: {raw}"))?;
                if args.batch_size == 0 {
                    return Err("--batch-size 必须大于 0".to_string());
                }
            }
            "--strict" => args.coercion = Coercion::Strict,
            "--init-schema" => args.init_schema = true,
            "--dry-run" => args.dry_run = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("未知参数: {other}")),
        }
    }

    if args.data_dir.is_empty() {
        return Err("--data-dir 为必填参数".to_string());
    }
    Ok(args)
}

fn print_summary(summary: &ImportSummary) {
    println!("==================================================");
    println!("导入完成，耗时 {:.2}s", summary.elapsed.as_secs_f64());
    for entity_type in EntityType::IMPORT_ORDER {
        if let Some(count) = summary.counts.get(&entity_type) {
            let skipped = summary.skipped.get(&entity_type).copied().unwrap_or(0);
            if skipped > 0 {
                println!("  {entity_type}: {count} 条（跳过 {skipped} 条）");
            } else {
                println!("  {entity_type}: {count} 条");
            }
        }
    }
    println!("  合计: {} 条", summary.total());
    if !summary.errors.is_empty() {
        println!("  错误 {} 条:", summary.errors.len());
        for error in &summary.errors {
            println!("    - {error}");
        }
    }
    println!("==================================================");
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("参数错误: {msg}");
            eprintln!();
            print_usage();
            return ExitCode::from(2);
        }
    };

    tracing::info!("==================================================");
    tracing::info!("{}", graphrag_import::APP_NAME);
    tracing::info!("系统版本: {}", graphrag_import::VERSION);
    tracing::info!("数据目录: {}", args.data_dir);
    tracing::info!("冲突策略: {}", args.policy);
    tracing::info!("==================================================");

    let client: Arc<dyn StoreClient> = if args.dry_run {
        tracing::info!("dry-run 模式，使用内存存储");
        Arc::new(MemoryStore::new())
    } else {
        match DgraphClient::new(&args.endpoint) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                eprintln!("存储客户端初始化失败: {e}");
                return ExitCode::FAILURE;
            }
        }
    };

    if args.init_schema {
        if let Err(e) = schema::init_schema(client.as_ref(), false).await {
            eprintln!("schema 初始化失败: {e}");
            return ExitCode::FAILURE;
        }
    }

    let mut options = ImportOptions::new(&args.data_dir);
    options.batch_size = args.batch_size;
    options.policy = args.policy;
    options.coercion = args.coercion;

    let importer = GraphImporter::new(client, options);
    match importer.run_types(&args.types).await {
        Ok(summary) => {
            print_summary(&summary);
            if summary.total() == 0 && !summary.errors.is_empty() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("导入失败: {e}");
            ExitCode::FAILURE
        }
    }
}
