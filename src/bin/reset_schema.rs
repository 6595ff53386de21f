// ==========================================
// GraphRAG 图谱导入 - 存储重置工具
// ==========================================
// 用途: 清空 Dgraph 全部数据并重建 schema（开发/测试环境）
// 用法: reset_schema [--endpoint http://localhost:8080] --yes
// ==========================================

use std::process::ExitCode;

use graphrag_import::store::schema;
use graphrag_import::{logging, DgraphClient, StoreClient, DEFAULT_ENDPOINT};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let mut endpoint = DEFAULT_ENDPOINT.to_string();
    let mut confirmed = false;
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--endpoint" => match iter.next() {
                Some(value) => endpoint = value,
                None => {
                    eprintln!("--endpoint 缺少取值");
                    return ExitCode::from(2);
                }
            },
            "--yes" => confirmed = true,
            other => {
                eprintln!("未知参数: {other}");
                eprintln!("用法: reset_schema [--endpoint <地址>] --yes");
                return ExitCode::from(2);
            }
        }
    }

    if !confirmed {
        eprintln!("该操作会清空 {endpoint} 的全部数据，确认请附加 --yes");
        return ExitCode::from(2);
    }

    let client = match DgraphClient::new(&endpoint) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("存储客户端初始化失败: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = client.check_connection().await {
        eprintln!("存储连接失败: {e}");
        return ExitCode::FAILURE;
    }

    match schema::init_schema(&client, true).await {
        Ok(()) => {
            tracing::info!("存储已清空并重建 schema: {endpoint}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("重置失败: {e}");
            ExitCode::FAILURE
        }
    }
}
