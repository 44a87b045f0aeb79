//! 就诊记录服务主程序

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use klinik_core::{Normalizer, VisitService};
use klinik_database::{DatabasePool, PostgresVisitStore};
use klinik_sheets::SheetsClient;
use klinik_web::{AppState, WebServer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigValidator};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "klinik-server")]
#[command(about = "诊所就诊记录服务")]
struct Args {
    /// 监听端口，覆盖配置文件
    #[arg(short, long)]
    port: Option<u16>,

    /// 监听地址，覆盖配置文件
    #[arg(long)]
    host: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // 初始化日志，RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("启动就诊记录服务...");
    info!(
        "Configuration loaded from {}",
        args.config.as_deref().unwrap_or("environment")
    );

    if let Err(e) = ConfigValidator::new().validate(&config) {
        error!("配置无效: {}", e);
        return Err(e);
    }

    let pool = DatabasePool::connect(&config.pool_settings())
        .await
        .context("Failed to connect to database")?;
    let store = PostgresVisitStore::new(pool.clone());
    store
        .migrate()
        .await
        .context("Failed to prepare database schema")?;

    let mut service = VisitService::new(Arc::new(store), Normalizer::new(config.validation.clone()));
    match config.sheets_config() {
        Some(sheets) => {
            let client = SheetsClient::new(sheets).context("Failed to create sheets client")?;
            service = service.with_spreadsheet(Arc::new(client));
        }
        None => warn!("Spreadsheet source disabled, serving document store only"),
    }

    let addr = config.listen_addr()?;
    info!("服务配置:");
    info!("  监听地址: {}", addr);
    info!("  表格数据源: {}", service.has_spreadsheet());

    let static_dir = config.server.static_dir.as_ref().map(PathBuf::from);
    let result = WebServer::new(addr, AppState::new(service), static_dir)
        .run()
        .await;

    pool.close().await;
    result
}
