//! 医院仪表盘主程序

mod console;
mod dashboard;
mod navigation;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hospital_admin::{init_logging, AuthContext, ConfigManager, LiveClock};
use tracing::{error, info};

use crate::console::Console;
use crate::navigation::Navigator;

/// 仪表盘命令行参数
#[derive(Parser, Debug)]
#[command(name = "hospital-dashboard")]
#[command(about = "医院管理仪表盘：患者、预约与账单")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long)]
    log_level: Option<String>,

    /// 写出默认配置后退出
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        ConfigManager::with_defaults().save(path).await?;
        println!("Default configuration written to {}", path.display());
        return Ok(());
    }

    let manager = ConfigManager::load(args.config.as_deref())?;
    let mut config = manager.config().clone();
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // 初始化日志
    init_logging(&config.logging)?;

    info!("启动医院仪表盘...");
    info!("  ID分配策略: {:?}", config.records.id_strategy);
    info!("  时钟间隔: {:?}", config.clock.tick());

    let auth = AuthContext::from_config(&config.auth).context("Failed to restore login state")?;
    let navigator = Navigator::new(LiveClock::new(config.clock.tick()));
    let mut console = Console::new(auth, navigator, config.records.id_strategy)?;

    // 标准输入是阻塞读取，放到阻塞线程中运行
    let result = tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        console.run(stdin.lock(), stdout.lock())
    })
    .await
    .context("Console thread panicked")?;

    if let Err(e) = &result {
        error!("控制台异常退出: {}", e);
    }
    info!("医院仪表盘已退出");
    result
}
