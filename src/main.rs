use anyhow::{Context, Result};
use clap::Parser;

use snaplink::cli::{Cli, Commands};
use snaplink::config::{get_config, init_config};
use snaplink::runtime::modes;
use snaplink::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config(cli.config.as_deref());
    let config = get_config();

    match cli.command {
        None | Some(Commands::Serve) => {
            config.validate().context("Invalid configuration")?;
            // guard 必须存活到进程结束，保证日志刷盘
            let _guard = init_logging(&config).context("Failed to initialize logging")?;
            modes::run_server().await
        }
        // 生成配置不依赖现有配置是否合法
        Some(cmd @ Commands::Config { .. }) => run_cli_or_exit(cmd).await,
        Some(cmd) => {
            config.validate().context("Invalid configuration")?;
            run_cli_or_exit(cmd).await
        }
    }
}

/// CLI 命令失败时错误已打印，以非零码退出
async fn run_cli_or_exit(cmd: Commands) -> Result<()> {
    if modes::run_cli(cmd).await.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
