use anyhow::Result;
use bedboard::config::{Cli, Commands, Config};
use bedboard::storage::Storage;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load_with_cli(cli.clone())?;

    // 初始化日志系统
    config.init_logging()?;

    tracing::info!("Bedboard Starting...");

    // 处理命令行子命令
    if let Some(command) = cli.command {
        handle_command(command, &config).await?;
        return Ok(());
    }

    run_server(&config).await
}

async fn run_server(config: &Config) -> Result<()> {
    let storage = Storage::new(&config.database.url).await?;

    tracing::info!("Bedboard Ready!");

    // 运行 HTTP 服务（包含优雅关闭）
    bedboard::api::serve(config, storage).await?;

    Ok(())
}

async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run => {
            // 这是默认行为，直接运行服务
            run_server(config).await?;
        }
        Commands::Migrate => {
            // Storage::new 已包含迁移，完成后直接退出
            let _storage = Storage::new(&config.database.url).await?;
            println!("数据库迁移完成: {}", config.database.url);
        }
        Commands::ResetConfig => {
            // 重置配置
            let default_config = Config::default();
            if let Some(config_path) = Config::get_user_config_path() {
                default_config.save_to_file(&config_path)?;
                println!("配置已重置到: {}", config_path.display());
            } else {
                println!("无法确定配置文件路径");
            }
        }
    }

    Ok(())
}
