use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use simulator_core::config::AppConfig;
use tracing::{error, info};
use visit_simulator::{
    app::{run_once, Application},
    cli::{Cli, Commands, RunArgs},
    logging::init_logging,
    shutdown::wait_for_shutdown_signal,
};
use simulator_worker::RunOutcome;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("加载配置文件失败: {path}"),
        None => "加载配置失败".to_string(),
    })?;
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.observability.log_format = format.as_str().to_string();
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Serve => {
            init_logging(&config.observability)?;
            serve(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => {
            init_logging(&config.observability)?;
            run(&config, &args).await
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!("启动网站访问模拟器服务");
    let app = Application::new(config).await?;
    app.run(wait_for_shutdown_signal()).await?;
    info!("网站访问模拟器已退出");
    Ok(())
}

async fn run(config: &AppConfig, args: &RunArgs) -> Result<ExitCode> {
    let outcome = run_once(args.to_config(&config.simulation)).await?;

    match outcome {
        RunOutcome::Completed(summary) => {
            println!("任务完成 - {summary}");
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Failed { summary, error } => {
            error!("任务失败: {}", error);
            println!("任务失败 - {summary}");
            Ok(ExitCode::FAILURE)
        }
        RunOutcome::Deleted => Ok(ExitCode::FAILURE),
    }
}
