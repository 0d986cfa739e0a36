use clap::{Args, Parser, Subcommand, ValueEnum};
use simulator_core::{config::SimulationDefaults, models::SimulationConfig};

/// 命令行入口
#[derive(Parser, Debug)]
#[command(name = "visit-simulator")]
#[command(version)]
#[command(about = "网站访问模拟器")]
#[command(long_about = "按随机间隔多次访问目标地址，记录每次访问结果；可作为HTTP服务运行，也可在前台运行单个任务")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 配置文件路径，缺省时依次查找 config/simulator.toml、simulator.toml
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long, global = true, value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: Option<String>,

    /// 日志格式，覆盖配置文件
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 启动HTTP服务（默认）
    Serve,
    /// 在前台运行一个任务直到结束
    Run(RunArgs),
    /// 打印生效的配置
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// 目标URL、域名或IP
    #[arg(short, long)]
    pub url: String,

    /// 最小访问间隔（秒），需与 --max-interval 同时给出
    #[arg(long, requires = "max_interval", allow_negative_numbers = true)]
    pub min_interval: Option<i64>,

    /// 最大访问间隔（秒），需与 --min-interval 同时给出
    #[arg(long, requires = "min_interval", allow_negative_numbers = true)]
    pub max_interval: Option<i64>,

    /// 访问次数
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub count: Option<i64>,

    /// 单次请求超时（秒）
    #[arg(short, long, allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// 超时或连接错误时的重试次数
    #[arg(short, long, allow_negative_numbers = true)]
    pub retries: Option<i64>,

    /// 重试间隔（秒）
    #[arg(long, allow_negative_numbers = true)]
    pub retry_delay: Option<i64>,
}

impl RunArgs {
    /// 未给出的参数取配置中的默认值
    pub fn to_config(&self, defaults: &SimulationDefaults) -> SimulationConfig {
        let mut config = defaults.to_config(self.url.clone());
        if let (Some(min), Some(max)) = (self.min_interval, self.max_interval) {
            config.min_interval = min;
            config.max_interval = max;
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(retry_delay) = self.retry_delay {
            config.retry_delay = retry_delay;
        }
        config
    }
}
