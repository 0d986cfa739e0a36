use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::Router;
use simulator_api::create_app;
use simulator_core::{config::AppConfig, models::SimulationConfig, traits::ProbeExecutor};
use simulator_infrastructure::{DatabaseManager, InMemoryTaskRepository};
use simulator_worker::{HttpProbeExecutor, RunOutcome, TaskSupervisor};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// 服务模式下的应用：任务注册表、监督者和HTTP接口
pub struct Application {
    config: AppConfig,
    database: DatabaseManager,
    supervisor: Arc<TaskSupervisor>,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let executor = HttpProbeExecutor::new().context("创建HTTP客户端失败")?;
        Self::with_executor(config, Arc::new(executor)).await
    }

    pub async fn with_executor(config: AppConfig, executor: Arc<dyn ProbeExecutor>) -> Result<Self> {
        let database = DatabaseManager::new(&config.database)
            .await
            .with_context(|| format!("初始化任务注册表失败: {}", config.database.url))?;
        info!("任务注册表类型: {:?}", database.database_type());

        let supervisor = Arc::new(TaskSupervisor::new(database.task_repository(), executor));

        Ok(Self {
            config,
            database,
            supervisor,
        })
    }

    pub fn supervisor(&self) -> Arc<TaskSupervisor> {
        self.supervisor.clone()
    }

    pub fn router(&self) -> Router {
        create_app(
            self.supervisor.clone(),
            self.config.simulation.clone(),
            &self.config.api,
        )
    }

    /// 恢复中断的任务并启动HTTP服务，直到 `shutdown` 完成
    ///
    /// 服务停止后中止所有运行器并关闭数据库连接。
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let recovered = self
            .supervisor
            .recover_interrupted()
            .await
            .context("恢复中断的任务失败")?;
        if recovered > 0 {
            warn!("{} 个上次未完成的任务已标记为失败", recovered);
        }

        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;
        info!(
            "HTTP服务监听于 {}，路径前缀 '{}'",
            listener.local_addr().context("获取监听地址失败")?,
            self.config.api.path_prefix
        );

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP服务异常退出");

        info!("HTTP服务已停止");
        self.supervisor.shutdown().await;
        self.database.close().await;
        result
    }
}

/// 在前台运行单个任务直到结束，使用内存注册表
pub async fn run_once(config: SimulationConfig) -> Result<RunOutcome> {
    let executor = HttpProbeExecutor::new().context("创建HTTP客户端失败")?;
    run_once_with(config, Arc::new(executor)).await
}

pub async fn run_once_with(
    config: SimulationConfig,
    executor: Arc<dyn ProbeExecutor>,
) -> Result<RunOutcome> {
    let supervisor = TaskSupervisor::new(Arc::new(InMemoryTaskRepository::new()), executor);
    let (detail, handle) = supervisor.launch(config).await.context("任务配置无效")?;

    handle
        .await
        .context("等待运行器结束失败")?
        .ok_or_else(|| anyhow!("任务 {} 的运行器被中止", detail.task.id))
}
