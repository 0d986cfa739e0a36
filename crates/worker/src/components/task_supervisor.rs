use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use simulator_core::{
    models::{SimulationConfig, Task, TaskConfig, TaskDetail, TaskStatus, TaskSummary},
    traits::{ProbeExecutor, TaskControlService, TaskRepository},
    SimulatorError, SimulatorResult,
};
use tokio::sync::RwLock;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};

use super::task_runner::{RunOutcome, TaskRunner};

/// 启动时把上次进程遗留的 `running` 任务标记为失败所用的原因
pub const INTERRUPTED_MESSAGE: &str = "服务重启，任务中断";

/// 任务监督者
///
/// 负责创建任务（校验、持久化、启动后台运行器）以及查询和删除。
/// 运行器以独立的 tokio 任务运行，这里只保留它们的中止句柄。
pub struct TaskSupervisor {
    repository: Arc<dyn TaskRepository>,
    runner: Arc<TaskRunner>,
    running: Arc<RwLock<HashMap<String, AbortHandle>>>,
}

impl TaskSupervisor {
    pub fn new(repository: Arc<dyn TaskRepository>, executor: Arc<dyn ProbeExecutor>) -> Self {
        let runner = Arc::new(TaskRunner::new(repository.clone(), executor));
        Self {
            repository,
            runner,
            running: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 把没有运行器的 `running` 任务转为 `failed`，返回处理的数量
    pub async fn recover_interrupted(&self) -> SimulatorResult<usize> {
        let ids = self.repository.list_running().await?;
        let mut recovered = 0;
        for id in ids {
            if self.running.read().await.contains_key(&id) {
                continue;
            }
            match self.repository.fail(&id, INTERRUPTED_MESSAGE).await {
                Ok(()) => {
                    warn!("任务 {} 在上次运行中被中断，已标记为失败", id);
                    recovered += 1;
                }
                Err(SimulatorError::TaskNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(recovered)
    }

    /// 在后台启动任务的运行器，立即返回
    ///
    /// 返回的句柄在运行器结束（或被中止）后完成。
    pub async fn spawn(&self, task: Task) -> JoinHandle<Option<RunOutcome>> {
        let id = task.id.clone();
        let runner = self.runner.clone();

        let mut running = self.running.write().await;
        let run = tokio::spawn(async move { runner.run(&task).await });
        running.insert(id.clone(), run.abort_handle());
        drop(running);

        let repository = self.repository.clone();
        let running = self.running.clone();
        tokio::spawn(async move {
            let outcome = match run.await {
                Ok(outcome) => {
                    debug!("任务 {} 的运行器已结束: {:?}", id, outcome.status());
                    Some(outcome)
                }
                Err(e) if e.is_panic() => {
                    error!("任务 {} 的运行器异常退出", id);
                    if let Err(e) = repository.fail(&id, "运行器异常退出").await {
                        warn!("记录任务 {} 失败状态时出错: {}", id, e);
                    }
                    None
                }
                Err(_) => {
                    info!("任务 {} 的运行器已中止", id);
                    None
                }
            };
            running.write().await.remove(&id);
            outcome
        })
    }

    /// 中止所有运行器；它们的任务会在下次启动时被恢复为失败
    pub async fn shutdown(&self) {
        let mut running = self.running.write().await;
        if !running.is_empty() {
            info!("中止 {} 个正在运行的任务", running.len());
        }
        for (_, handle) in running.drain() {
            handle.abort();
        }
    }

    /// 持久化并启动任务，返回创建时的详情和运行器句柄
    pub async fn launch(
        &self,
        config: SimulationConfig,
    ) -> SimulatorResult<(TaskDetail, JoinHandle<Option<RunOutcome>>)> {
        let config = TaskConfig::try_from(config)?;
        let task = self.repository.create(&Task::new(config)).await?;
        info!("创建任务 {}: {}", task.id, task.config);

        let handle = self.spawn(task.clone()).await;
        Ok((
            TaskDetail {
                task,
                results: Vec::new(),
            },
            handle,
        ))
    }
}

#[async_trait]
impl TaskControlService for TaskSupervisor {
    async fn create_task(&self, config: SimulationConfig) -> SimulatorResult<TaskDetail> {
        let (detail, _handle) = self.launch(config).await?;
        Ok(detail)
    }

    async fn get_task(&self, id: &str) -> SimulatorResult<TaskDetail> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| SimulatorError::task_not_found(id))
    }

    async fn list_tasks(&self, status: Option<TaskStatus>) -> SimulatorResult<Vec<TaskSummary>> {
        self.repository.list(status).await
    }

    async fn delete_task(&self, id: &str) -> SimulatorResult<()> {
        self.repository.delete(id).await?;
        info!("删除任务 {}", id);
        Ok(())
    }

    async fn active_runner_count(&self) -> usize {
        self.running.read().await.len()
    }
}
