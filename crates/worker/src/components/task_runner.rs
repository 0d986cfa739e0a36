use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use simulator_core::{
    models::{ProbeReport, Task, TaskStatus},
    traits::{ProbeExecutor, TaskRepository},
    validate_target, SimulatorError, SimulatorResult,
};
use tracing::{error, info, instrument, warn};

/// 一次运行的计数汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: u32,
    pub success_count: u32,
    pub fail_count: u32,
}

impl RunSummary {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            success_count: 0,
            fail_count: 0,
        }
    }

    fn from_task(task: &Task) -> Self {
        Self {
            total: task.config.count,
            success_count: task.success_count,
            fail_count: task.fail_count,
        }
    }

    pub fn attempted(&self) -> u32 {
        self.success_count + self.fail_count
    }

    /// 成功率（百分比），分母为配置的访问次数
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.success_count) / f64::from(self.total) * 100.0
    }

    fn record(&mut self, report: &ProbeReport) {
        if report.is_success() {
            self.success_count += 1;
        } else {
            self.fail_count += 1;
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "成功: {}, 失败: {}, 成功率: {:.1}%",
            self.success_count,
            self.fail_count,
            self.success_rate()
        )
    }
}

/// 运行结束的方式
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunSummary),
    Failed { summary: RunSummary, error: String },
    /// 任务在运行期间被删除，运行器安静退出
    Deleted,
}

impl RunOutcome {
    pub fn status(&self) -> Option<TaskStatus> {
        match self {
            RunOutcome::Completed(_) => Some(TaskStatus::Completed),
            RunOutcome::Failed { .. } => Some(TaskStatus::Failed),
            RunOutcome::Deleted => None,
        }
    }
}

/// 在 `[min, max]`（闭区间）内均匀抽取访问间隔秒数
pub fn draw_interval(min: u32, max: u32) -> u32 {
    if min >= max {
        return min;
    }
    rand::rng().random_range(min..=max)
}

/// 驱动单个任务从 `running` 走到终态
///
/// 每个任务只有一个运行器，它是该任务计数器和结果的唯一写入者。
pub struct TaskRunner {
    repository: Arc<dyn TaskRepository>,
    executor: Arc<dyn ProbeExecutor>,
}

impl TaskRunner {
    pub fn new(repository: Arc<dyn TaskRepository>, executor: Arc<dyn ProbeExecutor>) -> Self {
        Self {
            repository,
            executor,
        }
    }

    #[instrument(skip(self, task), fields(task_id = %task.id, url = %task.config.url))]
    pub async fn run(&self, task: &Task) -> RunOutcome {
        info!("开始模拟访问 {}", task.config.url);
        info!("配置: {}", task.config);

        let mut summary = RunSummary::from_task(task);
        let result = self.visit_all(task, &mut summary).await;

        let result = match result {
            Ok(()) => self.repository.finish(&task.id, TaskStatus::Completed).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!("访问完成! {summary}");
                RunOutcome::Completed(summary)
            }
            Err(SimulatorError::TaskNotFound { .. }) => {
                info!("任务已被删除，停止访问");
                RunOutcome::Deleted
            }
            Err(e) => self.abort(task, summary, e).await,
        }
    }

    async fn visit_all(&self, task: &Task, summary: &mut RunSummary) -> SimulatorResult<()> {
        let config = &task.config;
        validate_target(&config.url)?;

        for current in summary.attempted() + 1..=config.count {
            let interval = draw_interval(config.min_interval, config.max_interval);
            info!(
                "[{current}/{}] 等待 {interval} 秒后访问 {}",
                config.count, config.url
            );
            tokio::time::sleep(Duration::from_secs(u64::from(interval))).await;

            let report = self.executor.probe(config).await;
            info!("[{current}/{}] {}", config.count, report.message);

            self.repository.record_probe(&task.id, &report).await?;
            summary.record(&report);
        }
        Ok(())
    }

    async fn abort(&self, task: &Task, mut summary: RunSummary, error: SimulatorError) -> RunOutcome {
        let error = error.to_string();
        error!("发生意外错误: {error}");

        match self.repository.fail(&task.id, &error).await {
            Ok(()) => {
                if summary.attempted() < summary.total {
                    summary.fail_count += 1;
                }
            }
            Err(SimulatorError::TaskNotFound { .. }) => {
                info!("任务已被删除，无需记录失败状态");
            }
            Err(e) => warn!("记录任务失败状态时出错: {e}"),
        }

        error!("访问中止! {summary}");
        RunOutcome::Failed { summary, error }
    }
}
