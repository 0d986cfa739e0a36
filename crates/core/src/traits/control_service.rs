use async_trait::async_trait;

use crate::{
    models::{SimulationConfig, TaskDetail, TaskStatus, TaskSummary},
    SimulatorResult,
};

/// 任务控制服务接口
///
/// API 层只通过这个接口访问任务：创建（校验、持久化、启动后台运行器）、
/// 查询和删除。
#[async_trait]
pub trait TaskControlService: Send + Sync {
    /// 校验配置、持久化 `running` 任务并在后台启动运行器
    ///
    /// 持久化完成后立即返回，不等待运行循环。
    async fn create_task(&self, config: SimulationConfig) -> SimulatorResult<TaskDetail>;

    /// 获取任务详情
    async fn get_task(&self, id: &str) -> SimulatorResult<TaskDetail>;

    /// 列出任务
    async fn list_tasks(&self, status: Option<TaskStatus>) -> SimulatorResult<Vec<TaskSummary>>;

    /// 删除任务并级联删除结果，不中断正在运行的运行器
    async fn delete_task(&self, id: &str) -> SimulatorResult<()>;

    /// 当前仍在运行的运行器数量
    async fn active_runner_count(&self) -> usize;
}
