//! 任务注册表（持久化存储）接口
//!
//! 注册表保存任务配置、实时计数器和有序的探测结果。它是外部协作者，
//! 但一致性约束由 TaskRunner 决定：
//!
//! - 探测结果与计数器必须在同一次提交中可见，读者永远不会看到
//!   “计数器变了但结果没出现”或者相反的情况
//! - 只有 `running` 状态的任务可以被写入，状态转换单向
//! - 删除任务级联删除其结果；之后对该ID的任何写入返回 `TaskNotFound`

use async_trait::async_trait;

use crate::{
    models::{ProbeReport, Task, TaskDetail, TaskStatus, TaskSummary},
    SimulatorResult,
};

/// 任务注册表
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 持久化一个新任务
    ///
    /// 任务以 `running` 状态、零计数器写入。ID 由调用方生成（UUID）。
    async fn create(&self, task: &Task) -> SimulatorResult<Task>;

    /// 获取任务详情，结果按创建顺序排列；不存在时返回 `None`
    async fn get(&self, id: &str) -> SimulatorResult<Option<TaskDetail>>;

    /// 列出任务，最新创建的在前，可按状态过滤
    async fn list(&self, status: Option<TaskStatus>) -> SimulatorResult<Vec<TaskSummary>>;

    /// 删除任务及其所有结果
    ///
    /// # 错误
    ///
    /// * `TaskNotFound` - 任务不存在
    async fn delete(&self, id: &str) -> SimulatorResult<()>;

    /// 原子地追加一条探测结果并推进对应的计数器和 `updated_at`
    ///
    /// 返回更新后的任务。
    ///
    /// # 错误
    ///
    /// * `TaskNotFound` - 任务已被删除或已不处于 `running`
    async fn record_probe(&self, id: &str, report: &ProbeReport) -> SimulatorResult<Task>;

    /// 把 `running` 任务转换到终态（`completed` 或 `failed`）
    ///
    /// # 错误
    ///
    /// * `TaskNotFound` - 任务不存在或已不处于 `running`
    /// * `InvalidConfig` - 目标状态不是终态
    async fn finish(&self, id: &str, status: TaskStatus) -> SimulatorResult<()>;

    /// 以失败结束任务：在同一次提交中写入一条合成的失败结果、
    /// `fail_count + 1` 并把状态置为 `failed`
    async fn fail(&self, id: &str, message: &str) -> SimulatorResult<()>;

    /// 所有仍处于 `running` 的任务ID
    async fn list_running(&self) -> SimulatorResult<Vec<String>>;
}
