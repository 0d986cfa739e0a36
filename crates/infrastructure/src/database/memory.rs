use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use simulator_core::{
    models::{ProbeReport, ProbeResult, Task, TaskDetail, TaskStatus, TaskSummary},
    traits::TaskRepository,
    SimulatorError, SimulatorResult,
};
use tokio::sync::RwLock;
use tracing::debug;

/// 内存任务注册表
///
/// 供 `run` 命令和测试使用。所有状态放在一把读写锁后面，每个操作
/// 在持锁期间完成，因此计数器和结果列表总是一起可见。
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tasks: HashMap<String, StoredTask>,
    next_result_id: i64,
    next_seq: u64,
}

#[derive(Debug)]
struct StoredTask {
    /// 插入顺序，创建时间相同时用于排序
    seq: u64,
    task: Task,
    results: Vec<ProbeResult>,
}

impl MemoryState {
    fn running_mut(&mut self, id: &str) -> SimulatorResult<&mut StoredTask> {
        self.tasks
            .get_mut(id)
            .filter(|stored| stored.task.status == TaskStatus::Running)
            .ok_or_else(|| SimulatorError::task_not_found(id))
    }

    fn next_result_id(&mut self) -> i64 {
        self.next_result_id += 1;
        self.next_result_id
    }
}

impl StoredTask {
    fn push_result(&mut self, id: i64, report: &ProbeReport) {
        let now = Utc::now();
        self.results.push(ProbeResult {
            id,
            outcome: report.outcome,
            status_code: report.status_code,
            message: report.message.clone(),
            created_at: now,
        });
        if report.is_success() {
            self.task.success_count += 1;
        } else {
            self.task.fail_count += 1;
        }
        self.task.updated_at = now;
    }
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &Task) -> SimulatorResult<Task> {
        let mut state = self.state.write().await;
        if state.tasks.contains_key(&task.id) {
            return Err(SimulatorError::Internal(format!("任务ID重复: {}", task.id)));
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.tasks.insert(
            task.id.clone(),
            StoredTask {
                seq,
                task: task.clone(),
                results: Vec::new(),
            },
        );
        debug!("创建任务成功: {}", task.id);
        Ok(task.clone())
    }

    async fn get(&self, id: &str) -> SimulatorResult<Option<TaskDetail>> {
        let state = self.state.read().await;
        Ok(state.tasks.get(id).map(|stored| TaskDetail {
            task: stored.task.clone(),
            results: stored.results.clone(),
        }))
    }

    async fn list(&self, status: Option<TaskStatus>) -> SimulatorResult<Vec<TaskSummary>> {
        let state = self.state.read().await;
        let mut stored: Vec<&StoredTask> = state
            .tasks
            .values()
            .filter(|stored| status.map_or(true, |s| stored.task.status == s))
            .collect();
        stored.sort_by(|a, b| {
            b.task
                .created_at
                .cmp(&a.task.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(stored.iter().map(|stored| stored.task.summary()).collect())
    }

    async fn delete(&self, id: &str) -> SimulatorResult<()> {
        let mut state = self.state.write().await;
        state
            .tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SimulatorError::task_not_found(id))
    }

    async fn record_probe(&self, id: &str, report: &ProbeReport) -> SimulatorResult<Task> {
        let mut state = self.state.write().await;
        let result_id = state.next_result_id();
        let stored = state.running_mut(id)?;
        if stored.task.attempted() >= stored.task.config.count {
            return Err(SimulatorError::task_not_found(id));
        }
        stored.push_result(result_id, report);
        Ok(stored.task.clone())
    }

    async fn finish(&self, id: &str, status: TaskStatus) -> SimulatorResult<()> {
        if !TaskStatus::Running.can_transition_to(status) {
            return Err(SimulatorError::InvalidConfig(format!(
                "任务只能转换到终态: {status}"
            )));
        }
        let mut state = self.state.write().await;
        let stored = state.running_mut(id)?;
        stored.task.status = status;
        stored.task.updated_at = Utc::now();
        Ok(())
    }

    async fn fail(&self, id: &str, message: &str) -> SimulatorResult<()> {
        let mut state = self.state.write().await;
        let result_id = state.next_result_id();
        let stored = state.running_mut(id)?;
        if stored.task.attempted() < stored.task.config.count {
            stored.push_result(result_id, &ProbeReport::aborted(message));
        }
        stored.task.status = TaskStatus::Failed;
        stored.task.updated_at = Utc::now();
        Ok(())
    }

    async fn list_running(&self) -> SimulatorResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .values()
            .filter(|stored| stored.task.status == TaskStatus::Running)
            .map(|stored| stored.task.id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulator_core::models::{ProbeOutcome, SimulationConfig, TaskConfig};

    fn task(count: i64) -> Task {
        Task::new(
            TaskConfig::try_from(SimulationConfig {
                url: "localhost:9".to_string(),
                min_interval: 1,
                max_interval: 1,
                count,
                timeout: 1,
                retries: 0,
                retry_delay: 0,
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_record_and_finish() {
        let repo = InMemoryTaskRepository::new();
        let created = repo.create(&task(2)).await.unwrap();

        repo.record_probe(&created.id, &ProbeReport::success(200))
            .await
            .unwrap();
        let after = repo
            .record_probe(&created.id, &ProbeReport::failure(0, "失败"))
            .await
            .unwrap();
        assert_eq!(after.attempted(), 2);

        assert!(repo
            .record_probe(&created.id, &ProbeReport::success(200))
            .await
            .is_err());

        repo.finish(&created.id, TaskStatus::Completed).await.unwrap();
        let detail = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(detail.task.status, TaskStatus::Completed);
        assert_eq!(detail.results.len(), 2);
        assert_eq!(detail.results[1].outcome, ProbeOutcome::Failure);
        assert!(repo.list_running().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fail_and_delete() {
        let repo = InMemoryTaskRepository::new();
        let created = repo.create(&task(5)).await.unwrap();

        repo.fail(&created.id, "boom").await.unwrap();
        let detail = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(detail.task.status, TaskStatus::Failed);
        assert_eq!(detail.task.fail_count, 1);
        assert_eq!(detail.results[0].message, "任务失败: boom");

        repo.delete(&created.id).await.unwrap();
        assert!(repo.is_empty().await);
        assert!(matches!(
            repo.record_probe(&created.id, &ProbeReport::success(200)).await,
            Err(SimulatorError::TaskNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_order_and_filter() {
        let repo = InMemoryTaskRepository::new();
        let a = repo.create(&task(1)).await.unwrap();
        let b = repo.create(&task(1)).await.unwrap();
        repo.finish(&a.id, TaskStatus::Failed).await.unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all[0].id, b.id);
        assert_eq!(all[1].id, a.id);

        let failed = repo.list(Some(TaskStatus::Failed)).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, a.id);
    }
}
