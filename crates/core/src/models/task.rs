use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::probe::ProbeResult;
use crate::errors::{SimulatorError, SimulatorResult};
use crate::validation::validate_target;

/// 模拟任务
///
/// 一次模拟访问运行：不可变的 [`TaskConfig`] 加上运行中不断推进的计数器。
/// 任务处于 `Running` 时只有它自己的 TaskRunner 可以写入；进入
/// `Completed`/`Failed` 之后对所有人只读。
///
/// # 字段说明
///
/// - `id`: UUID v4 字符串，创建时分配
/// - `config`: 序列化时展开到顶层（url、min_interval 等）
/// - `success_count` / `fail_count`: 单调递增，两者之和不超过 `config.count`
/// - `created_at`: 只设置一次
/// - `updated_at`: 每次变更都会推进
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(flatten)]
    pub config: TaskConfig,
    pub status: TaskStatus,
    pub success_count: u32,
    pub fail_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// 以 Running 状态创建新任务，计数器归零
    pub fn new(config: TaskConfig) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            config,
            status: TaskStatus::Running,
            success_count: 0,
            fail_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 已经尝试过的探测次数
    pub fn attempted(&self) -> u32 {
        self.success_count + self.fail_count
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            url: self.config.url.clone(),
            status: self.status,
            success_count: self.success_count,
            fail_count: self.fail_count,
            created_at: self.created_at,
        }
    }
}

/// 任务状态
///
/// 状态转换是单向的：`Running → Completed` 或 `Running → Failed`，
/// 任何任务都不会重新进入 `Running`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// 是否允许从当前状态转换到 `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        *self == TaskStatus::Running && next.is_finished()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "running" => Ok(TaskStatus::Running),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(SimulatorError::InvalidConfig(format!("未知的任务状态: {s}"))),
        }
    }
}

impl sqlx::Type<sqlx::Sqlite> for TaskStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for TaskStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "running" => Ok(TaskStatus::Running),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(format!("Invalid task status: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for TaskStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 任务配置，任务启动后不可变
///
/// 只能通过 [`TaskConfig::try_from`] 从 [`SimulationConfig`] 构造，
/// 因此持有一个 `TaskConfig` 就意味着所有字段都已通过校验，
/// 且 `url` 已规范化（一定带 scheme）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub url: String,
    pub min_interval: u32,
    pub max_interval: u32,
    pub count: u32,
    pub timeout: u32,
    pub retries: u32,
    pub retry_delay: u32,
}

impl TaskConfig {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout))
    }

    pub fn retry_delay_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.retry_delay))
    }
}

impl fmt::Display for TaskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "目标URL={}, 访问间隔={}-{}秒, 访问次数={}, 超时={}秒, 重试次数={}, 重试延迟={}秒",
            self.url,
            self.min_interval,
            self.max_interval,
            self.count,
            self.timeout,
            self.retries,
            self.retry_delay
        )
    }
}

/// 未经校验的模拟配置（来自HTTP请求或命令行）
///
/// 数值字段使用 `i64`，这样负数也能被接收并返回明确的校验错误，
/// 而不是在反序列化阶段就失败。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub url: String,
    pub min_interval: i64,
    pub max_interval: i64,
    pub count: i64,
    pub timeout: i64,
    pub retries: i64,
    pub retry_delay: i64,
}

impl TryFrom<SimulationConfig> for TaskConfig {
    type Error = SimulatorError;

    fn try_from(raw: SimulationConfig) -> SimulatorResult<Self> {
        let url = validate_target(&raw.url)?;

        if raw.min_interval < 1 || raw.max_interval < 1 {
            return Err(SimulatorError::InvalidConfig(format!(
                "无效的访问间隔: {}-{}秒，间隔必须至少为1秒",
                raw.min_interval, raw.max_interval
            )));
        }
        if raw.min_interval > raw.max_interval {
            return Err(SimulatorError::InvalidConfig(format!(
                "无效的访问间隔: 最小间隔 {} 大于最大间隔 {}",
                raw.min_interval, raw.max_interval
            )));
        }
        if raw.count < 1 {
            return Err(SimulatorError::InvalidConfig(format!(
                "无效的访问次数: {}，必须大于0",
                raw.count
            )));
        }
        if raw.timeout < 1 {
            return Err(SimulatorError::InvalidConfig(format!(
                "无效的超时时间: {}，必须至少为1秒",
                raw.timeout
            )));
        }
        if raw.retries < 0 {
            return Err(SimulatorError::InvalidConfig(format!(
                "无效的重试次数: {}，不能为负数",
                raw.retries
            )));
        }
        if raw.retry_delay < 0 {
            return Err(SimulatorError::InvalidConfig(format!(
                "无效的重试延迟: {}，不能为负数",
                raw.retry_delay
            )));
        }

        Ok(TaskConfig {
            url,
            min_interval: to_u32("min_interval", raw.min_interval)?,
            max_interval: to_u32("max_interval", raw.max_interval)?,
            count: to_u32("count", raw.count)?,
            timeout: to_u32("timeout", raw.timeout)?,
            retries: to_u32("retries", raw.retries)?,
            retry_delay: to_u32("retry_delay", raw.retry_delay)?,
        })
    }
}

fn to_u32(field: &str, value: i64) -> SimulatorResult<u32> {
    u32::try_from(value)
        .map_err(|_| SimulatorError::InvalidConfig(format!("{field} 超出允许范围: {value}")))
}

/// 任务列表项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    pub url: String,
    pub status: TaskStatus,
    pub success_count: u32,
    pub fail_count: u32,
    pub created_at: DateTime<Utc>,
}

/// 任务详情：任务本身加上按创建顺序排列的探测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub results: Vec<ProbeResult>,
}
