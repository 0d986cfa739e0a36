//! 探测执行器接口
//!
//! 执行器对一个已校验的目标发起一次“探测”（内部包含全部重试），
//! 并且总是返回恰好一个终态分类。所有传输层失败都在执行器内部被
//! 吸收为 `Failure` 结果，不会越过这个边界向上抛出。
//!
//! 计数器由调用方（TaskRunner）根据返回的 [`ProbeReport`] 推进，
//! 执行器本身在两次调用之间不保存状态。

use async_trait::async_trait;

use crate::models::{ProbeReport, TaskConfig};

/// 探测执行器
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    /// 按任务配置执行一次探测（最多 `retries + 1` 次尝试）
    async fn probe(&self, config: &TaskConfig) -> ProbeReport;

    /// 执行器名称，用于日志
    fn name(&self) -> &str;
}
