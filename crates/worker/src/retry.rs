//! 单次探测内部的重试策略
//!
//! 每次尝试产生一个 [`AttemptOutcome`]，由 [`RetryPolicy`] 决定是结束还是
//! 等待后再试。只有传输层失败（超时、连接错误、其他请求错误）会重试，
//! 拿到 4xx/5xx 响应说明服务器已经给出了明确答复，直接结束。

use std::fmt;
use std::future::Future;
use std::time::Duration;

use simulator_core::models::{ProbeReport, TaskConfig};
use tracing::{error, warn};

/// 可重试失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connection,
    Transport,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Timeout => "请求超时",
            FailureKind::Connection => "连接错误",
            FailureKind::Transport => "请求错误",
        };
        f.write_str(label)
    }
}

/// 单次尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 收到 2xx/3xx 响应
    Success { status_code: u16 },
    /// 没有拿到响应，可以重试
    RetryableFailure { kind: FailureKind, detail: String },
    /// 收到 4xx/5xx 响应，不再重试
    TerminalFailure { status_code: u16, message: String },
}

impl AttemptOutcome {
    pub fn http_error(status_code: u16, reason: &str) -> Self {
        AttemptOutcome::TerminalFailure {
            status_code,
            message: format!("失败 - HTTP错误: {status_code} {reason}")
                .trim_end()
                .to_string(),
        }
    }

    pub fn retryable(kind: FailureKind, detail: impl Into<String>) -> Self {
        AttemptOutcome::RetryableFailure {
            kind,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次尝试之外允许的额外尝试次数
    pub retries: u32,
    /// 可重试失败与下一次尝试之间的等待时间
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn from_config(config: &TaskConfig) -> Self {
        Self::new(config.retries, config.retry_delay_duration())
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// 反复调用 `attempt`（参数为从1开始的尝试序号），直到得到终态结果
    ///
    /// 最多 `retries + 1` 次尝试；最后一次尝试之后不再等待。
    pub async fn run<F, Fut>(&self, mut attempt: F) -> ProbeReport
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AttemptOutcome>,
    {
        let mut attempt_no = 0;
        loop {
            attempt_no += 1;
            match attempt(attempt_no).await {
                AttemptOutcome::Success { status_code } => {
                    return ProbeReport::success(status_code);
                }
                AttemptOutcome::TerminalFailure {
                    status_code,
                    message,
                } => {
                    error!("{message}");
                    return ProbeReport::failure(status_code, message);
                }
                AttemptOutcome::RetryableFailure { kind, detail } => {
                    if attempt_no >= self.max_attempts() {
                        let message = self.exhausted_message(kind, &detail);
                        error!("{message}");
                        return ProbeReport::failure(0, message);
                    }
                    warn!(
                        "{kind}，{}秒后重试 ({}/{}): {detail}",
                        self.delay.as_secs(),
                        attempt_no,
                        self.retries
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }

    fn exhausted_message(&self, kind: FailureKind, detail: &str) -> String {
        let n = self.retries;
        match kind {
            FailureKind::Timeout => format!("失败 - 请求超时（重试{n}次后仍失败）"),
            FailureKind::Connection => format!("失败 - 连接错误（重试{n}次后仍失败）"),
            FailureKind::Transport => format!("失败 - {detail}（重试{n}次后仍失败）"),
        }
    }
}
