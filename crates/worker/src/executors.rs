use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use simulator_core::{
    models::{ProbeReport, TaskConfig},
    traits::ProbeExecutor,
    SimulatorError, SimulatorResult,
};
use tracing::debug;

use crate::retry::{AttemptOutcome, FailureKind, RetryPolicy};
use crate::user_agents::{default_headers, random_user_agent};

/// HTTP GET 探测执行器
///
/// 共享一个带连接池的客户端；每次探测随机挑选一个 User-Agent，
/// 同一次探测内的重试沿用同一个。
pub struct HttpProbeExecutor {
    client: reqwest::Client,
}

impl HttpProbeExecutor {
    pub fn new() -> SimulatorResult<Self> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .build()
            .map_err(|e| SimulatorError::Network(format!("创建HTTP客户端失败: {e}")))?;
        Ok(Self { client })
    }

    async fn attempt(&self, config: &TaskConfig, user_agent: &str) -> AttemptOutcome {
        let response = self
            .client
            .get(&config.url)
            .header(USER_AGENT, user_agent)
            .timeout(config.timeout_duration())
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                if status.is_client_error() || status.is_server_error() {
                    return AttemptOutcome::http_error(
                        status.as_u16(),
                        status.canonical_reason().unwrap_or_default(),
                    );
                }
                if let Err(e) = response.bytes().await {
                    debug!("读取响应体失败: {e}");
                }
                AttemptOutcome::Success {
                    status_code: status.as_u16(),
                }
            }
            Err(e) => classify_error(&e),
        }
    }
}

/// 连接超时既算超时也算连接错误，这里按超时处理
fn classify_error(error: &reqwest::Error) -> AttemptOutcome {
    let kind = if error.is_timeout() {
        FailureKind::Timeout
    } else if error.is_connect() {
        FailureKind::Connection
    } else {
        FailureKind::Transport
    };
    AttemptOutcome::retryable(kind, error.to_string())
}

#[async_trait]
impl ProbeExecutor for HttpProbeExecutor {
    async fn probe(&self, config: &TaskConfig) -> ProbeReport {
        let user_agent = random_user_agent();
        debug!("探测 {} (User-Agent: {})", config.url, user_agent);

        RetryPolicy::from_config(config)
            .run(move |_| self.attempt(config, user_agent))
            .await
    }

    fn name(&self) -> &str {
        "http"
    }
}
