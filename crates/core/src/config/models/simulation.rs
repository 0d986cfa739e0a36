use serde::{Deserialize, Serialize};

use crate::models::{SimulationConfig, TaskConfig};

/// 创建任务时未提供的字段所使用的默认值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationDefaults {
    pub min_interval: i64,
    pub max_interval: i64,
    pub count: i64,
    pub timeout: i64,
    pub retries: i64,
    pub retry_delay: i64,
}

impl Default for SimulationDefaults {
    fn default() -> Self {
        Self {
            min_interval: 2,
            max_interval: 5,
            count: 10,
            timeout: 10,
            retries: 0,
            retry_delay: 1,
        }
    }
}

impl SimulationDefaults {
    /// 以默认值为每个字段构造一份未校验的配置
    pub fn to_config(&self, url: impl Into<String>) -> SimulationConfig {
        SimulationConfig {
            url: url.into(),
            min_interval: self.min_interval,
            max_interval: self.max_interval,
            count: self.count,
            timeout: self.timeout,
            retries: self.retries,
            retry_delay: self.retry_delay,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        TaskConfig::try_from(self.to_config("localhost"))
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{e}"))
    }
}
