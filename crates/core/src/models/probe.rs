use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一次探测的最终分类
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutcome {
    Success,
    Failure,
}

impl ProbeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeOutcome::Success => "success",
            ProbeOutcome::Failure => "failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl sqlx::Type<sqlx::Sqlite> for ProbeOutcome {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ProbeOutcome {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "success" => Ok(ProbeOutcome::Success),
            "failure" => Ok(ProbeOutcome::Failure),
            _ => Err(format!("Invalid probe outcome: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ProbeOutcome {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 探测执行器返回给 TaskRunner 的终态结果，尚未持久化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub outcome: ProbeOutcome,
    /// 未拿到响应时为0
    pub status_code: u16,
    pub message: String,
}

impl ProbeReport {
    pub fn success(status_code: u16) -> Self {
        Self {
            outcome: ProbeOutcome::Success,
            status_code,
            message: format!("成功 - 状态码: {status_code}"),
        }
    }

    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            outcome: ProbeOutcome::Failure,
            status_code,
            message: message.into(),
        }
    }

    /// 循环中出现执行器未能分类的错误时写入的合成失败结果
    pub fn aborted(error: impl fmt::Display) -> Self {
        Self::failure(0, format!("任务失败: {error}"))
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// 已持久化的探测结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub id: i64,
    #[serde(rename = "status")]
    pub outcome: ProbeOutcome,
    pub status_code: u16,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
