use thiserror::Error;

/// 模拟器错误类型定义
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("任务未找到: {id}")]
    TaskNotFound { id: String },

    #[error("无效的URL: {0}")]
    InvalidTarget(String),

    #[error("无效的任务配置: {0}")]
    InvalidConfig(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl SimulatorError {
    pub fn task_not_found(id: impl Into<String>) -> Self {
        SimulatorError::TaskNotFound { id: id.into() }
    }

    /// 创建期配置问题（URL或参数），对应调用方的4xx
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SimulatorError::InvalidTarget(_) | SimulatorError::InvalidConfig(_)
        )
    }
}

/// 统一的Result类型
pub type SimulatorResult<T> = std::result::Result<T, SimulatorError>;

impl From<serde_json::Error> for SimulatorError {
    fn from(err: serde_json::Error) -> Self {
        SimulatorError::Serialization(err.to_string())
    }
}
