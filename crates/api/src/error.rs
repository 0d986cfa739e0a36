use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use simulator_core::SimulatorError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("模拟器错误: {0}")]
    Simulator(#[from] SimulatorError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Simulator(SimulatorError::TaskNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Simulator(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Simulator(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_message, error_type, suggestions) = match &self {
            ApiError::Simulator(SimulatorError::TaskNotFound { .. }) => (
                "任务不存在".to_string(),
                "TASK_NOT_FOUND",
                vec![
                    "请检查任务ID是否正确".to_string(),
                    "使用 GET /tasks 查看所有任务".to_string(),
                ],
            ),
            ApiError::Simulator(SimulatorError::InvalidTarget(target)) => (
                format!("无效的URL: {target}"),
                "INVALID_URL",
                vec![
                    "支持域名、localhost 或 IPv4 地址，可带端口和路径".to_string(),
                    "示例: example.com、http://localhost:8080/path、1.2.3.4".to_string(),
                ],
            ),
            ApiError::Simulator(SimulatorError::InvalidConfig(msg)) => (
                msg.clone(),
                "INVALID_CONFIG",
                vec![
                    "访问间隔至少为1秒且最小间隔不能大于最大间隔".to_string(),
                    "访问次数和超时时间必须大于0，重试次数和重试延迟不能为负数".to_string(),
                ],
            ),
            ApiError::BadRequest(msg) => (
                format!("请求参数错误: {msg}"),
                "BAD_REQUEST",
                vec![
                    "请检查JSON格式是否正确".to_string(),
                    "url 为必填字段，其余数值字段均为整数".to_string(),
                ],
            ),
            ApiError::Simulator(err) => {
                error!("处理请求时发生内部错误: {err}");
                (
                    "系统内部错误".to_string(),
                    "INTERNAL_ERROR",
                    vec!["系统遇到内部错误，请稍后重试".to_string()],
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_type,
                "message": error_message,
                "suggestions": suggestions,
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
