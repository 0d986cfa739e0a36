use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use simulator_core::models::{SimulationConfig, TaskStatus};

use crate::{
    error::{ApiError, ApiResult},
    response::{created, message},
    routes::AppState,
};

/// 任务创建请求，除 `url` 外的字段缺省时使用配置的默认值
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub url: String,
    pub min_interval: Option<i64>,
    pub max_interval: Option<i64>,
    pub count: Option<i64>,
    pub timeout: Option<i64>,
    pub retries: Option<i64>,
    pub retry_delay: Option<i64>,
}

impl CreateTaskRequest {
    fn into_config(self, state: &AppState) -> SimulationConfig {
        let defaults = &state.defaults;
        SimulationConfig {
            url: self.url,
            min_interval: self.min_interval.unwrap_or(defaults.min_interval),
            max_interval: self.max_interval.unwrap_or(defaults.max_interval),
            count: self.count.unwrap_or(defaults.count),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            retries: self.retries.unwrap_or(defaults.retries),
            retry_delay: self.retry_delay.unwrap_or(defaults.retry_delay),
        }
    }
}

/// 任务查询参数
#[derive(Debug, Deserialize)]
pub struct TaskQueryParams {
    pub status: Option<String>,
}

/// 创建任务
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let config = request.into_config(&state);

    let detail = state.task_controller.create_task(config).await?;
    Ok(created(detail))
}

/// 获取任务列表
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskQueryParams>,
) -> ApiResult<impl IntoResponse> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;

    let tasks = state.task_controller.list_tasks(status).await?;
    Ok(Json(tasks))
}

/// 获取单个任务
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let detail = state.task_controller.get_task(&id).await?;
    Ok(Json(detail))
}

/// 删除任务
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.task_controller.delete_task(&id).await?;
    Ok(message("任务已删除"))
}
